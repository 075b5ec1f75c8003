//! Deadline enforcement.
//!
//! # Responsibilities
//! - Wrap accept and read waits with an optional deadline
//! - Report expiry as `None` so callers pick their own error variant

use std::future::Future;
use std::time::Duration;

/// Run `fut` to completion, or until `deadline` elapses.
///
/// Returns `None` if the deadline expired first. Without a deadline the
/// future runs until it completes.
pub async fn with_deadline<F: Future>(deadline: Option<Duration>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
        None => Some(fut.await),
    }
}
