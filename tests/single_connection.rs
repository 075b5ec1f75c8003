//! End-to-end behaviour of the single-connection acceptor.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use oneshot_listener::net::ListenEndpoint;
use oneshot_listener::{Acceptor, AcceptorState, ServerError, Shutdown};
use socket2::SockRef;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

mod common;

/// Output that rejects every write, like a closed stdout pipe.
struct BrokenPipe;

impl AsyncWrite for BrokenPipe {
    fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::from(io::ErrorKind::BrokenPipe)))
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn hello_reaches_sink_and_closes() {
    let shutdown = Shutdown::new();
    let mut acceptor = Acceptor::new(common::loopback_config(), shutdown.subscribe());
    let state = acceptor.state();

    let endpoint = acceptor.bind().await.unwrap();
    let client = common::send_and_close(endpoint.local_addr(), b"hello".to_vec());

    let connection = acceptor.accept_one(endpoint).await.unwrap();
    let connection_id = connection.id();
    let mut sink = Vec::new();
    let summary = acceptor.drain(connection, &mut sink).await.unwrap();
    client.await.unwrap();

    assert_eq!(sink, b"hello");
    assert_eq!(summary.bytes, 5);
    assert_eq!(summary.connection_id, connection_id);
    assert_eq!(*state.borrow(), AcceptorState::Closed);
}

#[tokio::test]
async fn immediate_close_yields_nothing() {
    let shutdown = Shutdown::new();
    let mut acceptor = Acceptor::new(common::loopback_config(), shutdown.subscribe());

    let endpoint = acceptor.bind().await.unwrap();
    let client = common::send_and_close(endpoint.local_addr(), Vec::new());

    let connection = acceptor.accept_one(endpoint).await.unwrap();
    let mut sink = Vec::new();
    let summary = acceptor.drain(connection, &mut sink).await.unwrap();
    client.await.unwrap();

    assert!(sink.is_empty());
    assert_eq!(summary.bytes, 0);
    assert_eq!(summary.chunks, 0);
    assert_eq!(acceptor.current_state(), AcceptorState::Closed);
}

#[tokio::test]
async fn payload_larger_than_buffer_arrives_in_order() {
    let shutdown = Shutdown::new();
    let mut acceptor = Acceptor::new(common::loopback_config(), shutdown.subscribe());
    assert_eq!(acceptor.config().connection.buffer_capacity, 256);

    let payload: Vec<u8> = (0..300u32).map(|i| (i % 251) as u8).collect();

    let endpoint = acceptor.bind().await.unwrap();
    let client = common::send_and_close(endpoint.local_addr(), payload.clone());

    let connection = acceptor.accept_one(endpoint).await.unwrap();
    let mut sink = Vec::new();
    let summary = acceptor.drain(connection, &mut sink).await.unwrap();
    client.await.unwrap();

    assert_eq!(sink, payload);
    assert_eq!(summary.bytes, 300);
    assert!(summary.chunks >= 2, "300 bytes cannot fit one 255-byte read");
}

#[tokio::test]
async fn second_instance_cannot_bind_same_port() {
    let shutdown = Shutdown::new();
    let mut first = Acceptor::new(common::loopback_config(), shutdown.subscribe());
    let endpoint = first.bind().await.unwrap();

    let mut config = common::loopback_config();
    config.listener.port = endpoint.local_addr().port();
    let mut second = Acceptor::new(config, shutdown.subscribe());

    let err = second.bind().await.unwrap_err();
    assert!(matches!(err, ServerError::Bind { .. }), "unexpected error: {err}");
    assert_eq!(second.current_state(), AcceptorState::Failed);
}

#[tokio::test]
async fn bind_retry_waits_for_port_release() {
    let shutdown = Shutdown::new();
    let holder = ListenEndpoint::bind(&common::loopback_config().listener).unwrap();
    let port = holder.local_addr().port();

    let mut config = common::loopback_config();
    config.listener.port = port;
    config.retries.enabled = true;
    config.retries.max_attempts = 50;
    config.retries.base_delay_ms = 20;
    config.retries.max_delay_ms = 100;
    let mut acceptor = Acceptor::new(config, shutdown.subscribe());

    let release = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        drop(holder);
    });

    let endpoint = acceptor.bind().await.unwrap();
    release.await.unwrap();
    assert_eq!(endpoint.local_addr().port(), port);
}

#[tokio::test]
async fn idle_peer_waits_for_deadline_instead_of_spinning() {
    let shutdown = Shutdown::new();
    let mut config = common::loopback_config();
    config.connection.idle_timeout_secs = Some(1);
    let mut acceptor = Acceptor::new(config, shutdown.subscribe());

    let endpoint = acceptor.bind().await.unwrap();
    let client = common::connect_and_idle(endpoint.local_addr(), Duration::from_secs(3));

    let connection = acceptor.accept_one(endpoint).await.unwrap();
    let mut sink = Vec::new();
    let started = Instant::now();
    let err = acceptor.drain(connection, &mut sink).await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, ServerError::ReadTimeout { .. }), "unexpected error: {err}");
    assert!(elapsed >= Duration::from_millis(900));
    assert!(sink.is_empty());
    assert_eq!(acceptor.current_state(), AcceptorState::Failed);
    client.abort();
}

#[tokio::test]
async fn accept_deadline_expires_without_client() {
    let shutdown = Shutdown::new();
    let mut config = common::loopback_config();
    config.connection.accept_timeout_secs = Some(1);
    let mut acceptor = Acceptor::new(config, shutdown.subscribe());

    let endpoint = acceptor.bind().await.unwrap();
    let err = acceptor.accept_one(endpoint).await.unwrap_err();

    assert!(matches!(err, ServerError::AcceptTimeout(d) if d == Duration::from_secs(1)));
    assert_eq!(acceptor.current_state(), AcceptorState::Failed);
}

#[tokio::test]
async fn shutdown_cancels_accept() {
    let shutdown = Shutdown::new();
    let mut acceptor = Acceptor::new(common::loopback_config(), shutdown.subscribe());
    let endpoint = acceptor.bind().await.unwrap();

    let trigger = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.trigger();
    };
    let (result, ()) = tokio::join!(acceptor.accept_one(endpoint), trigger);

    assert!(result.unwrap_err().is_cancelled());
    assert_eq!(acceptor.current_state(), AcceptorState::Cancelled);
}

#[tokio::test]
async fn listener_is_released_after_accept() {
    let shutdown = Shutdown::new();
    let mut acceptor = Acceptor::new(common::loopback_config(), shutdown.subscribe());

    let endpoint = acceptor.bind().await.unwrap();
    let addr = endpoint.local_addr();
    let first = TcpStream::connect(addr).await.unwrap();
    let connection = acceptor.accept_one(endpoint).await.unwrap();
    assert_eq!(connection.peer_addr(), first.local_addr().unwrap());

    let second = TcpStream::connect(addr).await;
    assert!(second.is_err(), "no listener should remain after the one accept");
}

#[tokio::test]
async fn shutdown_cancels_bind_retries() {
    let shutdown = Shutdown::new();
    let holder = ListenEndpoint::bind(&common::loopback_config().listener).unwrap();

    let mut config = common::loopback_config();
    config.listener.port = holder.local_addr().port();
    config.retries.enabled = true;
    config.retries.max_attempts = 10;
    config.retries.base_delay_ms = 2_000;
    config.retries.max_delay_ms = 2_000;
    let mut acceptor = Acceptor::new(config, shutdown.subscribe());

    let trigger = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.trigger();
    };
    let started = Instant::now();
    let (result, ()) = tokio::join!(acceptor.bind(), trigger);

    assert!(result.unwrap_err().is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(acceptor.current_state(), AcceptorState::Cancelled);
}

#[tokio::test]
async fn failing_output_is_sink_error() {
    let shutdown = Shutdown::new();
    let mut acceptor = Acceptor::new(common::loopback_config(), shutdown.subscribe());

    let endpoint = acceptor.bind().await.unwrap();
    let client = common::send_and_close(endpoint.local_addr(), b"hello".to_vec());

    let connection = acceptor.accept_one(endpoint).await.unwrap();
    let err = acceptor.drain(connection, &mut BrokenPipe).await.unwrap_err();
    client.await.unwrap();

    assert!(
        matches!(&err, ServerError::Sink(e) if e.kind() == io::ErrorKind::BrokenPipe),
        "unexpected error: {err}"
    );
    assert_eq!(acceptor.current_state(), AcceptorState::Failed);
}

#[tokio::test]
async fn peer_reset_is_read_error() {
    let shutdown = Shutdown::new();
    let mut acceptor = Acceptor::new(common::loopback_config(), shutdown.subscribe());

    let endpoint = acceptor.bind().await.unwrap();
    let mut client = TcpStream::connect(endpoint.local_addr()).await.unwrap();
    let connection = acceptor.accept_one(endpoint).await.unwrap();
    let peer = connection.peer_addr();

    // Zero linger turns the close into a reset instead of a FIN
    client.write_all(b"partial").await.unwrap();
    SockRef::from(&client).set_linger(Some(Duration::ZERO)).unwrap();
    drop(client);

    let mut sink = Vec::new();
    let err = acceptor.drain(connection, &mut sink).await.unwrap_err();

    match err {
        ServerError::Read { peer: failed, .. } => assert_eq!(failed, peer),
        other => panic!("expected read error, got {other}"),
    }
    assert_eq!(acceptor.current_state(), AcceptorState::Failed);
}
