//! Shared utilities for integration testing.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use oneshot_listener::ServerConfig;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

/// Loopback config on an ephemeral port.
pub fn loopback_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = Ipv4Addr::LOCALHOST;
    config.listener.port = 0;
    config
}

/// Connect, send `payload`, then close the write side.
pub fn send_and_close(addr: SocketAddr, payload: Vec<u8>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        if !payload.is_empty() {
            stream.write_all(&payload).await.unwrap();
        }
        stream.shutdown().await.unwrap();
    })
}

/// Connect and stay silent for `hold`, keeping the connection open.
#[allow(dead_code)]
pub fn connect_and_idle(addr: SocketAddr, hold: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let _stream = TcpStream::connect(addr).await.unwrap();
        tokio::time::sleep(hold).await;
    })
}
