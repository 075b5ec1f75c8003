//! Companion client: send stdin to a listener, then half-close.

use clap::Parser;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

#[derive(Parser)]
#[command(name = "oneshot-send")]
#[command(about = "Send stdin to a oneshot-listener and close", long_about = None)]
struct Cli {
    /// Listener address
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    addr: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut stream = TcpStream::connect(&cli.addr).await?;
    let mut stdin = tokio::io::stdin();

    let sent = tokio::io::copy(&mut stdin, &mut stream).await?;
    stream.shutdown().await?;

    eprintln!("sent {} bytes to {}", sent, cli.addr);
    Ok(())
}
