//! Client execution logic.

use std::io::ErrorKind;

use tokio::net::TcpStream;

use crate::{domain::SessionEnd, error::ClientError, session::run_session, ui::spawn_readline};

/// Address of the chat server
pub const SERVER_ADDR: &str = "127.0.0.1:12345";

/// Connect to `addr` and run a session.
///
/// # Errors
///
/// Returns [`ClientError::ConnectionRefused`] if nothing is listening.
pub async fn connect(addr: &str) -> Result<TcpStream, ClientError> {
    tracing::info!("Attempting to connect to {}", addr);
    TcpStream::connect(addr).await.map_err(|e| match e.kind() {
        ErrorKind::ConnectionRefused => ClientError::ConnectionRefused(addr.to_string()),
        _ => ClientError::Io(e),
    })
}

/// Connect to the server and run an interactive session on the terminal
pub async fn run_client(addr: &str) -> Result<SessionEnd, ClientError> {
    let stream = connect(addr).await?;
    tracing::info!("Connected to chat server!");
    run_session(stream, spawn_readline()).await
}
