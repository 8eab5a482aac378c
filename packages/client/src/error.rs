//! Error types for the chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Nothing is listening on the server address
    #[error("Connection to {0} was refused")]
    ConnectionRefused(String),

    /// Socket error while connecting or talking to the server
    #[error("Connection error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing error on the line stream
    #[error("Protocol error: {0}")]
    Codec(#[from] tokio_util::codec::LinesCodecError),
}
