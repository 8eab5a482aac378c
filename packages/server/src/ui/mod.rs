//! UI layer: sockets, the operator console and the server lifecycle.

mod acceptor;
mod config;
mod connection;
mod console;
mod error;
mod server;
pub mod state;

pub use config::{DEFAULT_HOST, DEFAULT_MAX_LINE_LENGTH, DEFAULT_PORT, ServerConfig};
pub use console::{ConsoleAction, OperatorConsole, run_console, spawn_stdin_reader};
pub use error::ServerError;
pub use server::{RunningServer, Server};
