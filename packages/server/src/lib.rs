//! Hiroba: a multi-client, line-oriented TCP chat server.
//!
//! Clients send their username as the first line, then chat lines or
//! slash-commands. Every public event passes through a single broadcast
//! pipeline that records it in a bounded history and fans it out.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub use ui::{RunningServer, Server, ServerConfig, ServerError};
