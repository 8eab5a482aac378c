//! Interactive CLI client for the Hiroba chat server.

pub mod domain;
pub mod error;
pub mod formatter;
pub mod runner;
pub mod session;
pub mod ui;
