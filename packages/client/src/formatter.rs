//! Message formatting utilities for client display.

/// Clears the screen and moves the cursor home
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const WHISPER_PREFIX: &str = "[whisper ";
const SERVER_PREFIX: &str = "SERVER: ";
const ERROR_PREFIX: &str = "ERROR: ";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format one line received from the server.
    ///
    /// Whispers, server notices and errors get a short marker so they
    /// stand out from ordinary chat lines. The result starts on a fresh
    /// line so it does not run into a half-typed prompt.
    pub fn format_incoming(line: &str) -> String {
        let marker = if line.starts_with(WHISPER_PREFIX) {
            "~ "
        } else if line.starts_with(SERVER_PREFIX) {
            "* "
        } else if line.starts_with(ERROR_PREFIX) {
            "! "
        } else {
            ""
        };
        format!("\r{}{}\n", marker, line)
    }

    /// Help for the commands the client and server understand
    pub fn format_help() -> String {
        [
            "Commands:",
            "  /help                        Show this help",
            "  /users                       List connected users",
            "  /whisper <user> <message>    Send a private message",
            "  /clear                       Clear the screen",
            "  quit                         Leave the chat",
        ]
        .join("\n")
            + "\n"
    }
}
