//! Domain logic for client-side operations.
//!
//! Pure functions deciding what to do with a line the user typed, kept
//! apart from the terminal and the socket so they can be tested directly.

/// What the input loop should do with one line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    /// Leave the chat
    Quit,
    /// Print the local help text
    Help,
    /// Clear the terminal
    Clear,
    /// Send the line to the server as-is
    Send(String),
    /// Blank line, nothing to do
    Ignore,
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The server closed the stream
    ServerClosed,
    /// The user quit, hit Ctrl+C/Ctrl+D, or the process got SIGTERM
    UserQuit,
}

impl SessionEnd {
    /// The line printed when the session is over
    pub fn farewell(&self) -> &'static str {
        match self {
            SessionEnd::ServerClosed => "Lost connection to the server.",
            SessionEnd::UserQuit => "Disconnected from server.",
        }
    }
}

/// Classify a line of user input.
///
/// `quit` is matched case-insensitively. `/help` and `/clear` are handled
/// locally; every other slash-command goes to the server, which knows the
/// rest of the command set.
pub fn classify_input(line: &str) -> InputAction {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return InputAction::Ignore;
    }
    if trimmed.eq_ignore_ascii_case("quit") {
        return InputAction::Quit;
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "/help" => InputAction::Help,
        "/clear" => InputAction::Clear,
        _ => InputAction::Send(trimmed.to_string()),
    }
}
