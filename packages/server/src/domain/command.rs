//! Slash-command grammar.

use super::error::CommandError;

/// Leading sequence marking a line as a command rather than chat text.
pub const COMMAND_PREFIX: &str = "/";

const WHISPER_USAGE: &str = "/whisper <username> <message>";
const KICK_USAGE: &str = "/kick <username>";

/// Whether the first whitespace-delimited token carries the command prefix.
pub fn is_command(line: &str) -> bool {
    line.split_whitespace()
        .next()
        .is_some_and(|token| token.starts_with(COMMAND_PREFIX))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Users,
    Whisper { target: String, body: String },
    Kick { target: String },
}

impl Command {
    /// Parse a command line.
    ///
    /// Tokens are split on whitespace. For `/whisper` everything after the
    /// target is the body, rejoined with single spaces.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut tokens = line.split_whitespace();
        let head = tokens.next().unwrap_or_default();
        let name = head
            .strip_prefix(COMMAND_PREFIX)
            .ok_or_else(|| CommandError::UnknownCommand(head.to_string()))?;

        match name.to_ascii_lowercase().as_str() {
            "help" => Ok(Command::Help),
            "users" => Ok(Command::Users),
            "whisper" => {
                let target = tokens.next().ok_or(CommandError::Usage(WHISPER_USAGE))?;
                let body = tokens.collect::<Vec<_>>().join(" ");
                if body.is_empty() {
                    return Err(CommandError::Usage(WHISPER_USAGE));
                }
                Ok(Command::Whisper {
                    target: target.to_string(),
                    body,
                })
            }
            "kick" => match (tokens.next(), tokens.next()) {
                (Some(target), None) => Ok(Command::Kick {
                    target: target.to_string(),
                }),
                _ => Err(CommandError::Usage(KICK_USAGE)),
            },
            _ => Err(CommandError::UnknownCommand(head.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Help => "/help",
            Command::Users => "/users",
            Command::Whisper { .. } => "/whisper",
            Command::Kick { .. } => "/kick",
        }
    }
}
