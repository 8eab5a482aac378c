//! UseCase: slash-command dispatch
//!
//! Commands run on the caller's own control path. Replies are plain lines:
//! for a client they are pushed onto that session's outbound queue, for the
//! operator they are returned to the console. Malformed commands never leave
//! this module except as an `ERROR:` reply.
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - /help, /users, /whisper, /kick の各コマンドと未知のコマンド
//! - クライアントとオペレーターで利用可能なコマンドの違い
//!
//! ### どのような状況を想定しているか
//! - 正常系：ささやきが宛先と送信者にだけ届き、履歴に WHISPER として残る
//! - 異常系：存在しない宛先、引数不足、権限のないコマンド

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::{
    domain::{ChatEvent, Command, MessagePusher, Session, Timestamp},
    infrastructure::InMemorySessionRegistry,
};

use super::broadcast_pipeline::EventPublisher;

/// Help text for connected clients, one frame per line.
pub const CLIENT_HELP: &[&str] = &[
    "Available commands:",
    "  /help                        Show this help",
    "  /users                       List connected users",
    "  /whisper <username> <text>   Send a private message",
];

/// Help text for the server operator.
pub const OPERATOR_HELP: &[&str] = &[
    "Operator commands:",
    "  /help              Show this help",
    "  /users             List connected users with their addresses",
    "  /kick <username>   Disconnect a user",
    "  quit               Shut the server down",
    "Any other line is broadcast as a SERVER message.",
];

/// Sent to a kicked session right before its connection is closed.
pub const KICK_NOTICE: &str = "SERVER: You have been kicked from the chat.";

fn error_line(message: impl std::fmt::Display) -> String {
    format!("ERROR: {}", message)
}

pub struct CommandDispatcher {
    registry: Arc<InMemorySessionRegistry>,
    publisher: EventPublisher,
    clock: Arc<dyn Clock>,
}

impl CommandDispatcher {
    pub fn new(
        registry: Arc<InMemorySessionRegistry>,
        publisher: EventPublisher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            publisher,
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// Run a command typed by a connected client and push the replies to it.
    pub async fn dispatch_from_client(&self, invoker: &Session, line: &str) {
        let replies = self.execute_for_client(invoker, line).await;
        for reply in replies {
            if let Err(e) = self.registry.push_to(&invoker.id, &reply).await {
                tracing::debug!("Reply to '{}' not delivered: {}", invoker.username, e);
                break;
            }
        }
    }

    /// Replies a client command produces for its invoker.
    pub async fn execute_for_client(&self, invoker: &Session, line: &str) -> Vec<String> {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!("Bad command from '{}': {}", invoker.username, e);
                return vec![error_line(e)];
            }
        };

        tracing::debug!("'{}' invoked {}", invoker.username, command.name());
        match command {
            Command::Help => CLIENT_HELP.iter().map(|l| l.to_string()).collect(),
            Command::Users => {
                let usernames = self.registry.usernames().await;
                if usernames.is_empty() {
                    vec!["No users connected.".to_string()]
                } else {
                    vec![format!("Connected users: {}", usernames.join(", "))]
                }
            }
            Command::Whisper { target, body } => self.whisper(invoker, &target, &body).await,
            Command::Kick { .. } => vec![error_line(
                "/kick is only available to the server operator",
            )],
        }
    }

    async fn whisper(&self, invoker: &Session, target: &str, body: &str) -> Vec<String> {
        let Some(recipient) = self.registry.find_by_username(target).await else {
            return vec![error_line(format!("User '{}' not found", target))];
        };

        let delivered = self
            .registry
            .push_to(
                &recipient.id,
                &format!("[whisper from {}]: {}", invoker.username, body),
            )
            .await;
        if let Err(e) = delivered {
            // Target left between lookup and push.
            tracing::debug!("Whisper to '{}' failed: {}", target, e);
            return vec![error_line(format!("User '{}' not found", target))];
        }

        self.publisher.publish(ChatEvent::whisper(
            &invoker.username,
            &recipient.username,
            body,
            self.now(),
        ));
        vec![format!("[whisper to {}]: {}", recipient.username, body)]
    }

    /// Run a command typed on the operator console and return its output.
    pub async fn dispatch_from_operator(&self, line: &str) -> Vec<String> {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(e) => return vec![error_line(e)],
        };

        tracing::debug!("Operator invoked {}", command.name());
        match command {
            Command::Help => OPERATOR_HELP.iter().map(|l| l.to_string()).collect(),
            Command::Users => {
                let sessions = self.registry.sessions().await;
                if sessions.is_empty() {
                    return vec!["No users connected.".to_string()];
                }
                let mut lines = vec![format!("Connected users ({}):", sessions.len())];
                lines.extend(
                    sessions
                        .iter()
                        .map(|s| format!("  {} ({})", s.username, s.remote_addr)),
                );
                lines
            }
            Command::Kick { target } => self.kick(&target).await,
            Command::Whisper { .. } => vec![error_line(
                "/whisper is only available to connected clients",
            )],
        }
    }

    async fn kick(&self, target: &str) -> Vec<String> {
        match self.registry.kick(target, KICK_NOTICE).await {
            Some(session) => {
                tracing::info!("Kicked '{}' ({})", session.username, session.remote_addr);
                self.publisher
                    .publish(ChatEvent::kicked(&session.username, self.now()));
                vec![format!("Kicked '{}'.", session.username)]
            }
            None => vec![format!("User '{}' not found.", target)],
        }
    }
}
