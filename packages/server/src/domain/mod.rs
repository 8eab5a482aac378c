//! Domain layer: value objects, chat events, history and the command grammar.
//!
//! Nothing in here performs I/O. The only seam towards the outside world is
//! the [`MessagePusher`] trait, implemented by the infrastructure layer.

mod command;
mod error;
mod event;
mod history;
mod pusher;
mod session;
mod value;

pub use command::{COMMAND_PREFIX, Command, is_command};
pub use error::{CommandError, MessagePushError, UsernameError};
pub use event::{ChatEvent, EventKind, SERVER_ORIGIN};
pub use history::{DEFAULT_HISTORY_CAPACITY, HistoryBuffer};
pub use pusher::MessagePusher;
#[cfg(test)]
pub use pusher::MockMessagePusher;
pub use session::{CloseReason, Session};
pub use value::{MAX_USERNAME_LENGTH, SessionId, Timestamp, Username};
