//! UseCase layer: everything a session or the operator can make happen.

mod broadcast_pipeline;
mod connect_session;
mod disconnect_session;
mod dispatch_command;
pub mod error;
mod send_message;

pub use broadcast_pipeline::{BroadcastPipeline, EventPublisher};
pub use connect_session::{ConnectSessionUseCase, JoinedSession};
pub use disconnect_session::DisconnectSessionUseCase;
pub use dispatch_command::{CLIENT_HELP, CommandDispatcher, KICK_NOTICE, OPERATOR_HELP};
pub use error::ConnectError;
pub use send_message::SendMessageUseCase;
