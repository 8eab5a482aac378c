//! Shared state handed to every connection handler.

use std::{sync::Arc, time::Duration};

use crate::usecase::{
    CommandDispatcher, ConnectSessionUseCase, DisconnectSessionUseCase, SendMessageUseCase,
};

pub struct AppState {
    pub connect_session_usecase: Arc<ConnectSessionUseCase>,
    pub disconnect_session_usecase: Arc<DisconnectSessionUseCase>,
    pub send_message_usecase: Arc<SendMessageUseCase>,
    pub command_dispatcher: Arc<CommandDispatcher>,
    pub max_line_length: usize,
    /// How long a new connection may take to send its username
    pub username_timeout: Duration,
}
