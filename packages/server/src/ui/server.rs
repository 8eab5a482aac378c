//! Server execution logic.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use hiroba_shared::{
    signal::shutdown_signal,
    time::{Clock, SystemClock},
};
use tokio::{net::TcpListener, sync::Mutex, task::JoinHandle};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::{
    domain::{ChatEvent, CloseReason, HistoryBuffer, MessagePusher, Timestamp},
    infrastructure::InMemorySessionRegistry,
    usecase::{
        BroadcastPipeline, CommandDispatcher, ConnectSessionUseCase, DisconnectSessionUseCase,
        EventPublisher, SendMessageUseCase,
    },
};

use super::{
    acceptor::accept_loop,
    config::ServerConfig,
    console::{OperatorConsole, run_console, spawn_stdin_reader},
    error::ServerError,
    state::AppState,
};

/// TCP chat server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(ServerConfig::default()).start().await?;
/// println!("listening on {}", server.local_addr());
/// server.run_until_stopped().await;
/// ```
pub struct Server {
    config: ServerConfig,
    clock: Arc<dyn Clock>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used to timestamp sessions and events.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Bind the listener and start the acceptor and the broadcast pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound, e.g.
    /// because the port is already in use. Nothing is spawned in that case.
    pub async fn start(self) -> Result<RunningServer, ServerError> {
        let bind_addr = self.config.bind_addr();
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: bind_addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        // Wiring order: registry/history, pipeline, use cases, state
        let registry = Arc::new(InMemorySessionRegistry::new());
        let history = Arc::new(Mutex::new(HistoryBuffer::new(
            self.config.history_capacity,
        )));

        let message_pusher: Arc<dyn MessagePusher> = registry.clone();
        let (pipeline, publisher) = BroadcastPipeline::new(history.clone(), message_pusher);
        let pipeline = pipeline.with_console_echo(self.config.echo_events);

        let connect_session_usecase = Arc::new(ConnectSessionUseCase::new(
            registry.clone(),
            history.clone(),
            publisher.clone(),
            self.clock.clone(),
        ));
        let disconnect_session_usecase = Arc::new(DisconnectSessionUseCase::new(
            registry.clone(),
            publisher.clone(),
            self.clock.clone(),
        ));
        let send_message_usecase = Arc::new(SendMessageUseCase::new(
            publisher.clone(),
            self.clock.clone(),
        ));
        let command_dispatcher = Arc::new(CommandDispatcher::new(
            registry.clone(),
            publisher.clone(),
            self.clock.clone(),
        ));

        let app_state = Arc::new(AppState {
            connect_session_usecase,
            disconnect_session_usecase,
            send_message_usecase,
            command_dispatcher: command_dispatcher.clone(),
            max_line_length: self.config.max_line_length,
            username_timeout: self.config.username_timeout,
        });
        let console = OperatorConsole::new(command_dispatcher, publisher.clone(), self.clock.clone());

        let shutdown = CancellationToken::new();
        let tracker = TaskTracker::new();
        let pipeline_task = tokio::spawn(pipeline.run(shutdown.clone()));
        let acceptor_task = tokio::spawn(accept_loop(
            listener,
            app_state,
            shutdown.clone(),
            tracker.clone(),
        ));

        tracing::info!(
            "Chat server listening on {} (history capacity {})",
            local_addr,
            history.lock().await.capacity()
        );

        Ok(RunningServer {
            local_addr,
            registry,
            history,
            publisher,
            console,
            clock: self.clock,
            shutdown,
            tracker,
            pipeline_task,
            acceptor_task,
            shutdown_grace: self.config.shutdown_grace,
        })
    }
}

/// Handle to a started server. Shutting down consumes it.
pub struct RunningServer {
    local_addr: SocketAddr,
    registry: Arc<InMemorySessionRegistry>,
    history: Arc<Mutex<HistoryBuffer>>,
    publisher: EventPublisher,
    console: OperatorConsole,
    clock: Arc<dyn Clock>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
    pipeline_task: JoinHandle<()>,
    acceptor_task: JoinHandle<()>,
    shutdown_grace: Duration,
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The operator console bound to this server.
    pub fn console(&self) -> &OperatorConsole {
        &self.console
    }

    /// Usernames currently registered, in join order.
    pub async fn connected_usernames(&self) -> Vec<String> {
        self.registry.usernames().await
    }

    /// Copy of the chat history, oldest first.
    pub async fn history(&self) -> Vec<ChatEvent> {
        self.history.lock().await.snapshot()
    }

    /// Wait until every event published so far has been applied.
    pub async fn flush(&self) {
        self.publisher.flush().await;
    }

    /// Drive the operator console from stdin until `quit`, end of input or
    /// a termination signal, then shut down.
    pub async fn run_until_stopped(self) {
        let input = spawn_stdin_reader();
        tokio::select! {
            _ = run_console(&self.console, input) => {}
            _ = shutdown_signal() => {
                println!("\nReceived shutdown signal. Closing server...");
            }
        }
        self.shutdown().await;
    }

    /// Graceful shutdown: notify everyone, close every session, stop
    /// accepting, and wait for connection tasks to finish.
    pub async fn shutdown(self) {
        tracing::info!("Shutting down");

        self.publisher.publish(ChatEvent::shutting_down(Timestamp::new(
            self.clock.now_millis(),
        )));
        self.publisher.flush().await;

        let closed = self.registry.close_all(CloseReason::Shutdown).await;
        tracing::debug!("Closed {} session(s)", closed);

        self.shutdown.cancel();
        if let Err(e) = self.acceptor_task.await {
            tracing::warn!("Acceptor task failed: {}", e);
        }
        if let Err(e) = self.pipeline_task.await {
            tracing::warn!("Pipeline task failed: {}", e);
        }

        self.tracker.close();
        if tokio::time::timeout(self.shutdown_grace, self.tracker.wait())
            .await
            .is_err()
        {
            tracing::warn!(
                "Connections still open after {:?}, exiting anyway",
                self.shutdown_grace
            );
        }

        tracing::info!("Server shutdown complete");
    }
}
