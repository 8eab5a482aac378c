//! Operator console (the server's control loop).

use std::{io::BufRead, sync::Arc};

use hiroba_shared::time::Clock;
use tokio::sync::mpsc;

use crate::{
    domain::{ChatEvent, Timestamp, is_command},
    usecase::{CommandDispatcher, EventPublisher},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleAction {
    /// Keep reading; print these lines for the operator
    Continue(Vec<String>),
    Quit,
}

/// Turns operator input into broadcasts, commands or a shutdown request.
#[derive(Clone)]
pub struct OperatorConsole {
    command_dispatcher: Arc<CommandDispatcher>,
    publisher: EventPublisher,
    clock: Arc<dyn Clock>,
}

impl OperatorConsole {
    pub fn new(
        command_dispatcher: Arc<CommandDispatcher>,
        publisher: EventPublisher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            command_dispatcher,
            publisher,
            clock,
        }
    }

    pub async fn handle_line(&self, line: &str) -> ConsoleAction {
        let line = line.trim();
        if line.is_empty() {
            return ConsoleAction::Continue(Vec::new());
        }
        if line.eq_ignore_ascii_case("quit") {
            return ConsoleAction::Quit;
        }
        if is_command(line) {
            return ConsoleAction::Continue(
                self.command_dispatcher.dispatch_from_operator(line).await,
            );
        }

        self.publisher.publish(ChatEvent::server(
            line,
            Timestamp::new(self.clock.now_millis()),
        ));
        ConsoleAction::Continue(Vec::new())
    }
}

/// Read stdin lines on a dedicated thread.
///
/// The blocking read cannot be cancelled, so it lives on a plain thread
/// rather than the runtime's blocking pool; the channel closes on EOF.
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to read operator input: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Process operator input until `quit` or end of input.
pub async fn run_console(console: &OperatorConsole, mut input: mpsc::UnboundedReceiver<String>) {
    while let Some(line) = input.recv().await {
        match console.handle_line(&line).await {
            ConsoleAction::Continue(output) => {
                for line in output {
                    println!("{}", line);
                }
            }
            ConsoleAction::Quit => {
                tracing::info!("Operator requested shutdown");
                return;
            }
        }
    }
    tracing::info!("Operator input closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{HistoryBuffer, MessagePusher},
        infrastructure::InMemorySessionRegistry,
        usecase::BroadcastPipeline,
    };
    use hiroba_shared::time::FixedClock;
    use tokio::sync::Mutex;
    use tokio_util::sync::CancellationToken;

    fn console() -> (OperatorConsole, Arc<Mutex<HistoryBuffer>>, EventPublisher, CancellationToken) {
        let registry = Arc::new(InMemorySessionRegistry::new());
        let history = Arc::new(Mutex::new(HistoryBuffer::new(10)));
        let pusher: Arc<dyn MessagePusher> = registry.clone();
        let (pipeline, publisher) = BroadcastPipeline::new(history.clone(), pusher);
        let token = CancellationToken::new();
        tokio::spawn(pipeline.run(token.clone()));
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(1));
        let dispatcher = Arc::new(CommandDispatcher::new(
            registry,
            publisher.clone(),
            clock.clone(),
        ));
        (
            OperatorConsole::new(dispatcher, publisher.clone(), clock),
            history,
            publisher,
            token,
        )
    }

    #[tokio::test]
    async fn test_quit_in_any_case() {
        // テスト項目: quit は大文字小文字を問わずシャットダウン要求になる
        // given (前提条件):
        let (console, _history, _publisher, token) = console();

        // when (操作):
        let lower = console.handle_line("quit").await;
        let upper = console.handle_line("  QUIT ").await;

        // then (期待する結果):
        assert_eq!(lower, ConsoleAction::Quit);
        assert_eq!(upper, ConsoleAction::Quit);
        token.cancel();
    }

    #[tokio::test]
    async fn test_plain_line_is_broadcast_as_server_message() {
        // テスト項目: コマンド以外の行は SERVER メッセージとして配信・記録される
        // given (前提条件):
        let (console, history, publisher, token) = console();

        // when (操作):
        let action = console.handle_line("maintenance at noon").await;
        publisher.flush().await;

        // then (期待する結果):
        assert_eq!(action, ConsoleAction::Continue(Vec::new()));
        let events = history.lock().await.snapshot();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].render(), "SERVER: maintenance at noon");
        token.cancel();
    }

    #[tokio::test]
    async fn test_command_output_is_returned_locally() {
        // テスト項目: コマンドの結果はオペレーターに返され、配信されない
        // given (前提条件):
        let (console, history, publisher, token) = console();

        // when (操作):
        let action = console.handle_line("/kick nobody").await;
        let blank = console.handle_line("   ").await;
        publisher.flush().await;

        // then (期待する結果):
        assert_eq!(
            action,
            ConsoleAction::Continue(vec!["User 'nobody' not found.".to_string()])
        );
        assert_eq!(blank, ConsoleAction::Continue(Vec::new()));
        assert!(history.lock().await.is_empty());
        token.cancel();
    }

    #[tokio::test]
    async fn test_run_console_stops_on_quit() {
        // テスト項目: run_console は quit を受け取ると後続の入力を処理せずに終了する
        // given (前提条件):
        let (console, history, publisher, token) = console();
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send("first".to_string()).unwrap();
        tx.send("quit".to_string()).unwrap();
        tx.send("never processed".to_string()).unwrap();

        // when (操作):
        run_console(&console, rx).await;
        publisher.flush().await;

        // then (期待する結果):
        let events = history.lock().await.snapshot();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].text(), "first");
        token.cancel();
    }
}
