//! UseCase: ordered broadcast of chat events.
//!
//! Any number of producers (connection handlers, the operator console) hold
//! an [`EventPublisher`]. A single [`BroadcastPipeline`] task drains the queue
//! in FIFO order and, for each event, appends it to the history and fans the
//! rendered line out while holding the history lock. That makes the drain
//! step the system's only total order: an event is in history exactly when
//! it has been handed to every registered session.
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - 複数の publisher から投入されたイベントが投入順に履歴・配信される
//! - ささやき（WHISPER）は履歴に残るが配信されない
//! - 配信失敗があっても後続イベントの処理が継続する
//! - flush が先行イベントの処理完了を待つ

use std::sync::Arc;

use hiroba_shared::time::format_time_of_day;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::domain::{ChatEvent, HistoryBuffer, MessagePusher};

enum PipelineItem {
    Event(ChatEvent),
    /// Acknowledged once every item queued before it has been applied
    Flush(oneshot::Sender<()>),
}

/// Producer side of the broadcast pipeline. Cheap to clone.
#[derive(Clone)]
pub struct EventPublisher {
    tx: mpsc::UnboundedSender<PipelineItem>,
}

impl EventPublisher {
    /// Enqueue an event. Returns `false` if the pipeline has stopped.
    pub fn publish(&self, event: ChatEvent) -> bool {
        match self.tx.send(PipelineItem::Event(event)) {
            Ok(()) => true,
            Err(e) => {
                if let PipelineItem::Event(event) = e.0 {
                    tracing::warn!(
                        "Broadcast pipeline stopped, dropping event: {}",
                        event.render()
                    );
                }
                false
            }
        }
    }

    /// Wait until everything published before this call has been applied.
    ///
    /// Returns immediately if the pipeline has stopped.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(PipelineItem::Flush(done_tx)).is_ok() {
            // A dropped sender means the pipeline stopped mid-queue.
            let _ = done_rx.await;
        }
    }
}

/// Single consumer of the event queue.
pub struct BroadcastPipeline {
    rx: mpsc::UnboundedReceiver<PipelineItem>,
    history: Arc<Mutex<HistoryBuffer>>,
    message_pusher: Arc<dyn MessagePusher>,
    echo_to_console: bool,
}

impl BroadcastPipeline {
    pub fn new(
        history: Arc<Mutex<HistoryBuffer>>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> (Self, EventPublisher) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                rx,
                history,
                message_pusher,
                echo_to_console: false,
            },
            EventPublisher { tx },
        )
    }

    /// Print every applied event on stdout for the server operator.
    pub fn with_console_echo(mut self, enabled: bool) -> Self {
        self.echo_to_console = enabled;
        self
    }

    /// Drain the queue until `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::debug!("Broadcast pipeline started");
        loop {
            tokio::select! {
                biased;
                item = self.rx.recv() => match item {
                    Some(PipelineItem::Event(event)) => self.apply(event).await,
                    Some(PipelineItem::Flush(done)) => {
                        let _ = done.send(());
                    }
                    None => break,
                },
                _ = shutdown.cancelled() => break,
            }
        }
        tracing::debug!("Broadcast pipeline stopped");
    }

    async fn apply(&self, event: ChatEvent) {
        let line = event.render();
        let echo = self.echo_to_console.then(|| console_line(&event));
        let public = event.is_public();

        {
            let mut history = self.history.lock().await;
            history.push(event);

            if public {
                let dropped = self.message_pusher.broadcast(&line).await;
                if !dropped.is_empty() {
                    tracing::info!(
                        "Dropped {} unreachable session(s) during fan-out",
                        dropped.len()
                    );
                }
            }
        }

        // Printed outside the history lock; a slow stdout must not stall joins.
        if let Some(echo) = echo {
            println!("{}", echo);
        }
    }
}

/// `[HH:MM:SS] <rendered line>` as shown on the operator console.
fn console_line(event: &ChatEvent) -> String {
    format!(
        "[{}] {}",
        format_time_of_day(event.timestamp().value()),
        event.render()
    )
}
