//! Connection acceptor.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::{connection::handle_connection, state::AppState};

/// Accept connections until `shutdown` is cancelled.
///
/// Every connection gets its own task; the loop never waits for one. The
/// listener is dropped when this returns, so later connects are refused.
pub async fn accept_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, remote_addr)) => {
                    tracing::info!("New connection from {}", remote_addr);
                    tracker.spawn(handle_connection(
                        stream,
                        remote_addr,
                        state.clone(),
                        shutdown.clone(),
                    ));
                }
                Err(e) => {
                    if !shutdown.is_cancelled() {
                        tracing::error!("Listener error, no longer accepting connections: {}", e);
                    }
                    break;
                }
            },
        }
    }
    tracing::debug!("Acceptor stopped");
}
