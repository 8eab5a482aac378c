//! Per-connection handler.
//!
//! Each accepted socket runs through
//! `AWAITING_USERNAME -> ACTIVE -> CLOSING -> CLOSED` inside one task. The
//! task owns the socket for its whole life and closes it exactly once, on
//! whichever path ends the session.

use std::{net::SocketAddr, sync::Arc};

use futures_util::{SinkExt, StreamExt};
use hiroba_shared::time::timestamp_to_rfc3339;
use tokio::{net::TcpStream, sync::watch, time::timeout};
use tokio_util::{
    codec::{Framed, LinesCodec},
    sync::CancellationToken,
};

use crate::{
    domain::{CloseReason, Session, is_command},
    infrastructure::{SessionChannels, SessionHandle},
};

use super::state::AppState;

type Lines = Framed<TcpStream, LinesCodec>;

pub async fn handle_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    state: Arc<AppState>,
    shutdown: CancellationToken,
) {
    let mut lines = Framed::new(
        stream,
        LinesCodec::new_with_max_length(state.max_line_length),
    );

    // AWAITING_USERNAME
    let raw_username = tokio::select! {
        _ = shutdown.cancelled() => return,
        frame = timeout(state.username_timeout, lines.next()) => match frame {
            Ok(Some(Ok(line))) => line,
            Ok(Some(Err(e))) => {
                tracing::debug!("{} failed before sending a username: {}", remote_addr, e);
                return;
            }
            Ok(None) => {
                tracing::debug!("{} closed before sending a username", remote_addr);
                return;
            }
            Err(_) => {
                tracing::info!(
                    "{} sent no username within {:?}, closing",
                    remote_addr,
                    state.username_timeout
                );
                close(&mut lines, remote_addr).await;
                return;
            }
        },
    };

    let (handle, channels) = SessionHandle::channel();
    let joined = match state
        .connect_session_usecase
        .execute(&raw_username, remote_addr, handle)
        .await
    {
        Ok(joined) => joined,
        Err(e) => {
            tracing::warn!("Rejecting {}: {}", remote_addr, e);
            if let Err(e) = lines.send(format!("ERROR: {}", e)).await {
                tracing::debug!("Failed to send rejection to {}: {}", remote_addr, e);
            }
            close(&mut lines, remote_addr).await;
            return;
        }
    };
    let session = joined.session;
    tracing::info!(
        "'{}' joined from {} at {}",
        session.username,
        remote_addr,
        timestamp_to_rfc3339(session.joined_at.value())
    );

    // History goes straight to the socket; it is not re-broadcast.
    let reason = match replay_history(&mut lines, joined.replay).await {
        Ok(()) => run_active(&mut lines, &session, channels, &state, &shutdown).await,
        Err(e) => {
            tracing::debug!("History replay to '{}' failed: {}", session.username, e);
            None
        }
    };

    // CLOSING
    match reason {
        Some(reason) => tracing::info!("'{}' closed ({:?})", session.username, reason),
        None => tracing::info!("'{}' disconnected", session.username),
    }
    state
        .disconnect_session_usecase
        .execute(&session, reason)
        .await;
    close(&mut lines, remote_addr).await;
}

async fn replay_history(
    lines: &mut Lines,
    replay: Vec<String>,
) -> Result<(), tokio_util::codec::LinesCodecError> {
    for line in replay {
        lines.feed(line).await?;
    }
    SinkExt::<String>::flush(lines).await
}

/// ACTIVE state. Returns the close reason if the session was closed from
/// outside, `None` if the peer went away or the socket failed.
async fn run_active(
    lines: &mut Lines,
    session: &Session,
    mut channels: SessionChannels,
    state: &AppState,
    shutdown: &CancellationToken,
) -> Option<CloseReason> {
    loop {
        tokio::select! {
            frame = lines.next() => match frame {
                Some(Ok(line)) => handle_line(state, session, &line).await,
                Some(Err(e)) => {
                    tracing::debug!("Read from '{}' failed: {}", session.username, e);
                    return None;
                }
                None => return None,
            },
            Some(outbound) = channels.outbound.recv() => {
                if let Err(e) = lines.send(outbound).await {
                    tracing::debug!("Write to '{}' failed: {}", session.username, e);
                    return None;
                }
            }
            reason = wait_for_close(&mut channels.close) => {
                drain_outbound(lines, &mut channels).await;
                return Some(reason);
            }
            _ = shutdown.cancelled() => {
                drain_outbound(lines, &mut channels).await;
                return Some(CloseReason::Shutdown);
            }
        }
    }
}

async fn handle_line(state: &AppState, session: &Session, line: &str) {
    let text = line.trim();
    if text.is_empty() {
        return;
    }
    if is_command(text) {
        state
            .command_dispatcher
            .dispatch_from_client(session, text)
            .await;
    } else {
        state.send_message_usecase.execute(session, text);
    }
}

async fn wait_for_close(close: &mut watch::Receiver<Option<CloseReason>>) -> CloseReason {
    // Copy the reason out so the borrowed value is gone before any await.
    let reason = match close.wait_for(Option::is_some).await {
        Ok(reason) => Some((*reason).unwrap_or(CloseReason::Shutdown)),
        Err(_) => None,
    };
    match reason {
        Some(reason) => reason,
        // Handle dropped without a reason; other branches end the session.
        None => std::future::pending().await,
    }
}

/// Write out whatever was queued for the session before it was closed.
async fn drain_outbound(lines: &mut Lines, channels: &mut SessionChannels) {
    while let Ok(line) = channels.outbound.try_recv() {
        if lines.feed(line).await.is_err() {
            return;
        }
    }
    if let Err(e) = SinkExt::<String>::flush(lines).await {
        tracing::debug!("Final flush failed: {}", e);
    }
}

async fn close(lines: &mut Lines, remote_addr: SocketAddr) {
    if let Err(e) = SinkExt::<String>::close(lines).await {
        tracing::debug!("Closing {} failed: {}", remote_addr, e);
    }
}
