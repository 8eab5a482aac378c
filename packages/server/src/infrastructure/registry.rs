//! In-memory session registry.
//!
//! Single source of truth for "who is online". Every operation takes the
//! lock once and hands back owned copies, so callers never iterate the live
//! map. The registry also implements [`MessagePusher`]: each entry carries
//! the sending half of its session's outbound channel.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc, watch};

use crate::domain::{CloseReason, MessagePushError, MessagePusher, Session, SessionId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Username '{0}' is already taken")]
    DuplicateUsername(String),
}

/// Control side of one live connection, held by the registry.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    outbound: mpsc::UnboundedSender<String>,
    close: watch::Sender<Option<CloseReason>>,
}

/// Connection side of a [`SessionHandle`], owned by the connection handler.
#[derive(Debug)]
pub struct SessionChannels {
    /// Lines queued for this session, in the order they were pushed
    pub outbound: mpsc::UnboundedReceiver<String>,
    /// Set once when the session is closed from outside
    pub close: watch::Receiver<Option<CloseReason>>,
}

impl SessionHandle {
    pub fn channel() -> (Self, SessionChannels) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (close_tx, close_rx) = watch::channel(None);
        (
            Self {
                outbound: outbound_tx,
                close: close_tx,
            },
            SessionChannels {
                outbound: outbound_rx,
                close: close_rx,
            },
        )
    }

    pub fn send(&self, line: &str) -> Result<(), MessagePushError> {
        self.outbound
            .send(line.to_string())
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))
    }

    /// Request the session to close. Only the first reason sticks.
    ///
    /// Returns `true` if this call was the one that closed it.
    pub fn close(&self, reason: CloseReason) -> bool {
        self.close.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        })
    }
}

struct RegisteredSession {
    session: Session,
    handle: SessionHandle,
    /// Registration order, used for stable listings
    seq: u64,
}

#[derive(Default)]
struct RegistryInner {
    sessions: HashMap<SessionId, RegisteredSession>,
    next_seq: u64,
}

impl RegistryInner {
    fn ordered(&self) -> Vec<&RegisteredSession> {
        let mut entries: Vec<&RegisteredSession> = self.sessions.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries
    }

    fn find_id(&self, username: &str) -> Option<SessionId> {
        self.sessions
            .values()
            .find(|entry| entry.session.username.as_str() == username)
            .map(|entry| entry.session.id)
    }
}

/// Registry of live sessions keyed by connection identity.
#[derive(Default)]
pub struct InMemorySessionRegistry {
    inner: Mutex<RegistryInner>,
}

impl InMemorySessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session. Usernames must be unique among live sessions.
    pub async fn register(
        &self,
        session: Session,
        handle: SessionHandle,
    ) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock().await;
        if inner.find_id(session.username.as_str()).is_some() {
            return Err(RegistryError::DuplicateUsername(
                session.username.as_str().to_string(),
            ));
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        tracing::debug!(
            "Session '{}' registered as '{}' from {}",
            session.id,
            session.username,
            session.remote_addr
        );
        inner.sessions.insert(
            session.id,
            RegisteredSession {
                session,
                handle,
                seq,
            },
        );
        Ok(())
    }

    /// Remove a session. Removing an absent session is a no-op.
    pub async fn remove(&self, session_id: &SessionId) -> Option<Session> {
        let mut inner = self.inner.lock().await;
        let removed = inner.sessions.remove(session_id).map(|entry| entry.session);
        if let Some(session) = &removed {
            tracing::debug!("Session '{}' ({}) unregistered", session.id, session.username);
        }
        removed
    }

    pub async fn find_by_username(&self, username: &str) -> Option<Session> {
        let inner = self.inner.lock().await;
        let id = inner.find_id(username)?;
        inner.sessions.get(&id).map(|entry| entry.session.clone())
    }

    /// Usernames in registration order.
    pub async fn usernames(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner
            .ordered()
            .into_iter()
            .map(|entry| entry.session.username.as_str().to_string())
            .collect()
    }

    /// Sessions in registration order.
    pub async fn sessions(&self) -> Vec<Session> {
        let inner = self.inner.lock().await;
        inner
            .ordered()
            .into_iter()
            .map(|entry| entry.session.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remove the session registered as `username`, queue `notice` for it and
    /// close it with [`CloseReason::Kicked`].
    pub async fn kick(&self, username: &str, notice: &str) -> Option<Session> {
        let mut inner = self.inner.lock().await;
        let id = inner.find_id(username)?;
        let entry = inner.sessions.remove(&id)?;
        if let Err(e) = entry.handle.send(notice) {
            tracing::debug!("Kick notice for '{}' not delivered: {}", username, e);
        }
        entry.handle.close(CloseReason::Kicked);
        Some(entry.session)
    }

    /// Remove and close every session. Returns how many were closed.
    pub async fn close_all(&self, reason: CloseReason) -> usize {
        let mut inner = self.inner.lock().await;
        let count = inner.sessions.len();
        for (_, entry) in inner.sessions.drain() {
            entry.handle.close(reason);
        }
        count
    }
}

#[async_trait]
impl MessagePusher for InMemorySessionRegistry {
    async fn push_to(&self, session_id: &SessionId, line: &str) -> Result<(), MessagePushError> {
        let inner = self.inner.lock().await;
        let entry = inner
            .sessions
            .get(session_id)
            .ok_or_else(|| MessagePushError::SessionNotFound(session_id.to_string()))?;
        entry.handle.send(line)
    }

    async fn broadcast(&self, line: &str) -> Vec<SessionId> {
        let mut inner = self.inner.lock().await;

        let failed: Vec<SessionId> = inner
            .sessions
            .iter()
            .filter_map(|(id, entry)| match entry.handle.send(line) {
                Ok(()) => None,
                Err(e) => {
                    tracing::warn!(
                        "Failed to push to '{}', dropping session: {}",
                        entry.session.username,
                        e
                    );
                    Some(*id)
                }
            })
            .collect();

        for id in &failed {
            if let Some(entry) = inner.sessions.remove(id) {
                entry.handle.close(CloseReason::Unreachable);
            }
        }

        failed
    }
}
