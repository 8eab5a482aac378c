//! UseCase: session registration
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectSessionUseCase::execute() メソッド
//! - ユーザー名の検証、重複拒否、履歴スナップショットの取得、join 通知の投入
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規セッションの登録と履歴の再送内容
//! - 異常系：不正なユーザー名、重複したユーザー名

use std::{net::SocketAddr, sync::Arc};

use hiroba_shared::time::Clock;
use tokio::sync::Mutex;

use crate::{
    domain::{ChatEvent, HistoryBuffer, Session, Timestamp, Username},
    infrastructure::{InMemorySessionRegistry, SessionHandle},
};

use super::{broadcast_pipeline::EventPublisher, error::ConnectError};

/// Outcome of a successful join.
#[derive(Debug)]
pub struct JoinedSession {
    pub session: Session,
    /// History lines to send to the new session before any live traffic
    pub replay: Vec<String>,
}

pub struct ConnectSessionUseCase {
    registry: Arc<InMemorySessionRegistry>,
    history: Arc<Mutex<HistoryBuffer>>,
    publisher: EventPublisher,
    clock: Arc<dyn Clock>,
}

impl ConnectSessionUseCase {
    pub fn new(
        registry: Arc<InMemorySessionRegistry>,
        history: Arc<Mutex<HistoryBuffer>>,
        publisher: EventPublisher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            history,
            publisher,
            clock,
        }
    }

    /// Register a session for the given username line.
    ///
    /// Registration and the history snapshot happen under the history lock,
    /// the same lock the pipeline holds while recording and fanning out. Every
    /// event is therefore either in the replay or delivered live, never both.
    pub async fn execute(
        &self,
        raw_username: &str,
        remote_addr: SocketAddr,
        handle: SessionHandle,
    ) -> Result<JoinedSession, ConnectError> {
        let username = Username::new(raw_username)?;
        let joined_at = Timestamp::new(self.clock.now_millis());
        let session = Session::new(username, remote_addr, joined_at);

        let replay = {
            let history = self.history.lock().await;
            self.registry.register(session.clone(), handle).await?;
            history.replay_lines()
        };

        self.publisher
            .publish(ChatEvent::joined(&session.username, joined_at));

        Ok(JoinedSession { session, replay })
    }
}
