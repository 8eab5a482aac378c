//! Server configuration.

use std::time::Duration;

use crate::domain::DEFAULT_HISTORY_CAPACITY;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 12345;
pub const DEFAULT_MAX_LINE_LENGTH: usize = 4096;
const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
const DEFAULT_USERNAME_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to bind to; 0 picks a free port
    pub port: u16,
    /// Number of chat events kept for replay
    pub history_capacity: usize,
    /// Longest accepted line in bytes, excluding the newline
    pub max_line_length: usize,
    /// Print every broadcast event on stdout
    pub echo_events: bool,
    /// How long shutdown waits for connection tasks to finish
    pub shutdown_grace: Duration,
    /// How long a new connection may take to send its username
    pub username_timeout: Duration,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            echo_events: true,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            username_timeout: DEFAULT_USERNAME_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // テスト項目: デフォルト設定が 127.0.0.1:12345、履歴 50 件になる
        // given (前提条件):
        let config = ServerConfig::default();

        // when (操作):
        let addr = config.bind_addr();

        // then (期待する結果):
        assert_eq!(addr, "127.0.0.1:12345");
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.max_line_length, 4096);
        assert_eq!(config.username_timeout, Duration::from_secs(60));
    }
}
