//! Per-connection timing.

use std::time::Duration;

use parlor_transport::DEFAULT_HANDSHAKE_TIMEOUT;

/// Liveness and idle settings applied to every accepted connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// How often the server pings the client.
    pub ping_interval: Duration,

    /// How long a single ping or outbound message may take to write before
    /// the connection is considered dead.
    pub ping_timeout: Duration,

    /// How long the read loop waits for any inbound frame, control frames
    /// included, before giving up on the client.
    pub idle_timeout: Duration,

    /// Upper bound on the WebSocket upgrade.
    pub handshake_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            ping_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(60),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_config_default() {
        let config = ConnectionConfig::default();
        assert_eq!(config.ping_interval, Duration::from_secs(30));
        assert_eq!(config.ping_timeout, Duration::from_secs(10));
        assert_eq!(config.idle_timeout, Duration::from_secs(60));
        assert_eq!(config.handshake_timeout, Duration::from_secs(10));
        assert!(config.ping_interval < config.idle_timeout);
    }
}
