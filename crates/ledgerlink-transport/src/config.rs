use std::time::Duration;

/// Default time allowed to establish a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default time allowed to write a single frame to the peer.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);
/// Default time allowed between frames (including pong acknowledgements).
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Deadlines and keepalive cadence for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// Bound on dial plus handshake.
    pub connect_timeout: Duration,
    /// Deadline applied to each send.
    pub write_timeout: Duration,
    /// Read deadline, refreshed on every received frame and pong.
    pub read_timeout: Duration,
    /// Keepalive ping cadence. `None` derives it from `read_timeout`.
    pub ping_interval: Option<Duration>,
}

impl TransportConfig {
    /// Effective keepalive cadence.
    ///
    /// Must stay below `read_timeout` so a silent peer is noticed before the
    /// read deadline expires; the default is 9/10 of the read window.
    pub fn ping_interval(&self) -> Duration {
        self.ping_interval.unwrap_or(self.read_timeout * 9 / 10)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            ping_interval: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ping_interval_is_nine_tenths_of_read_window() {
        let config = TransportConfig::default();
        assert_eq!(config.ping_interval(), Duration::from_secs(54));
    }

    #[test]
    fn explicit_ping_interval_wins() {
        let config = TransportConfig {
            ping_interval: Some(Duration::from_millis(250)),
            ..TransportConfig::default()
        };
        assert_eq!(config.ping_interval(), Duration::from_millis(250));
    }

    #[test]
    fn derived_interval_tracks_read_timeout() {
        let config = TransportConfig {
            read_timeout: Duration::from_secs(10),
            ..TransportConfig::default()
        };
        assert_eq!(config.ping_interval(), Duration::from_secs(9));
        assert!(config.ping_interval() < config.read_timeout);
    }
}
