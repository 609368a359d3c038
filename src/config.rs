//! Session configuration.

use std::time::Duration;

/// Default idle timeout: the backend emits heartbeats well inside this
/// window, so two minutes of silence means the connection is gone.
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for a streaming session.
///
/// # Example
///
/// ```ignore
/// use foundry_client::SessionConfig;
/// use std::time::Duration;
///
/// let config = SessionConfig::default()
///     .with_idle_timeout(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Abort the session when no chunk arrives for this long.
    /// `None` disables the idle timeout.
    pub idle_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
        }
    }
}

impl SessionConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the idle timeout.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Disable the idle timeout entirely.
    pub fn without_idle_timeout(mut self) -> Self {
        self.idle_timeout = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_idle_timeout() {
        let config = SessionConfig::default();
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_builder() {
        let config = SessionConfig::new().with_idle_timeout(Duration::from_secs(5));
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(5)));

        let config = config.without_idle_timeout();
        assert_eq!(config.idle_timeout, None);
    }
}
