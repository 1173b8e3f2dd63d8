use std::time::Duration;

/// Tunables for the connection pipeline. Defaults reflect how much each
/// tier's native success signal can be trusted: the modern tier has already
/// seen an availability callback when polling starts, the legacy tier has
/// nothing but the poller.
#[derive(Debug, Clone)]
pub struct Config {
    /// Confirmation samples after a modern-tier availability signal.
    pub modern_poll_attempts: u32,
    /// Confirmation samples after the legacy register/enable/reconnect run.
    pub legacy_poll_attempts: u32,
    /// Spacing between confirmation samples.
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            modern_poll_attempts: 3,
            legacy_poll_attempts: 10,
            poll_interval: Duration::from_millis(1000),
        }
    }
}

impl Config {
    pub fn with_poll_interval_ms(mut self, millis: u64) -> Self {
        self.poll_interval = Duration::from_millis(millis);
        self
    }
}
