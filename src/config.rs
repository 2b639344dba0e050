use chrono::Duration;
use serde::Deserialize;

/// Application configuration, extracted from whatever configuration source
/// the embedding transport layer provides.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    verify_timeout: u32,
}

impl Config {
    pub fn new(verify_timeout: u32) -> Self {
        Self { verify_timeout }
    }

    /// Seconds a single proof verification may run before it is canceled.
    /// A timed-out verification discards its partial result and counts as a
    /// rejection for that attempt; retrying is the caller's decision.
    pub fn verify_timeout(&self) -> Duration {
        Duration::seconds(self.verify_timeout.into())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { verify_timeout: 30 }
    }
}
