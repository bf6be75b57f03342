//! Page behaviour settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UiConfig {
    /// How long an error alert stays visible before it dismisses itself.
    pub alert_timeout_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            alert_timeout_ms: 5_000,
        }
    }
}

impl UiConfig {
    pub fn alert_timeout(&self) -> Duration {
        Duration::from_millis(self.alert_timeout_ms)
    }
}
