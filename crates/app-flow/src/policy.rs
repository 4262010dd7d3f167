use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed settle intervals and retry bounds of the automation flow.
///
/// Every wait is a constant; nothing backs off exponentially and no stage
/// retries without a bound.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationPolicy {
    /// Wait after starting the app before touching its UI.
    pub launch_settle_ms: u64,
    pub advancer_rounds: u32,
    pub advancer_settle_ms: u64,
    /// Wait after dismissing an interstitial.
    pub advancer_click_settle_ms: u64,
    /// Extra wait before the first locate attempt.
    pub locate_warmup_ms: u64,
    pub locate_attempts: u32,
    pub locate_retry_ms: u64,
    /// Wait when the platform has no tree to offer yet.
    pub tree_unavailable_ms: u64,
    pub trigger_warmup_ms: u64,
    pub trigger_settle_ms: u64,
    /// Pause between two apps of a fleet run.
    pub inter_app_delay_ms: u64,
    /// Pause between the final progress message and the completion signal.
    pub completion_delay_ms: u64,
}

impl AutomationPolicy {
    pub fn launch_settle(&self) -> Duration {
        Duration::from_millis(self.launch_settle_ms)
    }

    pub fn advancer_settle(&self) -> Duration {
        Duration::from_millis(self.advancer_settle_ms)
    }

    pub fn advancer_click_settle(&self) -> Duration {
        Duration::from_millis(self.advancer_click_settle_ms)
    }

    pub fn locate_warmup(&self) -> Duration {
        Duration::from_millis(self.locate_warmup_ms)
    }

    pub fn locate_retry(&self) -> Duration {
        Duration::from_millis(self.locate_retry_ms)
    }

    pub fn tree_unavailable(&self) -> Duration {
        Duration::from_millis(self.tree_unavailable_ms)
    }

    pub fn trigger_warmup(&self) -> Duration {
        Duration::from_millis(self.trigger_warmup_ms)
    }

    pub fn trigger_settle(&self) -> Duration {
        Duration::from_millis(self.trigger_settle_ms)
    }

    pub fn inter_app_delay(&self) -> Duration {
        Duration::from_millis(self.inter_app_delay_ms)
    }

    pub fn completion_delay(&self) -> Duration {
        Duration::from_millis(self.completion_delay_ms)
    }
}

impl Default for AutomationPolicy {
    fn default() -> Self {
        Self {
            launch_settle_ms: 5000,
            advancer_rounds: 3,
            advancer_settle_ms: 1500,
            advancer_click_settle_ms: 2000,
            locate_warmup_ms: 2000,
            locate_attempts: 8,
            locate_retry_ms: 2500,
            tree_unavailable_ms: 2000,
            trigger_warmup_ms: 1000,
            trigger_settle_ms: 1000,
            inter_app_delay_ms: 4000,
            completion_delay_ms: 0,
        }
    }
}
