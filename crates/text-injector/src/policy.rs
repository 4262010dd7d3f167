use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What counts as a successful injection.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// The platform acknowledging the set-text action is enough.
    #[default]
    AcknowledgeOnly,
    /// Re-read the tree after an acknowledged method and compare the field text.
    VerifyByReadback,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectionPolicy {
    pub direct_settle_ms: u64,
    pub focus_settle_ms: u64,
    pub clear_settle_ms: u64,
    pub keystroke_ms: u64,
    pub typing_tail_ms: u64,
    pub between_methods_ms: u64,
    pub strictness: Strictness,
}

impl InjectionPolicy {
    pub fn direct_settle(&self) -> Duration {
        Duration::from_millis(self.direct_settle_ms)
    }

    pub fn focus_settle(&self) -> Duration {
        Duration::from_millis(self.focus_settle_ms)
    }

    pub fn clear_settle(&self) -> Duration {
        Duration::from_millis(self.clear_settle_ms)
    }

    pub fn keystroke(&self) -> Duration {
        Duration::from_millis(self.keystroke_ms)
    }

    pub fn typing_tail(&self) -> Duration {
        Duration::from_millis(self.typing_tail_ms)
    }

    pub fn between_methods(&self) -> Duration {
        Duration::from_millis(self.between_methods_ms)
    }

    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }
}

impl Default for InjectionPolicy {
    fn default() -> Self {
        Self {
            direct_settle_ms: 1500,
            focus_settle_ms: 1000,
            clear_settle_ms: 500,
            keystroke_ms: 200,
            typing_tail_ms: 1000,
            between_methods_ms: 1000,
            strictness: Strictness::AcknowledgeOnly,
        }
    }
}
