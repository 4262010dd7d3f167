use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Execution context handed to the injector by the orchestrator.
#[derive(Clone, Debug)]
pub struct InjectCtx {
    /// Display name of the app being automated, used for log fields only.
    pub app: String,
    pub cancel: CancellationToken,
}

impl InjectCtx {
    pub fn new(app: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            app: app.into(),
            cancel,
        }
    }
}

/// Field-population methods, declared from least to most invasive.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionMethod {
    DirectSet,
    ClickThenSet,
    FocusClearThenSet,
    SimulatedTyping,
}

impl InjectionMethod {
    pub fn chain() -> [InjectionMethod; 4] {
        [
            InjectionMethod::DirectSet,
            InjectionMethod::ClickThenSet,
            InjectionMethod::FocusClearThenSet,
            InjectionMethod::SimulatedTyping,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            InjectionMethod::DirectSet => "direct-set",
            InjectionMethod::ClickThenSet => "click-then-set",
            InjectionMethod::FocusClearThenSet => "focus-clear-then-set",
            InjectionMethod::SimulatedTyping => "simulated-typing",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InjectionReport {
    pub success: bool,
    /// Method that succeeded, if any.
    pub method: Option<InjectionMethod>,
    /// Methods started, in order.
    pub attempted: Vec<InjectionMethod>,
    /// The field went stale; the caller has to locate it again.
    pub stale: bool,
    pub elapsed: Duration,
}

impl InjectionReport {
    pub fn succeeded(&self) -> bool {
        self.success && !self.stale
    }
}
