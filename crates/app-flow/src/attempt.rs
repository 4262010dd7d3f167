//! Per-app attempt state and its transition function.
//!
//! Stage execution lives in the orchestrator; this module only decides,
//! from the outcome a stage reported, which stage comes next. Keeping the
//! transitions as data makes the state machine testable without a device.

use std::fmt;
use std::time::Duration;

use field_locator::LocatorStrategy;
use ridescan_core_types::AppKey;
use serde::{Deserialize, Serialize};
use text_injector::InjectionMethod;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Launching,
    AdvancingScreens,
    LocatingField,
    InjectingText,
    Triggering,
    Done,
    Failed,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Launching => "launching",
            Stage::AdvancingScreens => "advancing_screens",
            Stage::LocatingField => "locating_field",
            Stage::InjectingText => "injecting_text",
            Stage::Triggering => "triggering",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    NotInstalled,
    LaunchFailed,
    FieldNotFound,
    /// The located field was replaced before text could be entered.
    StaleField,
    TextEntryFailed,
    Platform(String),
    Cancelled,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NotInstalled => f.write_str("not installed"),
            FailureReason::LaunchFailed => f.write_str("launch failed"),
            FailureReason::FieldNotFound => f.write_str("field not found"),
            FailureReason::StaleField => f.write_str("field went stale"),
            FailureReason::TextEntryFailed => f.write_str("text entry failed"),
            FailureReason::Platform(detail) => write!(f, "platform error: {}", detail),
            FailureReason::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// What a stage reports back to the state machine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Success,
    Skipped(FailureReason),
    SoftFailed(FailureReason),
    HardFailed(FailureReason),
}

impl StageOutcome {
    fn reason(&self) -> Option<&FailureReason> {
        match self {
            StageOutcome::Success => None,
            StageOutcome::Skipped(r) | StageOutcome::SoftFailed(r) | StageOutcome::HardFailed(r) => {
                Some(r)
            }
        }
    }
}

/// How many times each stage ran.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounters {
    pub launch: u32,
    pub advance: u32,
    pub locate: u32,
    pub inject: u32,
    pub trigger: u32,
}

impl StageCounters {
    fn bump(&mut self, stage: Stage) {
        match stage {
            Stage::Launching => self.launch += 1,
            Stage::AdvancingScreens => self.advance += 1,
            Stage::LocatingField => self.locate += 1,
            Stage::InjectingText => self.inject += 1,
            Stage::Triggering => self.trigger += 1,
            Stage::Done | Stage::Failed => {}
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub outcome: StageOutcome,
}

#[derive(Clone, Debug)]
pub struct AutomationAttempt {
    app: AppKey,
    stage: Stage,
    counters: StageCounters,
    max_locate_attempts: u32,
    failure: Option<FailureReason>,
    trace: Vec<StageRecord>,
}

impl AutomationAttempt {
    pub fn new(app: AppKey, max_locate_attempts: u32) -> Self {
        Self {
            app,
            stage: Stage::Launching,
            counters: StageCounters::default(),
            max_locate_attempts: max_locate_attempts.max(1),
            failure: None,
            trace: Vec::new(),
        }
    }

    pub fn app(&self) -> &AppKey {
        &self.app
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn counters(&self) -> StageCounters {
        self.counters
    }

    /// Reason of the last failure; set once the attempt is `Failed`.
    pub fn failure(&self) -> Option<&FailureReason> {
        self.failure.as_ref()
    }

    pub fn trace(&self) -> &[StageRecord] {
        &self.trace
    }

    /// Locate attempts still available.
    pub fn locate_budget(&self) -> u32 {
        self.max_locate_attempts.saturating_sub(self.counters.locate)
    }

    /// Records the outcome of the current stage and moves to the next one.
    /// Terminal stages absorb further outcomes unchanged.
    pub fn advance(&mut self, outcome: StageOutcome) -> Stage {
        let current = self.stage;
        if current.is_terminal() {
            return current;
        }
        self.counters.bump(current);
        self.trace.push(StageRecord {
            stage: current,
            outcome: outcome.clone(),
        });

        if outcome.reason() == Some(&FailureReason::Cancelled) {
            return self.fail(FailureReason::Cancelled);
        }

        let next = match (current, outcome) {
            // best effort stages never stop the attempt
            (Stage::AdvancingScreens, _) => Stage::LocatingField,
            (Stage::Triggering, _) => Stage::Done,

            (_, StageOutcome::HardFailed(reason)) => return self.fail(reason),

            (Stage::Launching, StageOutcome::Success) => Stage::AdvancingScreens,
            (Stage::Launching, StageOutcome::Skipped(r) | StageOutcome::SoftFailed(r)) => {
                return self.fail(r)
            }

            (Stage::LocatingField, StageOutcome::Success) => Stage::InjectingText,
            (Stage::LocatingField, _) => return self.retry_locate(),

            (Stage::InjectingText, StageOutcome::Success) => Stage::Triggering,
            (Stage::InjectingText, StageOutcome::SoftFailed(FailureReason::StaleField)) => {
                return self.retry_locate()
            }
            (Stage::InjectingText, StageOutcome::Skipped(r) | StageOutcome::SoftFailed(r)) => {
                return self.fail(r)
            }

            (Stage::Done | Stage::Failed, _) => current,
        };
        self.stage = next;
        next
    }

    fn retry_locate(&mut self) -> Stage {
        if self.locate_budget() > 0 {
            self.stage = Stage::LocatingField;
            self.stage
        } else {
            self.fail(FailureReason::FieldNotFound)
        }
    }

    fn fail(&mut self, reason: FailureReason) -> Stage {
        self.failure = Some(reason);
        self.stage = Stage::Failed;
        self.stage
    }

    pub fn outcome(&self) -> Option<AppOutcome> {
        match self.stage {
            Stage::Done => Some(AppOutcome::Ready),
            Stage::Failed => Some(AppOutcome::from_failure(self.failure.as_ref())),
            _ => None,
        }
    }
}

/// Summary of one app's attempt as shown to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppOutcome {
    /// Destination entered and search triggered
    Ready,
    /// App opened but the destination has to be typed by hand
    ManualEntryNeeded,
    /// App not installed
    Skipped,
    LaunchFailed,
    Errored,
    Cancelled,
}

impl AppOutcome {
    fn from_failure(reason: Option<&FailureReason>) -> Self {
        match reason {
            Some(FailureReason::NotInstalled) => AppOutcome::Skipped,
            Some(FailureReason::LaunchFailed) => AppOutcome::LaunchFailed,
            Some(
                FailureReason::FieldNotFound
                | FailureReason::StaleField
                | FailureReason::TextEntryFailed,
            ) => AppOutcome::ManualEntryNeeded,
            Some(FailureReason::Cancelled) => AppOutcome::Cancelled,
            Some(FailureReason::Platform(_)) | None => AppOutcome::Errored,
        }
    }

    /// The app is open in front of the user.
    pub fn app_opened(&self) -> bool {
        matches!(self, AppOutcome::Ready | AppOutcome::ManualEntryNeeded)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttemptReport {
    pub app: AppKey,
    pub display_name: String,
    pub outcome: AppOutcome,
    pub failure: Option<FailureReason>,
    pub counters: StageCounters,
    pub trace: Vec<StageRecord>,
    pub strategy: Option<LocatorStrategy>,
    pub method: Option<InjectionMethod>,
    pub elapsed: Duration,
}

impl AttemptReport {
    /// Report for an attempt whose task died before producing one.
    pub fn errored(app: AppKey, display_name: String, detail: String) -> Self {
        Self {
            app,
            display_name,
            outcome: AppOutcome::Errored,
            failure: Some(FailureReason::Platform(detail)),
            counters: StageCounters::default(),
            trace: Vec::new(),
            strategy: None,
            method: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Stages in the order they ran.
    pub fn stages(&self) -> Vec<Stage> {
        self.trace.iter().map(|record| record.stage).collect()
    }
}
