//! Automation flow layer
//!
//! Drives one ride app at a time from launch to a submitted destination
//! search, and runs that flow across the configured apps in a fixed order.
//!
//! - [`ScreenAdvancer`] dismisses interstitial prompts after launch
//! - [`Orchestrator`] is the per-app state machine
//! - [`FleetCoordinator`] sequences the apps and streams [`FleetEvent`]s

pub mod advancer;
pub mod attempt;
pub mod catalog;
pub mod deeplink;
pub mod errors;
pub mod events;
pub mod fleet;
pub mod orchestrator;
pub mod policy;

mod wait;

pub use advancer::{find_labelled_button, ScreenAdvancer};
pub use attempt::{
    AppOutcome, AttemptReport, AutomationAttempt, FailureReason, Stage, StageCounters,
    StageOutcome, StageRecord,
};
pub use catalog::{AppCatalog, TargetApp};
pub use deeplink::deep_link;
pub use errors::FlowError;
pub use events::{FleetEvent, ProgressEvent, ProgressLevel, ProgressSink, ProgressStage};
pub use fleet::{FleetCoordinator, FleetHandle, FleetRequest, FleetSummary};
pub use orchestrator::{AppRequest, Orchestrator};
pub use policy::AutomationPolicy;
