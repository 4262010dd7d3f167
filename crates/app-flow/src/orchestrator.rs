//! Per-app automation: launch, advance, locate, inject, trigger.

use std::sync::Arc;

use field_locator::{FieldCandidate, FieldLocator, LocatorError, LocatorStrategy};
use ridescan_core_types::{KeywordTables, Place};
use text_injector::{
    InjectCtx, InjectError, InjectionMethod, InjectionPolicy, TextInjector, TextInjectorBuilder,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use ui_platform::{AccessibilityPort, AppLifecyclePort, LaunchFlags, NodeAction};

use crate::advancer::{find_labelled_button, ScreenAdvancer};
use crate::attempt::{
    AppOutcome, AttemptReport, AutomationAttempt, FailureReason, Stage, StageOutcome,
};
use crate::catalog::TargetApp;
use crate::deeplink::deep_link;
use crate::errors::FlowError;
use crate::events::{ProgressLevel, ProgressSink, ProgressStage};
use crate::policy::AutomationPolicy;
use crate::wait::settle;

/// Route handed to every app of a fleet run.
#[derive(Clone, Debug, PartialEq)]
pub struct AppRequest {
    pub destination: String,
    pub pickup: Place,
    pub dropoff: Place,
}

/// Scratch state carried between stages of one attempt.
#[derive(Default)]
struct RunState {
    field: Option<FieldCandidate>,
    strategy: Option<LocatorStrategy>,
    method: Option<InjectionMethod>,
}

pub struct Orchestrator {
    accessibility: Arc<dyn AccessibilityPort>,
    lifecycle: Arc<dyn AppLifecyclePort>,
    locator: FieldLocator,
    injector: Arc<dyn TextInjector>,
    advancer: ScreenAdvancer,
    tables: Arc<KeywordTables>,
    policy: AutomationPolicy,
}

impl Orchestrator {
    pub fn new(
        accessibility: Arc<dyn AccessibilityPort>,
        lifecycle: Arc<dyn AppLifecyclePort>,
        tables: Arc<KeywordTables>,
        policy: AutomationPolicy,
        injection: InjectionPolicy,
    ) -> Result<Self, FlowError> {
        let injector = TextInjectorBuilder::new(injection)
            .with_accessibility(accessibility.clone())
            .build()?;
        let advancer = ScreenAdvancer::new(
            accessibility.clone(),
            tables.interstitial_labels.clone(),
            policy.clone(),
        );
        Ok(Self {
            accessibility,
            lifecycle,
            locator: FieldLocator::new(tables.clone()),
            injector,
            advancer,
            tables,
            policy,
        })
    }

    pub fn policy(&self) -> &AutomationPolicy {
        &self.policy
    }

    /// Drives one app to a terminal stage. Never fails: platform faults and
    /// cancellation end up in the report.
    #[instrument(skip_all, fields(app = %app.key))]
    pub async fn run(
        &self,
        app: &TargetApp,
        request: &AppRequest,
        cancel: &CancellationToken,
        sink: &ProgressSink,
    ) -> AttemptReport {
        let started = Instant::now();
        let mut attempt = AutomationAttempt::new(app.key.clone(), self.policy.locate_attempts);
        let mut state = RunState::default();

        while !attempt.stage().is_terminal() {
            let stage = attempt.stage();
            let result = if cancel.is_cancelled() {
                Err(FlowError::Cancelled)
            } else {
                match stage {
                    Stage::Launching => self.launch(app, request, cancel, sink).await,
                    Stage::AdvancingScreens => self.advance_screens(app, cancel, sink).await,
                    Stage::LocatingField => {
                        self.locate(app, &attempt, &mut state, cancel, sink).await
                    }
                    Stage::InjectingText => {
                        self.inject(app, request, &mut state, cancel).await
                    }
                    Stage::Triggering => self.trigger(cancel).await,
                    Stage::Done | Stage::Failed => break,
                }
            };
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(err) if err.is_cancelled() => {
                    StageOutcome::HardFailed(FailureReason::Cancelled)
                }
                Err(err) => {
                    error!(stage = %stage, error = %err, "{} processing failed", app.display_name);
                    StageOutcome::HardFailed(FailureReason::Platform(err.to_string()))
                }
            };
            let next = attempt.advance(outcome);
            debug!(from = %stage, to = %next, "Stage transition");
        }

        let outcome = attempt.outcome().unwrap_or(AppOutcome::Errored);
        info!(outcome = ?outcome, failure = ?attempt.failure(), "Attempt finished");
        AttemptReport {
            app: app.key.clone(),
            display_name: app.display_name.clone(),
            outcome,
            failure: attempt.failure().cloned(),
            counters: attempt.counters(),
            trace: attempt.trace().to_vec(),
            strategy: state.strategy,
            method: state.method,
            elapsed: started.elapsed(),
        }
    }

    async fn launch(
        &self,
        app: &TargetApp,
        request: &AppRequest,
        cancel: &CancellationToken,
        sink: &ProgressSink,
    ) -> Result<StageOutcome, FlowError> {
        if !self.lifecycle.is_installed(&app.package).await? {
            info!(package = %app.package, "App not installed");
            return Ok(StageOutcome::Skipped(FailureReason::NotInstalled));
        }

        sink.emit(
            Some(&app.key),
            ProgressStage::App(Stage::Launching),
            ProgressLevel::Info,
            format!("Opening {}...", app.display_name),
        );

        let Some(intent) = self.lifecycle.launch_intent(&app.package).await? else {
            warn!(package = %app.package, "No launch intent");
            return Ok(StageOutcome::HardFailed(FailureReason::LaunchFailed));
        };
        let mut intent = intent.with_flags(LaunchFlags::NEW_TASK | LaunchFlags::CLEAR_TASK);
        if app.coordinate_link {
            intent = intent
                .with_extra("pickup_lat", format!("{:.6}", request.pickup.lat()))
                .with_extra("pickup_lng", format!("{:.6}", request.pickup.lng()))
                .with_extra("drop_lat", format!("{:.6}", request.dropoff.lat()))
                .with_extra("drop_lng", format!("{:.6}", request.dropoff.lng()))
                .with_extra("pickup_name", request.pickup.name.clone())
                .with_extra("drop_name", request.dropoff.name.clone());
            if let Some(link) = deep_link(app, &request.pickup, &request.dropoff) {
                intent = intent.with_data_uri(link.to_string());
            }
        }
        if let Err(err) = self.lifecycle.start_activity(&intent).await {
            warn!(package = %app.package, error = %err, "Failed to launch");
            return Ok(StageOutcome::HardFailed(FailureReason::LaunchFailed));
        }

        settle(cancel, self.policy.launch_settle()).await?;
        Ok(StageOutcome::Success)
    }

    async fn advance_screens(
        &self,
        app: &TargetApp,
        cancel: &CancellationToken,
        sink: &ProgressSink,
    ) -> Result<StageOutcome, FlowError> {
        sink.emit(
            Some(&app.key),
            ProgressStage::App(Stage::AdvancingScreens),
            ProgressLevel::Info,
            format!("Setting up {}...", app.display_name),
        );
        let dismissed = self.advancer.run(cancel).await?;
        debug!(dismissed, "Interstitials dismissed");
        Ok(StageOutcome::Success)
    }

    async fn locate(
        &self,
        app: &TargetApp,
        attempt: &AutomationAttempt,
        state: &mut RunState,
        cancel: &CancellationToken,
        sink: &ProgressSink,
    ) -> Result<StageOutcome, FlowError> {
        let number = attempt.counters().locate + 1;
        if number == 1 {
            sink.emit(
                Some(&app.key),
                ProgressStage::App(Stage::LocatingField),
                ProgressLevel::Info,
                format!("Entering destination in {}...", app.display_name),
            );
            settle(cancel, self.policy.locate_warmup()).await?;
        }
        debug!(
            "Destination entry attempt {}/{}",
            number, self.policy.locate_attempts
        );

        match self.locator.locate_live(self.accessibility.as_ref()).await {
            Ok(Some(candidate)) => {
                state.strategy = Some(candidate.strategy);
                state.field = Some(candidate);
                Ok(StageOutcome::Success)
            }
            Ok(None) => {
                settle(cancel, self.policy.locate_retry()).await?;
                Ok(StageOutcome::SoftFailed(FailureReason::FieldNotFound))
            }
            Err(err) if err.is_retryable() => {
                if matches!(err, LocatorError::TreeUnavailable) {
                    warn!("No root node available, waiting...");
                } else {
                    warn!(error = %err, "Transient tree read failure, waiting...");
                }
                settle(cancel, self.policy.tree_unavailable()).await?;
                Ok(StageOutcome::SoftFailed(FailureReason::FieldNotFound))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn inject(
        &self,
        app: &TargetApp,
        request: &AppRequest,
        state: &mut RunState,
        cancel: &CancellationToken,
    ) -> Result<StageOutcome, FlowError> {
        let Some(field) = state.field.take() else {
            return Ok(StageOutcome::SoftFailed(FailureReason::StaleField));
        };
        let ctx = InjectCtx::new(app.display_name.clone(), cancel.clone());
        match self
            .injector
            .inject(&ctx, &field.handle, &request.destination)
            .await
        {
            Ok(report) if report.succeeded() => {
                state.method = report.method;
                Ok(StageOutcome::Success)
            }
            Ok(report) if report.stale => {
                info!("Field went stale, locating again");
                Ok(StageOutcome::SoftFailed(FailureReason::StaleField))
            }
            Ok(_) => Ok(StageOutcome::SoftFailed(FailureReason::TextEntryFailed)),
            Err(InjectError::EmptyText) => {
                warn!("Empty destination, nothing to enter");
                Ok(StageOutcome::SoftFailed(FailureReason::TextEntryFailed))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Clicks the first search/submit button, or presses back when there is
    /// none. Platform faults are logged and ignored.
    async fn trigger(&self, cancel: &CancellationToken) -> Result<StageOutcome, FlowError> {
        settle(cancel, self.policy.trigger_warmup()).await?;

        let tree = match self.accessibility.current_tree().await {
            Ok(tree) => tree,
            Err(err) => {
                warn!(error = %err, "Tree read failed before triggering search");
                None
            }
        };
        let button = tree
            .as_ref()
            .and_then(|tree| find_labelled_button(tree, &self.tables.trigger_labels));

        match button {
            Some((label, handle)) => {
                info!("Triggering search with '{}'", label);
                if let Err(err) = self.accessibility.perform(&handle, NodeAction::Click).await {
                    warn!(label = %label, error = %err, "Search click failed");
                }
                settle(cancel, self.policy.trigger_settle()).await?;
            }
            None => {
                debug!("No search button, pressing back");
                if let Err(err) = self.accessibility.global_back().await {
                    debug!(error = %err, "Back navigation failed");
                }
            }
        }
        Ok(StageOutcome::Success)
    }
}
