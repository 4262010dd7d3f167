//! Sequential fleet runs across the configured apps.

use std::sync::Arc;

use ridescan_core_types::{AppKey, Place, RunId};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, instrument, warn};

use crate::attempt::{AppOutcome, AttemptReport, Stage};
use crate::catalog::{AppCatalog, TargetApp};
use crate::errors::FlowError;
use crate::events::{FleetEvent, ProgressLevel, ProgressSink, ProgressStage};
use crate::orchestrator::{AppRequest, Orchestrator};
use crate::wait::settle;

#[derive(Clone, Debug, PartialEq)]
pub struct FleetRequest {
    pub destination: String,
    pub pickup: Place,
    pub dropoff: Place,
    /// Apps to automate, in order.
    pub apps: Vec<AppKey>,
}

impl FleetRequest {
    pub fn new(destination: impl Into<String>, pickup: Place, dropoff: Place) -> Self {
        Self {
            destination: destination.into(),
            pickup,
            dropoff,
            apps: AppCatalog::default_keys(),
        }
    }

    pub fn with_apps(mut self, apps: Vec<AppKey>) -> Self {
        self.apps = apps;
        self
    }

    /// Both coordinate pairs must be in range.
    pub fn validate(&self) -> Result<(), FlowError> {
        self.pickup.point.validate()?;
        self.dropoff.point.validate()?;
        Ok(())
    }

    fn app_request(&self) -> AppRequest {
        AppRequest {
            destination: self.destination.clone(),
            pickup: self.pickup.clone(),
            dropoff: self.dropoff.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FleetSummary {
    pub run_id: RunId,
    /// One report per app that was started, in run order.
    pub reports: Vec<AttemptReport>,
    pub cancelled: bool,
    /// Set when the request was refused before any app was touched.
    pub rejected: Option<String>,
}

impl FleetSummary {
    fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            reports: Vec::new(),
            cancelled: false,
            rejected: None,
        }
    }

    pub fn count(&self, outcome: AppOutcome) -> usize {
        self.reports.iter().filter(|r| r.outcome == outcome).count()
    }
}

/// Caller side of a running fleet. Dropping the handle cancels the run.
pub struct FleetHandle {
    pub run_id: RunId,
    events: mpsc::UnboundedReceiver<FleetEvent>,
    cancel: CancellationToken,
    task: JoinHandle<FleetSummary>,
    guard: DropGuard,
}

impl FleetHandle {
    /// Next event in emission order; `None` once the run has finished and
    /// the stream is drained.
    pub async fn next_event(&mut self) -> Option<FleetEvent> {
        self.events.recv().await
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Waits for the run to finish. The run stays live while waiting.
    pub async fn join(self) -> Result<FleetSummary, FlowError> {
        let FleetHandle { task, guard, .. } = self;
        let summary = task
            .await
            .map_err(|err| FlowError::TaskFailed(err.to_string()));
        guard.disarm();
        summary
    }
}

/// Runs the orchestrator over a list of apps, one at a time. A new run
/// started on the same coordinator supersedes the one in flight.
#[derive(Clone)]
pub struct FleetCoordinator {
    orchestrator: Arc<Orchestrator>,
    catalog: Arc<AppCatalog>,
    foreground: Arc<Mutex<()>>,
    current: Arc<parking_lot::Mutex<Option<CancellationToken>>>,
}

impl FleetCoordinator {
    pub fn new(orchestrator: Arc<Orchestrator>, catalog: Arc<AppCatalog>) -> Self {
        Self {
            orchestrator,
            catalog,
            foreground: Arc::new(Mutex::new(())),
            current: Arc::new(parking_lot::Mutex::new(None)),
        }
    }

    /// Share the foreground lock with other coordinators driving the same device.
    pub fn with_foreground_lock(mut self, lock: Arc<Mutex<()>>) -> Self {
        self.foreground = lock;
        self
    }

    pub fn foreground_lock(&self) -> Arc<Mutex<()>> {
        self.foreground.clone()
    }

    /// Spawns the run and returns immediately, cancelling any earlier run of
    /// this coordinator. Must be called inside a tokio runtime.
    pub fn start(&self, request: FleetRequest) -> FleetHandle {
        let run_id = RunId::new();
        let cancel = CancellationToken::new();
        let (sink, events) = ProgressSink::channel();

        if let Some(previous) = self.current.lock().replace(cancel.clone()) {
            if !previous.is_cancelled() {
                debug!(run_id = %run_id, "Cancelling the previous fleet run");
                previous.cancel();
            }
        }

        let this = self.clone();
        let token = cancel.clone();
        let id = run_id.clone();
        let task = tokio::spawn(async move {
            let summary = this.drive(id, request, &token, &sink).await;
            sink.send(FleetEvent::Completed(summary.clone()));
            summary
        });

        FleetHandle {
            run_id,
            events,
            guard: cancel.clone().drop_guard(),
            cancel,
            task,
        }
    }

    /// Callback flavour of [`start`](Self::start): `on_progress` receives every
    /// progress message in order, `on_complete` fires once after the last one.
    /// The returned token cancels the run.
    pub fn run_fleet_automation<P, C>(
        &self,
        destination: impl Into<String>,
        pickup: Place,
        dropoff: Place,
        on_progress: P,
        on_complete: C,
    ) -> CancellationToken
    where
        P: Fn(String) + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        let mut handle = self.start(FleetRequest::new(destination, pickup, dropoff));
        let token = handle.cancel_token();
        tokio::spawn(async move {
            let mut on_complete = Some(on_complete);
            while let Some(event) = handle.next_event().await {
                match event {
                    FleetEvent::Progress(progress) => on_progress(progress.message),
                    FleetEvent::AppFinished(_) => {}
                    FleetEvent::Completed(_) => {
                        if let Some(done) = on_complete.take() {
                            done();
                        }
                    }
                }
            }
        });
        token
    }

    #[instrument(skip_all, fields(run_id = %run_id))]
    async fn drive(
        &self,
        run_id: RunId,
        request: FleetRequest,
        cancel: &CancellationToken,
        sink: &ProgressSink,
    ) -> FleetSummary {
        let mut summary = FleetSummary::new(run_id);

        if let Err(err) = request.validate() {
            warn!(error = %err, "Rejecting fleet request");
            sink.emit(
                None,
                ProgressStage::InvalidInput,
                ProgressLevel::Error,
                "Invalid coordinates provided",
            );
            summary.rejected = Some(err.to_string());
            return summary;
        }

        let apps = match self.catalog.select(&request.apps) {
            Ok(apps) => apps,
            Err(err) => {
                warn!(error = %err, "Rejecting fleet request");
                sink.emit(
                    None,
                    ProgressStage::InvalidInput,
                    ProgressLevel::Error,
                    err.to_string(),
                );
                summary.rejected = Some(err.to_string());
                return summary;
            }
        };

        let _foreground = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return self.finish_cancelled(summary, sink);
            }
            guard = self.foreground.lock() => guard,
        };

        info!(apps = apps.len(), destination = %request.destination, "Starting fleet run");
        sink.emit(
            None,
            ProgressStage::Starting,
            ProgressLevel::Info,
            "Opening apps with your destination...",
        );

        let app_request = request.app_request();
        let policy = self.orchestrator.policy().clone();

        for (index, app) in apps.iter().enumerate() {
            if index > 0 && settle(cancel, policy.inter_app_delay()).await.is_err() {
                break;
            }
            let report = self.run_isolated(app, &app_request, cancel, sink).await;
            announce(app, &report, sink);
            let cancelled = report.outcome == AppOutcome::Cancelled;
            summary.reports.push(report.clone());
            sink.send(FleetEvent::AppFinished(report));
            if cancelled {
                break;
            }
        }

        if cancel.is_cancelled() {
            return self.finish_cancelled(summary, sink);
        }

        sink.emit(
            None,
            ProgressStage::Completed,
            ProgressLevel::Success,
            "All apps opened! Compare live prices manually",
        );
        if settle(cancel, policy.completion_delay()).await.is_err() {
            summary.cancelled = true;
        }
        let opened = summary
            .reports
            .iter()
            .filter(|report| report.outcome.app_opened())
            .count();
        info!(
            opened,
            ready = summary.count(AppOutcome::Ready),
            manual = summary.count(AppOutcome::ManualEntryNeeded),
            "Fleet run finished"
        );
        summary
    }

    /// Runs one app in its own task so a panicking platform implementation
    /// only costs that app.
    async fn run_isolated(
        &self,
        app: &TargetApp,
        request: &AppRequest,
        cancel: &CancellationToken,
        sink: &ProgressSink,
    ) -> AttemptReport {
        let orchestrator = self.orchestrator.clone();
        let target = app.clone();
        let request = request.clone();
        let token = cancel.clone();
        let events = sink.clone();
        let joined = tokio::spawn(async move {
            orchestrator.run(&target, &request, &token, &events).await
        })
        .await;

        match joined {
            Ok(report) => report,
            Err(err) => {
                error!(app = %app.key, error = %err, "App task died");
                AttemptReport::errored(app.key.clone(), app.display_name.clone(), err.to_string())
            }
        }
    }

    fn finish_cancelled(&self, mut summary: FleetSummary, sink: &ProgressSink) -> FleetSummary {
        info!("Fleet run cancelled");
        sink.emit(
            None,
            ProgressStage::Cancelled,
            ProgressLevel::Warning,
            "Automation cancelled",
        );
        summary.cancelled = true;
        summary
    }
}

/// Terminal per-app message. Cancelled attempts stay silent.
fn announce(app: &TargetApp, report: &AttemptReport, sink: &ProgressSink) {
    let name = &app.display_name;
    let (stage, level, message) = match report.outcome {
        AppOutcome::Ready => (
            Stage::Done,
            ProgressLevel::Success,
            format!("{} ready - check prices!", name),
        ),
        AppOutcome::ManualEntryNeeded => (
            Stage::Failed,
            ProgressLevel::Info,
            format!("{} opened (manual entry needed)", name),
        ),
        AppOutcome::Skipped => (
            Stage::Failed,
            ProgressLevel::Warning,
            format!("{} not installed - skipping", name),
        ),
        AppOutcome::LaunchFailed => (
            Stage::Failed,
            ProgressLevel::Error,
            format!("Failed to open {}", name),
        ),
        AppOutcome::Errored => (
            Stage::Failed,
            ProgressLevel::Error,
            format!("{}: Error occurred", name),
        ),
        AppOutcome::Cancelled => return,
    };
    sink.emit(Some(&app.key), ProgressStage::App(stage), level, message);
}
