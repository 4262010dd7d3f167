//! Ordered progress stream delivered to the caller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ridescan_core_types::AppKey;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::attempt::{AttemptReport, Stage};
use crate::fleet::FleetSummary;

/// Where in the run a progress message was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    Starting,
    App(Stage),
    Completed,
    InvalidInput,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Position in the stream, starting at 0.
    pub seq: u64,
    pub app: Option<AppKey>,
    pub stage: ProgressStage,
    pub level: ProgressLevel,
    pub message: String,
}

#[derive(Clone, Debug)]
pub enum FleetEvent {
    Progress(ProgressEvent),
    AppFinished(AttemptReport),
    /// Always the last event of a run, sent exactly once.
    Completed(FleetSummary),
}

impl FleetEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            FleetEvent::Progress(_) => "progress",
            FleetEvent::AppFinished(_) => "app_finished",
            FleetEvent::Completed(_) => "completed",
        }
    }

    pub fn as_progress(&self) -> Option<&ProgressEvent> {
        match self {
            FleetEvent::Progress(event) => Some(event),
            _ => None,
        }
    }
}

/// Sending half of a run's event stream. Clones share the sequence counter.
#[derive(Clone)]
pub struct ProgressSink {
    tx: mpsc::UnboundedSender<FleetEvent>,
    seq: Arc<AtomicU64>,
}

impl ProgressSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<FleetEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                seq: Arc::new(AtomicU64::new(0)),
            },
            rx,
        )
    }

    pub fn emit(
        &self,
        app: Option<&AppKey>,
        stage: ProgressStage,
        level: ProgressLevel,
        message: impl Into<String>,
    ) {
        let event = ProgressEvent {
            seq: self.seq.fetch_add(1, Ordering::SeqCst),
            app: app.cloned(),
            stage,
            level,
            message: message.into(),
        };
        info!(
            target: "progress",
            seq = event.seq,
            app = event.app.as_ref().map(|k| k.as_str()).unwrap_or("-"),
            "{}",
            event.message
        );
        self.send(FleetEvent::Progress(event));
    }

    pub fn send(&self, event: FleetEvent) {
        let kind = event.kind();
        if self.tx.send(event).is_err() {
            debug!(kind, "Event receiver dropped");
        }
    }
}
