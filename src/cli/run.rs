use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use app_flow::{FleetEvent, FleetSummary, ProgressEvent};
use clap::Args;
use ridescan_cli::{load_scene, AppContext, AutomationConfig};
use ridescan_core_types::{AppKey, Place};
use tokio::signal;
use tracing::{info, warn};
use ui_platform::ScriptedDevice;

use super::output::OutputFormat;

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Destination typed into each app
    #[arg(long)]
    pub destination: String,

    /// Pickup point
    #[arg(long, value_name = "LAT,LNG[,NAME]")]
    pub pickup: Place,

    /// Dropoff point
    #[arg(long, value_name = "LAT,LNG[,NAME]")]
    pub dropoff: Place,

    /// Scripted device scene to drive
    #[arg(long, value_name = "FILE")]
    pub scene: PathBuf,

    /// Apps to automate, overriding the configuration (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub apps: Vec<String>,
}

pub async fn cmd_run(args: RunArgs, mut config: AutomationConfig, output: OutputFormat) -> Result<()> {
    if !args.apps.is_empty() {
        config.apps = args.apps.iter().map(|key| AppKey::new(key.as_str())).collect();
    }
    let scene = load_scene(&args.scene).await?;
    let device = Arc::new(ScriptedDevice::new(scene));
    let context = AppContext::new(config, device.clone(), device)?;

    let request = context.request(&args.destination, args.pickup, args.dropoff);
    let mut handle = context.coordinator().start(request);
    let cancel = handle.cancel_token();
    info!(run_id = %handle.run_id, "Fleet run started");

    let mut interrupted = false;
    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(event) => print_event(&event, output)?,
                None => break,
            },
            result = signal::ctrl_c(), if !interrupted => {
                if let Err(err) = result {
                    warn!(error = %err, "Failed to listen for Ctrl-C");
                } else {
                    warn!("Interrupt received, cancelling automation");
                    cancel.cancel();
                }
                interrupted = true;
            }
        }
    }

    let summary = handle.join().await.context("Fleet run task failed")?;
    if output == OutputFormat::Human {
        print_summary(&summary);
    }
    Ok(())
}

fn print_event(event: &FleetEvent, output: OutputFormat) -> Result<()> {
    match (event, output) {
        (FleetEvent::Progress(progress), OutputFormat::Human) => print_progress(progress),
        (FleetEvent::Progress(progress), OutputFormat::Json) => {
            println!("{}", serde_json::to_string(progress)?)
        }
        (FleetEvent::AppFinished(report), OutputFormat::Json) => {
            println!("{}", serde_json::to_string(report)?)
        }
        _ => {}
    }
    Ok(())
}

fn print_progress(progress: &ProgressEvent) {
    match &progress.app {
        Some(app) => println!("[{:>3}] {:<10} {}", progress.seq, app.as_str(), progress.message),
        None => println!("[{:>3}] {}", progress.seq, progress.message),
    }
}

fn print_summary(summary: &FleetSummary) {
    if let Some(reason) = &summary.rejected {
        println!("\nRun {} rejected: {}", summary.run_id, reason);
        return;
    }
    println!("\nRun {}{}", summary.run_id, if summary.cancelled { " (cancelled)" } else { "" });
    for report in &summary.reports {
        let detail = match (&report.failure, report.strategy, report.method) {
            (Some(reason), _, _) => reason.to_string(),
            (None, Some(strategy), Some(method)) => {
                format!("{} / {}", strategy.name(), method.name())
            }
            _ => String::new(),
        };
        println!(
            "  {:<12} {:<20} {:>6.1}s  {}",
            report.display_name,
            format!("{:?}", report.outcome),
            report.elapsed.as_secs_f64(),
            detail
        );
    }
}
