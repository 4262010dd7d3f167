use std::sync::Arc;
use std::time::Duration;

use app_flow::{
    AppCatalog, AppOutcome, AutomationPolicy, FailureReason, FleetCoordinator, FleetEvent,
    FleetHandle, FleetRequest, FleetSummary, Orchestrator, Stage,
};
use async_trait::async_trait;
use ridescan_core_types::{AppKey, KeywordTables, Place};
use text_injector::InjectionPolicy;
use tokio::time::Instant;
use ui_platform::scripted::{JournalEntry, SceneApp, SceneScreen, ScriptedNode, SetTextBehavior};
use ui_platform::{
    AccessibilityPort, DeviceScene, NodeAction, NodeHandle, PlatformError, ScriptedDevice, UiTree,
};

const UBER: &str = "com.ubercab";
const OLA: &str = "com.olacabs.customer";

fn pickup() -> Place {
    Place::new(12.9716, 77.5946, "MG Road")
}

fn dropoff() -> Place {
    Place::new(12.9352, 77.6245, "Koramangala")
}

fn request(apps: &[&str]) -> FleetRequest {
    FleetRequest::new("Koramangala", pickup(), dropoff())
        .with_apps(apps.iter().map(|key| AppKey::new(*key)).collect())
}

fn where_to(behavior: SetTextBehavior) -> ScriptedNode {
    ScriptedNode::new("android.widget.EditText")
        .hint("Where to?")
        .editable()
        .set_text(behavior)
}

fn home(behavior: SetTextBehavior) -> SceneScreen {
    SceneScreen::new(
        "home",
        ScriptedNode::new("android.widget.FrameLayout").with_children([
            ScriptedNode::new("android.widget.LinearLayout").child(where_to(behavior)),
            ScriptedNode::new("android.widget.Button")
                .text("Search")
                .clickable()
                .on_click("results"),
        ]),
    )
}

fn results() -> SceneScreen {
    SceneScreen::new(
        "results",
        ScriptedNode::new("android.widget.FrameLayout")
            .child(ScriptedNode::new("android.widget.TextView").text("Choose a ride")),
    )
}

fn ride_app(package: &str) -> SceneApp {
    SceneApp::new(package)
        .screen(home(SetTextBehavior::Accept))
        .screen(results())
}

fn coordinator_for(
    accessibility: Arc<dyn AccessibilityPort>,
    device: &Arc<ScriptedDevice>,
) -> FleetCoordinator {
    let orchestrator = Orchestrator::new(
        accessibility,
        device.clone(),
        Arc::new(KeywordTables::default()),
        AutomationPolicy::default(),
        InjectionPolicy::default(),
    )
    .unwrap();
    FleetCoordinator::new(Arc::new(orchestrator), Arc::new(AppCatalog::builtin()))
}

fn coordinator(device: &Arc<ScriptedDevice>) -> FleetCoordinator {
    coordinator_for(device.clone(), device)
}

async fn drain(mut handle: FleetHandle) -> (Vec<FleetEvent>, FleetSummary) {
    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        events.push(event);
    }
    let summary = handle.join().await.unwrap();
    (events, summary)
}

fn messages(events: &[FleetEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| event.as_progress().map(|p| p.message.clone()))
        .collect()
}

fn assert_completed_once_and_last(events: &[FleetEvent]) {
    let completed = events
        .iter()
        .filter(|event| matches!(event, FleetEvent::Completed(_)))
        .count();
    assert_eq!(completed, 1);
    assert!(matches!(events.last(), Some(FleetEvent::Completed(_))));
}

#[tokio::test(start_paused = true)]
async fn invalid_coordinates_complete_without_touching_apps() {
    let device = Arc::new(ScriptedDevice::new(DeviceScene::new().app(ride_app(UBER))));
    let bad = FleetRequest::new("Koramangala", Place::new(95.0, 77.5946, ""), dropoff());

    let (events, summary) = drain(coordinator(&device).start(bad)).await;

    assert_eq!(messages(&events), vec!["Invalid coordinates provided"]);
    assert_completed_once_and_last(&events);
    assert_eq!(events.len(), 2);
    assert!(summary.rejected.is_some());
    assert!(summary.reports.is_empty());
    assert!(device.launched_packages().is_empty());
}

#[tokio::test(start_paused = true)]
async fn koramangala_run_reports_both_apps_in_order() {
    let scene = DeviceScene::new().app(ride_app(UBER)).app(ride_app(OLA));
    let device = Arc::new(ScriptedDevice::new(scene));

    let (events, summary) = drain(coordinator(&device).start(request(&["uber", "ola"]))).await;

    assert_eq!(
        messages(&events),
        vec![
            "Opening apps with your destination...",
            "Opening Uber...",
            "Setting up Uber...",
            "Entering destination in Uber...",
            "Uber ready - check prices!",
            "Opening Ola...",
            "Setting up Ola...",
            "Entering destination in Ola...",
            "Ola ready - check prices!",
            "All apps opened! Compare live prices manually",
        ]
    );
    assert_completed_once_and_last(&events);

    let seqs: Vec<u64> = events
        .iter()
        .filter_map(|event| event.as_progress().map(|p| p.seq))
        .collect();
    assert_eq!(seqs, (0..seqs.len() as u64).collect::<Vec<_>>());

    assert_eq!(device.launched_packages(), vec![UBER, OLA]);
    assert_eq!(device.set_text_calls(UBER), vec!["Koramangala"]);
    assert_eq!(device.set_text_calls(OLA), vec!["Koramangala"]);
    assert_eq!(
        device.foreground(),
        Some((OLA.to_string(), "results".to_string()))
    );

    let keys: Vec<&str> = summary.reports.iter().map(|r| r.app.as_str()).collect();
    assert_eq!(keys, vec!["uber", "ola"]);
    assert!(summary.reports.iter().all(|r| r.outcome == AppOutcome::Ready));
    assert_eq!(
        summary.reports[0].stages(),
        vec![
            Stage::Launching,
            Stage::AdvancingScreens,
            Stage::LocatingField,
            Stage::InjectingText,
            Stage::Triggering,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn repeated_runs_follow_the_same_stages() {
    let scene = DeviceScene::new().app(ride_app(UBER)).app(ride_app(OLA));
    let device = Arc::new(ScriptedDevice::new(scene));
    let coordinator = coordinator(&device);

    let (_, first) = drain(coordinator.start(request(&["uber", "ola"]))).await;
    let (_, second) = drain(coordinator.start(request(&["uber", "ola"]))).await;

    let stages = |summary: &FleetSummary| -> Vec<Vec<Stage>> {
        summary.reports.iter().map(|r| r.stages()).collect()
    };
    assert_eq!(stages(&first), stages(&second));
    assert_ne!(first.run_id, second.run_id);
}

#[tokio::test(start_paused = true)]
async fn missing_apps_are_skipped() {
    let scene = DeviceScene::new()
        .app(SceneApp::new(UBER).not_installed())
        .app(ride_app(OLA));
    let device = Arc::new(ScriptedDevice::new(scene));

    let (events, summary) =
        drain(coordinator(&device).start(request(&["uber", "rapido", "ola"]))).await;

    let messages = messages(&events);
    assert!(messages.contains(&"Uber not installed - skipping".to_string()));
    assert!(messages.contains(&"Rapido not installed - skipping".to_string()));
    assert!(!messages.contains(&"Opening Uber...".to_string()));
    assert!(messages.contains(&"Ola ready - check prices!".to_string()));
    assert_completed_once_and_last(&events);

    assert_eq!(device.launched_packages(), vec![OLA]);
    assert_eq!(summary.count(AppOutcome::Skipped), 2);
    assert_eq!(summary.reports[0].failure, Some(FailureReason::NotInstalled));
}

#[tokio::test(start_paused = true)]
async fn refused_text_entry_leaves_app_open_for_manual_entry() {
    let app = SceneApp::new(UBER)
        .screen(home(SetTextBehavior::Reject))
        .screen(results());
    let device = Arc::new(ScriptedDevice::new(DeviceScene::new().app(app)));

    let (events, summary) = drain(coordinator(&device).start(request(&["uber"]))).await;

    let report = &summary.reports[0];
    assert_eq!(report.outcome, AppOutcome::ManualEntryNeeded);
    assert_eq!(report.failure, Some(FailureReason::TextEntryFailed));
    assert!(messages(&events).contains(&"Uber opened (manual entry needed)".to_string()));
    assert_eq!(
        messages(&events).last().map(String::as_str),
        Some("All apps opened! Compare live prices manually")
    );
}

#[tokio::test(start_paused = true)]
async fn unlaunchable_app_is_reported() {
    let scene = DeviceScene::new()
        .app(ride_app(UBER).not_launchable())
        .app(ride_app(OLA));
    let device = Arc::new(ScriptedDevice::new(scene));

    let (events, summary) = drain(coordinator(&device).start(request(&["uber", "ola"]))).await;

    assert!(messages(&events).contains(&"Failed to open Uber".to_string()));
    assert_eq!(summary.reports[0].outcome, AppOutcome::LaunchFailed);
    assert_eq!(summary.reports[1].outcome, AppOutcome::Ready);
}

#[tokio::test(start_paused = true)]
async fn interstitials_are_dismissed_before_locating() {
    let onboarding = SceneScreen::new(
        "onboarding",
        ScriptedNode::new("android.widget.FrameLayout").with_children([
            ScriptedNode::new("android.widget.TextView").text("Welcome to Ola"),
            ScriptedNode::new("android.widget.LinearLayout")
                .clickable()
                .on_click("home")
                .child(ScriptedNode::new("android.widget.TextView").text("Not Now")),
        ]),
    );
    let app = SceneApp::new(OLA)
        .screen(onboarding)
        .screen(home(SetTextBehavior::Accept))
        .screen(results());
    let device = Arc::new(ScriptedDevice::new(DeviceScene::new().app(app)));

    let (_, summary) = drain(coordinator(&device).start(request(&["ola"]))).await;

    assert_eq!(summary.reports[0].outcome, AppOutcome::Ready);
    let dismissed = device.journal().into_iter().any(|entry| {
        matches!(
            entry,
            JournalEntry::Action { screen, action: NodeAction::Click, acknowledged: true, .. }
                if screen == "onboarding"
        )
    });
    assert!(dismissed);
}

#[tokio::test(start_paused = true)]
async fn stale_field_is_located_again() {
    // clicking the home field opens a dedicated search screen
    let home = SceneScreen::new(
        "home",
        ScriptedNode::new("android.widget.FrameLayout")
            .child(where_to(SetTextBehavior::Reject).on_click("search")),
    );
    let search = SceneScreen::new(
        "search",
        ScriptedNode::new("android.widget.FrameLayout")
            .child(where_to(SetTextBehavior::Accept)),
    );
    let app = SceneApp::new(UBER).screen(home).screen(search);
    let device = Arc::new(ScriptedDevice::new(DeviceScene::new().app(app)));

    let (_, summary) = drain(coordinator(&device).start(request(&["uber"]))).await;

    let report = &summary.reports[0];
    assert_eq!(report.outcome, AppOutcome::Ready);
    assert_eq!(report.counters.locate, 2);
    assert_eq!(report.counters.inject, 2);
    assert_eq!(device.field_text(ui_platform::NodeId(1)).as_deref(), Some("Koramangala"));
}

#[tokio::test(start_paused = true)]
async fn broken_tree_reads_are_contained() {
    let scene = DeviceScene::new()
        .app(ride_app(UBER).failing_tree_reads())
        .app(ride_app(OLA));
    let device = Arc::new(ScriptedDevice::new(scene));

    let (events, summary) = drain(coordinator(&device).start(request(&["uber", "ola"]))).await;

    assert!(messages(&events).contains(&"Uber: Error occurred".to_string()));
    assert_eq!(summary.reports[0].outcome, AppOutcome::Errored);
    assert!(matches!(
        summary.reports[0].failure,
        Some(FailureReason::Platform(_))
    ));
    assert_eq!(summary.reports[1].outcome, AppOutcome::Ready);
    assert_completed_once_and_last(&events);
}

/// Accessibility port that panics while a given package is in the foreground.
struct PanicsFor {
    device: Arc<ScriptedDevice>,
    package: &'static str,
}

impl PanicsFor {
    fn check(&self) {
        if let Some((package, _)) = self.device.foreground() {
            if package == self.package {
                panic!("accessibility service crashed");
            }
        }
    }
}

#[async_trait]
impl AccessibilityPort for PanicsFor {
    async fn current_tree(&self) -> Result<Option<UiTree>, PlatformError> {
        self.check();
        self.device.current_tree().await
    }

    async fn perform(&self, node: &NodeHandle, action: NodeAction) -> Result<bool, PlatformError> {
        self.check();
        self.device.perform(node, action).await
    }

    async fn global_back(&self) -> Result<bool, PlatformError> {
        self.check();
        self.device.global_back().await
    }
}

#[tokio::test(start_paused = true)]
async fn panicking_platform_only_costs_one_app() {
    let scene = DeviceScene::new().app(ride_app(UBER)).app(ride_app(OLA));
    let device = Arc::new(ScriptedDevice::new(scene));
    let port = Arc::new(PanicsFor {
        device: device.clone(),
        package: UBER,
    });

    let (events, summary) =
        drain(coordinator_for(port, &device).start(request(&["uber", "ola"]))).await;

    let messages = messages(&events);
    assert!(messages.contains(&"Uber: Error occurred".to_string()));
    assert!(messages.contains(&"Ola ready - check prices!".to_string()));
    assert_eq!(summary.reports[0].outcome, AppOutcome::Errored);
    assert_eq!(summary.reports[1].outcome, AppOutcome::Ready);
    assert_completed_once_and_last(&events);
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_the_run_without_success_messages() {
    let scene = DeviceScene::new().app(ride_app(UBER)).app(ride_app(OLA));
    let device = Arc::new(ScriptedDevice::new(scene));
    let mut handle = coordinator(&device).start(request(&["uber", "ola"]));

    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        let entering = event
            .as_progress()
            .map(|p| p.message == "Entering destination in Uber...")
            .unwrap_or(false);
        events.push(event);
        if entering {
            handle.cancel();
        }
    }
    let summary = handle.join().await.unwrap();

    let messages = messages(&events);
    assert_eq!(messages.last().map(String::as_str), Some("Automation cancelled"));
    assert!(!messages.iter().any(|m| m.contains("ready")));
    assert!(!messages.iter().any(|m| m.starts_with("All apps opened")));
    assert_completed_once_and_last(&events);

    assert!(summary.cancelled);
    assert_eq!(summary.reports.len(), 1);
    assert_eq!(summary.reports[0].outcome, AppOutcome::Cancelled);
    assert_eq!(device.launched_packages(), vec![UBER]);
    assert!(device.set_text_calls(UBER).is_empty());
}

#[tokio::test(start_paused = true)]
async fn callback_contract_reports_messages_then_completion() {
    let scene = DeviceScene::new().app(ride_app(UBER));
    let device = Arc::new(ScriptedDevice::new(scene));
    let coordinator = coordinator(&device);

    let seen = Arc::new(parking_lot::Mutex::new(Vec::<String>::new()));
    let (done_tx, done_rx) = tokio::sync::oneshot::channel();
    let sink = seen.clone();
    // default app list: uber, ola, rapido; only uber is installed
    coordinator.run_fleet_automation(
        "Koramangala",
        pickup(),
        dropoff(),
        move |message| sink.lock().push(message),
        move || {
            let _ = done_tx.send(());
        },
    );
    done_rx.await.unwrap();

    let seen = seen.lock().clone();
    assert_eq!(seen.first().map(String::as_str), Some("Opening apps with your destination..."));
    assert!(seen.contains(&"Uber ready - check prices!".to_string()));
    assert!(seen.contains(&"Ola not installed - skipping".to_string()));
    assert_eq!(
        seen.last().map(String::as_str),
        Some("All apps opened! Compare live prices manually")
    );
}

#[tokio::test(start_paused = true)]
async fn coordinators_sharing_a_device_take_turns() {
    let scene = DeviceScene::new().app(ride_app(UBER)).app(ride_app(OLA));
    let device = Arc::new(ScriptedDevice::new(scene));
    let first = coordinator(&device);
    let second = coordinator(&device).with_foreground_lock(first.foreground_lock());

    let a = first.start(request(&["uber"]));
    let b = second.start(request(&["ola"]));
    let (_, a) = drain(a).await;
    let (_, b) = drain(b).await;

    assert_eq!(a.reports[0].outcome, AppOutcome::Ready);
    assert_eq!(b.reports[0].outcome, AppOutcome::Ready);
    assert_eq!(device.launched_packages(), vec![UBER, OLA]);
}

#[tokio::test(start_paused = true)]
async fn new_run_supersedes_the_one_in_flight() {
    let scene = DeviceScene::new().app(ride_app(UBER)).app(ride_app(OLA));
    let device = Arc::new(ScriptedDevice::new(scene));
    let coordinator = coordinator(&device);

    let mut first = coordinator.start(request(&["uber", "ola"]));
    let mut first_events = Vec::new();
    while let Some(event) = first.next_event().await {
        let entering = event
            .as_progress()
            .map(|p| p.message == "Entering destination in Uber...")
            .unwrap_or(false);
        first_events.push(event);
        if entering {
            break;
        }
    }

    let started = Instant::now();
    let mut second = coordinator.start(request(&["ola"]));
    let mut second_events = vec![second.next_event().await.unwrap()];
    assert!(started.elapsed() < Duration::from_secs(1));

    let (rest, first_summary) = drain(first).await;
    first_events.extend(rest);
    let (rest, second_summary) = drain(second).await;
    second_events.extend(rest);

    assert!(first_summary.cancelled);
    assert_eq!(first_summary.reports.len(), 1);
    assert_eq!(first_summary.reports[0].outcome, AppOutcome::Cancelled);
    assert_eq!(
        messages(&first_events).last().map(String::as_str),
        Some("Automation cancelled")
    );
    assert_completed_once_and_last(&first_events);

    assert_eq!(
        messages(&second_events).first().map(String::as_str),
        Some("Opening apps with your destination...")
    );
    assert_eq!(second_summary.reports[0].outcome, AppOutcome::Ready);
    assert_completed_once_and_last(&second_events);

    assert_eq!(device.launched_packages(), vec![UBER, OLA]);
    assert!(device.set_text_calls(UBER).is_empty());
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_cancels_the_run() {
    let scene = DeviceScene::new().app(ride_app(UBER)).app(ride_app(OLA));
    let device = Arc::new(ScriptedDevice::new(scene));
    let mut handle = coordinator(&device).start(request(&["uber", "ola"]));

    while let Some(event) = handle.next_event().await {
        if event.as_progress().map(|p| p.message == "Opening Uber...").unwrap_or(false) {
            break;
        }
    }
    drop(handle);
    tokio::time::sleep(Duration::from_secs(600)).await;

    assert_eq!(device.launched_packages(), vec![UBER]);
    assert!(device.set_text_calls(UBER).is_empty());
}

#[tokio::test(start_paused = true)]
async fn field_never_found_leaves_app_for_manual_entry() {
    let blank = SceneScreen::new(
        "home",
        ScriptedNode::new("android.widget.FrameLayout")
            .child(ScriptedNode::new("android.widget.TextView").text("Good evening")),
    );
    let app = SceneApp::new(UBER).screen(blank);
    let device = Arc::new(ScriptedDevice::new(DeviceScene::new().app(app)));

    let (events, summary) = drain(coordinator(&device).start(request(&["uber"]))).await;

    let report = &summary.reports[0];
    assert_eq!(report.outcome, AppOutcome::ManualEntryNeeded);
    assert_eq!(report.failure, Some(FailureReason::FieldNotFound));
    assert_eq!(report.counters.locate, AutomationPolicy::default().locate_attempts);
    assert_eq!(report.counters.locate, 8);
    assert!(messages(&events).contains(&"Uber opened (manual entry needed)".to_string()));
    assert!(device.set_text_calls(UBER).is_empty());
    assert_completed_once_and_last(&events);
}

#[tokio::test(start_paused = true)]
async fn slow_window_content_is_waited_out_while_locating() {
    // five empty reads: three go to the advancer, two to locating
    let app = SceneApp::new(UBER)
        .screen(home(SetTextBehavior::Accept).loading_polls(5))
        .screen(results());
    let device = Arc::new(ScriptedDevice::new(DeviceScene::new().app(app)));

    let (events, summary) = drain(coordinator(&device).start(request(&["uber"]))).await;

    let report = &summary.reports[0];
    assert_eq!(report.outcome, AppOutcome::Ready);
    assert_eq!(report.counters.locate, 3);
    assert_eq!(device.set_text_calls(UBER), vec!["Koramangala"]);
    assert!(messages(&events).contains(&"Uber ready - check prices!".to_string()));
}

#[tokio::test(start_paused = true)]
async fn coordinate_apps_launch_with_their_deep_link() {
    const BLUSMART: &str = "com.blusmart.rider";
    let scene = DeviceScene::new().app(ride_app(UBER)).app(ride_app(BLUSMART));
    let device = Arc::new(ScriptedDevice::new(scene));

    drain(coordinator(&device).start(request(&["uber", "blusmart"]))).await;

    let launches: Vec<(String, Option<String>)> = device
        .journal()
        .into_iter()
        .filter_map(|entry| match entry {
            JournalEntry::Launched { package, data_uri } => Some((package, data_uri)),
            _ => None,
        })
        .collect();
    assert_eq!(launches.len(), 2);
    assert_eq!(launches[0].0, UBER);
    let uber_link = launches[0].1.as_deref().unwrap();
    assert!(uber_link.starts_with("https://m.uber.com/ul/?action=setPickup"));
    assert!(uber_link.contains("12.935200"));
    assert_eq!(launches[1], (BLUSMART.to_string(), None));
}
