use ui_platform::scripted::{JournalEntry, SceneApp, SceneScreen, ScriptedNode, SetTextBehavior};
use ui_platform::{
    AccessibilityPort, AppLifecyclePort, DeviceScene, LaunchIntent, NodeAction, NodeId,
    PlatformError, ScriptedDevice,
};

fn device() -> ScriptedDevice {
    let home = ScriptedNode::new("android.widget.FrameLayout").with_children([
        ScriptedNode::new("android.widget.Button")
            .text("Skip")
            .clickable()
            .on_click("search"),
        ScriptedNode::new("android.widget.TextView").text("Welcome"),
    ]);
    let search = ScriptedNode::new("android.widget.FrameLayout").child(
        ScriptedNode::new("android.widget.EditText")
            .hint("Where to?")
            .editable()
            .set_text(SetTextBehavior::PerCharacter),
    );
    ScriptedDevice::new(
        DeviceScene::new()
            .app(
                SceneApp::new("com.example.ride")
                    .screen(SceneScreen::new("home", home).loading_polls(1))
                    .screen(SceneScreen::new("search", search).on_back("home")),
            )
            .app(SceneApp::new("com.example.absent").not_installed()),
    )
}

#[tokio::test]
async fn launch_shows_first_screen_after_loading_polls() {
    let device = device();
    assert!(device.current_tree().await.unwrap().is_none());

    assert!(device.is_installed("com.example.ride").await.unwrap());
    assert!(!device.is_installed("com.example.absent").await.unwrap());
    assert!(device.launch_intent("com.example.absent").await.unwrap().is_none());

    let intent = device.launch_intent("com.example.ride").await.unwrap().unwrap();
    device.start_activity(&intent).await.unwrap();

    // first read after launch simulates an app that is still rendering
    assert!(device.current_tree().await.unwrap().is_none());
    let tree = device.current_tree().await.unwrap().unwrap();
    assert_eq!(tree.len(), 3);
    assert_eq!(device.launched_packages(), vec!["com.example.ride"]);
}

#[tokio::test]
async fn click_transition_invalidates_old_handles() {
    let device = device();
    device
        .start_activity(&LaunchIntent::for_package("com.example.ride"))
        .await
        .unwrap();
    let _ = device.current_tree().await.unwrap();

    let skip = device.find_by_text("skip").await.unwrap();
    assert_eq!(skip.len(), 1);
    assert!(device.perform(&skip[0], NodeAction::Click).await.unwrap());
    assert_eq!(
        device.foreground(),
        Some(("com.example.ride".to_string(), "search".to_string()))
    );

    let err = device.perform(&skip[0], NodeAction::Click).await.unwrap_err();
    assert!(matches!(err, PlatformError::StaleNode(_)));
}

#[tokio::test]
async fn per_character_fields_reject_bulk_text() {
    let device = device();
    device
        .start_activity(&LaunchIntent::for_package("com.example.ride"))
        .await
        .unwrap();
    let _ = device.current_tree().await.unwrap();
    let skip = device.find_by_text("Skip").await.unwrap();
    device.perform(&skip[0], NodeAction::Click).await.unwrap();

    let tree = device.current_tree().await.unwrap().unwrap();
    let field = tree.get(NodeId(1)).unwrap().handle();

    assert!(!device
        .perform(&field, NodeAction::SetText("Koramangala".into()))
        .await
        .unwrap());
    for prefix in ["K", "Ko", "Kor"] {
        assert!(device
            .perform(&field, NodeAction::SetText(prefix.into()))
            .await
            .unwrap());
    }
    assert_eq!(device.field_text(NodeId(1)).as_deref(), Some("Kor"));
    assert_eq!(
        device.set_text_calls("com.example.ride"),
        vec!["Koramangala", "K", "Ko", "Kor"]
    );

    assert!(device.global_back().await.unwrap());
    assert!(matches!(
        device.journal().last(),
        Some(JournalEntry::Back { screen, .. }) if screen == "search"
    ));
    assert_eq!(device.foreground().unwrap().1, "home");
}

#[tokio::test]
async fn failing_tree_reads_surface_internal_errors() {
    let device = ScriptedDevice::new(
        DeviceScene::new().app(SceneApp::new("com.example.broken").failing_tree_reads()),
    );
    device
        .start_activity(&LaunchIntent::for_package("com.example.broken"))
        .await
        .unwrap();
    let err = device.current_tree().await.unwrap_err();
    assert!(matches!(err, PlatformError::Internal(_)));
    assert!(!err.is_transient());
}

#[test]
fn find_by_text_matches_description_too() {
    let screen = ScriptedNode::new("android.widget.FrameLayout").with_children([
        ScriptedNode::new("android.widget.ImageButton").description("Search rides"),
        ScriptedNode::new("android.widget.TextView").text("Research"),
    ]);
    let device = ScriptedDevice::new(
        DeviceScene::new().app(SceneApp::new("com.rapido.passenger").screen(SceneScreen::new("home", screen))),
    );
    tokio_test::block_on(device.start_activity(&LaunchIntent::for_package("com.rapido.passenger")))
        .unwrap();

    let found = tokio_test::block_on(device.find_by_text("SEARCH")).unwrap();
    let ids: Vec<NodeId> = found.iter().map(|handle| handle.id).collect();
    assert_eq!(ids, vec![NodeId(1), NodeId(2)]);
    assert!(tokio_test::block_on(device.find_by_text("")).unwrap().is_empty());
}
