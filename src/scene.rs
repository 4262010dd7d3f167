//! Scene files for the scripted device.
//!
//! A scene describes the apps installed on a simulated phone and the screens
//! each one shows, so the whole automation can be exercised from the command
//! line without a device.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tokio::fs;
use tracing::debug;
use ui_platform::scripted::ScriptedNode;
use ui_platform::DeviceScene;

pub fn parse_scene(raw: &str) -> Result<DeviceScene> {
    let scene: DeviceScene = serde_yaml::from_str(raw).context("Failed to parse scene")?;
    validate_scene(&scene)?;
    Ok(scene)
}

pub async fn load_scene(path: &Path) -> Result<DeviceScene> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let scene = parse_scene(&raw).with_context(|| format!("parsing {}", path.display()))?;
    debug!(apps = scene.apps.len(), "Loaded scene from {}", path.display());
    Ok(scene)
}

/// Packages must be unique and every click/back transition must name a
/// screen of the same app.
pub fn validate_scene(scene: &DeviceScene) -> Result<()> {
    let mut packages = HashSet::new();
    for app in &scene.apps {
        if !packages.insert(app.package.as_str()) {
            bail!("package {} is declared twice", app.package);
        }
        let screens: HashSet<&str> = app.screens.iter().map(|s| s.name.as_str()).collect();
        if screens.len() != app.screens.len() {
            bail!("{}: duplicate screen names", app.package);
        }
        if app.installed && app.launchable && app.screens.is_empty() {
            bail!("{}: launchable app needs at least one screen", app.package);
        }
        for screen in &app.screens {
            if let Some(target) = &screen.on_back {
                if !screens.contains(target.as_str()) {
                    bail!(
                        "{}/{}: on_back targets unknown screen '{}'",
                        app.package,
                        screen.name,
                        target
                    );
                }
            }
            check_clicks(&screen.root, &screens).with_context(|| {
                format!("{}/{}", app.package, screen.name)
            })?;
        }
    }
    Ok(())
}

fn check_clicks(node: &ScriptedNode, screens: &HashSet<&str>) -> Result<()> {
    if let Some(target) = &node.on_click {
        if !screens.contains(target.as_str()) {
            bail!("on_click targets unknown screen '{}'", target);
        }
    }
    for child in &node.children {
        check_clicks(child, screens)?;
    }
    Ok(())
}
