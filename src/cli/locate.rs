use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use app_flow::AppCatalog;
use clap::Args;
use field_locator::{dump_tree, FieldLocator, LocatorStrategy};
use ridescan_cli::{load_scene, AutomationConfig};
use ridescan_core_types::AppKey;
use ui_platform::{AccessibilityPort, AppLifecyclePort, DeviceScene, LaunchIntent, ScriptedDevice};

use super::output::OutputFormat;

const DUMP_DEPTH: usize = 3;

#[derive(Args, Clone, Debug)]
pub struct LocateArgs {
    /// Scripted device scene
    #[arg(long, value_name = "FILE")]
    pub scene: PathBuf,

    /// App key (uber, ola, ...)
    #[arg(long)]
    pub app: String,

    /// Screen to inspect; defaults to the launch screen
    #[arg(long)]
    pub screen: Option<String>,
}

pub async fn cmd_locate(args: LocateArgs, config: &AutomationConfig, output: OutputFormat) -> Result<()> {
    let catalog = AppCatalog::builtin();
    let key = AppKey::new(args.app.as_str());
    let target = catalog
        .get(&key)
        .with_context(|| format!("unknown app '{}'", key))?;

    let scene = load_scene(&args.scene).await?;
    let Some(mut app) = scene
        .apps
        .into_iter()
        .find(|app| app.package == target.package)
    else {
        bail!("scene has no app with package {}", target.package);
    };
    if let Some(name) = &args.screen {
        let Some(idx) = app.screens.iter().position(|s| &s.name == name) else {
            bail!("{} has no screen named '{}'", target.package, name);
        };
        let screen = app.screens.remove(idx);
        app.screens.insert(0, screen);
    }
    if let Some(first) = app.screens.first_mut() {
        first.loading_polls = 0;
    }
    app.installed = true;
    app.fail_tree_reads = false;

    let device = ScriptedDevice::new(DeviceScene::new().app(app));
    device
        .start_activity(&LaunchIntent::for_package(target.package.clone()))
        .await?;
    let tree = device
        .current_tree()
        .await?
        .context("screen rendered no tree")?;

    let locator = FieldLocator::new(std::sync::Arc::new(config.keyword_tables())).without_dumps();
    let chosen = locator.locate(&tree);
    let per_strategy: Vec<_> = LocatorStrategy::fallback_chain()
        .into_iter()
        .map(|strategy| (strategy, locator.locate_with(&tree, strategy)))
        .collect();
    let lines = dump_tree(&tree, DUMP_DEPTH);

    match output {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "app": target.key,
                "chosen": chosen.as_ref().map(|c| serde_json::json!({
                    "node": c.handle.id.0,
                    "strategy": c.strategy,
                    "depth": c.depth,
                })),
                "strategies": per_strategy.iter().map(|(strategy, found)| serde_json::json!({
                    "strategy": strategy,
                    "node": found.as_ref().map(|c| c.handle.id.0),
                })).collect::<Vec<_>>(),
                "tree": lines,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Human => {
            println!("=== SCREEN STRUCTURE ({}) ===", target.display_name);
            for line in &lines {
                println!("{}", line);
            }
            println!("=== END SCREEN STRUCTURE ===");
            for (strategy, found) in &per_strategy {
                match found {
                    Some(candidate) => println!(
                        "{:<14} node {} (depth {})",
                        strategy.name(),
                        candidate.handle.id.0,
                        candidate.depth
                    ),
                    None => println!("{:<14} -", strategy.name()),
                }
            }
            match chosen {
                Some(candidate) => println!(
                    "\nChosen: node {} via {} ({}, hint '{}')",
                    candidate.handle.id.0,
                    candidate.strategy.name(),
                    candidate.attrs.short_class(),
                    candidate.attrs.hint_str()
                ),
                None => println!("\nNo destination field found"),
            }
        }
    }
    Ok(())
}
