use anyhow::{bail, Result};
use app_flow::{deep_link, AppCatalog};
use clap::Args;
use ridescan_cli::AutomationConfig;
use ridescan_core_types::Place;
use serde_json::json;

use super::output::OutputFormat;

#[derive(Args, Clone, Debug)]
pub struct AppsArgs {
    /// Pickup point; together with --dropoff prints each app's deep link
    #[arg(long, value_name = "LAT,LNG[,NAME]")]
    pub pickup: Option<Place>,

    /// Dropoff point
    #[arg(long, value_name = "LAT,LNG[,NAME]")]
    pub dropoff: Option<Place>,
}

pub fn cmd_apps(args: AppsArgs, config: &AutomationConfig, output: OutputFormat) -> Result<()> {
    let route = match (args.pickup, args.dropoff) {
        (Some(pickup), Some(dropoff)) => {
            pickup.point.validate()?;
            dropoff.point.validate()?;
            Some((pickup, dropoff))
        }
        (None, None) => None,
        _ => bail!("--pickup and --dropoff must be given together"),
    };

    let catalog = AppCatalog::builtin();
    let rows: Vec<_> = catalog
        .iter()
        .map(|app| {
            let link = route
                .as_ref()
                .and_then(|(pickup, dropoff)| deep_link(app, pickup, dropoff));
            (app, config.apps.contains(&app.key), link)
        })
        .collect();

    match output {
        OutputFormat::Json => {
            let value: Vec<_> = rows
                .iter()
                .map(|(app, enabled, link)| {
                    json!({
                        "key": app.key,
                        "name": app.display_name,
                        "package": app.package,
                        "coordinate_link": app.coordinate_link,
                        "color": format!("#{:08X}", app.color),
                        "enabled": enabled,
                        "deep_link": link.as_ref().map(|url| url.as_str()),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Human => {
            for (app, enabled, link) in &rows {
                println!(
                    "{} {:<12} {:<12} {}",
                    if *enabled { "*" } else { " " },
                    app.key.as_str(),
                    app.display_name,
                    app.package
                );
                if let Some(url) = link {
                    println!("    {}", url);
                } else if route.is_some() {
                    println!("    (no deep link, UI automation only)");
                }
            }
        }
    }
    Ok(())
}
