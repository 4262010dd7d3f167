use clap::Subcommand;

use super::apps::AppsArgs;
use super::locate::LocateArgs;
use super::run::RunArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Open every configured ride app with the destination filled in
    Run(RunArgs),

    /// List supported ride apps and their deep links
    Apps(AppsArgs),

    /// Show which field the locator picks on one screen
    Locate(LocateArgs),
}
