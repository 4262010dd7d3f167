//! Configuration management module
//!
//! The automation settings live in one YAML document. Every section is
//! optional; missing keys fall back to the built-in defaults. A handful of
//! environment variables override the file for quick experiments.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use app_flow::{AppCatalog, AutomationPolicy};
use ridescan_core_types::{AppKey, KeywordTables};
use serde::{Deserialize, Serialize};
use text_injector::{InjectionPolicy, Strictness};
use tokio::fs;
use tracing::{info, warn};

pub const ENV_APPS: &str = "RIDESCAN_APPS";
pub const ENV_STRICT_INJECTION: &str = "RIDESCAN_STRICT_INJECTION";
pub const ENV_INTER_APP_DELAY_MS: &str = "RIDESCAN_INTER_APP_DELAY_MS";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Apps to automate, in order.
    pub apps: Vec<AppKey>,
    pub policy: AutomationPolicy,
    pub injection: InjectionPolicy,
    /// Extra vocabulary appended to the built-in keyword tables.
    pub keywords: Option<KeywordTables>,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            apps: AppCatalog::default_keys(),
            policy: AutomationPolicy::default(),
            injection: InjectionPolicy::default(),
            keywords: None,
        }
    }
}

impl AutomationConfig {
    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).context("Failed to parse config file")
    }

    /// Built-in tables extended with the configured entries.
    pub fn keyword_tables(&self) -> KeywordTables {
        let builtin = KeywordTables::default();
        match &self.keywords {
            Some(extra) => builtin.extended_with(extra),
            None => builtin,
        }
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_APPS) {
            let apps: Vec<AppKey> = raw
                .split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(AppKey::new)
                .collect();
            if apps.is_empty() {
                bail!("{} is set but lists no apps", ENV_APPS);
            }
            info!("Using apps from {}: {}", ENV_APPS, raw);
            self.apps = apps;
        }

        if let Some(raw) = lookup(ENV_STRICT_INJECTION) {
            self.injection.strictness = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Strictness::VerifyByReadback,
                "0" | "false" | "no" | "off" => Strictness::AcknowledgeOnly,
                other => bail!("{} must be a boolean, got '{}'", ENV_STRICT_INJECTION, other),
            };
            info!(strictness = ?self.injection.strictness, "Injection strictness overridden");
        }

        if let Some(raw) = lookup(ENV_INTER_APP_DELAY_MS) {
            self.policy.inter_app_delay_ms = raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be milliseconds", ENV_INTER_APP_DELAY_MS))?;
        }
        Ok(())
    }

    /// Rejects app keys the catalog does not know.
    pub fn validate(&self, catalog: &AppCatalog) -> Result<()> {
        catalog
            .select(&self.apps)
            .context("Invalid app list in configuration")?;
        if self.policy.locate_attempts == 0 {
            bail!("policy.locate_attempts must be at least 1");
        }
        Ok(())
    }
}

pub struct LoadedConfig {
    pub config: AutomationConfig,
    pub path: PathBuf,
}

/// `~/.config/ridescan/config.yaml` on Linux, the platform equivalent elsewhere.
pub fn default_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().context("Failed to get config directory")?;
    path.push("ridescan");
    path.push("config.yaml");
    Ok(path)
}

pub async fn load_config(config_path: Option<&Path>) -> Result<LoadedConfig> {
    let config_path = match config_path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };

    let config = if fs::try_exists(&config_path).await.unwrap_or(false) {
        let content = fs::read_to_string(&config_path)
            .await
            .with_context(|| format!("reading {}", config_path.display()))?;
        let config = AutomationConfig::from_yaml(&content)
            .with_context(|| format!("parsing {}", config_path.display()))?;
        info!("Loaded configuration from: {}", config_path.display());
        config
    } else {
        warn!(
            "Config file not found, using defaults: {}",
            config_path.display()
        );
        AutomationConfig::default()
    };

    Ok(LoadedConfig {
        config,
        path: config_path,
    })
}
