//! Application context and shared components
//!
//! Wires the configured policies and platform ports into one orchestrator and
//! fleet coordinator, so every command drives the device the same way.

use std::sync::Arc;

use anyhow::{Context, Result};
use app_flow::{AppCatalog, FleetCoordinator, FleetRequest, Orchestrator};
use ridescan_core_types::{KeywordTables, Place};
use ui_platform::{AccessibilityPort, AppLifecyclePort};

use crate::config::AutomationConfig;

pub struct AppContext {
    config: AutomationConfig,
    catalog: Arc<AppCatalog>,
    tables: Arc<KeywordTables>,
    coordinator: FleetCoordinator,
}

impl AppContext {
    pub fn new(
        config: AutomationConfig,
        accessibility: Arc<dyn AccessibilityPort>,
        lifecycle: Arc<dyn AppLifecyclePort>,
    ) -> Result<Self> {
        let catalog = Arc::new(AppCatalog::builtin());
        config.validate(&catalog)?;
        let tables = Arc::new(config.keyword_tables());
        let orchestrator = Orchestrator::new(
            accessibility,
            lifecycle,
            tables.clone(),
            config.policy.clone(),
            config.injection.clone(),
        )
        .context("Failed to build orchestrator")?;
        let coordinator = FleetCoordinator::new(Arc::new(orchestrator), catalog.clone());
        Ok(Self {
            config,
            catalog,
            tables,
            coordinator,
        })
    }

    pub fn config(&self) -> &AutomationConfig {
        &self.config
    }

    pub fn catalog(&self) -> &AppCatalog {
        &self.catalog
    }

    pub fn keyword_tables(&self) -> Arc<KeywordTables> {
        self.tables.clone()
    }

    pub fn coordinator(&self) -> &FleetCoordinator {
        &self.coordinator
    }

    /// Fleet request over the configured app list.
    pub fn request(&self, destination: &str, pickup: Place, dropoff: Place) -> FleetRequest {
        FleetRequest::new(destination, pickup, dropoff).with_apps(self.config.apps.clone())
    }
}
