//! Supported ride services.

use ridescan_core_types::AppKey;
use serde::{Deserialize, Serialize};

use crate::errors::FlowError;

/// One supported ride service. Whether it is installed is asked of the
/// platform on every run, never stored here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetApp {
    pub key: AppKey,
    pub display_name: String,
    pub package: String,
    /// The vendor accepts pickup/dropoff coordinates in a deep link.
    pub coordinate_link: bool,
    /// ARGB display colour.
    pub color: u32,
}

impl TargetApp {
    pub fn new(
        key: &str,
        display_name: &str,
        package: &str,
        coordinate_link: bool,
        color: u32,
    ) -> Self {
        Self {
            key: AppKey::new(key),
            display_name: display_name.to_string(),
            package: package.to_string(),
            coordinate_link,
            color,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppCatalog {
    apps: Vec<TargetApp>,
}

impl AppCatalog {
    pub fn builtin() -> Self {
        Self {
            apps: vec![
                TargetApp::new("uber", "Uber", "com.ubercab", true, 0xFF00_0000),
                TargetApp::new("ola", "Ola", "com.olacabs.customer", true, 0xFF00_C853),
                TargetApp::new("rapido", "Rapido", "com.rapido.passenger", true, 0xFFFF_5722),
                TargetApp::new(
                    "nammayatri",
                    "Namma Yatri",
                    "in.juspay.nammayatri",
                    true,
                    0xFF21_96F3,
                ),
                TargetApp::new("blusmart", "BluSmart", "com.blusmart.rider", false, 0xFF4C_AF50),
            ],
        }
    }

    /// Keys automated when the caller does not choose.
    pub fn default_keys() -> Vec<AppKey> {
        ["uber", "ola", "rapido"].into_iter().map(AppKey::new).collect()
    }

    pub fn get(&self, key: &AppKey) -> Option<&TargetApp> {
        self.apps.iter().find(|app| &app.key == key)
    }

    /// Resolves `keys` in the order given. Duplicates are dropped.
    pub fn select(&self, keys: &[AppKey]) -> Result<Vec<TargetApp>, FlowError> {
        let mut selected: Vec<TargetApp> = Vec::with_capacity(keys.len());
        for key in keys {
            let app = self
                .get(key)
                .ok_or_else(|| FlowError::UnknownApp(key.to_string()))?;
            if !selected.iter().any(|s| s.key == app.key) {
                selected.push(app.clone());
            }
        }
        Ok(selected)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetApp> {
        self.apps.iter()
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

impl Default for AppCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
