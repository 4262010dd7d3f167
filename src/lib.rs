//! RideScan library
//!
//! Exposes modules for integration testing

pub mod app_context;
pub mod config;
pub mod scene;

// Re-export commonly used types for external use
pub use app_context::AppContext;
pub use config::{load_config, AutomationConfig, LoadedConfig};
pub use scene::{load_scene, parse_scene};
