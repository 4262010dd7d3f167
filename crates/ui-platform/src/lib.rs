//! Platform seam for on-device UI automation.
//!
//! This crate models what the automation core is allowed to know about the
//! host platform:
//! - an immutable snapshot of the accessibility tree ([`UiTree`])
//! - owned, generation-stamped node handles ([`NodeHandle`]) for dispatching actions
//! - the accessibility and app-lifecycle capabilities as async traits
//! - a scripted in-memory device used by tests and the CLI simulator

pub mod errors;
pub mod intent;
pub mod ports;
pub mod scripted;
pub mod tree;

pub use errors::PlatformError;
pub use intent::{LaunchFlags, LaunchIntent};
pub use ports::{AccessibilityPort, AppLifecyclePort, NodeAction};
pub use scripted::{DeviceScene, ScriptedDevice};
pub use tree::{NodeAttrs, NodeHandle, NodeId, NodeRef, NodeSpec, TreeGeneration, UiTree};
