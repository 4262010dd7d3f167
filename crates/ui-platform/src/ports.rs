use async_trait::async_trait;

use crate::errors::PlatformError;
use crate::intent::LaunchIntent;
use crate::tree::{NodeHandle, UiTree};

/// Actions the core may dispatch against a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeAction {
    Click,
    Focus,
    SetText(String),
}

impl NodeAction {
    pub fn label(&self) -> &'static str {
        match self {
            NodeAction::Click => "click",
            NodeAction::Focus => "focus",
            NodeAction::SetText(_) => "set_text",
        }
    }
}

/// Accessibility / UI-introspection capability of the host platform.
#[async_trait]
pub trait AccessibilityPort: Send + Sync {
    /// Snapshot of the active window, or `None` while nothing is rendered yet.
    async fn current_tree(&self) -> Result<Option<UiTree>, PlatformError>;

    /// Nodes whose visible text or description contains `text`,
    /// case-insensitively, in pre-order.
    async fn find_by_text(&self, text: &str) -> Result<Vec<NodeHandle>, PlatformError> {
        let Some(tree) = self.current_tree().await? else {
            return Ok(Vec::new());
        };
        let needle = text.to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        Ok(tree
            .preorder()
            .filter(|node| {
                let attrs = node.attrs();
                attrs.text_str().to_lowercase().contains(&needle)
                    || attrs.description_str().to_lowercase().contains(&needle)
            })
            .map(|node| node.handle())
            .collect())
    }

    /// Dispatches an action. `Ok(true)` means the platform acknowledged it.
    async fn perform(&self, node: &NodeHandle, action: NodeAction)
        -> Result<bool, PlatformError>;

    /// System "back" navigation.
    async fn global_back(&self) -> Result<bool, PlatformError>;
}

/// Package-manager and activity-start capability of the host platform.
#[async_trait]
pub trait AppLifecyclePort: Send + Sync {
    async fn is_installed(&self, package: &str) -> Result<bool, PlatformError>;

    async fn launch_intent(&self, package: &str) -> Result<Option<LaunchIntent>, PlatformError>;

    async fn start_activity(&self, intent: &LaunchIntent) -> Result<(), PlatformError>;
}
