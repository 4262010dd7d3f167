//! Interstitial dismissal after launch.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use ui_platform::{AccessibilityPort, NodeAction, NodeHandle, NodeRef, UiTree};

use crate::errors::FlowError;
use crate::policy::AutomationPolicy;
use crate::wait::settle;

/// First node (in `labels` priority order, then pre-order) whose visible text
/// equals a label, ignoring case and surrounding whitespace. The returned
/// handle is the node itself when clickable, otherwise its nearest clickable
/// ancestor; labels without a clickable target are skipped.
pub fn find_labelled_button(tree: &UiTree, labels: &[String]) -> Option<(String, NodeHandle)> {
    for label in labels {
        let wanted = label.trim();
        if wanted.is_empty() {
            continue;
        }
        let target = tree
            .preorder()
            .filter(|node| node.attrs().text_str().trim().eq_ignore_ascii_case(wanted))
            .find_map(clickable_target);
        if let Some(handle) = target {
            return Some((label.clone(), handle));
        }
    }
    None
}

fn clickable_target(node: NodeRef<'_>) -> Option<NodeHandle> {
    let mut current = Some(node);
    while let Some(n) = current {
        if n.attrs().clickable && n.attrs().enabled {
            return Some(n.handle());
        }
        current = n.parent();
    }
    None
}

/// Best-effort dismissal of permission, onboarding and guest prompts.
pub struct ScreenAdvancer {
    port: Arc<dyn AccessibilityPort>,
    labels: Vec<String>,
    policy: AutomationPolicy,
}

impl ScreenAdvancer {
    pub fn new(port: Arc<dyn AccessibilityPort>, labels: Vec<String>, policy: AutomationPolicy) -> Self {
        Self {
            port,
            labels,
            policy,
        }
    }

    /// Runs the bounded dismissal rounds and returns how many prompts were
    /// clicked away. Only cancellation is an error; platform faults end the
    /// current round.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<u32, FlowError> {
        let mut dismissed = 0;
        for round in 1..=self.policy.advancer_rounds {
            settle(cancel, self.policy.advancer_settle()).await?;

            let tree = match self.port.current_tree().await {
                Ok(Some(tree)) => tree,
                Ok(None) => {
                    debug!(round, "No window content yet");
                    continue;
                }
                Err(err) => {
                    warn!(round, error = %err, "Tree read failed while advancing screens");
                    continue;
                }
            };

            let Some((label, handle)) = find_labelled_button(&tree, &self.labels) else {
                debug!(round, "No interstitial found");
                continue;
            };
            info!(round, "Clicking '{}' to proceed", label);
            match self.port.perform(&handle, NodeAction::Click).await {
                Ok(true) => dismissed += 1,
                Ok(false) => debug!(label = %label, "Click not acknowledged"),
                Err(err) => warn!(label = %label, error = %err, "Click failed"),
            }
            settle(cancel, self.policy.advancer_click_settle()).await?;
        }
        Ok(dismissed)
    }
}
