//! Core types for the locator

use serde::{Deserialize, Serialize};
use ui_platform::{NodeAttrs, NodeHandle, NodeRef};

/// Locator strategy enumeration, declared in fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LocatorStrategy {
    /// Placeholder text contains a destination keyword
    HintMatch,

    /// Current text contains a destination keyword
    TextMatch,

    /// Class name marks an edit field
    ClassMatch,

    /// Any editable, enabled, focusable node
    AnyEditable,
}

impl LocatorStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            LocatorStrategy::HintMatch => "hint-match",
            LocatorStrategy::TextMatch => "text-match",
            LocatorStrategy::ClassMatch => "class-match",
            LocatorStrategy::AnyEditable => "any-editable",
        }
    }

    /// 1-based rank; lower is tried first.
    pub fn rank(&self) -> u8 {
        match self {
            LocatorStrategy::HintMatch => 1,
            LocatorStrategy::TextMatch => 2,
            LocatorStrategy::ClassMatch => 3,
            LocatorStrategy::AnyEditable => 4,
        }
    }

    /// Get all strategies in fallback order
    pub fn fallback_chain() -> [LocatorStrategy; 4] {
        [
            LocatorStrategy::HintMatch,
            LocatorStrategy::TextMatch,
            LocatorStrategy::ClassMatch,
            LocatorStrategy::AnyEditable,
        ]
    }
}

/// A located field plus the strategy that found it.
///
/// Only the handle outlives the snapshot; the attributes are a copy kept for
/// logging.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCandidate {
    pub handle: NodeHandle,
    pub strategy: LocatorStrategy,
    pub attrs: NodeAttrs,
    pub depth: usize,
}

impl FieldCandidate {
    pub fn new(node: &NodeRef<'_>, strategy: LocatorStrategy) -> Self {
        Self {
            handle: node.handle(),
            strategy,
            attrs: node.attrs().clone(),
            depth: node.depth(),
        }
    }

    pub fn priority(&self) -> u8 {
        self.strategy.rank()
    }
}
