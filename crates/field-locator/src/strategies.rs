//! Field matching strategies
//!
//! Four strategies in fallback order:
//! 1. Hint - placeholder text matching
//! 2. Text - current text matching
//! 3. Class - edit-field class name
//! 4. Any editable - last resort

use std::sync::Arc;

use ridescan_core_types::KeywordTables;
use tracing::debug;
use ui_platform::{NodeAttrs, NodeRef, UiTree};

use crate::types::{FieldCandidate, LocatorStrategy};

/// Strategy trait for field matching
pub trait Strategy: Send + Sync {
    /// Predicate evaluated against every node
    fn matches(&self, attrs: &NodeAttrs) -> bool;

    /// Get strategy type
    fn strategy_type(&self) -> LocatorStrategy;

    /// Get strategy name
    fn name(&self) -> &'static str {
        self.strategy_type().name()
    }

    /// First node in pre-order satisfying the predicate.
    fn find(&self, tree: &UiTree) -> Option<FieldCandidate> {
        let found = tree.preorder().find(|node| self.matches(node.attrs()))?;
        log_match(&found, self.strategy_type());
        Some(FieldCandidate::new(&found, self.strategy_type()))
    }
}

fn log_match(node: &NodeRef<'_>, strategy: LocatorStrategy) {
    let attrs = node.attrs();
    debug!(
        strategy = strategy.name(),
        class = %attrs.class_name,
        text = attrs.text_str(),
        hint = attrs.hint_str(),
        depth = node.depth(),
        "Found matching field"
    );
}

/// Placeholder-text strategy
pub struct HintStrategy {
    tables: Arc<KeywordTables>,
}

impl HintStrategy {
    pub fn new(tables: Arc<KeywordTables>) -> Self {
        Self { tables }
    }
}

impl Strategy for HintStrategy {
    fn matches(&self, attrs: &NodeAttrs) -> bool {
        attrs.editable && self.tables.hint_matches(attrs.hint_str())
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::HintMatch
    }
}

/// Visible-text strategy
pub struct TextStrategy {
    tables: Arc<KeywordTables>,
}

impl TextStrategy {
    pub fn new(tables: Arc<KeywordTables>) -> Self {
        Self { tables }
    }
}

impl Strategy for TextStrategy {
    fn matches(&self, attrs: &NodeAttrs) -> bool {
        attrs.editable && self.tables.text_matches(attrs.text_str())
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::TextMatch
    }
}

/// Class-name strategy
pub struct ClassStrategy {
    tables: Arc<KeywordTables>,
}

impl ClassStrategy {
    pub fn new(tables: Arc<KeywordTables>) -> Self {
        Self { tables }
    }
}

impl Strategy for ClassStrategy {
    fn matches(&self, attrs: &NodeAttrs) -> bool {
        attrs.editable && attrs.enabled && self.tables.is_edit_class(&attrs.class_name)
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::ClassMatch
    }
}

/// Catch-all strategy
pub struct AnyEditableStrategy;

impl Strategy for AnyEditableStrategy {
    fn matches(&self, attrs: &NodeAttrs) -> bool {
        attrs.editable && attrs.enabled && attrs.focusable
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::AnyEditable
    }
}
