//! Field resolver with fallback chain orchestration

use std::sync::Arc;

use ridescan_core_types::KeywordTables;
use tracing::{debug, info};
use ui_platform::{AccessibilityPort, UiTree};

use crate::diagnostics::dump_tree;
use crate::errors::LocatorError;
use crate::strategies::*;
use crate::types::{FieldCandidate, LocatorStrategy};

const DUMP_DEPTH: usize = 3;

pub struct FieldLocator {
    hint_strategy: Arc<HintStrategy>,
    text_strategy: Arc<TextStrategy>,
    class_strategy: Arc<ClassStrategy>,
    any_strategy: Arc<AnyEditableStrategy>,
    dump_screens: bool,
}

impl FieldLocator {
    pub fn new(tables: Arc<KeywordTables>) -> Self {
        Self {
            hint_strategy: Arc::new(HintStrategy::new(tables.clone())),
            text_strategy: Arc::new(TextStrategy::new(tables.clone())),
            class_strategy: Arc::new(ClassStrategy::new(tables)),
            any_strategy: Arc::new(AnyEditableStrategy),
            dump_screens: true,
        }
    }

    /// Disable the DEBUG tree dump emitted before each locate pass.
    pub fn without_dumps(mut self) -> Self {
        self.dump_screens = false;
        self
    }

    fn get_strategy(&self, strategy_type: LocatorStrategy) -> Arc<dyn Strategy> {
        match strategy_type {
            LocatorStrategy::HintMatch => self.hint_strategy.clone(),
            LocatorStrategy::TextMatch => self.text_strategy.clone(),
            LocatorStrategy::ClassMatch => self.class_strategy.clone(),
            LocatorStrategy::AnyEditable => self.any_strategy.clone(),
        }
    }

    /// Best candidate from the first strategy that matches anything.
    pub fn locate(&self, tree: &UiTree) -> Option<FieldCandidate> {
        if tree.is_empty() {
            debug!("Empty tree, nothing to locate");
            return None;
        }
        if self.dump_screens {
            dump_tree(tree, DUMP_DEPTH);
        }

        for strategy_type in LocatorStrategy::fallback_chain() {
            debug!("Trying strategy: {}", strategy_type.name());
            if let Some(candidate) = self.locate_with(tree, strategy_type) {
                info!(
                    "Located destination field using {} strategy: {} (depth {})",
                    strategy_type.name(),
                    candidate.handle,
                    candidate.depth
                );
                return Some(candidate);
            }
        }

        debug!("All locator strategies exhausted");
        None
    }

    /// Run a single strategy.
    pub fn locate_with(&self, tree: &UiTree, strategy: LocatorStrategy) -> Option<FieldCandidate> {
        self.get_strategy(strategy).find(tree)
    }

    /// Fetch the live tree and locate on it.
    pub async fn locate_live(
        &self,
        port: &dyn AccessibilityPort,
    ) -> Result<Option<FieldCandidate>, LocatorError> {
        let tree = port
            .current_tree()
            .await?
            .ok_or(LocatorError::TreeUnavailable)?;
        Ok(self.locate(&tree))
    }
}

impl Default for FieldLocator {
    fn default() -> Self {
        Self::new(Arc::new(KeywordTables::default()))
    }
}
