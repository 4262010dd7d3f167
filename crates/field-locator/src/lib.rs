//! Destination-field locator
//!
//! Finds the input field of a third-party ride app by heuristics, trying four
//! strategies in a fixed order:
//! - placeholder text contains a destination keyword
//! - current text contains a destination keyword
//! - class name marks an edit field
//! - any editable, enabled and focusable node
//!
//! Within a strategy the first node in pre-order wins.

pub mod diagnostics;
pub mod errors;
pub mod resolver;
pub mod strategies;
pub mod types;

pub use diagnostics::dump_tree;
pub use errors::LocatorError;
pub use resolver::FieldLocator;
pub use strategies::Strategy;
pub use types::{FieldCandidate, LocatorStrategy};
