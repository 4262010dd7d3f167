//! Snapshot model of the platform accessibility tree.
//!
//! A [`UiTree`] is only valid for the screen it was captured from. Nothing in
//! the automation core keeps a borrowed node across a suspension point; what
//! survives is a [`NodeHandle`], which the platform checks against the current
//! [`TreeGeneration`] before dispatching an action.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Pre-order index of a node inside one snapshot.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Monotonic counter bumped by the platform whenever the window content is replaced.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TreeGeneration(pub u64);

impl TreeGeneration {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Owned reference to a node that can outlive the snapshot it came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct NodeHandle {
    pub generation: TreeGeneration,
    pub id: NodeId,
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen{}#{}", self.generation.0, self.id.0)
    }
}

fn default_true() -> bool {
    true
}

/// Semantic attributes exposed by the accessibility layer for one node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttrs {
    #[serde(default, rename = "class")]
    pub class_name: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub focusable: bool,
    #[serde(default)]
    pub clickable: bool,
}

impl Default for NodeAttrs {
    fn default() -> Self {
        Self {
            class_name: String::new(),
            text: None,
            hint: None,
            description: None,
            enabled: true,
            editable: false,
            focusable: false,
            clickable: false,
        }
    }
}

impl NodeAttrs {
    pub fn text_str(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn hint_str(&self) -> &str {
        self.hint.as_deref().unwrap_or("")
    }

    pub fn description_str(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// Class name without its package prefix, e.g. `EditText`.
    pub fn short_class(&self) -> &str {
        self.class_name
            .rsplit('.')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown")
    }
}

/// Nested, serialisable description of a tree. Used to build snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(flatten)]
    pub attrs: NodeAttrs,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            attrs: NodeAttrs {
                class_name: class_name.into(),
                ..NodeAttrs::default()
            },
            children: Vec::new(),
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.attrs.text = Some(text.into());
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.attrs.hint = Some(hint.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.attrs.description = Some(description.into());
        self
    }

    pub fn editable(mut self) -> Self {
        self.attrs.editable = true;
        self.attrs.focusable = true;
        self
    }

    pub fn clickable(mut self) -> Self {
        self.attrs.clickable = true;
        self
    }

    pub fn focusable(mut self, focusable: bool) -> Self {
        self.attrs.focusable = focusable;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.attrs.enabled = enabled;
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = NodeSpec>) -> Self {
        self.children.extend(children);
        self
    }
}

#[derive(Clone, Debug)]
struct Slot {
    attrs: NodeAttrs,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    depth: usize,
}

/// Arena-backed snapshot. Slots are stored in pre-order, so index order is
/// traversal order.
#[derive(Clone, Debug)]
pub struct UiTree {
    generation: TreeGeneration,
    slots: Vec<Slot>,
}

impl UiTree {
    pub fn empty(generation: TreeGeneration) -> Self {
        Self {
            generation,
            slots: Vec::new(),
        }
    }

    pub fn from_spec(generation: TreeGeneration, spec: &NodeSpec) -> Self {
        let mut tree = Self::empty(generation);
        tree.push(spec, None, 0);
        tree
    }

    fn push(&mut self, spec: &NodeSpec, parent: Option<NodeId>, depth: usize) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Slot {
            attrs: spec.attrs.clone(),
            parent,
            children: Vec::with_capacity(spec.children.len()),
            depth,
        });
        for child in &spec.children {
            let child_id = self.push(child, Some(id), depth + 1);
            self.slots[id.0 as usize].children.push(child_id);
        }
        id
    }

    pub fn generation(&self) -> TreeGeneration {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn root(&self) -> Option<NodeRef<'_>> {
        self.get(NodeId(0))
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.slots
            .get(id.0 as usize)
            .map(|_| NodeRef { tree: self, id })
    }

    /// Resolves a handle against this snapshot; `None` when the handle is
    /// from another generation.
    pub fn resolve(&self, handle: &NodeHandle) -> Option<NodeRef<'_>> {
        if handle.generation != self.generation {
            return None;
        }
        self.get(handle.id)
    }

    /// Depth-first, pre-order walk over every node.
    pub fn preorder(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        (0..self.slots.len()).map(move |idx| NodeRef {
            tree: self,
            id: NodeId(idx as u32),
        })
    }

    fn slot(&self, id: NodeId) -> &Slot {
        &self.slots[id.0 as usize]
    }
}

/// Borrowed view of one node in a snapshot.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a UiTree,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn handle(&self) -> NodeHandle {
        NodeHandle {
            generation: self.tree.generation,
            id: self.id,
        }
    }

    pub fn attrs(&self) -> &'a NodeAttrs {
        &self.tree.slot(self.id).attrs
    }

    pub fn depth(&self) -> usize {
        self.tree.slot(self.id).depth
    }

    /// Lookup-only back reference.
    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.tree.slot(self.id).parent.and_then(|p| self.tree.get(p))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        tree.slot(self.id)
            .children
            .iter()
            .map(move |id| NodeRef { tree, id: *id })
    }

    pub fn child_count(&self) -> usize {
        self.tree.slot(self.id).children.len()
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attrs = self.attrs();
        f.debug_struct("NodeRef")
            .field("handle", &self.handle())
            .field("class", &attrs.class_name)
            .field("text", &attrs.text)
            .field("hint", &attrs.hint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UiTree {
        let spec = NodeSpec::new("android.widget.FrameLayout").with_children([
            NodeSpec::new("android.widget.LinearLayout")
                .child(NodeSpec::new("android.widget.TextView").text("Hello")),
            NodeSpec::new("android.widget.EditText")
                .hint("Where to?")
                .editable(),
        ]);
        UiTree::from_spec(TreeGeneration(3), &spec)
    }

    #[test]
    fn ids_follow_preorder() {
        let tree = sample();
        let classes: Vec<_> = tree.preorder().map(|n| n.attrs().short_class()).collect();
        assert_eq!(
            classes,
            vec!["FrameLayout", "LinearLayout", "TextView", "EditText"]
        );
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn parent_and_depth_are_tracked() {
        let tree = sample();
        let text_view = tree.get(NodeId(2)).unwrap();
        assert_eq!(text_view.depth(), 2);
        assert_eq!(text_view.parent().unwrap().id(), NodeId(1));
        assert!(tree.root().unwrap().parent().is_none());
        assert_eq!(tree.root().unwrap().child_count(), 2);
    }

    #[test]
    fn handles_do_not_resolve_across_generations() {
        let tree = sample();
        let handle = tree.get(NodeId(3)).unwrap().handle();
        assert!(tree.resolve(&handle).is_some());

        let stale = NodeHandle {
            generation: TreeGeneration(2),
            id: NodeId(3),
        };
        assert!(tree.resolve(&stale).is_none());
    }

    #[test]
    fn empty_tree_has_no_root() {
        let tree = UiTree::empty(TreeGeneration::default());
        assert!(tree.root().is_none());
        assert_eq!(tree.preorder().count(), 0);
    }
}
