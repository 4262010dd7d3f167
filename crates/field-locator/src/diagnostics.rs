use tracing::debug;
use ui_platform::{NodeRef, UiTree};

/// Renders the interesting part of a screen (nodes carrying text, hint,
/// description, or editable) down to `max_depth`, logging each line under the
/// `screen_structure` target. The lines are also returned for callers that
/// want to print them.
pub fn dump_tree(tree: &UiTree, max_depth: usize) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(root) = tree.root() {
        walk(root, max_depth, &mut lines);
    }
    for line in &lines {
        debug!(target: "screen_structure", "{}", line);
    }
    lines
}

fn walk(node: NodeRef<'_>, max_depth: usize, lines: &mut Vec<String>) {
    let depth = node.depth();
    if depth > max_depth {
        return;
    }
    let attrs = node.attrs();
    if !attrs.text_str().is_empty()
        || !attrs.hint_str().is_empty()
        || !attrs.description_str().is_empty()
        || attrs.editable
    {
        lines.push(format!(
            "{}{} - Text:'{}', Hint:'{}', Desc:'{}', Editable:{}",
            "  ".repeat(depth),
            attrs.short_class(),
            attrs.text_str(),
            attrs.hint_str(),
            attrs.description_str(),
            attrs.editable
        ));
    }
    for child in node.children() {
        walk(child, max_depth, lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ui_platform::{NodeSpec, TreeGeneration};

    #[test]
    fn skips_silent_nodes_and_deep_levels() {
        let mut deepest = NodeSpec::new("android.widget.TextView").text("too deep");
        for _ in 0..4 {
            deepest = NodeSpec::new("android.widget.FrameLayout").child(deepest);
        }
        let spec = NodeSpec::new("android.widget.FrameLayout").with_children([
            NodeSpec::new("android.widget.EditText")
                .hint("Where to?")
                .editable(),
            deepest,
        ]);
        let lines = dump_tree(&UiTree::from_spec(TreeGeneration(1), &spec), 3);
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0],
            "  EditText - Text:'', Hint:'Where to?', Desc:'', Editable:true"
        );
    }
}
