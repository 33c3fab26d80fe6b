//! Tree Model: an arena of typed Python nodes.
//!
//! Nodes are addressed by [`NodeId`] and carry parent/child indices instead
//! of owning each other, so splicing, detaching and moving a subtree is an
//! index update. A detached node stays in the arena until the tree is
//! dropped; it simply stops being reachable from the root.
//!
//! [`parse`] builds a tree from text and [`serialize`] emits it back.
//! Emission is canonical: it preserves structure, not the original tokens.

pub(crate) mod build;
mod emit;
pub mod node;

pub use build::{dedent, parse};
pub use emit::serialize;
pub use node::{
    Declaration, Fragment, FragmentLine, Import, ImportAlias, ImportFrom, ImportNames, NodeId,
    NodeKind, Parameter, ParameterKind, Routine,
};

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Same-line trailing comment, including the leading `#`.
    comment: Option<String>,
}

/// A parsed Python module.
#[derive(Debug, Clone)]
pub struct SourceTree {
    nodes: Vec<NodeData>,
}

impl Default for SourceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceTree {
    /// An empty module.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Module,
                parent: None,
                children: Vec::new(),
                comment: None,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn top_level(&self) -> &[NodeId] {
        self.children(self.root())
    }

    pub fn comment(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].comment.as_deref()
    }

    pub fn set_comment(&mut self, id: NodeId, comment: Option<String>) {
        self.nodes[id.0].comment = comment;
    }

    /// Allocate a detached node.
    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            comment: None,
        });
        id
    }

    /// Splice a detached node into `parent` at `index` (clamped to the end).
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        debug_assert!(self.nodes[child.0].parent.is_none(), "child is attached");
        let siblings = &mut self.nodes[parent.0].children;
        let index = index.min(siblings.len());
        siblings.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    pub fn push_child(&mut self, parent: NodeId, child: NodeId) {
        let end = self.nodes[parent.0].children.len();
        self.insert_child(parent, end, child);
    }

    /// Index of `id` within its parent's children.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    /// Unlink a node from its parent. Returns the former parent and index.
    pub fn detach(&mut self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.position(id)?;
        self.nodes[parent.0].children.remove(index);
        self.nodes[id.0].parent = None;
        Some((parent, index))
    }

    /// Put detached `new` where `old` currently sits; `old` becomes detached.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Option<NodeId> {
        let (parent, index) = self.detach(old)?;
        self.insert_child(parent, index, new);
        Some(parent)
    }

    /// Remove all children of a container, leaving them detached.
    pub fn clear_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for &child in &children {
            self.nodes[child.0].parent = None;
        }
        children
    }

    /// Deep-copy the subtree rooted at `id` of `other` into this arena.
    /// The copy is detached.
    pub fn graft(&mut self, other: &SourceTree, id: NodeId) -> NodeId {
        let data = &other.nodes[id.0];
        let copy = self.alloc(data.kind.clone());
        self.nodes[copy.0].comment = data.comment.clone();
        for &child in &data.children {
            let child_copy = self.graft(other, child);
            self.push_child(copy, child_copy);
        }
        copy
    }

    /// Every node reachable below `id`, in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Whether any ancestor chain of `id` reaches the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root() {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Children of `id` that are not placeholders.
    pub fn semantic_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&child| !self.kind(child).is_placeholder())
    }

    /// Parse `text` and return its single top-level node grafted into this
    /// arena (detached). Blank lines and comments around it are ignored.
    pub fn graft_single(&mut self, text: &str) -> Result<NodeId, crate::EditError> {
        let other = parse(&dedent(text))?;
        let mut nodes = other.semantic_children(other.root());
        let first = nodes.next().ok_or_else(|| crate::EditError::SignatureMismatch {
            expected: "a single statement",
            found: "empty text".to_string(),
        })?;
        if nodes.next().is_some() {
            return Err(crate::EditError::SignatureMismatch {
                expected: "a single statement",
                found: "multiple statements".to_string(),
            });
        }
        Ok(self.graft(&other, first))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detach_and_reinsert_is_index_update() {
        let mut tree = parse("a = 1\nb = 2\nc = 3\n").unwrap();
        let b = tree.top_level()[1];

        assert_eq!(tree.detach(b), Some((tree.root(), 1)));
        assert!(!tree.is_attached(b));
        assert_eq!(serialize(&tree), "a = 1\nc = 3\n");

        tree.push_child(tree.root(), b);
        assert_eq!(serialize(&tree), "a = 1\nc = 3\nb = 2\n");
    }

    #[test]
    fn graft_copies_whole_subtree() {
        let source = parse("class A:\n    def f(self):\n        return 1\n").unwrap();
        let class = source.top_level()[0];

        let mut dest = SourceTree::new();
        let copy = dest.graft(&source, class);
        dest.push_child(dest.root(), copy);

        assert_eq!(serialize(&dest), serialize(&source));
        assert_eq!(dest.descendants(copy).len(), source.descendants(class).len());
    }

    #[test]
    fn graft_single_rejects_multiple_statements() {
        let mut tree = SourceTree::new();
        let err = tree.graft_single("a = 1\nb = 2\n").unwrap_err();
        assert!(matches!(err, crate::EditError::SignatureMismatch { .. }));
    }
}
