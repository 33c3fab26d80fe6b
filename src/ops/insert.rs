use super::insert_spacer;
use crate::error::EditError;
use crate::locate::{locate, MatchPolicy, SearchHorizon, Target};
use crate::tree::{self, NodeId, NodeKind, SourceTree};

/// Insert a class after the class named `after`, or append it to the end
/// of the module.
pub fn insert_declaration(
    tree: &mut SourceTree,
    declaration: &str,
    after: Option<&str>,
) -> Result<NodeId, EditError> {
    let new = tree.graft_single(declaration)?;
    expect_kind(tree, new, "a class definition", |kind| {
        matches!(kind, NodeKind::Declaration(_))
    })?;

    let root = tree.root();
    match after {
        Some(anchor) => {
            let anchor = locate(
                tree,
                &Target::Declaration(anchor.to_string()),
                SearchHorizon::TopLevel,
                MatchPolicy::Unique,
            )?;
            let index = tree.position(anchor).unwrap_or(0) + 1;
            insert_spacer(tree, root, index);
            tree.insert_child(root, index + 1, new);
        }
        None => {
            let end = tree.top_level().len();
            if end > 0 {
                insert_spacer(tree, root, end);
            }
            tree.push_child(root, new);
        }
    }

    Ok(new)
}

/// Insert import statements as one block after the last top-level import.
///
/// Without existing imports the block goes to the top of the module, after
/// a leading module docstring. Statements already present (same canonical
/// form) are skipped. Returns the inserted nodes.
pub fn insert_imports(tree: &mut SourceTree, imports: &[String]) -> Result<Vec<NodeId>, EditError> {
    let existing: Vec<String> = tree
        .top_level()
        .iter()
        .filter(|&&id| tree.kind(id).is_import())
        .map(|&id| render(tree, id))
        .collect();

    let mut new_nodes = Vec::new();
    let mut seen = existing;
    for text in imports {
        let parsed = tree::parse(&tree::dedent(text))?;
        for id in parsed.semantic_children(parsed.root()) {
            let kind = parsed.kind(id);
            if !kind.is_import() {
                return Err(EditError::SignatureMismatch {
                    expected: "an import statement",
                    found: kind.label(),
                });
            }
            let rendered = render(&parsed, id);
            if seen.contains(&rendered) {
                continue;
            }
            seen.push(rendered);
            new_nodes.push(tree.graft(&parsed, id));
        }
    }

    if new_nodes.is_empty() {
        return Ok(new_nodes);
    }

    let root = tree.root();
    let mut index = import_insertion_index(tree);
    for &node in &new_nodes {
        tree.insert_child(root, index, node);
        index += 1;
    }
    if index < tree.top_level().len() {
        insert_spacer(tree, root, index);
    }

    Ok(new_nodes)
}

/// Index right after the last top-level import, or after a leading module
/// docstring when there are no imports.
pub(crate) fn import_insertion_index(tree: &SourceTree) -> usize {
    let top = tree.top_level();
    if let Some(last) = top.iter().rposition(|&id| tree.kind(id).is_import()) {
        return last + 1;
    }
    match top.iter().position(|&id| !tree.kind(id).is_placeholder()) {
        Some(first) if is_docstring(tree.kind(top[first])) => first + 1,
        _ => 0,
    }
}

fn is_docstring(kind: &NodeKind) -> bool {
    match kind {
        NodeKind::Expression(fragment) => fragment
            .lines
            .first()
            .map(|line| {
                let text = line.text.trim_start_matches(|c: char| "rRbBuU".contains(c));
                text.starts_with('"') || text.starts_with('\'')
            })
            .unwrap_or(false),
        _ => false,
    }
}

/// Insert a method into the class named `declaration`, after the method
/// named `after` or at the end of the class body.
pub fn insert_routine(
    tree: &mut SourceTree,
    declaration: &str,
    routine: &str,
    after: Option<&str>,
) -> Result<NodeId, EditError> {
    let decl = locate(
        tree,
        &Target::Declaration(declaration.to_string()),
        SearchHorizon::FullTree,
        MatchPolicy::Unique,
    )?;
    let anchor = match after {
        Some(name) => Some(locate(
            tree,
            &Target::Routine(name.to_string()),
            SearchHorizon::Within(decl),
            MatchPolicy::Unique,
        )?),
        None => None,
    };

    let new = tree.graft_single(routine)?;
    expect_kind(tree, new, "a function definition", |kind| {
        matches!(kind, NodeKind::Routine(_))
    })?;

    match anchor {
        Some(anchor) => {
            let index = tree.position(anchor).unwrap_or(0) + 1;
            insert_spacer(tree, decl, index);
            tree.insert_child(decl, index + 1, new);
        }
        None => append_to_body(tree, decl, new),
    }

    Ok(new)
}

/// Append `node` to a container body, separated by a blank line. A body
/// consisting of a lone `pass` is replaced.
pub(crate) fn append_to_body(tree: &mut SourceTree, container: NodeId, node: NodeId) {
    let semantic: Vec<NodeId> = tree.semantic_children(container).collect();
    if let [only] = semantic[..] {
        if is_pass(tree.kind(only)) {
            tree.clear_children(container);
        }
    }

    if tree.semantic_children(container).next().is_some() {
        let end = tree.children(container).len();
        insert_spacer(tree, container, end);
    }
    tree.push_child(container, node);
}

fn is_pass(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::Statement(fragment) if fragment.text() == "pass")
}

pub(crate) fn expect_kind(
    tree: &SourceTree,
    id: NodeId,
    expected: &'static str,
    check: impl Fn(&NodeKind) -> bool,
) -> Result<(), EditError> {
    let kind = tree.kind(id);
    if check(kind) {
        Ok(())
    } else {
        Err(EditError::SignatureMismatch {
            expected,
            found: kind.label(),
        })
    }
}

fn render(tree: &SourceTree, id: NodeId) -> String {
    match tree.kind(id) {
        NodeKind::Import(import) => import.to_string(),
        NodeKind::ImportFrom(import) => import.to_string(),
        other => other.label(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::edit;

    #[test]
    fn import_goes_after_docstring_when_module_has_none() {
        let out = edit("\"\"\"Doc.\"\"\"\nx = 1\n", |tree| {
            insert_imports(tree, &["import os".to_string()])
        })
        .unwrap();
        assert_eq!(out, "\"\"\"Doc.\"\"\"\nimport os\n\nx = 1\n");
    }

    #[test]
    fn duplicate_import_is_skipped() {
        let out = edit("import os\n", |tree| {
            insert_imports(tree, &["import os".to_string(), "import sys".to_string()])
        })
        .unwrap();
        assert_eq!(out, "import os\nimport sys\n");
    }

    #[test]
    fn routine_replaces_lone_pass() {
        let out = edit("class A:\n    pass\n", |tree| {
            insert_routine(tree, "A", "def f(self):\n    return 1", None)
        })
        .unwrap();
        assert_eq!(out, "class A:\n    def f(self):\n        return 1\n");
    }
}
