use super::insert::expect_kind;
use crate::error::EditError;
use crate::locate::{locate, routine_horizon, MatchPolicy, SearchHorizon, Target};
use crate::tree::{self, NodeId, NodeKind, SourceTree};

/// Replace the body of the routine named `routine`, keeping its signature
/// and decorators.
///
/// `body` may be written at any indentation; it is dedented and parsed on
/// its own.
pub fn replace_routine_body(
    tree: &mut SourceTree,
    routine: &str,
    scope: Option<&str>,
    body: &str,
) -> Result<NodeId, EditError> {
    let horizon = routine_horizon(tree, scope)?;
    let id = locate(
        tree,
        &Target::Routine(routine.to_string()),
        horizon,
        MatchPolicy::Unique,
    )?;

    let dedented = tree::dedent(body);
    if dedented.trim().is_empty() {
        return Err(EditError::violation("replacement body is empty"));
    }
    // Parsed as a module so string literals keep their exact text.
    let replacement = tree::parse(&dedented)?;

    tree.clear_children(id);
    for &statement in replacement.children(replacement.root()) {
        let copy = tree.graft(&replacement, statement);
        tree.push_child(id, copy);
    }

    Ok(id)
}

/// Replace the top-level class named `declaration` with `replacement`.
///
/// The replacement keeps the original class name whatever name its text
/// declares.
pub fn replace_declaration(
    tree: &mut SourceTree,
    declaration: &str,
    replacement: &str,
) -> Result<NodeId, EditError> {
    let old = locate(
        tree,
        &Target::Declaration(declaration.to_string()),
        SearchHorizon::TopLevel,
        MatchPolicy::Unique,
    )?;

    let new = tree.graft_single(replacement)?;
    expect_kind(tree, new, "a class definition", |kind| {
        matches!(kind, NodeKind::Declaration(_))
    })?;
    if let NodeKind::Declaration(decl) = tree.kind_mut(new) {
        decl.name = declaration.to_string();
    }

    tree.replace(old, new);
    Ok(new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::edit;

    #[test]
    fn body_replacement_keeps_signature() {
        let source = "@cache\ndef f(a: int) -> int:\n    return a\n";
        let out = edit(source, |tree| {
            replace_routine_body(tree, "f", None, "        b = a * 2\n        return b\n")
        })
        .unwrap();
        assert_eq!(
            out,
            "@cache\ndef f(a: int) -> int:\n    b = a * 2\n    return b\n"
        );
    }

    #[test]
    fn multiline_string_in_body_keeps_its_value() {
        let out = edit("def f():\n    pass\n", |tree| {
            replace_routine_body(tree, "f", None, "x = \"\"\"\nhello\n\"\"\"\nreturn x")
        })
        .unwrap();
        assert_eq!(out, "def f():\n    x = \"\"\"\nhello\n\"\"\"\n    return x\n");
    }

    #[test]
    fn body_with_syntax_error_is_rejected() {
        let err = edit("def f():\n    pass\n", |tree| {
            replace_routine_body(tree, "f", None, "return (")
        })
        .unwrap_err();
        assert!(matches!(err, EditError::Syntax { .. }));
    }

    #[test]
    fn replacement_class_takes_original_name() {
        let out = edit("class A:\n    x = 1\n\nclass B:\n    pass\n", |tree| {
            replace_declaration(tree, "A", "class Renamed(Base):\n    y = 2\n")
        })
        .unwrap();
        assert_eq!(out, "class A(Base):\n    y = 2\n\nclass B:\n    pass\n");
    }

    #[test]
    fn replacement_must_be_a_class() {
        let err = edit("class A:\n    pass\n", |tree| {
            replace_declaration(tree, "A", "def A():\n    pass\n")
        })
        .unwrap_err();
        assert!(matches!(err, EditError::SignatureMismatch { .. }));
    }
}
