use crate::error::EditError;
use crate::locate::{locate, MatchPolicy, SearchHorizon, Target};
use crate::tree::{NodeId, SourceTree};

/// Remove the top-level class named `declaration`, together with the
/// blank-line placeholders directly before and after it.
pub fn delete_declaration(tree: &mut SourceTree, declaration: &str) -> Result<NodeId, EditError> {
    let id = locate(
        tree,
        &Target::Declaration(declaration.to_string()),
        SearchHorizon::TopLevel,
        MatchPolicy::Unique,
    )?;

    let (parent, index) = tree
        .detach(id)
        .ok_or_else(|| EditError::violation("class is not attached to the module"))?;

    // Trailing spacers first so the leading index stays valid.
    while let Some(&next) = tree.children(parent).get(index) {
        if !tree.kind(next).is_placeholder() {
            break;
        }
        tree.detach(next);
    }
    let mut index = index;
    while index > 0 {
        let prev = tree.children(parent)[index - 1];
        if !tree.kind(prev).is_placeholder() {
            break;
        }
        tree.detach(prev);
        index -= 1;
    }

    Ok(id)
}
