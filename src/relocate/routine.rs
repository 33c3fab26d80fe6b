use super::Relocation;
use crate::error::EditError;
use crate::locate::{locate, MatchPolicy, SearchHorizon, Target};
use crate::ops::{append_to_body, finish};
use crate::tree::{self, NodeId, SourceTree};

/// Names a method and the classes it moves between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutineMove<'a> {
    pub routine: &'a str,
    pub from: &'a str,
    pub to: &'a str,
}

/// Move a method from one class of `source` to a class of `destination`.
///
/// No import analysis is done: the destination is trusted to already import
/// what the method uses.
pub fn relocate_routine(
    source: &str,
    destination: &str,
    request: RoutineMove<'_>,
) -> Result<Relocation, EditError> {
    let mut source_tree = tree::parse(source)?;
    let mut dest_tree = tree::parse(destination)?;

    let routine = locate_routine(&source_tree, request)?;
    let target = locate_class(&dest_tree, request.to)?;

    source_tree.detach(routine);
    let moved = dest_tree.graft(&source_tree, routine);
    append_to_body(&mut dest_tree, target, moved);

    Ok(Relocation {
        source: finish(&source_tree)?,
        destination: finish(&dest_tree)?,
        carried_imports: Vec::new(),
    })
}

/// Move a method between two classes of the same module.
pub fn relocate_routine_within(text: &str, request: RoutineMove<'_>) -> Result<String, EditError> {
    let mut tree = tree::parse(text)?;

    let routine = locate_routine(&tree, request)?;
    let target = locate_class(&tree, request.to)?;
    if tree.descendants(routine).contains(&target) {
        return Err(EditError::violation(format!(
            "class '{}' is nested inside the function being moved",
            request.to
        )));
    }

    tree.detach(routine);
    append_to_body(&mut tree, target, routine);
    finish(&tree)
}

fn locate_routine(tree: &SourceTree, request: RoutineMove<'_>) -> Result<NodeId, EditError> {
    let from = locate_class(tree, request.from)?;
    locate(
        tree,
        &Target::Routine(request.routine.to_string()),
        SearchHorizon::Within(from),
        MatchPolicy::Unique,
    )
}

fn locate_class(tree: &SourceTree, name: &str) -> Result<NodeId, EditError> {
    locate(
        tree,
        &Target::Declaration(name.to_string()),
        SearchHorizon::FullTree,
        MatchPolicy::Unique,
    )
}
