//! Mutation Operations.
//!
//! Each operation is "locate, then splice" on a [`SourceTree`]. The text
//! level entry point [`edit`] parses the input, runs one tree operation,
//! serializes, and re-validates the output so that an operation can never
//! hand back text that does not parse.

mod delete;
mod insert;
mod parameter;
mod replace;

pub use delete::delete_declaration;
pub use insert::{insert_declaration, insert_imports, insert_routine};
pub(crate) use insert::append_to_body;
pub use parameter::{insert_parameter, NewParameter};
pub use replace::{replace_declaration, replace_routine_body};

use crate::error::EditError;
use crate::tree::{self, NodeId, SourceTree};
use crate::ts::validate_syntax;

/// Parse `text`, apply `operation` to the tree, and return the new text.
pub fn edit<F, R>(text: &str, operation: F) -> Result<String, EditError>
where
    F: FnOnce(&mut SourceTree) -> Result<R, EditError>,
{
    let mut tree = tree::parse(text)?;
    operation(&mut tree)?;
    finish(&tree)
}

/// Serialize and re-validate a mutated tree.
pub fn finish(tree: &SourceTree) -> Result<String, EditError> {
    let output = tree::serialize(tree);
    validate_syntax(&output).map_err(|err| {
        EditError::violation(format!("edit would produce invalid source ({err})"))
    })?;
    Ok(output)
}

/// Insert a blank-line placeholder at `index` of `parent`.
pub(crate) fn insert_spacer(tree: &mut SourceTree, parent: NodeId, index: usize) {
    let spacer = tree.alloc(tree::NodeKind::Placeholder);
    tree.insert_child(parent, index, spacer);
}
