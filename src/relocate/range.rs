use super::names::{free_identifiers, import_bindings};
use super::Relocation;
use crate::error::EditError;
use crate::pool;
use crate::tree::{self, build::named_children, NodeKind};
use crate::ts::validate_syntax;
use std::collections::BTreeSet;
use tracing::debug;

/// Where a line range moves from and to. All line numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    /// First moved line.
    pub start: usize,
    /// Last moved line, inclusive.
    pub end: usize,
    /// Line of the destination, in its original numbering, that the block
    /// is inserted before. Values past the end append.
    pub insert_at: usize,
    /// Copy the imports the block needs into the destination.
    pub carry_imports: bool,
}

/// Move lines `range.start..=range.end` of `source` into `destination`.
///
/// The block is moved verbatim. With `carry_imports`, every top-level import
/// of `source` binding a name the block references but does not define is
/// copied into `destination` after its last import, unless `destination`
/// already binds that name. Imports are never removed from `source`.
pub fn relocate_range(
    source: &str,
    destination: &str,
    range: LineRange,
) -> Result<Relocation, EditError> {
    let source_lines: Vec<&str> = source.lines().collect();
    if range.start == 0 || range.start > range.end || range.end > source_lines.len() {
        return Err(EditError::violation(format!(
            "line range {}..={} is outside the source ({} lines)",
            range.start,
            range.end,
            source_lines.len()
        )));
    }

    let block = &source_lines[range.start - 1..range.end];

    let mut dest_lines: Vec<String> = destination.lines().map(str::to_string).collect();
    let mut insert_at = range.insert_at.saturating_sub(1).min(dest_lines.len());

    let carried = if range.carry_imports {
        let free = free_identifiers(&tree::dedent(&block.join("\n")))?;
        debug!(free = ?free, "moved block references");
        carried_imports(source, destination, &free)?
    } else {
        Vec::new()
    };

    if !carried.is_empty() {
        let anchor = import_anchor(destination)?;
        let mut inserted = carried.clone();
        if !dest_lines.get(anchor).is_some_and(|line| line.trim().is_empty()) {
            inserted.push(String::new());
        }
        let shift = inserted.len();
        dest_lines.splice(anchor..anchor, inserted);
        if anchor <= insert_at {
            insert_at += shift;
        }
    }

    let mut moved: Vec<String> = block.iter().map(|line| line.to_string()).collect();
    moved.push(String::new());
    dest_lines.splice(insert_at..insert_at, moved);

    let remaining: Vec<&str> = source_lines[..range.start - 1]
        .iter()
        .chain(&source_lines[range.end..])
        .copied()
        .collect();

    let relocation = Relocation {
        source: join_lines(&remaining),
        destination: join_lines(&dest_lines),
        carried_imports: carried,
    };
    validate_side("source", &relocation.source)?;
    validate_side("destination", &relocation.destination)?;
    Ok(relocation)
}

/// Canonical text of the source imports the destination must gain, in
/// source order.
fn carried_imports(
    source: &str,
    destination: &str,
    free: &BTreeSet<String>,
) -> Result<Vec<String>, EditError> {
    let source_tree = tree::parse(source)?;
    let dest_tree = tree::parse(destination)?;
    let already_bound = import_bindings(&dest_tree);

    let needed: BTreeSet<_> = import_bindings(&source_tree)
        .into_iter()
        .filter(|(name, _)| free.contains(name) && !already_bound.contains_key(name))
        .map(|(_, id)| id)
        .collect();

    let mut carried: Vec<String> = Vec::new();
    for &id in source_tree.top_level() {
        if !needed.contains(&id) {
            continue;
        }
        let text = match source_tree.kind(id) {
            NodeKind::Import(import) => import.to_string(),
            NodeKind::ImportFrom(import) => import.to_string(),
            _ => continue,
        };
        if !carried.contains(&text) {
            carried.push(text);
        }
    }
    Ok(carried)
}

/// Line index just past the last top-level import of `text`, or past a
/// leading module docstring when there is no import.
fn import_anchor(text: &str) -> Result<usize, EditError> {
    let parsed = pool::with_parser(|parser| parser.parse(text))??;
    let root = parsed.root_node();
    let statements: Vec<_> = named_children(root)
        .into_iter()
        .filter(|node| node.kind() != "comment")
        .collect();

    let last_import = statements.iter().rev().find(|node| {
        matches!(
            node.kind(),
            "import_statement" | "import_from_statement" | "future_import_statement"
        )
    });
    if let Some(node) = last_import {
        return Ok(node.end_position().row + 1);
    }

    match statements.first() {
        Some(first)
            if first.kind() == "expression_statement"
                && first.named_child(0).is_some_and(|child| child.kind() == "string") =>
        {
            Ok(first.end_position().row + 1)
        }
        _ => Ok(0),
    }
}

fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let end = lines
        .iter()
        .rposition(|line| !line.as_ref().trim().is_empty())
        .map_or(0, |last| last + 1);
    let mut out = String::new();
    for line in &lines[..end] {
        out.push_str(line.as_ref());
        out.push('\n');
    }
    out
}

fn validate_side(side: &str, text: &str) -> Result<(), EditError> {
    validate_syntax(text).map_err(|err| {
        EditError::violation(format!("relocation would leave the {side} invalid ({err})"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: usize, end: usize, insert_at: usize, carry_imports: bool) -> LineRange {
        LineRange {
            start,
            end,
            insert_at,
            carry_imports,
        }
    }

    #[test]
    fn carries_only_missing_imports() {
        let source = "import os\nimport sys\n\nvalue = os.getcwd() + sys.argv[0]\n";
        let destination = "import os\n\nother = 1\n";

        let out = relocate_range(source, destination, range(4, 4, 3, true)).unwrap();

        assert_eq!(out.carried_imports, vec!["import sys"]);
        assert_eq!(
            out.destination,
            "import os\nimport sys\n\nvalue = os.getcwd() + sys.argv[0]\n\nother = 1\n"
        );
        assert_eq!(out.source, "import os\nimport sys\n");
    }

    #[test]
    fn insert_line_past_end_appends() {
        let out = relocate_range("a = 1\nb = 2\n", "c = 3\n", range(2, 2, 99, false)).unwrap();
        assert_eq!(out.source, "a = 1\n");
        assert_eq!(out.destination, "c = 3\nb = 2\n");
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = relocate_range("a = 1\nb = 2\n", "", range(2, 1, 1, false)).unwrap_err();
        assert!(matches!(err, EditError::StructuralViolation { .. }));
    }

    #[test]
    fn partial_statement_is_rejected() {
        let source = "call(\n    1,\n    2,\n)\n";
        let err = relocate_range(source, "", range(1, 2, 1, true)).unwrap_err();
        assert!(matches!(err, EditError::Syntax { .. }));
    }

    #[test]
    fn anchor_follows_docstring_without_imports() {
        assert_eq!(import_anchor("\"\"\"Doc.\n\nMore.\n\"\"\"\nx = 1\n").unwrap(), 4);
        assert_eq!(import_anchor("x = 1\n").unwrap(), 0);
    }
}
