//! Canonical formatter.
//!
//! Works line by line over the concrete syntax tree: every logical line is
//! re-indented to its block depth, continuation lines keep their offset
//! from the line they continue, and string interiors are left alone. Long
//! single-line bracket lists are then split one element per line until no
//! line can be split further.

use crate::config::FormatOptions;
use crate::error::EditError;
use crate::pool;
use crate::tree::build::{named_children, string_interior_rows};
use crate::ts::{validate_syntax, ParsedSource};
use std::collections::{HashMap, HashSet};
use tree_sitter::Node;

/// Upper bound on split passes; each pass splits one bracket.
const MAX_SPLITS: usize = 10_000;

const CLAUSES: [&str; 7] = [
    "elif_clause",
    "else_clause",
    "except_clause",
    "except_group_clause",
    "finally_clause",
    "case_clause",
    "decorator",
];

const SPLITTABLE: [&str; 6] = [
    "argument_list",
    "parameters",
    "list",
    "tuple",
    "dictionary",
    "set",
];

/// Format valid Python text.
///
/// Fails on input that does not parse, or if the result would not parse.
pub fn format(text: &str, options: &FormatOptions) -> Result<String, EditError> {
    let mut output = reindent(text, options)?;

    for _ in 0..MAX_SPLITS {
        match split_long_line(&output, options)? {
            Some(next) => output = next,
            None => break,
        }
    }

    validate_syntax(&output).map_err(|err| {
        EditError::violation(format!("formatted text does not parse ({err})"))
    })?;
    Ok(output)
}

struct Line {
    text: String,
    depth: usize,
    verbatim: bool,
}

fn parse(text: &str) -> Result<ParsedSource<'_>, EditError> {
    Ok(pool::with_parser(|parser| parser.parse_valid(text))??)
}

fn reindent(text: &str, options: &FormatOptions) -> Result<String, EditError> {
    let parsed = parse(text)?;
    let root = parsed.root_node();
    let verbatim_rows = string_interior_rows(root);

    let mut starts = HashMap::new();
    collect_line_starts(root, text, 0, &mut starts);

    let source = if options.normalize_quotes {
        normalize_quotes(text, root)
    } else {
        text.to_string()
    };

    let unit = options.indent_unit();
    let mut lines = Vec::new();
    // (original indent, new indent, depth) of the last logical line.
    let mut anchor = (0usize, 0usize, 0usize);

    for (row, raw) in source.lines().enumerate() {
        if verbatim_rows.contains(&row) {
            lines.push(Line {
                text: raw.to_string(),
                depth: anchor.2,
                verbatim: true,
            });
            continue;
        }

        let content = raw.trim();
        if content.is_empty() {
            lines.push(Line {
                text: String::new(),
                depth: anchor.2,
                verbatim: false,
            });
            continue;
        }

        let original = indent_of(raw);
        let (indent, depth) = match starts.get(&row) {
            Some(&LineStart::Statement(depth)) => {
                let indent = depth * unit.len();
                anchor = (original, indent, depth);
                (indent, depth)
            }
            Some(&LineStart::Comment(depth)) => (depth * unit.len(), depth),
            None => ((anchor.1 + original).saturating_sub(anchor.0), anchor.2),
        };
        lines.push(Line {
            text: format!("{}{content}", " ".repeat(indent)),
            depth,
            verbatim: false,
        });
    }

    Ok(assemble(lines))
}

/// What begins a row, with its block depth.
#[derive(Debug, Clone, Copy)]
enum LineStart {
    Statement(usize),
    /// Own-line comments sit at block depth but never anchor continuation
    /// lines.
    Comment(usize),
}

/// Record every row on which a logical line or an own-line comment starts.
fn collect_line_starts(
    node: Node<'_>,
    source: &str,
    depth: usize,
    starts: &mut HashMap<usize, LineStart>,
) {
    let inner = if node.kind() == "block" { depth + 1 } else { depth };
    for child in named_children(node) {
        if begins_row(child, source) {
            let start = if child.kind() == "comment" {
                statement_level(node).then_some(LineStart::Comment(inner))
            } else if starts_logical_line(node, child) {
                Some(LineStart::Statement(inner))
            } else {
                None
            };
            if let Some(start) = start {
                starts.entry(child.start_position().row).or_insert(start);
            }
        }
        collect_line_starts(child, source, inner, starts);
    }
}

fn starts_logical_line(parent: Node<'_>, child: Node<'_>) -> bool {
    matches!(
        parent.kind(),
        "module" | "block" | "decorated_definition"
    ) || CLAUSES.contains(&child.kind())
}

/// Outside any bracket: comments here follow block indentation.
fn statement_level(node: Node<'_>) -> bool {
    let kind = node.kind();
    matches!(kind, "module" | "block" | "decorated_definition")
        || kind.ends_with("_statement")
        || kind.ends_with("_definition")
        || CLAUSES.contains(&kind)
}

/// Nothing but whitespace precedes `node` on its row.
fn begins_row(node: Node<'_>, source: &str) -> bool {
    let start = node.start_byte();
    let line_start = source[..start].rfind('\n').map_or(0, |at| at + 1);
    source[line_start..start].trim().is_empty()
}

/// Rewrite single-quoted strings as double-quoted when the body contains
/// no double quote or backslash. Quote swaps keep byte offsets intact.
fn normalize_quotes(text: &str, root: Node<'_>) -> String {
    let mut bytes = text.as_bytes().to_vec();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.kind() == "string" {
            let range = node.byte_range();
            let literal = &text[range.clone()];
            let prefix = literal.len()
                - literal
                    .trim_start_matches(|c: char| "rRbBuUfF".contains(c))
                    .len();
            let quoted = &literal[prefix..];
            let simple = quoted.len() >= 2
                && quoted.starts_with('\'')
                && quoted.ends_with('\'')
                && !quoted.starts_with("'''");
            if simple {
                let body = &quoted[1..quoted.len() - 1];
                if !body.contains('"') && !body.contains('\\') {
                    bytes[range.start + prefix] = b'"';
                    bytes[range.end - 1] = b'"';
                }
            }
            // Strings nested in f-string interpolations stay as written.
            continue;
        }
        let mut cursor = node.walk();
        stack.extend(node.children(&mut cursor));
    }
    String::from_utf8(bytes).unwrap_or_else(|_| text.to_string())
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Collapse blank runs, trim blank edges, and join.
fn assemble(lines: Vec<Line>) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut pending_blanks = 0usize;

    for line in &lines {
        if !line.verbatim && line.text.is_empty() {
            pending_blanks += 1;
            continue;
        }
        if !out.is_empty() {
            let limit = if line.depth == 0 { 2 } else { 1 };
            for _ in 0..pending_blanks.min(limit) {
                out.push("");
            }
        }
        pending_blanks = 0;
        out.push(&line.text);
    }

    if out.is_empty() {
        return String::new();
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// Split the first single-row bracket list on an over-long line that
/// carries no comment, if there is one.
fn split_long_line(text: &str, options: &FormatOptions) -> Result<Option<String>, EditError> {
    let lines: Vec<&str> = text.lines().collect();
    let too_long = |row: usize| {
        lines
            .get(row)
            .is_some_and(|line| line.chars().count() > options.line_width)
    };
    if !(0..lines.len()).any(too_long) {
        return Ok(None);
    }

    let parsed = parse(text)?;
    let mut comment_rows = HashSet::new();
    let mut brackets = Vec::new();
    let mut stack = vec![parsed.root_node()];
    while let Some(node) = stack.pop() {
        let row = node.start_position().row;
        if node.kind() == "comment" {
            comment_rows.insert(row);
        } else if SPLITTABLE.contains(&node.kind())
            && node.end_position().row == row
            && too_long(row)
            && elements(node).next().is_some()
        {
            brackets.push(node);
        }
        // Brackets inside f-string interpolations must stay on one line.
        if node.kind() == "string" {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }

    Ok(brackets
        .into_iter()
        .find(|node| !comment_rows.contains(&node.start_position().row))
        .map(|bracket| explode(text, &lines, bracket, options)))
}

fn elements<'t>(bracket: Node<'t>) -> impl Iterator<Item = Node<'t>> {
    named_children(bracket)
        .into_iter()
        .filter(|child| child.kind() != "comment")
}

fn explode(text: &str, lines: &[&str], bracket: Node<'_>, options: &FormatOptions) -> String {
    let row = bracket.start_position().row;
    let line = lines[row];
    let line_start = line_offset(text, row);
    let open = bracket.start_byte() - line_start;
    let close = bracket.end_byte() - line_start;

    let indent = " ".repeat(indent_of(line));
    let inner = format!("{indent}{}", options.indent_unit());

    let mut replacement = vec![line[..open + 1].to_string()];
    for element in elements(bracket) {
        replacement.push(format!("{inner}{},", &text[element.byte_range()]));
    }
    replacement.push(format!("{indent}{}", &line[close - 1..]));

    let mut out: Vec<String> = lines[..row].iter().map(|l| l.to_string()).collect();
    out.extend(replacement);
    out.extend(lines[row + 1..].iter().map(|l| l.to_string()));
    let mut text = out.join("\n");
    text.push('\n');
    text
}

fn line_offset(text: &str, row: usize) -> usize {
    text.split_inclusive('\n').take(row).map(str::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(text: &str) -> String {
        format(text, &FormatOptions::default()).unwrap()
    }

    #[test]
    fn reindents_blocks() {
        assert_eq!(
            fmt("class A:\n  def f(self):\n        if x:\n              return 1\n"),
            "class A:\n    def f(self):\n        if x:\n            return 1\n"
        );
    }

    #[test]
    fn continuation_keeps_relative_offset() {
        assert_eq!(
            fmt("def f():\n  x = call(\n      1)\n"),
            "def f():\n    x = call(\n        1)\n"
        );
    }

    #[test]
    fn brackets_inside_fstrings_are_not_split() {
        let source = "x = f\"{compute(alpha_value, beta_value, gamma_value)}\"\n";
        let options = FormatOptions::with_widths(4, 30);
        assert_eq!(format(source, &options).unwrap(), source);
    }

    #[test]
    fn normalizes_simple_single_quotes() {
        assert_eq!(
            fmt("a = 'x'\nb = 'say \"hi\"'\nc = f'{a}'\n"),
            "a = \"x\"\nb = 'say \"hi\"'\nc = f\"{a}\"\n"
        );
    }

    #[test]
    fn string_interior_untouched() {
        let text = "def f():\n  s = '''\n  keep   \n'''\n  return s\n";
        assert_eq!(
            fmt(text),
            "def f():\n    s = '''\n  keep   \n'''\n    return s\n"
        );
    }

    #[test]
    fn collapses_blank_runs() {
        assert_eq!(
            fmt("\n\nimport os\n\n\n\n\nclass A:\n    x = 1\n\n\n\n    y = 2\n\n\n"),
            "import os\n\n\nclass A:\n    x = 1\n\n    y = 2\n"
        );
    }

    #[test]
    fn splits_long_call() {
        let options = FormatOptions::with_widths(4, 30);
        let out = format("result = compute(alpha, beta, gamma)\n", &options).unwrap();
        assert_eq!(out, "result = compute(\n    alpha,\n    beta,\n    gamma,\n)\n");
    }

    #[test]
    fn line_with_comment_is_not_split() {
        let options = FormatOptions::with_widths(4, 30);
        let text = "result = compute(alpha, beta, gamma)  # keep\n";
        assert_eq!(format(text, &options).unwrap(), text);
    }

    #[test]
    fn rejects_invalid_input() {
        assert!(matches!(
            format("def f(:\n", &FormatOptions::default()),
            Err(EditError::Syntax { .. })
        ));
    }

    #[test]
    fn empty_input() {
        assert_eq!(fmt(""), "");
    }
}
