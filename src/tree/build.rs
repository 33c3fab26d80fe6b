//! Building a [`SourceTree`] from the tree-sitter concrete syntax tree.

use super::node::{
    Declaration, Fragment, FragmentLine, Import, ImportAlias, ImportFrom, ImportNames, NodeId,
    NodeKind, Parameter, ParameterKind, Routine,
};
use super::SourceTree;
use crate::error::EditError;
use crate::pool;
use std::collections::HashSet;
use tree_sitter::Node;

/// Parse Python text into a [`SourceTree`].
///
/// Fails with [`EditError::Syntax`] on the first ERROR or MISSING node;
/// a tree is only ever built from fully valid input.
pub fn parse(text: &str) -> Result<SourceTree, EditError> {
    let parsed = pool::with_parser(|parser| parser.parse_valid(text))??;

    let root = parsed.root_node();
    let mut builder = Builder {
        source: text,
        string_rows: string_interior_rows(root),
        tree: SourceTree::new(),
    };
    let module = builder.tree.root();
    builder.body(module, named_children(root), None)?;
    Ok(builder.tree)
}

/// Remove the common leading whitespace of all non-blank lines.
///
/// Lines that continue a string literal from an earlier line are part of
/// its value: they neither set the margin nor lose any whitespace.
pub fn dedent(text: &str) -> String {
    let literal_rows = continued_string_rows(text);
    let margin = text
        .lines()
        .enumerate()
        .filter(|(row, line)| !literal_rows.contains(row) && !line.trim().is_empty())
        .map(|(_, line)| leading_whitespace(line))
        .min()
        .unwrap_or(0);

    text.lines()
        .enumerate()
        .map(|(row, line)| {
            if literal_rows.contains(&row) {
                line
            } else if line.trim().is_empty() {
                ""
            } else {
                &line[margin..]
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rows of `text` that begin inside a string literal opened on an earlier
/// row. A lexical scan, so it works on text that does not parse yet.
fn continued_string_rows(text: &str) -> HashSet<usize> {
    let mut rows = HashSet::new();
    let mut open: Option<&'static str> = None;

    for (row, line) in text.lines().enumerate() {
        if open.is_some() {
            rows.insert(row);
        }
        let bytes = line.as_bytes();
        let mut at = 0;
        while at < bytes.len() {
            match open {
                Some(_) if bytes[at] == b'\\' => at += 2,
                Some(quote) if bytes[at..].starts_with(quote.as_bytes()) => {
                    at += quote.len();
                    open = None;
                }
                Some(_) => at += 1,
                None => match bytes[at] {
                    b'#' => break,
                    b'"' | b'\'' => {
                        let quote = ["\"\"\"", "'''", "\"", "'"]
                            .into_iter()
                            .find(|quote| bytes[at..].starts_with(quote.as_bytes()))
                            .unwrap_or("\"");
                        at += quote.len();
                        open = Some(quote);
                    }
                    _ => at += 1,
                },
            }
        }
        // Single-quoted strings only span rows through a trailing backslash.
        if matches!(open, Some("\"") | Some("'")) && !line.ends_with('\\') {
            open = None;
        }
    }
    rows
}

fn leading_whitespace(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

struct Builder<'a> {
    source: &'a str,
    /// Rows whose first byte lies inside a multi-line string literal.
    string_rows: HashSet<usize>,
    tree: SourceTree,
}

impl<'a> Builder<'a> {
    /// Append the statements of a block to `parent`.
    ///
    /// `header_row` is the row of the owning `class`/`def` line, so a comment
    /// sharing that row is attached to the container rather than the body.
    fn body(
        &mut self,
        parent: NodeId,
        statements: Vec<Node<'_>>,
        header_row: Option<usize>,
    ) -> Result<(), EditError> {
        let mut prev_row = header_row;
        let mut prev_node = header_row.map(|_| parent);

        for statement in statements {
            let start_row = statement.start_position().row;

            if statement.kind() == "comment" && prev_row == Some(start_row) {
                if let Some(owner) = prev_node {
                    if self.tree.comment(owner).is_none() {
                        let text = self.text(statement).to_string();
                        self.tree.set_comment(owner, Some(text));
                        continue;
                    }
                }
            }

            if let Some(prev) = prev_row {
                if start_row > prev + 1 {
                    let spacer = self.tree.alloc(NodeKind::Placeholder);
                    self.tree.push_child(parent, spacer);
                }
            }

            let id = self.statement(statement)?;
            self.tree.push_child(parent, id);
            prev_row = Some(last_row(statement));
            prev_node = Some(id);
        }

        Ok(())
    }

    fn statement(&mut self, node: Node<'_>) -> Result<NodeId, EditError> {
        match node.kind() {
            "class_definition" => self.declaration(node, Vec::new()),
            "function_definition" => self.routine(node, Vec::new()),
            "decorated_definition" => {
                let decorators = named_children(node)
                    .into_iter()
                    .filter(|child| child.kind() == "decorator")
                    .map(|child| self.text(child).to_string())
                    .collect();
                let definition = node
                    .child_by_field_name("definition")
                    .ok_or_else(|| EditError::violation("decorator without definition"))?;
                match definition.kind() {
                    "class_definition" => self.declaration(definition, decorators),
                    _ => self.routine(definition, decorators),
                }
            }
            "import_statement" => {
                let names = field_children(node, "name")
                    .into_iter()
                    .map(|child| self.alias(child))
                    .collect();
                Ok(self.tree.alloc(NodeKind::Import(Import { names })))
            }
            "import_from_statement" | "future_import_statement" => {
                let module = match node.child_by_field_name("module_name") {
                    Some(module) => squash(self.text(module)),
                    None => "__future__".to_string(),
                };
                let has_wildcard =
                    named_children(node).iter().any(|child| child.kind() == "wildcard_import");
                let names = if has_wildcard {
                    ImportNames::Wildcard
                } else {
                    ImportNames::Names(
                        field_children(node, "name")
                            .into_iter()
                            .map(|child| self.alias(child))
                            .collect(),
                    )
                };
                Ok(self
                    .tree
                    .alloc(NodeKind::ImportFrom(ImportFrom { module, names })))
            }
            "expression_statement" if !is_assignment(node) => {
                let fragment = self.fragment(node);
                Ok(self.tree.alloc(NodeKind::Expression(fragment)))
            }
            _ => {
                let fragment = self.fragment(node);
                Ok(self.tree.alloc(NodeKind::Statement(fragment)))
            }
        }
    }

    fn declaration(&mut self, node: Node<'_>, decorators: Vec<String>) -> Result<NodeId, EditError> {
        let declaration = Declaration {
            name: self.field_text(node, "name").unwrap_or_default(),
            decorators,
            type_params: self.field_text(node, "type_parameters"),
            bases: self.field_text(node, "superclasses"),
        };
        let id = self.tree.alloc(NodeKind::Declaration(declaration));
        self.container_body(id, node)?;
        Ok(id)
    }

    fn routine(&mut self, node: Node<'_>, decorators: Vec<String>) -> Result<NodeId, EditError> {
        let mut cursor = node.walk();
        let is_async = node.children(&mut cursor).any(|child| child.kind() == "async");
        let parameters = match node.child_by_field_name("parameters") {
            Some(params) => self.parameters(params),
            None => Vec::new(),
        };
        let routine = Routine {
            name: self.field_text(node, "name").unwrap_or_default(),
            decorators,
            is_async,
            type_params: self.field_text(node, "type_parameters"),
            parameters,
            returns: self.field_text(node, "return_type"),
        };
        let id = self.tree.alloc(NodeKind::Routine(routine));
        self.container_body(id, node)?;
        Ok(id)
    }

    /// Build the body of a class/def. Comments that tree-sitter hangs off
    /// the definition itself (between `:` and the block) are folded in.
    fn container_body(&mut self, id: NodeId, node: Node<'_>) -> Result<(), EditError> {
        let header_row = node.start_position().row;
        let body = node.child_by_field_name("body");

        let mut statements: Vec<Node<'_>> = named_children(node)
            .into_iter()
            .filter(|child| child.kind() == "comment")
            .collect();
        if let Some(body) = body {
            statements.extend(named_children(body));
        }
        statements.sort_by_key(|child| child.start_byte());

        self.body(id, statements, Some(header_row))
    }

    fn parameters(&self, node: Node<'_>) -> Vec<Parameter> {
        let mut params = Vec::new();
        let mut keyword_only = false;

        for child in named_children(node) {
            let ordinary = if keyword_only {
                ParameterKind::KeywordOnly
            } else {
                ParameterKind::Positional
            };

            let param = match child.kind() {
                "comment" => continue,
                "identifier" => Parameter {
                    kind: ordinary,
                    name: self.text(child).to_string(),
                    annotation: None,
                    default: None,
                },
                "typed_parameter" => {
                    let inner = named_children(child)
                        .into_iter()
                        .find(|n| n.kind() != "type" && n.kind() != "comment");
                    let (kind, name) = match inner {
                        Some(inner) => self.splat(inner, ordinary),
                        None => (ordinary, String::new()),
                    };
                    Parameter {
                        kind,
                        name,
                        annotation: self.field_text(child, "type"),
                        default: None,
                    }
                }
                "default_parameter" | "typed_default_parameter" => Parameter {
                    kind: ordinary,
                    name: self.field_text(child, "name").unwrap_or_default(),
                    annotation: self.field_text(child, "type"),
                    default: self.field_text(child, "value"),
                },
                "list_splat_pattern" | "dictionary_splat_pattern" => {
                    let (kind, name) = self.splat(child, ordinary);
                    Parameter {
                        kind,
                        name,
                        annotation: None,
                        default: None,
                    }
                }
                "keyword_separator" => Parameter {
                    kind: ParameterKind::KeywordOnlyMarker,
                    name: String::new(),
                    annotation: None,
                    default: None,
                },
                "positional_separator" => Parameter {
                    kind: ParameterKind::PositionalOnlyMarker,
                    name: String::new(),
                    annotation: None,
                    default: None,
                },
                _ => Parameter {
                    kind: ordinary,
                    name: self.text(child).to_string(),
                    annotation: None,
                    default: None,
                },
            };

            if matches!(
                param.kind,
                ParameterKind::VarPositional | ParameterKind::KeywordOnlyMarker
            ) {
                keyword_only = true;
            }
            params.push(param);
        }

        params
    }

    fn splat(&self, node: Node<'_>, ordinary: ParameterKind) -> (ParameterKind, String) {
        let name = |n: Node<'_>| {
            named_children(n)
                .into_iter()
                .next()
                .map(|inner| self.text(inner).to_string())
                .unwrap_or_default()
        };
        match node.kind() {
            "list_splat_pattern" => (ParameterKind::VarPositional, name(node)),
            "dictionary_splat_pattern" => (ParameterKind::VarKeyword, name(node)),
            _ => (ordinary, self.text(node).to_string()),
        }
    }

    fn alias(&self, node: Node<'_>) -> ImportAlias {
        match node.kind() {
            "aliased_import" => ImportAlias {
                name: node
                    .child_by_field_name("name")
                    .map(|n| squash(self.text(n)))
                    .unwrap_or_default(),
                alias: self.field_text(node, "alias"),
            },
            _ => ImportAlias {
                name: squash(self.text(node)),
                alias: None,
            },
        }
    }

    /// Capture a statement's text relative to its own start column.
    fn fragment(&self, node: Node<'_>) -> Fragment {
        let start_row = node.start_position().row;
        let column = node.start_position().column;

        let lines = self
            .text(node)
            .split('\n')
            .enumerate()
            .map(|(offset, raw)| {
                let raw = raw.strip_suffix('\r').unwrap_or(raw);
                let verbatim = offset > 0 && self.string_rows.contains(&(start_row + offset));
                let text = if offset == 0 || verbatim {
                    raw.to_string()
                } else if raw.trim().is_empty() {
                    String::new()
                } else {
                    let strip = leading_whitespace(raw).min(column);
                    raw[strip..].to_string()
                };
                FragmentLine { text, verbatim }
            })
            .collect();

        Fragment { lines }
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        &self.source[node.byte_range()]
    }

    fn field_text(&self, node: Node<'_>, field: &str) -> Option<String> {
        node.child_by_field_name(field)
            .map(|child| self.text(child).to_string())
    }
}

/// Rows that begin inside a string literal spanning several lines.
pub(crate) fn string_interior_rows(root: Node<'_>) -> HashSet<usize> {
    let mut rows = HashSet::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.kind() == "string" {
            let start = node.start_position().row;
            let end = node.end_position().row;
            rows.extend(start + 1..=end);
            continue;
        }
        let mut cursor = node.walk();
        stack.extend(node.children(&mut cursor));
    }
    rows
}

fn is_assignment(node: Node<'_>) -> bool {
    named_children(node)
        .first()
        .is_some_and(|child| matches!(child.kind(), "assignment" | "augmented_assignment"))
}

/// Last row occupied by a node's own tokens.
fn last_row(node: Node<'_>) -> usize {
    let end = node.end_position();
    if end.column == 0 && end.row > node.start_position().row {
        end.row - 1
    } else {
        end.row
    }
}

pub(crate) fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

/// `os . path` -> `os.path`
fn squash(text: &str) -> String {
    text.split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::serialize;

    #[test]
    fn classifies_top_level_nodes() {
        let tree = parse(
            "import os\nfrom typing import List as L\n\nclass A:\n    pass\n\ndef f():\n    return 1\n\nf()\n",
        )
        .unwrap();
        let kinds: Vec<_> = tree
            .semantic_children(tree.root())
            .map(|id| tree.kind(id).label())
            .collect();
        assert_eq!(
            kinds,
            vec!["import", "import", "class 'A'", "function 'f'", "expression"]
        );
    }

    #[test]
    fn blank_line_gaps_become_placeholders() {
        let tree = parse("a = 1\n\n\nb = 2\nc = 3\n").unwrap();
        let placeholders = tree
            .top_level()
            .iter()
            .filter(|&&id| tree.kind(id).is_placeholder())
            .count();
        assert_eq!(placeholders, 1);
    }

    #[test]
    fn parameters_are_structured() {
        let tree = parse("def f(a, b: int = 2, *args, c, d=4, **kw) -> None:\n    pass\n").unwrap();
        let NodeKind::Routine(routine) = tree.kind(tree.top_level()[0]) else {
            panic!("expected routine");
        };
        let kinds: Vec<_> = routine.parameters.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ParameterKind::Positional,
                ParameterKind::Positional,
                ParameterKind::VarPositional,
                ParameterKind::KeywordOnly,
                ParameterKind::KeywordOnly,
                ParameterKind::VarKeyword,
            ]
        );
        assert_eq!(routine.parameters[1].annotation.as_deref(), Some("int"));
        assert_eq!(routine.parameters[1].default.as_deref(), Some("2"));
        assert_eq!(routine.returns.as_deref(), Some("None"));
    }

    #[test]
    fn multiline_string_lines_are_verbatim() {
        let source = "def f():\n    x = \"\"\"\n  keep\n\"\"\"\n    return x\n";
        let tree = parse(source).unwrap();
        assert_eq!(serialize(&tree), source);
    }

    #[test]
    fn trailing_comment_stays_on_its_line() {
        let tree = parse("x = 1  # one\ny = 2\n").unwrap();
        assert_eq!(serialize(&tree), "x = 1  # one\ny = 2\n");
    }

    #[test]
    fn rejects_invalid_input() {
        assert!(matches!(parse("def f(:\n"), Err(EditError::Syntax { .. })));
    }

    #[test]
    fn dedent_strips_common_margin() {
        assert_eq!(dedent("    a = 1\n\n      b = 2"), "a = 1\n\n  b = 2");
    }

    #[test]
    fn dedent_leaves_string_continuations_alone() {
        let text = "    x = \"\"\"\nhello\n      world\n    \"\"\"\n    y = 'a # b'\n    z = 1";
        assert_eq!(
            dedent(text),
            "x = \"\"\"\nhello\n      world\n    \"\"\"\ny = 'a # b'\nz = 1"
        );
    }
}
