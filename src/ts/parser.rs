use crate::ts::errors::TreeSitterError;
use ast_grep_language::{LanguageExt, SupportLang};
use tree_sitter::{Node, Parser, Point, Tree};

/// Bytes of surrounding text quoted in a syntax error.
const EXCERPT_RADIUS: usize = 20;

/// Nodes that own exactly one indented body.
const COMPOUND: &[&str] = &[
    "function_definition",
    "class_definition",
    "if_statement",
    "elif_clause",
    "else_clause",
    "for_statement",
    "while_statement",
    "with_statement",
    "try_statement",
    "except_clause",
    "except_group_clause",
    "finally_clause",
    "match_statement",
    "case_clause",
];

/// Tree-sitter parser loaded with the Python grammar.
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    pub fn new() -> Result<Self, TreeSitterError> {
        let mut parser = Parser::new();
        let language = SupportLang::Python.get_ts_language();
        parser
            .set_language(&language)
            .map_err(|_| TreeSitterError::LanguageSet)?;
        Ok(Self { parser })
    }

    /// Parse without judging the result; the tree may hold ERROR nodes.
    pub fn parse(&mut self, source: &str) -> Result<Tree, TreeSitterError> {
        self.parser
            .parse(source, None)
            .ok_or(TreeSitterError::ParseFailed)
    }

    /// Parse and reject anything tree-sitter had to recover from.
    pub fn parse_valid<'a>(&mut self, source: &'a str) -> Result<ParsedSource<'a>, TreeSitterError> {
        let parsed = ParsedSource {
            source,
            tree: self.parse(source)?,
        };
        match parsed.first_error() {
            Some(err) => Err(err),
            None => Ok(parsed),
        }
    }
}

/// A tree together with the text it was parsed from.
pub struct ParsedSource<'a> {
    pub source: &'a str,
    pub tree: Tree,
}

impl<'a> ParsedSource<'a> {
    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// The first ERROR or MISSING node in document order, as a located
    /// syntax error. Layout errors tree-sitter recovers from silently (an
    /// empty block, a statement indented off its siblings) count too.
    pub fn first_error(&self) -> Option<TreeSitterError> {
        let root = self.tree.root_node();
        first_error_node(root)
            .or_else(|| first_layout_error(root, self.source))
            .map(|node| ErrorNode::from(node).to_error(self.source))
    }

    pub fn text(&self, node: Node<'_>) -> &'a str {
        &self.source[node.byte_range()]
    }
}

/// Position of a node tree-sitter could not parse.
#[derive(Debug, Clone)]
pub struct ErrorNode {
    pub byte_start: usize,
    pub byte_end: usize,
    pub start_point: Point,
}

impl From<Node<'_>> for ErrorNode {
    fn from(node: Node<'_>) -> Self {
        Self {
            byte_start: node.start_byte(),
            byte_end: node.end_byte(),
            start_point: node.start_position(),
        }
    }
}

impl ErrorNode {
    /// 1-based position plus a one-line excerpt around the node.
    pub fn to_error(&self, source: &str) -> TreeSitterError {
        let from = floor_char_boundary(source, self.byte_start.saturating_sub(EXCERPT_RADIUS));
        let to = floor_char_boundary(source, (self.byte_end + EXCERPT_RADIUS).min(source.len()));
        let context = source.get(from..to).unwrap_or("").replace('\n', "\\n");

        TreeSitterError::SyntaxError {
            line: self.start_point.row + 1,
            column: self.start_point.column + 1,
            context,
        }
    }
}

fn floor_char_boundary(source: &str, mut index: usize) -> usize {
    while index > 0 && !source.is_char_boundary(index) {
        index -= 1;
    }
    index
}

// `has_error` marks every ancestor of a bad node, so clean subtrees are
// skipped outright.
fn first_error_node(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find_map(first_error_node);
    found
}

// A header without a body parses as an empty `block` (reported at the
// header), and an unexpected indent just shifts a statement's column.
fn first_layout_error<'t>(node: Node<'t>, source: &str) -> Option<Node<'t>> {
    if COMPOUND.contains(&node.kind()) {
        let mut cursor = node.walk();
        let has_body = node
            .named_children(&mut cursor)
            .any(|child| child.kind() == "block");
        if !has_body {
            return Some(node);
        }
    }
    if matches!(node.kind(), "module" | "block") {
        let statements: Vec<Node<'t>> = {
            let mut cursor = node.walk();
            node.named_children(&mut cursor)
                .filter(|child| !matches!(child.kind(), "comment" | "line_continuation"))
                .collect()
        };
        if node.kind() == "block" && statements.is_empty() {
            return Some(node.parent().unwrap_or(node));
        }

        // Statements sharing a row with their header (`if x: a; b`) fix no column.
        let column = match node.kind() {
            "module" => Some(0),
            _ => statements
                .first()
                .filter(|first| starts_row(source, **first))
                .map(|first| first.start_position().column),
        };
        if let Some(column) = column {
            let misplaced = statements.iter().find(|statement| {
                starts_row(source, **statement) && statement.start_position().column != column
            });
            if let Some(&statement) = misplaced {
                return Some(statement);
            }
        }
    }

    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .find_map(|child| first_layout_error(child, source))
}

fn starts_row(source: &str, node: Node<'_>) -> bool {
    let start = node.start_byte();
    let line_start = source
        .get(..start)
        .and_then(|before| before.rfind('\n'))
        .map_or(0, |newline| newline + 1);
    source
        .get(line_start..start)
        .is_some_and(|prefix| prefix.trim().is_empty())
}
