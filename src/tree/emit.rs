//! Canonical emission of a [`SourceTree`].

use super::node::{Fragment, NodeId, NodeKind, Parameter};
use super::SourceTree;

const INDENT: &str = "    ";

/// Serialize a tree to Python text.
///
/// Placeholders emit one blank line, except at the start or end of a
/// sequence or directly after another placeholder. An empty class/def body
/// emits `pass`. Non-empty output always ends with a single newline.
pub fn serialize(tree: &SourceTree) -> String {
    let mut emitter = Emitter {
        tree,
        lines: Vec::new(),
    };
    emitter.sequence(tree.children(tree.root()), 0);

    if emitter.lines.is_empty() {
        return String::new();
    }
    let mut out = emitter.lines.join("\n");
    out.push('\n');
    out
}

struct Emitter<'t> {
    tree: &'t SourceTree,
    lines: Vec<String>,
}

impl<'t> Emitter<'t> {
    fn sequence(&mut self, ids: &[NodeId], depth: usize) {
        let mut emitted = false;
        let mut blank_pending = false;

        for &id in ids {
            if self.tree.kind(id).is_placeholder() {
                blank_pending = emitted;
                continue;
            }
            if blank_pending {
                self.lines.push(String::new());
                blank_pending = false;
            }
            self.node(id, depth);
            emitted = true;
        }
    }

    fn node(&mut self, id: NodeId, depth: usize) {
        let indent = INDENT.repeat(depth);
        let comment = self
            .tree
            .comment(id)
            .map(|comment| format!("  {comment}"))
            .unwrap_or_default();

        match self.tree.kind(id) {
            NodeKind::Module => self.sequence(self.tree.children(id), depth),
            NodeKind::Declaration(decl) => {
                self.decorators(&decl.decorators, &indent);
                let header = format!(
                    "class {}{}{}:",
                    decl.name,
                    decl.type_params.as_deref().unwrap_or(""),
                    decl.bases.as_deref().unwrap_or(""),
                );
                self.lines.push(format!("{indent}{header}{comment}"));
                self.body(id, depth + 1);
            }
            NodeKind::Routine(routine) => {
                self.decorators(&routine.decorators, &indent);
                let returns = routine
                    .returns
                    .as_deref()
                    .map(|returns| format!(" -> {returns}"))
                    .unwrap_or_default();
                let header = format!(
                    "{}def {}{}({}){}:",
                    if routine.is_async { "async " } else { "" },
                    routine.name,
                    routine.type_params.as_deref().unwrap_or(""),
                    render_parameters(&routine.parameters),
                    returns,
                );
                self.lines.push(format!("{indent}{header}{comment}"));
                self.body(id, depth + 1);
            }
            NodeKind::Import(import) => self.lines.push(format!("{indent}{import}{comment}")),
            NodeKind::ImportFrom(import) => self.lines.push(format!("{indent}{import}{comment}")),
            NodeKind::Statement(fragment) | NodeKind::Expression(fragment) => {
                self.fragment(fragment, &indent);
                if let Some(last) = self.lines.last_mut() {
                    last.push_str(&comment);
                }
            }
            NodeKind::Placeholder => self.lines.push(String::new()),
        }
    }

    fn body(&mut self, id: NodeId, depth: usize) {
        if self.tree.semantic_children(id).next().is_none() {
            self.lines.push(format!("{}pass", INDENT.repeat(depth)));
        } else {
            self.sequence(self.tree.children(id), depth);
        }
    }

    fn decorators(&mut self, decorators: &[String], indent: &str) {
        for decorator in decorators {
            self.lines.push(format!("{indent}{decorator}"));
        }
    }

    fn fragment(&mut self, fragment: &Fragment, indent: &str) {
        for line in &fragment.lines {
            if line.verbatim || line.text.is_empty() {
                self.lines.push(line.text.clone());
            } else {
                self.lines.push(format!("{indent}{}", line.text));
            }
        }
    }
}

pub(crate) fn render_parameters(parameters: &[Parameter]) -> String {
    parameters
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use crate::tree::parse;
    use crate::tree::serialize;

    #[test]
    fn canonicalizes_imports_and_signatures() {
        let source = "from a import (b,\n    c as d)\ndef f(x:int=1,*, y ) ->int:\n  return x\n";
        assert_eq!(
            serialize(&parse(source).unwrap()),
            "from a import b, c as d\ndef f(x: int = 1, *, y) -> int:\n    return x\n"
        );
    }

    #[test]
    fn structural_round_trip_converges() {
        let source = "import os\n\n\n@dec\nclass A(B):\n  '''Doc.'''\n\n  def m(self):  # hi\n      if self:\n          return (1,\n     2)\n";
        let once = serialize(&parse(source).unwrap());
        let twice = serialize(&parse(&once).unwrap());
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_tree_serializes_to_empty_text() {
        assert_eq!(serialize(&parse("").unwrap()), "");
    }
}
