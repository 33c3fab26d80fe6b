//! Name analysis for relocation: free identifiers of a code block and the
//! import bindings of a module.

use crate::error::EditError;
use crate::locate::bound_names;
use crate::pool;
use crate::tree::build::named_children;
use crate::tree::{NodeId, SourceTree};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tree_sitter::Node;

/// Names referenced in `block` that the block does not bind itself.
///
/// Binding sites are assignment, `for`, `with ... as`, `except ... as` and
/// walrus targets, `def`/`class` names, parameters, comprehension variables,
/// `global`/`nonlocal` names and imports. Attribute member names
/// (`x.member`) and keyword argument names (`f(key=...)`) are not
/// references.
pub fn free_identifiers(block: &str) -> Result<BTreeSet<String>, EditError> {
    let parsed = pool::with_parser(|parser| parser.parse_valid(block))??;

    let mut scan = NameScan {
        source: block,
        referenced: BTreeSet::new(),
        bound: HashSet::new(),
    };
    scan.visit(parsed.root_node());

    Ok(scan
        .referenced
        .into_iter()
        .filter(|name| !scan.bound.contains(name))
        .collect())
}

/// Map from each name bound by a top-level import to the import node that
/// binds it. A later import of the same name overrides an earlier one.
pub fn import_bindings(tree: &SourceTree) -> BTreeMap<String, NodeId> {
    let mut bindings = BTreeMap::new();
    for &id in tree.top_level() {
        for name in bound_names(tree.kind(id)) {
            bindings.insert(name, id);
        }
    }
    bindings
}

struct NameScan<'a> {
    source: &'a str,
    referenced: BTreeSet<String>,
    bound: HashSet<String>,
}

impl<'a> NameScan<'a> {
    fn visit(&mut self, node: Node<'_>) {
        match node.kind() {
            "identifier" => {
                self.referenced.insert(self.text(node));
            }
            "attribute" => {
                if let Some(object) = node.child_by_field_name("object") {
                    self.visit(object);
                }
            }
            "keyword_argument" => {
                if let Some(value) = node.child_by_field_name("value") {
                    self.visit(value);
                }
            }
            "import_statement" | "import_from_statement" | "future_import_statement" => {
                self.bind_import(node);
            }
            "function_definition" | "class_definition" => {
                let name = node.child_by_field_name("name");
                if let Some(name) = name {
                    self.bound.insert(self.text(name));
                }
                for child in named_children(node) {
                    if Some(child) != name {
                        self.visit(child);
                    }
                }
            }
            "parameters" | "lambda_parameters" => {
                for child in named_children(node) {
                    self.bind_parameter(child);
                }
            }
            "assignment" | "augmented_assignment" | "for_statement" | "for_in_clause" => {
                let left = node.child_by_field_name("left");
                if let Some(left) = left {
                    self.bind_target(left);
                }
                for child in named_children(node) {
                    if Some(child) != left {
                        self.visit(child);
                    }
                }
            }
            "named_expression" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.bind_target(name);
                }
                if let Some(value) = node.child_by_field_name("value") {
                    self.visit(value);
                }
            }
            "as_pattern" => {
                let alias = node.child_by_field_name("alias");
                if let Some(alias) = alias {
                    self.bind_target(alias);
                }
                for child in named_children(node) {
                    if Some(child) != alias {
                        self.visit(child);
                    }
                }
            }
            "except_clause" => {
                let mut after_as = false;
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() == "as" {
                        after_as = true;
                    } else if after_as && child.is_named() {
                        self.bind_target(child);
                        after_as = false;
                    } else if child.is_named() {
                        self.visit(child);
                    }
                }
            }
            "global_statement" | "nonlocal_statement" => {
                for child in named_children(node) {
                    self.bind_target(child);
                }
            }
            _ => {
                for child in named_children(node) {
                    self.visit(child);
                }
            }
        }
    }

    fn bind_target(&mut self, node: Node<'_>) {
        match node.kind() {
            "identifier" => {
                self.bound.insert(self.text(node));
            }
            "pattern_list" | "tuple_pattern" | "list_pattern" | "tuple" | "list"
            | "parenthesized_expression" | "list_splat_pattern" | "list_splat"
            | "as_pattern_target" | "expression_list" => {
                for child in named_children(node) {
                    self.bind_target(child);
                }
            }
            _ => self.visit(node),
        }
    }

    fn bind_parameter(&mut self, node: Node<'_>) {
        match node.kind() {
            "identifier" => {
                self.bound.insert(self.text(node));
            }
            "list_splat_pattern" | "dictionary_splat_pattern" => {
                for child in named_children(node) {
                    self.bind_parameter(child);
                }
            }
            "typed_parameter" => {
                for child in named_children(node) {
                    if child.kind() == "type" {
                        self.visit(child);
                    } else {
                        self.bind_parameter(child);
                    }
                }
            }
            "default_parameter" | "typed_default_parameter" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.bind_parameter(name);
                }
                for field in ["type", "value"] {
                    if let Some(child) = node.child_by_field_name(field) {
                        self.visit(child);
                    }
                }
            }
            _ => {}
        }
    }

    fn bind_import(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        let names: Vec<Node<'_>> = node.children_by_field_name("name", &mut cursor).collect();
        for name in names {
            let bound = match name.kind() {
                "aliased_import" => name
                    .child_by_field_name("alias")
                    .map(|alias| self.text(alias)),
                _ => self.text(name).split('.').next().map(|s| s.trim().to_string()),
            };
            if let Some(bound) = bound {
                self.bound.insert(bound);
            }
        }
    }

    fn text(&self, node: Node<'_>) -> String {
        self.source[node.byte_range()].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::parse;

    fn free(block: &str) -> Vec<String> {
        free_identifiers(block).unwrap().into_iter().collect()
    }

    #[test]
    fn assignments_bind_and_attributes_do_not_reference() {
        assert_eq!(
            free("cfg = Config.load(path)\ncfg.value = limit\n"),
            vec!["Config", "limit", "path"]
        );
    }

    #[test]
    fn parameters_and_comprehensions_bind() {
        assert_eq!(
            free("def f(a, b: Type = DEFAULT, *rest, **kw):\n    return [x for x in a if x in rest]\n"),
            vec!["DEFAULT", "Type"]
        );
    }

    #[test]
    fn keyword_names_are_not_references() {
        assert_eq!(free("call(timeout=limit)\n"), vec!["call", "limit"]);
    }

    #[test]
    fn with_and_except_aliases_bind() {
        assert_eq!(
            free("with open(p) as fh:\n    try:\n        fh.read()\n    except OSError as err:\n        log(err)\n"),
            vec!["OSError", "log", "open", "p"]
        );
    }

    #[test]
    fn aliased_import_binds_alias() {
        let tree = parse("import numpy as np\nimport os.path\nfrom a import b as c, d\n").unwrap();
        let names: Vec<_> = import_bindings(&tree).into_keys().collect();
        assert_eq!(names, vec!["c", "d", "np", "os"]);
    }
}
