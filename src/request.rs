//! Operation dispatch.
//!
//! A request is `{"operation": "<name>", "params": {...}}`. [`execute`]
//! runs it against the text it was handed and returns replacement text for
//! every buffer it touched; nothing here reads or writes files.

use crate::config::{EditorConfig, FormatOptions};
use crate::error::EditError;
use crate::format;
use crate::ops::{self, NewParameter};
use crate::relocate::{self, LineRange, RoutineMove};
use serde::{Deserialize, Serialize};
use tracing::debug;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "operation",
    content = "params",
    rename_all = "snake_case",
    deny_unknown_fields
)]
pub enum Operation {
    InsertDeclaration {
        text: String,
        #[serde(default)]
        after: Option<String>,
    },
    InsertImport {
        imports: Vec<String>,
    },
    InsertRoutine {
        declaration: String,
        text: String,
        #[serde(default)]
        after: Option<String>,
    },
    InsertParameter {
        routine: String,
        #[serde(default)]
        scope: Option<String>,
        name: String,
        #[serde(default)]
        annotation: Option<String>,
        #[serde(default)]
        default: Option<String>,
    },
    ReplaceRoutineBody {
        routine: String,
        #[serde(default)]
        scope: Option<String>,
        body: String,
    },
    ReplaceDeclaration {
        declaration: String,
        text: String,
    },
    DeleteDeclaration {
        declaration: String,
    },
    RelocateRange {
        start_line: usize,
        end_line: usize,
        insert_line: usize,
        #[serde(default = "default_true")]
        carry_imports: bool,
    },
    RelocateRoutine {
        routine: String,
        from: String,
        to: String,
    },
    Reformat {
        #[serde(default)]
        indent_width: Option<usize>,
        #[serde(default)]
        line_width: Option<usize>,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::InsertDeclaration { .. } => "insert_declaration",
            Operation::InsertImport { .. } => "insert_import",
            Operation::InsertRoutine { .. } => "insert_routine",
            Operation::InsertParameter { .. } => "insert_parameter",
            Operation::ReplaceRoutineBody { .. } => "replace_routine_body",
            Operation::ReplaceDeclaration { .. } => "replace_declaration",
            Operation::DeleteDeclaration { .. } => "delete_declaration",
            Operation::RelocateRange { .. } => "relocate_range",
            Operation::RelocateRoutine { .. } => "relocate_routine",
            Operation::Reformat { .. } => "reformat",
        }
    }

    /// Whether the operation needs a destination buffer.
    pub fn needs_destination(&self) -> bool {
        matches!(self, Operation::RelocateRange { .. })
    }
}

/// The text an operation works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Buffers<'a> {
    One(&'a str),
    Two {
        source: &'a str,
        destination: &'a str,
    },
}

/// Replacement text for each buffer, in the shape of the [`Buffers`] given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    One(String),
    Two { source: String, destination: String },
}

/// Run `operation`. `options` supply the formatting defaults a `reformat`
/// request does not override.
pub fn execute(
    operation: &Operation,
    buffers: Buffers<'_>,
    options: &FormatOptions,
) -> Result<Outcome, EditError> {
    debug!(operation = operation.name(), "executing request");

    match (operation, buffers) {
        (
            Operation::RelocateRange {
                start_line,
                end_line,
                insert_line,
                carry_imports,
            },
            Buffers::Two {
                source,
                destination,
            },
        ) => {
            let relocation = relocate::relocate_range(
                source,
                destination,
                LineRange {
                    start: *start_line,
                    end: *end_line,
                    insert_at: *insert_line,
                    carry_imports: *carry_imports,
                },
            )?;
            debug!(carried = ?relocation.carried_imports, "relocated line range");
            Ok(Outcome::Two {
                source: relocation.source,
                destination: relocation.destination,
            })
        }
        (Operation::RelocateRange { .. }, Buffers::One(_)) => Err(EditError::violation(
            "relocate_range needs a destination file",
        )),
        (Operation::RelocateRoutine { routine, from, to }, buffers) => {
            let request = RoutineMove {
                routine,
                from,
                to,
            };
            match buffers {
                Buffers::One(text) => Ok(Outcome::One(relocate::relocate_routine_within(
                    text, request,
                )?)),
                Buffers::Two {
                    source,
                    destination,
                } => {
                    let relocation = relocate::relocate_routine(source, destination, request)?;
                    Ok(Outcome::Two {
                        source: relocation.source,
                        destination: relocation.destination,
                    })
                }
            }
        }
        (operation, Buffers::One(text)) => Ok(Outcome::One(single(operation, text, options)?)),
        (operation, Buffers::Two { .. }) => Err(EditError::violation(format!(
            "{} edits a single file",
            operation.name()
        ))),
    }
}

fn single(operation: &Operation, text: &str, options: &FormatOptions) -> Result<String, EditError> {
    match operation {
        Operation::InsertDeclaration { text: new, after } => ops::edit(text, |tree| {
            ops::insert_declaration(tree, new, after.as_deref())
        }),
        Operation::InsertImport { imports } => {
            ops::edit(text, |tree| ops::insert_imports(tree, imports))
        }
        Operation::InsertRoutine {
            declaration,
            text: new,
            after,
        } => ops::edit(text, |tree| {
            ops::insert_routine(tree, declaration, new, after.as_deref())
        }),
        Operation::InsertParameter {
            routine,
            scope,
            name,
            annotation,
            default,
        } => {
            let param = NewParameter {
                name: name.clone(),
                annotation: annotation.clone(),
                default: default.clone(),
            };
            ops::edit(text, |tree| {
                ops::insert_parameter(tree, routine, scope.as_deref(), &param)
            })
        }
        Operation::ReplaceRoutineBody {
            routine,
            scope,
            body,
        } => ops::edit(text, |tree| {
            ops::replace_routine_body(tree, routine, scope.as_deref(), body)
        }),
        Operation::ReplaceDeclaration {
            declaration,
            text: new,
        } => ops::edit(text, |tree| ops::replace_declaration(tree, declaration, new)),
        Operation::DeleteDeclaration { declaration } => {
            ops::edit(text, |tree| ops::delete_declaration(tree, declaration))
        }
        Operation::Reformat {
            indent_width,
            line_width,
        } => {
            let config = EditorConfig {
                format: FormatOptions {
                    indent_width: indent_width.unwrap_or(options.indent_width),
                    line_width: line_width.unwrap_or(options.line_width),
                    ..*options
                },
            };
            config
                .validate()
                .map_err(|err| EditError::violation(err.to_string()))?;
            Ok(format::reformat(text, &config.format).text)
        }
        Operation::RelocateRange { .. } | Operation::RelocateRoutine { .. } => Err(
            EditError::violation(format!("{} is not a single-file edit", operation.name())),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Operation {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn decodes_tagged_request() {
        let op = parse(
            r#"{"operation": "insert_parameter", "params": {"routine": "f", "name": "timeout", "default": "30"}}"#,
        );
        assert_eq!(
            op,
            Operation::InsertParameter {
                routine: "f".into(),
                scope: None,
                name: "timeout".into(),
                annotation: None,
                default: Some("30".into()),
            }
        );
    }

    #[test]
    fn carry_imports_defaults_on() {
        let op = parse(
            r#"{"operation": "relocate_range", "params": {"start_line": 1, "end_line": 2, "insert_line": 1}}"#,
        );
        assert!(matches!(
            op,
            Operation::RelocateRange {
                carry_imports: true,
                ..
            }
        ));
    }

    #[test]
    fn unknown_params_are_rejected() {
        let result: Result<Operation, _> = serde_json::from_str(
            r#"{"operation": "delete_declaration", "params": {"declaration": "A", "force": true}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn single_file_edit_rejects_two_buffers() {
        let op = Operation::DeleteDeclaration {
            declaration: "A".into(),
        };
        let err = execute(
            &op,
            Buffers::Two {
                source: "",
                destination: "",
            },
            &FormatOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EditError::StructuralViolation { .. }));
    }

    #[test]
    fn reformat_uses_request_widths() {
        let op = Operation::Reformat {
            indent_width: Some(2),
            line_width: None,
        };
        let out = execute(
            &op,
            Buffers::One("def f():\n    return 1\n"),
            &FormatOptions::default(),
        )
        .unwrap();
        assert_eq!(out, Outcome::One("def f():\n  return 1\n".into()));
    }
}
