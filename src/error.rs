use crate::ts::TreeSitterError;
use std::fmt;
use thiserror::Error;

/// What kind of node a lookup was searching for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Declaration,
    Routine,
    Import,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRole::Declaration => f.write_str("class"),
            NodeRole::Routine => f.write_str("function"),
            NodeRole::Import => f.write_str("import"),
        }
    }
}

/// Every failure an operation can surface to its caller.
///
/// None of these is retried or recovered internally: an operation either
/// returns complete replacement text or exactly one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("syntax error at line {line}, column {column}: {context}")]
    Syntax {
        line: usize,
        column: usize,
        context: String,
    },

    #[error("{kind} '{name}' not found{}{}", scope_suffix(.scope), suggestion_suffix(.suggestion))]
    NotFound {
        kind: NodeRole,
        name: String,
        scope: Option<String>,
        suggestion: Option<String>,
    },

    #[error("{kind} '{name}' is ambiguous: {count} matches")]
    Ambiguous {
        kind: NodeRole,
        name: String,
        count: usize,
    },

    #[error("structural violation: {message}")]
    StructuralViolation { message: String },

    #[error("expected {expected}, found {found}")]
    SignatureMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("failed to initialize the Python parser")]
    ParserInit,
}

impl EditError {
    pub(crate) fn violation(message: impl Into<String>) -> Self {
        EditError::StructuralViolation {
            message: message.into(),
        }
    }
}

fn scope_suffix(scope: &Option<String>) -> String {
    match scope {
        Some(scope) => format!(" in '{scope}'"),
        None => String::new(),
    }
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean '{name}'?)"),
        None => String::new(),
    }
}

impl From<TreeSitterError> for EditError {
    fn from(err: TreeSitterError) -> Self {
        match err {
            TreeSitterError::SyntaxError {
                line,
                column,
                context,
            } => EditError::Syntax {
                line,
                column,
                context,
            },
            TreeSitterError::LanguageSet | TreeSitterError::ParseFailed => EditError::ParserInit,
        }
    }
}
