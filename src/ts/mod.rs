//! Tree-sitter integration for Python sources.
//!
//! Thin wrapper over the Python grammar bundled with ast-grep-language. The
//! rest of the crate never touches tree-sitter parsers directly; it goes
//! through [`PythonParser`] (or the pooled instance in [`crate::pool`]).

pub mod errors;
pub mod parser;
pub mod validator;

pub use errors::TreeSitterError;
pub use parser::{ErrorNode, ParsedSource, PythonParser};
pub use validator::{validate_snippet, validate_syntax, SnippetCategory};
