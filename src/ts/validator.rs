use crate::pool;
use crate::ts::errors::TreeSitterError;

/// Whether `source` is a complete, valid Python module.
///
/// The error is the first ERROR or MISSING node in document order.
pub fn validate_syntax(source: &str) -> Result<(), TreeSitterError> {
    pool::with_parser(|parser| parser.parse_valid(source).map(drop))?
}

/// Check if a code snippet is valid as a specific syntactic category.
pub fn validate_snippet(snippet: &str, category: SnippetCategory) -> Result<(), TreeSitterError> {
    let wrapped = match category {
        SnippetCategory::Module => snippet.to_string(),
        SnippetCategory::Expression => format!("__wrapper__ = ({})\n", snippet),
        SnippetCategory::Annotation => format!("__wrapper__: {}\n", snippet),
    };

    validate_syntax(&wrapped)
}

/// Category of code snippet for validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetCategory {
    /// One or more top-level statements
    Module,
    /// A single expression (parameter defaults)
    Expression,
    /// A type annotation
    Annotation,
}
