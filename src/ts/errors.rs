use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeSitterError {
    #[error("failed to set Python language for parser")]
    LanguageSet,

    #[error("failed to parse source code")]
    ParseFailed,

    #[error("syntax error at {line}:{column}: {context}")]
    SyntaxError {
        line: usize,
        column: usize,
        context: String,
    },
}
