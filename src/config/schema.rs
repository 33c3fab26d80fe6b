use serde::Deserialize;
use std::fmt;

pub const DEFAULT_INDENT_WIDTH: usize = 4;
pub const DEFAULT_LINE_WIDTH: usize = 88;

const MAX_INDENT_WIDTH: usize = 16;
const MIN_LINE_WIDTH: usize = 20;

/// Top-level editor configuration.
///
/// ```toml
/// [format]
/// indent_width = 4
/// line_width = 88
/// normalize_quotes = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditorConfig {
    #[serde(default)]
    pub format: FormatOptions,
}

/// Style rules applied by the formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatOptions {
    pub indent_width: usize,
    pub line_width: usize,
    pub normalize_quotes: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
            line_width: DEFAULT_LINE_WIDTH,
            normalize_quotes: true,
        }
    }
}

impl FormatOptions {
    pub fn with_widths(indent_width: usize, line_width: usize) -> Self {
        Self {
            indent_width,
            line_width,
            ..Self::default()
        }
    }

    pub fn indent_unit(&self) -> String {
        " ".repeat(self.indent_width)
    }
}

impl EditorConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        let format = &self.format;

        if format.indent_width == 0 || format.indent_width > MAX_INDENT_WIDTH {
            issues.push(ValidationIssue::OutOfRange {
                field: "format.indent_width",
                value: format.indent_width,
                expected: "between 1 and 16",
            });
        }
        if format.line_width < MIN_LINE_WIDTH {
            issues.push(ValidationIssue::OutOfRange {
                field: "format.line_width",
                value: format.line_width,
                expected: "at least 20",
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    OutOfRange {
        field: &'static str,
        value: usize,
        expected: &'static str,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::OutOfRange {
                field,
                value,
                expected,
            } => write!(f, "'{field}' is {value}, expected {expected}"),
        }
    }
}
