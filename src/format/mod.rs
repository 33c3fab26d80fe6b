//! Resilient formatter.
//!
//! [`reformat`] always tries the canonical formatter first. If that fails,
//! because the text does not parse or the result would not, the line-based
//! fallback re-indenter takes over. The fallback never fails, so
//! `reformat` always returns text; [`Formatted::path`] says which tier
//! produced it. Fallback output is best effort and may not be valid Python.

pub mod canonical;
pub mod fallback;

use crate::config::FormatOptions;
use tracing::{debug, warn};

/// Which formatter produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatPath {
    Canonical,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    pub text: String,
    pub path: FormatPath,
}

pub fn reformat(text: &str, options: &FormatOptions) -> Formatted {
    match canonical::format(text, options) {
        Ok(text) => {
            debug!("canonical formatter succeeded");
            Formatted {
                text,
                path: FormatPath::Canonical,
            }
        }
        Err(err) => {
            warn!(error = %err, "canonical formatter failed, using fallback re-indenter");
            Formatted {
                text: fallback::reindent(text, options.indent_width),
                path: FormatPath::Fallback,
            }
        }
    }
}
