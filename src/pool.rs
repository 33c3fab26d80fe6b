//! Thread-local parser pooling.
//!
//! Every operation parses its input, its fragments and finally its output
//! for validation. Keeping one parser per thread avoids re-loading the
//! grammar for each of those passes.

use crate::ts::{PythonParser, TreeSitterError};
use std::cell::RefCell;

thread_local! {
    static PYTHON_PARSER: RefCell<Option<PythonParser>> = const { RefCell::new(None) };
}

/// Run `f` with this thread's parser, creating it on first use.
///
/// The outer error only reports grammar loading; whatever `f` returns is
/// passed through untouched. `f` must not call back into `with_parser`.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use pyedit::pool::with_parser;
///
/// let statements = with_parser(|parser| {
///     parser
///         .parse_valid("def main(): pass\n")
///         .map(|parsed| parsed.root_node().named_child_count())
/// })??;
/// assert_eq!(statements, 1);
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(f: F) -> Result<R, TreeSitterError>
where
    F: FnOnce(&mut PythonParser) -> R,
{
    PYTHON_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        let parser = match slot.as_mut() {
            Some(parser) => parser,
            None => slot.insert(PythonParser::new()?),
        };
        Ok(f(parser))
    })
}
