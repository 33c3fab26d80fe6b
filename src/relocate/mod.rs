//! Dependency-aware relocation.
//!
//! A line range moves verbatim and may drag the imports it needs along with
//! it; a method moves as a node between class bodies and never touches
//! imports. Both sides are produced together and validated before either is
//! returned.

mod names;
mod range;
mod routine;

pub use names::{free_identifiers, import_bindings};
pub use range::{relocate_range, LineRange};
pub use routine::{relocate_routine, relocate_routine_within, RoutineMove};

/// Both sides of a cross-file relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub source: String,
    pub destination: String,
    /// Import statements copied into the destination, in canonical form.
    pub carried_imports: Vec<String>,
}
