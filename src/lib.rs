//! pyedit: structural editing of Python source.
//!
//! Edits are tree operations rather than line splices. A file is parsed
//! into a [`SourceTree`], one operation locates its target by name and
//! splices nodes in or out, and the tree is serialized back to canonical
//! text. Every operation re-parses its own output, so a caller gets either
//! complete valid replacement text or one [`EditError`].
//!
//! # Architecture
//!
//! - [`tree`]: arena of typed nodes, built from the tree-sitter CST
//! - [`locate`]: name lookup with an explicit search horizon
//! - [`ops`]: insert, replace and delete operations
//! - [`relocate`]: moving code between files together with its imports
//! - [`format`]: canonical formatter with a line-based fallback
//! - [`request`]: JSON-decodable operation dispatch
//! - [`persist`]: verified two-phase writes of the results
//!
//! The library never touches the filesystem except through [`persist`] and
//! [`config::discover`].
//!
//! # Example
//!
//! ```no_run
//! use pyedit::ops::{self, NewParameter};
//!
//! let source = "def fetch(url, retries=3):\n    pass\n";
//! let updated = ops::edit(source, |tree| {
//!     ops::insert_parameter(
//!         tree,
//!         "fetch",
//!         None,
//!         &NewParameter {
//!             name: "timeout".into(),
//!             annotation: None,
//!             default: Some("30".into()),
//!         },
//!     )
//! })?;
//! assert_eq!(updated, "def fetch(url, retries=3, timeout=30):\n    pass\n");
//! # Ok::<(), pyedit::EditError>(())
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod locate;
pub mod ops;
pub mod persist;
pub mod pool;
pub mod relocate;
pub mod request;
pub mod tree;
pub mod ts;

// Re-exports
pub use config::{ConfigError, EditorConfig, FormatOptions};
pub use error::{EditError, NodeRole};
pub use format::{reformat, FormatPath, Formatted};
pub use locate::{locate, MatchPolicy, SearchHorizon, Target};
pub use persist::{commit, PersistError, StagedWrite, WriteOutcome};
pub use relocate::{relocate_range, relocate_routine, LineRange, Relocation, RoutineMove};
pub use request::{execute, Buffers, Operation, Outcome};
pub use tree::{parse, serialize, NodeId, NodeKind, SourceTree};
pub use ts::TreeSitterError;
