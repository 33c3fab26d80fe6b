pub mod loader;
pub mod schema;

pub use loader::{discover, load_from_path, load_from_str, ConfigError};
pub use schema::{EditorConfig, FormatOptions, ValidationError, ValidationIssue};
