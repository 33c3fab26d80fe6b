//! Writing edited text back to disk.
//!
//! Operations only ever produce text. [`commit`] persists the one or two
//! texts of a request together: every target is re-read and checked
//! against the content the edit was computed from, and every new text is
//! written and fsynced to a temp file beside its target, before any target
//! is replaced. A stale or unreadable target therefore leaves all files
//! untouched. Only the final renames can fail part-way.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

/// Texts above this size are verified by hash instead of by copy.
const HASH_THRESHOLD: usize = 1024;

/// What a target must still contain for a staged write to proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentVerification {
    ExactMatch(String),
    /// xxh3 of the expected text.
    Hash(u64),
}

impl ContentVerification {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            ContentVerification::ExactMatch(expected) => text == expected,
            ContentVerification::Hash(expected) => xxh3_64(text.as_bytes()) == *expected,
        }
    }

    pub fn from_text(text: &str) -> Self {
        if text.len() > HASH_THRESHOLD {
            ContentVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            ContentVerification::ExactMatch(text.to_string())
        }
    }
}

/// New contents for one file, plus what the file held when they were
/// computed. A missing file counts as empty.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "StagedWrite does nothing until committed"]
pub struct StagedWrite {
    pub path: PathBuf,
    pub contents: String,
    pub expected_before: ContentVerification,
}

impl StagedWrite {
    pub fn new(path: impl Into<PathBuf>, before: &str, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
            expected_before: ContentVerification::from_text(before),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written { path: PathBuf, bytes: usize },
    Unchanged { path: PathBuf },
}

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("{0} changed on disk since it was read")]
    Modified(PathBuf),

    #[error("{0} is staged more than once")]
    DuplicateTarget(PathBuf),

    #[error("{0} is not valid UTF-8")]
    NotUtf8(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> PersistError + '_ {
    move |source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Persist all staged writes, or none if any target fails verification.
pub fn commit(writes: &[StagedWrite]) -> Result<Vec<WriteOutcome>, PersistError> {
    for (idx, write) in writes.iter().enumerate() {
        if writes[..idx].iter().any(|earlier| earlier.path == write.path) {
            return Err(PersistError::DuplicateTarget(write.path.clone()));
        }
    }

    // Phase 1: verify and stage everything.
    let mut staged = Vec::with_capacity(writes.len());
    let mut outcomes = Vec::with_capacity(writes.len());
    for write in writes {
        let current = read_current(&write.path)?;
        if !write.expected_before.matches(&current) {
            return Err(PersistError::Modified(write.path.clone()));
        }
        if current == write.contents {
            outcomes.push(WriteOutcome::Unchanged {
                path: write.path.clone(),
            });
            continue;
        }
        staged.push((write, stage(&write.path, write.contents.as_bytes())?));
    }

    // Phase 2: move every staged file into place.
    for (write, temp) in staged {
        temp.persist(&write.path)
            .map_err(|err| io_error(&write.path)(err.error))?;
        filetime::set_file_mtime(&write.path, filetime::FileTime::now())
            .map_err(io_error(&write.path))?;
        debug!(path = %write.path.display(), bytes = write.contents.len(), "wrote file");
        outcomes.push(WriteOutcome::Written {
            path: write.path.clone(),
            bytes: write.contents.len(),
        });
    }

    Ok(outcomes)
}

fn read_current(path: &Path) -> Result<String, PersistError> {
    match fs::read(path) {
        Ok(bytes) => String::from_utf8(bytes).map_err(|_| PersistError::NotUtf8(path.to_path_buf())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(io_error(path)(err)),
    }
}

/// Write `content` to a synced temp file in `path`'s directory.
fn stage(path: &Path, content: &[u8]) -> Result<NamedTempFile, PersistError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(parent).map_err(io_error(path))?;
    temp.write_all(content).map_err(io_error(path))?;
    temp.as_file().sync_all().map_err(io_error(path))?;
    Ok(temp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_switches_to_hash_for_large_text() {
        assert!(matches!(
            ContentVerification::from_text("small"),
            ContentVerification::ExactMatch(_)
        ));
        let large = "x".repeat(2000);
        let verify = ContentVerification::from_text(&large);
        assert!(matches!(verify, ContentVerification::Hash(_)));
        assert!(verify.matches(&large));
        assert!(!verify.matches("y"));
    }

    #[test]
    fn commits_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.py");
        let b = dir.path().join("b.py");
        fs::write(&a, "x = 1\n").unwrap();

        let outcomes = commit(&[
            StagedWrite::new(&a, "x = 1\n", "x = 2\n"),
            StagedWrite::new(&b, "", "y = 1\n"),
        ])
        .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(fs::read_to_string(&a).unwrap(), "x = 2\n");
        assert_eq!(fs::read_to_string(&b).unwrap(), "y = 1\n");
    }

    #[test]
    fn stale_target_aborts_everything() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.py");
        let b = dir.path().join("b.py");
        fs::write(&a, "x = 1\n").unwrap();
        fs::write(&b, "changed\n").unwrap();

        let err = commit(&[
            StagedWrite::new(&a, "x = 1\n", "x = 2\n"),
            StagedWrite::new(&b, "y = 1\n", "y = 2\n"),
        ])
        .unwrap_err();

        assert!(matches!(err, PersistError::Modified(_)));
        assert_eq!(fs::read_to_string(&a).unwrap(), "x = 1\n");
    }

    #[test]
    fn identical_contents_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.py");
        fs::write(&a, "x = 1\n").unwrap();

        let outcomes = commit(&[StagedWrite::new(&a, "x = 1\n", "x = 1\n")]).unwrap();
        assert!(matches!(outcomes[0], WriteOutcome::Unchanged { .. }));
    }

    #[test]
    fn duplicate_targets_are_rejected() {
        let err = commit(&[
            StagedWrite::new("same.py", "", "a\n"),
            StagedWrite::new("same.py", "", "b\n"),
        ])
        .unwrap_err();
        assert!(matches!(err, PersistError::DuplicateTarget(_)));
    }
}
