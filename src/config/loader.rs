use crate::config::schema::{EditorConfig, ValidationError, DEFAULT_LINE_WIDTH};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const PYPROJECT: &str = "pyproject.toml";

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config from {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(f, "failed to parse config ({}): {}", path.display(), source),
                None => write!(f, "failed to parse config: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid config ({}): {}", path.display(), source),
                None => write!(f, "invalid config: {}", source),
            },
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str) -> Result<EditorConfig, ConfigError> {
    let config: EditorConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<EditorConfig, ConfigError> {
    let path = path.as_ref();
    let contents = read(path)?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

#[derive(Debug, Default, Deserialize)]
struct PyProject {
    #[serde(default)]
    tool: Tools,
}

#[derive(Debug, Default, Deserialize)]
struct Tools {
    pyedit: Option<EditorConfig>,
    black: Option<BlackSection>,
}

#[derive(Debug, Deserialize)]
struct BlackSection {
    #[serde(rename = "line-length")]
    line_length: Option<usize>,
}

/// Find the nearest `pyproject.toml` at or above `start` and read the
/// editor settings from it.
///
/// `[tool.pyedit]` wins; otherwise `[tool.black] line-length` seeds the
/// line width. Without a project file the defaults apply.
pub fn discover(start: impl AsRef<Path>) -> Result<EditorConfig, ConfigError> {
    let Some(path) = start
        .as_ref()
        .ancestors()
        .map(|dir| dir.join(PYPROJECT))
        .find(|candidate| candidate.is_file())
    else {
        return Ok(EditorConfig::default());
    };
    debug!(path = %path.display(), "reading project configuration");

    let contents = read(&path)?;
    let project: PyProject = toml_edit::de::from_str(&contents).map_err(|source| {
        ConfigError::Toml {
            path: Some(path.clone()),
            source,
        }
    })?;

    let config = match project.tool {
        Tools {
            pyedit: Some(config),
            ..
        } => config,
        Tools {
            black: Some(black), ..
        } => {
            let mut config = EditorConfig::default();
            config.format.line_width = black.line_length.unwrap_or(DEFAULT_LINE_WIDTH);
            config
        }
        _ => EditorConfig::default(),
    };
    config.validate().map_err(|source| ConfigError::Validation {
        path: Some(path),
        source,
    })?;
    Ok(config)
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_format_table_keeps_defaults() {
        let config = load_from_str("[format]\nline_width = 100\n").unwrap();
        assert_eq!(config.format.line_width, 100);
        assert_eq!(config.format.indent_width, 4);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = load_from_str("[format]\nwidth = 100\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let err = load_from_str("[format]\nindent_width = 40\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn discover_reads_black_line_length() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(PYPROJECT),
            "[project]\nname = \"demo\"\n\n[tool.black]\nline-length = 100\n",
        )
        .unwrap();
        let nested = dir.path().join("pkg");
        fs::create_dir(&nested).unwrap();

        let config = discover(&nested).unwrap();
        assert_eq!(config.format.line_width, 100);
    }

    #[test]
    fn discover_prefers_own_table() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(PYPROJECT),
            "[tool.black]\nline-length = 100\n\n[tool.pyedit.format]\nline_width = 79\n",
        )
        .unwrap();

        let config = discover(dir.path()).unwrap();
        assert_eq!(config.format.line_width, 79);
    }
}
