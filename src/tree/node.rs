//! Node payloads stored in the [`SourceTree`](super::SourceTree) arena.

use std::fmt;

/// Index of a node inside one tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Typed payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Synthetic root; its children are the top-level statements.
    Module,
    /// A `class` definition.
    Declaration(Declaration),
    /// A `def` / `async def` definition.
    Routine(Routine),
    /// `import a.b as c, d`
    Import(Import),
    /// `from m import x as y` (including `from __future__ import ...`)
    ImportFrom(ImportFrom),
    /// Any other statement, kept as re-indentable text. Compound statements
    /// other than class/def, and comments, land here.
    Statement(Fragment),
    /// A bare expression statement (calls, docstrings).
    Expression(Fragment),
    /// Reserves exactly one blank output line and nothing else.
    Placeholder,
}

impl NodeKind {
    /// The semantic key of the node, if it has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            NodeKind::Declaration(decl) => Some(&decl.name),
            NodeKind::Routine(routine) => Some(&routine.name),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Module | NodeKind::Declaration(_) | NodeKind::Routine(_)
        )
    }

    pub fn is_import(&self) -> bool {
        matches!(self, NodeKind::Import(_) | NodeKind::ImportFrom(_))
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, NodeKind::Placeholder)
    }

    /// Short human-readable label used in error messages.
    pub fn label(&self) -> String {
        match self {
            NodeKind::Module => "module".to_string(),
            NodeKind::Declaration(decl) => format!("class '{}'", decl.name),
            NodeKind::Routine(routine) => format!("function '{}'", routine.name),
            NodeKind::Import(_) | NodeKind::ImportFrom(_) => "import".to_string(),
            NodeKind::Statement(_) => "statement".to_string(),
            NodeKind::Expression(_) => "expression".to_string(),
            NodeKind::Placeholder => "blank line".to_string(),
        }
    }
}

/// A `class` header. The body lives in the node's children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub decorators: Vec<String>,
    /// PEP 695 type parameters including brackets, e.g. `[T]`.
    pub type_params: Option<String>,
    /// Base class list including parentheses, e.g. `(Base, metaclass=M)`.
    pub bases: Option<String>,
}

/// A `def` header. The body lives in the node's children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routine {
    pub name: String,
    pub decorators: Vec<String>,
    pub is_async: bool,
    pub type_params: Option<String>,
    pub parameters: Vec<Parameter>,
    pub returns: Option<String>,
}

impl Routine {
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|param| param.kind.binds_name() && param.name == name)
    }
}

/// Position class of a parameter within a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Ordinary parameter before any `*`.
    Positional,
    /// `/` marker.
    PositionalOnlyMarker,
    /// `*args`
    VarPositional,
    /// Bare `*` marker.
    KeywordOnlyMarker,
    /// Parameter after `*args` or `*`.
    KeywordOnly,
    /// `**kwargs`
    VarKeyword,
}

impl ParameterKind {
    pub fn binds_name(self) -> bool {
        !matches!(
            self,
            ParameterKind::PositionalOnlyMarker | ParameterKind::KeywordOnlyMarker
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub kind: ParameterKind,
    /// Bare name without `*`/`**`; empty for markers.
    pub name: String,
    pub annotation: Option<String>,
    pub default: Option<String>,
}

impl Parameter {
    pub fn positional(name: impl Into<String>) -> Self {
        Self {
            kind: ParameterKind::Positional,
            name: name.into(),
            annotation: None,
            default: None,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParameterKind::PositionalOnlyMarker => return f.write_str("/"),
            ParameterKind::KeywordOnlyMarker => return f.write_str("*"),
            ParameterKind::VarPositional => f.write_str("*")?,
            ParameterKind::VarKeyword => f.write_str("**")?,
            ParameterKind::Positional | ParameterKind::KeywordOnly => {}
        }
        f.write_str(&self.name)?;
        match (&self.annotation, &self.default) {
            (Some(annotation), Some(default)) => write!(f, ": {annotation} = {default}"),
            (Some(annotation), None) => write!(f, ": {annotation}"),
            (None, Some(default)) => write!(f, "={default}"),
            (None, None) => Ok(()),
        }
    }
}

/// One `name [as alias]` entry of an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportAlias {
    /// Dotted name as written, e.g. `os.path`.
    pub name: String,
    pub alias: Option<String>,
}

impl ImportAlias {
    /// Name this entry introduces into the importing module's namespace.
    ///
    /// `import a.b` binds `a`; `from m import a.b` cannot occur, so the
    /// first dotted component is right for both statement forms.
    pub fn bound_name(&self) -> &str {
        match &self.alias {
            Some(alias) => alias,
            None => self.name.split('.').next().unwrap_or(&self.name),
        }
    }
}

impl fmt::Display for ImportAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} as {}", self.name, alias),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub names: Vec<ImportAlias>,
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("import ")?;
        write_joined(f, &self.names)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportNames {
    Wildcard,
    Names(Vec<ImportAlias>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFrom {
    /// Module path including any leading dots, e.g. `..pkg.mod` or `.`.
    pub module: String,
    pub names: ImportNames,
}

impl fmt::Display for ImportFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "from {} import ", self.module)?;
        match &self.names {
            ImportNames::Wildcard => f.write_str("*"),
            ImportNames::Names(names) => write_joined(f, names),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, names: &[ImportAlias]) -> fmt::Result {
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{name}")?;
    }
    Ok(())
}

/// Source text of an opaque statement, stored relative to its own
/// indentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub lines: Vec<FragmentLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentLine {
    pub text: String,
    /// Line starts inside a multi-line string literal and must be emitted
    /// byte-for-byte, without indentation.
    pub verbatim: bool,
}

impl Fragment {
    /// Single-line fragment, e.g. a synthesized `pass`.
    pub fn single(text: impl Into<String>) -> Self {
        Self {
            lines: vec![FragmentLine {
                text: text.into(),
                verbatim: false,
            }],
        }
    }

    /// Raw text of the fragment at zero indentation.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
