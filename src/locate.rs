//! Node Locator: resolve a declaration, routine or import by name.
//!
//! Names are compared by exact string match at the nodes the search horizon
//! covers; there is no scope resolution or shadowing. The horizon is always
//! explicit, and whether several matches are an error or "first wins" is
//! chosen by the caller through [`MatchPolicy`].

use crate::error::{EditError, NodeRole};
use crate::tree::{ImportNames, NodeId, NodeKind, SourceTree};

/// What to look for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A class by name
    Declaration(String),
    /// A function or method by name
    Routine(String),
    /// An import statement by the name it binds
    Import(String),
}

impl Target {
    pub fn role(&self) -> NodeRole {
        match self {
            Target::Declaration(_) => NodeRole::Declaration,
            Target::Routine(_) => NodeRole::Routine,
            Target::Import(_) => NodeRole::Import,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Target::Declaration(name) | Target::Routine(name) | Target::Import(name) => name,
        }
    }
}

/// Which nodes a lookup inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchHorizon {
    /// Direct children of the module
    TopLevel,
    /// Direct children of one container
    Within(NodeId),
    /// Every attached node, in pre-order
    FullTree,
}

/// How to treat more than one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Several matches are [`EditError::Ambiguous`].
    #[default]
    Unique,
    /// The first match in walk order wins.
    First,
}

/// Resolve exactly one node (or the first, under [`MatchPolicy::First`]).
pub fn locate(
    tree: &SourceTree,
    target: &Target,
    horizon: SearchHorizon,
    policy: MatchPolicy,
) -> Result<NodeId, EditError> {
    let matches = locate_all(tree, target, horizon);
    match (matches.len(), policy) {
        (0, _) => Err(not_found(tree, target, horizon)),
        (1, _) | (_, MatchPolicy::First) => Ok(matches[0]),
        (count, MatchPolicy::Unique) => Err(EditError::Ambiguous {
            kind: target.role(),
            name: target.name().to_string(),
            count,
        }),
    }
}

/// All matches for a target within the horizon, in walk order.
pub fn locate_all(tree: &SourceTree, target: &Target, horizon: SearchHorizon) -> Vec<NodeId> {
    candidates(tree, horizon)
        .into_iter()
        .filter(|&id| matches_target(tree.kind(id), target))
        .collect()
}

/// Narrow a routine lookup to one class body, or search the whole tree.
pub fn routine_horizon(tree: &SourceTree, scope: Option<&str>) -> Result<SearchHorizon, EditError> {
    match scope {
        None => Ok(SearchHorizon::FullTree),
        Some(name) => {
            let decl = locate(
                tree,
                &Target::Declaration(name.to_string()),
                SearchHorizon::FullTree,
                MatchPolicy::Unique,
            )?;
            Ok(SearchHorizon::Within(decl))
        }
    }
}

fn candidates(tree: &SourceTree, horizon: SearchHorizon) -> Vec<NodeId> {
    let nodes = match horizon {
        SearchHorizon::TopLevel => tree.top_level().to_vec(),
        SearchHorizon::Within(id) => tree.children(id).to_vec(),
        SearchHorizon::FullTree => tree.descendants(tree.root()),
    };
    nodes
        .into_iter()
        .filter(|&id| !tree.kind(id).is_placeholder())
        .collect()
}

fn matches_target(kind: &NodeKind, target: &Target) -> bool {
    match (kind, target) {
        (NodeKind::Declaration(decl), Target::Declaration(name)) => &decl.name == name,
        (NodeKind::Routine(routine), Target::Routine(name)) => &routine.name == name,
        (_, Target::Import(name)) => bound_names(kind).iter().any(|bound| bound == name),
        _ => false,
    }
}

/// Names an import node binds; empty for everything else.
pub fn bound_names(kind: &NodeKind) -> Vec<String> {
    match kind {
        NodeKind::Import(import) => import
            .names
            .iter()
            .map(|alias| alias.bound_name().to_string())
            .collect(),
        NodeKind::ImportFrom(import) => match &import.names {
            ImportNames::Wildcard => Vec::new(),
            ImportNames::Names(names) => names
                .iter()
                .map(|alias| alias.bound_name().to_string())
                .collect(),
        },
        _ => Vec::new(),
    }
}

fn not_found(tree: &SourceTree, target: &Target, horizon: SearchHorizon) -> EditError {
    let existing: Vec<String> = candidates(tree, horizon)
        .into_iter()
        .flat_map(|id| {
            let kind = tree.kind(id);
            match (kind, target) {
                (NodeKind::Declaration(decl), Target::Declaration(_)) => vec![decl.name.clone()],
                (NodeKind::Routine(routine), Target::Routine(_)) => vec![routine.name.clone()],
                (_, Target::Import(_)) => bound_names(kind),
                _ => Vec::new(),
            }
        })
        .collect();

    let suggestion = existing
        .iter()
        .map(|name| (strsim::jaro_winkler(name, target.name()), name))
        .filter(|(score, _)| *score >= 0.8)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, name)| name.clone());

    let scope = match horizon {
        SearchHorizon::Within(id) => tree.kind(id).name().map(str::to_string),
        _ => None,
    };

    EditError::NotFound {
        kind: target.role(),
        name: target.name().to_string(),
        scope,
        suggestion,
    }
}
