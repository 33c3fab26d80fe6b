use crate::error::EditError;
use crate::locate::{locate, routine_horizon, MatchPolicy, Target};
use crate::tree::{NodeId, NodeKind, Parameter, ParameterKind, SourceTree};
use crate::ts::{validate_snippet, SnippetCategory};

/// Default back-filled when a parameter without one would follow a
/// parameter that has one.
const PLACEHOLDER_DEFAULT: &str = "None";

/// A parameter to add to an existing signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParameter {
    pub name: String,
    pub annotation: Option<String>,
    pub default: Option<String>,
}

/// Add a parameter to the routine named `routine`.
///
/// The parameter joins the ordinary positional parameters, so it lands
/// before `*args`, a bare `*`, keyword-only parameters and `**kwargs`.
pub fn insert_parameter(
    tree: &mut SourceTree,
    routine: &str,
    scope: Option<&str>,
    param: &NewParameter,
) -> Result<NodeId, EditError> {
    if let Some(annotation) = &param.annotation {
        validate_snippet(annotation, SnippetCategory::Annotation)?;
    }
    if let Some(default) = &param.default {
        validate_snippet(default, SnippetCategory::Expression)?;
    }

    let horizon = routine_horizon(tree, scope)?;
    let id = locate(
        tree,
        &Target::Routine(routine.to_string()),
        horizon,
        MatchPolicy::Unique,
    )?;

    let NodeKind::Routine(signature) = tree.kind_mut(id) else {
        return Err(EditError::violation("located node is not a function"));
    };
    if signature.parameter(&param.name).is_some() {
        return Err(EditError::violation(format!(
            "function '{}' already has a parameter named '{}'",
            signature.name, param.name
        )));
    }

    let index = signature
        .parameters
        .iter()
        .position(|p| {
            !matches!(
                p.kind,
                ParameterKind::Positional | ParameterKind::PositionalOnlyMarker
            )
        })
        .unwrap_or(signature.parameters.len());

    let follows_default = signature.parameters[..index]
        .iter()
        .any(|p| p.kind == ParameterKind::Positional && p.default.is_some());
    let default = match &param.default {
        Some(default) => Some(default.trim().to_string()),
        None if follows_default => Some(PLACEHOLDER_DEFAULT.to_string()),
        None => None,
    };

    signature.parameters.insert(
        index,
        Parameter {
            kind: ParameterKind::Positional,
            name: param.name.clone(),
            annotation: param.annotation.as_ref().map(|a| a.trim().to_string()),
            default,
        },
    );

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::edit;

    fn add(source: &str, name: &str, annotation: Option<&str>, default: Option<&str>) -> String {
        edit(source, |tree| {
            insert_parameter(
                tree,
                "f",
                None,
                &NewParameter {
                    name: name.to_string(),
                    annotation: annotation.map(str::to_string),
                    default: default.map(str::to_string),
                },
            )
        })
        .unwrap()
    }

    #[test]
    fn inserts_before_star_args() {
        let out = add("def f(a, *args, **kw):\n    pass\n", "b", Some("int"), None);
        assert_eq!(out, "def f(a, b: int, *args, **kw):\n    pass\n");
    }

    #[test]
    fn backfills_default_after_defaulted_parameter() {
        let out = add("def f(a, retries=3):\n    pass\n", "extra", None, None);
        assert_eq!(out, "def f(a, retries=3, extra=None):\n    pass\n");
    }

    #[test]
    fn rejects_duplicate_parameter() {
        let err = edit("def f(a):\n    pass\n", |tree| {
            insert_parameter(
                tree,
                "f",
                None,
                &NewParameter {
                    name: "a".into(),
                    annotation: None,
                    default: None,
                },
            )
        })
        .unwrap_err();
        assert!(matches!(err, EditError::StructuralViolation { .. }));
    }

    #[test]
    fn rejects_malformed_default() {
        let err = edit("def f(a):\n    pass\n", |tree| {
            insert_parameter(
                tree,
                "f",
                None,
                &NewParameter {
                    name: "b".into(),
                    annotation: None,
                    default: Some("1 +".into()),
                },
            )
        })
        .unwrap_err();
        assert!(matches!(err, EditError::Syntax { .. }));
    }
}
