//! Automatic fixes offered during interactive resolution
//!
//! A fix is a named, per-code repair action. The resolver lists every fix
//! registered for the error's code alongside the standard menu choices; a
//! successful fix resolves the error as `Fixed`.

use crate::error::codes::{ERR_EMPTY_DATASET, ERR_INVALID_FORMAT, ERR_NIL_VALUE};
use crate::error::context::display_value;
use crate::error::OutputError;
use std::collections::BTreeMap;
use std::sync::Arc;

type FixFn = Arc<dyn Fn(&OutputError) -> Result<String, OutputError> + Send + Sync>;

/// A single repair action. `apply` returns a short description of what was
/// done, shown to the user.
#[derive(Clone)]
pub struct AutoFix {
    name: String,
    description: String,
    apply: FixFn,
}

impl AutoFix {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, apply: F) -> Self
    where
        F: Fn(&OutputError) -> Result<String, OutputError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            apply: Arc::new(apply),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn apply(&self, err: &OutputError) -> Result<String, OutputError> {
        (self.apply)(err)
    }
}

impl std::fmt::Debug for AutoFix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoFix")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Fixes keyed by error code.
#[derive(Clone, Debug, Default)]
pub struct AutoFixRegistry {
    fixes: BTreeMap<String, Vec<AutoFix>>,
}

impl AutoFixRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, code: impl Into<String>, fix: AutoFix) {
        self.fixes.entry(code.into()).or_default().push(fix);
    }

    pub fn with_fix(mut self, code: impl Into<String>, fix: AutoFix) -> Self {
        self.register(code, fix);
        self
    }

    pub fn fixes_for(&self, code: &str) -> &[AutoFix] {
        self.fixes.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }
}

/// The stock catalog: format reset, empty-dataset acceptance, and nil-value
/// substitution.
pub fn default_fixes() -> AutoFixRegistry {
    AutoFixRegistry::new()
        .with_fix(
            ERR_INVALID_FORMAT.as_str(),
            AutoFix::new(
                "use_default_format",
                "reset the output format to table",
                |err| {
                    let rejected = err
                        .context()
                        .output_format()
                        .unwrap_or("unknown")
                        .to_string();
                    Ok(format!("replaced format {rejected} with table"))
                },
            ),
        )
        .with_fix(
            ERR_EMPTY_DATASET.as_str(),
            AutoFix::new(
                "accept_empty",
                "render the empty dataset as a placeholder",
                |_err| Ok("empty dataset accepted, placeholder output".to_string()),
            ),
        )
        .with_fix(
            ERR_NIL_VALUE.as_str(),
            AutoFix::new(
                "substitute_empty",
                "replace the nil value with an empty string",
                |err| match &err.context().field {
                    Some(field) => Ok(format!("field {field} set to empty string")),
                    None => {
                        let value = err
                            .context()
                            .value
                            .as_ref()
                            .map(display_value)
                            .unwrap_or_else(|| "nil".to_string());
                        Ok(format!("value {value} replaced with empty string"))
                    }
                },
            ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn registry_returns_fixes_per_code() {
        let fixes = default_fixes();
        assert_eq!(fixes.fixes_for("OUT-1001").len(), 1);
        assert_eq!(fixes.fixes_for("OUT-2004").len(), 1);
        assert_eq!(fixes.fixes_for("OUT-2006").len(), 1);
        assert!(fixes.fixes_for("OUT-9999").is_empty());
    }

    #[test]
    fn nil_value_fix_names_the_field() {
        let fixes = default_fixes();
        let err = ErrorBuilder::new(ERR_NIL_VALUE)
            .message("nil value")
            .with_field("owner")
            .build();
        let applied = fixes.fixes_for("OUT-2006")[0].apply(&err).unwrap();
        assert_eq!(applied, "field owner set to empty string");
    }

    #[test]
    fn fixes_can_fail() {
        let mut registry = AutoFixRegistry::new();
        registry.register(
            "OUT-1001",
            AutoFix::new("broken", "always fails", |err| Err(err.clone())),
        );
        let err = ErrorBuilder::new(ERR_INVALID_FORMAT).message("bad").build();
        assert!(registry.fixes_for("OUT-1001")[0].apply(&err).is_err());
    }
}
