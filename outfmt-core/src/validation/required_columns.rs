//! Required-column validation
//!
//! Set-membership check of required column names against a dataset's
//! declared keys. The last verdict is cached keyed on the key list's
//! content (not identity); datasets that share a schema revalidate for
//! free. The cache sits behind a reader/writer lock because validator
//! instances are shared across concurrent runner invocations.

use super::{PerformanceProfile, Subject, Validator};
use crate::error::codes::ERR_MISSING_COLUMN;
use crate::error::{ErrorSeverity, OutputError, ValidationErrorBuilder, Violation};
use parking_lot::RwLock;
use serde_json::Value;

pub struct RequiredColumnsValidator {
    required: Vec<String>,
    cache: RwLock<Option<CachedVerdict>>,
}

struct CachedVerdict {
    keys: Vec<String>,
    verdict: Result<(), OutputError>,
}

impl RequiredColumnsValidator {
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
            cache: RwLock::new(None),
        }
    }

    fn check_keys(&self, keys: &[String]) -> Result<(), OutputError> {
        let missing: Vec<&String> = self
            .required
            .iter()
            .filter(|required| !keys.contains(required))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        let mut builder = ValidationErrorBuilder::new(ERR_MISSING_COLUMN)
            .severity(ErrorSeverity::Error)
            .message(format!(
                "missing required columns: {}",
                missing
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
            .with_suggestion("declare the missing columns in the dataset schema");
        for column in missing {
            builder = builder.with_violation(Violation::new(
                column.clone(),
                Value::Null,
                "required",
                "column is not declared",
            ));
        }
        Err(builder.build())
    }
}

impl Validator for RequiredColumnsValidator {
    fn name(&self) -> &str {
        "required_columns"
    }

    fn validate(&self, subject: &Subject) -> Result<(), OutputError> {
        let dataset = match subject.as_dataset() {
            Some(d) => d,
            None => return Ok(()),
        };
        if let Some(cached) = self.cache.read().as_ref() {
            if cached.keys == dataset.keys() {
                return cached.verdict.clone();
            }
        }
        let verdict = self.check_keys(dataset.keys());
        *self.cache.write() = Some(CachedVerdict {
            keys: dataset.keys().to_vec(),
            verdict: verdict.clone(),
        });
        verdict
    }

    fn performance(&self) -> Option<PerformanceProfile> {
        Some(PerformanceProfile::fail_fast(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Dataset;
    use pretty_assertions::assert_eq;

    fn subject(keys: &[&str]) -> Subject {
        Subject::Dataset(Dataset::new(keys.iter().copied()))
    }

    #[test]
    fn superset_of_required_keys_passes() {
        let validator = RequiredColumnsValidator::new(["id", "name"]);
        assert!(validator.validate(&subject(&["id", "name", "extra"])).is_ok());
    }

    #[test]
    fn missing_columns_are_named_exactly() {
        let validator = RequiredColumnsValidator::new(["id", "name", "age"]);
        let err = validator.validate(&subject(&["name"])).unwrap_err();
        assert_eq!(err.code(), ERR_MISSING_COLUMN);
        let validation = err.as_validation().unwrap();
        let fields: Vec<&str> = validation
            .violations()
            .iter()
            .map(|v| v.field.as_str())
            .collect();
        assert_eq!(fields, vec!["id", "age"]);
        assert!(err.to_string().contains("missing required columns: id, age"));
    }

    #[test]
    fn verdict_is_cached_by_key_content() {
        let validator = RequiredColumnsValidator::new(["id"]);
        // Two datasets, same key content, different instances.
        let first = subject(&["id", "name"]);
        let second = subject(&["id", "name"]);
        assert!(validator.validate(&first).is_ok());
        assert!(validator.validate(&second).is_ok());
        // Content change recomputes and flips the verdict.
        let changed = subject(&["name"]);
        assert!(validator.validate(&changed).is_err());
        assert!(validator.validate(&first).is_ok());
    }

    #[test]
    fn non_dataset_subjects_pass_vacuously() {
        let validator = RequiredColumnsValidator::new(["id"]);
        assert!(validator
            .validate(&Subject::Text("plain".to_string()))
            .is_ok());
    }
}
