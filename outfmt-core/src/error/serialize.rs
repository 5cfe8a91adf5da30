//! JSON encoding of error values
//!
//! Wire layout: `{code, severity, message, context?, suggestions?, cause?}`,
//! with severity as its lowercase label. Validation errors add a
//! `violations` array, composites an `errors` array. Optional fields are
//! omitted rather than null.

use super::types::OutputError;
use serde::ser::{Serialize, SerializeMap, Serializer};

impl Serialize for OutputError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("code", self.code().as_str())?;
        map.serialize_entry("severity", &self.severity())?;
        map.serialize_entry("message", &self.message())?;
        let context = self.context();
        if !context.is_empty() {
            map.serialize_entry("context", context)?;
        }
        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            map.serialize_entry("suggestions", &suggestions)?;
        }
        match self {
            OutputError::Validation(e) => {
                if !e.violations().is_empty() {
                    map.serialize_entry("violations", e.violations())?;
                }
                if let Some(cause) = e.details().cause() {
                    map.serialize_entry("cause", &cause.to_string())?;
                }
            }
            OutputError::Plain(d) => {
                if let Some(cause) = d.cause() {
                    map.serialize_entry("cause", &cause.to_string())?;
                }
            }
            OutputError::Processing(e) => {
                if let Some(cause) = e.details().cause() {
                    map.serialize_entry("cause", &cause.to_string())?;
                }
            }
            OutputError::Composite(c) => {
                map.serialize_entry("errors", c.errors())?;
            }
        }
        map.end()
    }
}
