//! Validation subjects
//!
//! Renderers hand validators a [`Subject`], a closed set of tagged
//! variants. Built-in validators operate on the tabular [`Dataset`]
//! variant; the others pass through them vacuously so a runner can be
//! pointed at any subject without pre-sorting validators.

use serde_json::Value;
use std::collections::BTreeMap;

/// One row of tabular data, keyed by column name.
pub type Record = BTreeMap<String, Value>;

/// What a validator is asked to look at.
#[derive(Debug, Clone)]
pub enum Subject {
    Dataset(Dataset),
    Document(Value),
    Text(String),
}

impl Subject {
    pub fn as_dataset(&self) -> Option<&Dataset> {
        match self {
            Subject::Dataset(d) => Some(d),
            _ => None,
        }
    }
}

impl From<Dataset> for Subject {
    fn from(dataset: Dataset) -> Self {
        Subject::Dataset(dataset)
    }
}

/// Tabular data: declared column keys plus rows. A row may be absent
/// (`None`), which the malformed-data validator flags.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    keys: Vec<String>,
    rows: Vec<Option<Record>>,
}

impl Dataset {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: Record) -> Self {
        self.rows.push(Some(row));
        self
    }

    /// Append a nil row map, as produced by broken upstream marshaling.
    pub fn with_nil_row(mut self) -> Self {
        self.rows.push(None);
        self
    }

    pub fn push_row(&mut self, row: Record) {
        self.rows.push(Some(row));
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn rows(&self) -> &[Option<Record>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Build a [`Record`] from `(key, value)` pairs. Test and example helper.
pub fn record<I, K, V>(pairs: I) -> Record
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
