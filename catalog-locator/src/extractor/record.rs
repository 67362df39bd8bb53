//! Extracted records.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::schema::FieldSchema;

/// One extracted record: every schema field, each a value or absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    values: BTreeMap<String, Option<String>>,
}

impl Record {
    /// Creates a record with every schema field absent.
    #[must_use]
    pub fn empty(schema: &FieldSchema) -> Self {
        Self {
            values: schema.field_names().map(|n| (n.to_string(), None)).collect(),
        }
    }

    /// Sets a field; blank values are stored as absent.
    pub fn set(&mut self, field: impl Into<String>, value: impl AsRef<str>) {
        let trimmed = value.as_ref().trim();
        let value = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self.values.insert(field.into(), value);
    }

    /// Sets a field and returns the record.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl AsRef<str>) -> Self {
        self.set(field, value);
        self
    }

    /// The value of a field, if extracted.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(Option::as_deref)
    }

    /// The value of a field, or `marker` when absent.
    #[must_use]
    pub fn get_or<'a>(&'a self, field: &str, marker: &'a str) -> &'a str {
        self.get(field).unwrap_or(marker)
    }

    /// Whether a field holds a value.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Iterates over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Converts to a dictionary, writing `absent_marker` for absent fields.
    #[must_use]
    pub fn to_dict(&self, absent_marker: &str) -> HashMap<String, serde_json::Value> {
        self.values
            .iter()
            .map(|(k, v)| {
                let value = v.as_deref().unwrap_or(absent_marker);
                (k.clone(), serde_json::json!(value))
            })
            .collect()
    }
}
