//! Field schema: which header keywords name which record field.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::ConfigError;

/// One extractable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Record key, e.g. `filePath`.
    pub name: String,
    /// Header keywords; a header cell containing any of them (ignoring case)
    /// names this field's column.
    pub keywords: Vec<String>,
    /// Optional regex for the unstructured-text fallback. The first capture
    /// group is used when present, otherwise the whole match.
    #[serde(default)]
    pub text_pattern: Option<String>,
}

impl FieldSpec {
    /// Creates a field with header keywords and no text pattern.
    #[must_use]
    pub fn new(name: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
            text_pattern: None,
        }
    }

    /// Sets the fallback text pattern.
    #[must_use]
    pub fn with_text_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.text_pattern = Some(pattern.into());
        self
    }

    /// Whether a header cell's text names this field.
    #[must_use]
    pub fn matches_header(&self, header_text: &str) -> bool {
        let folded = header_text.to_lowercase();
        self.keywords
            .iter()
            .any(|keyword| folded.contains(&keyword.to_lowercase()))
    }
}

/// Mapping from record fields to header keywords, plus extraction policy.
///
/// Fields are listed in priority order: when one header cell matches the
/// keywords of several fields, the earliest field claims it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Fields in priority order.
    #[serde(default = "default_fields")]
    pub fields: Vec<FieldSpec>,
    /// Field that must be non-empty for a row to become a record.
    #[serde(default = "default_primary_field")]
    pub primary_field: String,
    /// Placeholder reported for fields that could not be extracted.
    #[serde(default = "default_absent_marker")]
    pub absent_marker: String,
}

fn default_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("filePath", &["path"]).with_text_pattern(r#"[A-Za-z]:\\[^\s<>"']+"#),
        FieldSpec::new("product", &["product", "product name"])
            .with_text_pattern(r"Product\s*Name\s*[:\-]\s*([^\n<]+)"),
        FieldSpec::new("vendor", &["vendor", "company"])
            .with_text_pattern(r"Company\s*[:\-]\s*([^\n<]+)"),
    ]
}

fn default_primary_field() -> String {
    "filePath".to_string()
}

fn default_absent_marker() -> String {
    "Not found".to_string()
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self {
            fields: default_fields(),
            primary_field: default_primary_field(),
            absent_marker: default_absent_marker(),
        }
    }
}

impl FieldSchema {
    /// Creates a schema from fields; the first field is primary.
    #[must_use]
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        let primary_field = fields
            .first()
            .map_or_else(default_primary_field, |f| f.name.clone());
        Self {
            fields,
            primary_field,
            absent_marker: default_absent_marker(),
        }
    }

    /// Sets the primary field.
    #[must_use]
    pub fn with_primary_field(mut self, name: impl Into<String>) -> Self {
        self.primary_field = name.into();
        self
    }

    /// Sets the absent-marker.
    #[must_use]
    pub fn with_absent_marker(mut self, marker: impl Into<String>) -> Self {
        self.absent_marker = marker.into();
        self
    }

    /// Field names in priority order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Index of the first field, in priority order, whose keywords match.
    #[must_use]
    pub fn field_for_header(&self, header_text: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.matches_header(header_text))
    }

    /// Compiles the fallback text patterns of fields that have one.
    ///
    /// # Errors
    ///
    /// Returns an error naming the field whose pattern does not compile.
    pub fn compile_text_patterns(&self) -> Result<Vec<(&str, Regex)>, ConfigError> {
        self.fields
            .iter()
            .filter_map(|f| f.text_pattern.as_deref().map(|p| (f, p)))
            .map(|(field, pattern)| {
                Regex::new(pattern)
                    .map(|regex| (field.name.as_str(), regex))
                    .map_err(|e| {
                        ConfigError::invalid(
                            format!("schema.fields.{}.text_pattern", field.name),
                            e.to_string(),
                        )
                    })
            })
            .collect()
    }

    /// Validates the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no fields, names repeat, a field has no
    /// usable keyword, the primary field is unknown, or a pattern is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fields.is_empty() {
            return Err(ConfigError::invalid("schema.fields", "at least one field is required"));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(ConfigError::invalid("schema.fields", "field names must not be blank"));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ConfigError::invalid(
                    "schema.fields",
                    format!("duplicate field '{}'", field.name),
                ));
            }
            if field.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(ConfigError::invalid(
                    format!("schema.fields.{}.keywords", field.name),
                    "at least one non-blank keyword is required",
                ));
            }
        }

        if self.field(&self.primary_field).is_none() {
            return Err(ConfigError::invalid(
                "schema.primary_field",
                format!("'{}' is not a configured field", self.primary_field),
            ));
        }

        self.compile_text_patterns().map(|_| ())
    }
}
