// Biographical records and the text derived from them.
//
// Records arrive as flat JSON objects straight from the scrapers: a `name`
// plus any number of free-text fields. Field values are usually strings,
// sometimes lists of strings, sometimes null. Scoring only ever sees the
// combined text built here; the record itself is never modified.

pub mod group;

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Scraper placeholders such as "No publications found." carry no content.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^no [\w ]+ found\.?$").expect("placeholder pattern is valid")
});

/// One entity to be ranked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    /// Every other key of the source object, in source order.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style helper for setting a string field.
    pub fn with_field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields
            .insert(key.to_string(), Value::String(value.into()));
        self
    }

    /// Text of one field. Missing, null, non-text, and placeholder values
    /// are all empty.
    pub fn field_text(&self, key: &str) -> String {
        match self.fields.get(key) {
            Some(value) => value_text(value),
            None => String::new(),
        }
    }

    /// Non-empty fields in the given order, joined by single spaces.
    pub fn combined_text(&self, fields: &[String]) -> String {
        fields
            .iter()
            .map(|key| self.field_text(key))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A null name reads as empty rather than failing the whole file.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => clean(s),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(clean)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    }
}

fn clean(text: &str) -> String {
    let trimmed = text.trim();
    if PLACEHOLDER.is_match(trimmed) {
        String::new()
    } else {
        trimmed.to_string()
    }
}
