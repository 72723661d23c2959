//! Structured search filters
//!
//! The filter vocabulary is a closed set of fields. Input maps (query strings,
//! AI-produced JSON) are projected onto it; keys outside the set are dropped
//! without error.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    Name,
    Industry,
    Country,
    Region,
    Size,
    Locality,
    FoundedFrom,
    FoundedTo,
}

impl FilterField {
    pub const ALL: [FilterField; 8] = [
        FilterField::Name,
        FilterField::Industry,
        FilterField::Country,
        FilterField::Region,
        FilterField::Size,
        FilterField::Locality,
        FilterField::FoundedFrom,
        FilterField::FoundedTo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterField::Name => "name",
            FilterField::Industry => "industry",
            FilterField::Country => "country",
            FilterField::Region => "region",
            FilterField::Size => "size",
            FilterField::Locality => "locality",
            FilterField::FoundedFrom => "founded_from",
            FilterField::FoundedTo => "founded_to",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == key.trim())
    }

    /// Column the filter constrains.
    pub fn column(self) -> &'static str {
        match self {
            FilterField::FoundedFrom | FilterField::FoundedTo => "founded",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
}

impl FilterValue {
    pub fn is_blank(&self) -> bool {
        matches!(self, FilterValue::Text(s) if s.trim().is_empty())
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FilterValue::Integer(v) => Some(*v),
            FilterValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(s) => f.write_str(s),
            FilterValue::Integer(v) => write!(f, "{v}"),
        }
    }
}

/// Field-to-value map for one search call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchFilters {
    values: BTreeMap<FilterField, FilterValue>,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; blank text values are not recorded.
    pub fn with(mut self, field: FilterField, value: FilterValue) -> Self {
        if !value.is_blank() {
            self.values.insert(field, value);
        }
        self
    }

    pub fn with_text(self, field: FilterField, value: impl Into<String>) -> Self {
        self.with(field, FilterValue::Text(value.into()))
    }

    /// Project raw key/value pairs (e.g. a query string) onto the known fields.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        pairs
            .into_iter()
            .fold(Self::new(), |filters, (key, value)| {
                match FilterField::from_key(key) {
                    Some(field) => filters.with_text(field, value.trim()),
                    None => filters,
                }
            })
    }

    /// Project a JSON object onto the known fields. Strings and integers are
    /// accepted; other value kinds are dropped.
    pub fn from_json_object(object: &Map<String, JsonValue>) -> Self {
        object
            .iter()
            .fold(Self::new(), |filters, (key, value)| {
                let Some(field) = FilterField::from_key(key) else {
                    return filters;
                };
                match value {
                    JsonValue::String(s) => filters.with_text(field, s.trim()),
                    JsonValue::Number(n) => match n.as_i64() {
                        Some(v) => filters.with(field, FilterValue::Integer(v)),
                        None => filters.with_text(field, n.to_string()),
                    },
                    _ => filters,
                }
            })
    }

    pub fn get(&self, field: FilterField) -> Option<&FilterValue> {
        self.values.get(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}
