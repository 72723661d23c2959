//! Filter compilation.
//!
//! Turns [`SearchFilters`] into a [`CompiledPredicate`]: groups of per-field
//! conditions. Explicit filters form an AND group; AI-derived hints form an OR
//! group. Groups are ANDed together. The predicate is backend neutral; the
//! Postgres rendering lives in the query builder.

use crate::models::{FilterField, FilterValue, Record, SearchFilters};
use crate::{Error, Result};

use super::escape::quote_literal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Case-insensitive substring match on a text column.
    Contains { column: &'static str, needle: String },
    /// Inclusive lower bound on an integer column.
    AtLeast { column: &'static str, bound: i64 },
    /// Inclusive upper bound on an integer column.
    AtMost { column: &'static str, bound: i64 },
}

impl Condition {
    pub fn column(&self) -> &'static str {
        match self {
            Condition::Contains { column, .. }
            | Condition::AtLeast { column, .. }
            | Condition::AtMost { column, .. } => column,
        }
    }

    /// SQL-like rendering for prompt text.
    pub fn describe(&self) -> String {
        match self {
            Condition::Contains { column, needle } => {
                format!("{column} ILIKE {}", quote_literal(&format!("%{needle}%")))
            }
            Condition::AtLeast { column, bound } => format!("{column} >= {bound}"),
            Condition::AtMost { column, bound } => format!("{column} <= {bound}"),
        }
    }

    /// Evaluate against an in-memory record (missing or null columns never match).
    pub fn matches(&self, record: &Record) -> bool {
        let value = record.get(self.column());
        match self {
            Condition::Contains { needle, .. } => value
                .and_then(|v| v.as_str())
                .map(|s| s.to_lowercase().contains(&needle.to_lowercase()))
                .unwrap_or(false),
            Condition::AtLeast { bound, .. } => value
                .and_then(|v| v.as_i64())
                .map(|v| v >= *bound)
                .unwrap_or(false),
            Condition::AtMost { bound, .. } => value
                .and_then(|v| v.as_i64())
                .map(|v| v <= *bound)
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    All,
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionGroup {
    pub combinator: Combinator,
    pub conditions: Vec<Condition>,
}

impl ConditionGroup {
    fn matches(&self, record: &Record) -> bool {
        match self.combinator {
            Combinator::All => self.conditions.iter().all(|c| c.matches(record)),
            Combinator::Any => self.conditions.iter().any(|c| c.matches(record)),
        }
    }
}

/// AND of condition groups. Empty groups are never stored, so an empty
/// predicate matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledPredicate {
    groups: Vec<ConditionGroup>,
}

impl CompiledPredicate {
    pub fn match_all() -> Self {
        Self::default()
    }

    fn with_group(mut self, combinator: Combinator, conditions: Vec<Condition>) -> Self {
        if !conditions.is_empty() {
            self.groups.push(ConditionGroup {
                combinator,
                conditions,
            });
        }
        self
    }

    /// Conjunction of both predicates.
    pub fn and(mut self, other: CompiledPredicate) -> Self {
        self.groups.extend(other.groups);
        self
    }

    pub fn groups(&self) -> &[ConditionGroup] {
        &self.groups
    }

    pub fn is_unconstrained(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.groups.iter().flat_map(|g| g.conditions.iter())
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.groups.iter().all(|g| g.matches(record))
    }
}

/// The value could not be turned into a condition for its field.
struct InvalidValue;

type BuildResult = std::result::Result<Condition, InvalidValue>;
type ConditionBuilder = fn(&'static str, &FilterValue) -> BuildResult;

/// Static field table: which condition each filter field produces.
const FIELD_RULES: &[(FilterField, ConditionBuilder)] = &[
    (FilterField::Name, contains),
    (FilterField::Industry, contains),
    (FilterField::Country, contains),
    (FilterField::Region, contains),
    (FilterField::Size, contains),
    (FilterField::Locality, contains),
    (FilterField::FoundedFrom, at_least),
    (FilterField::FoundedTo, at_most),
];

fn contains(column: &'static str, value: &FilterValue) -> BuildResult {
    Ok(Condition::Contains {
        column,
        needle: value.to_string().trim().to_string(),
    })
}

fn at_least(column: &'static str, value: &FilterValue) -> BuildResult {
    let bound = value.as_integer().ok_or(InvalidValue)?;
    Ok(Condition::AtLeast { column, bound })
}

fn at_most(column: &'static str, value: &FilterValue) -> BuildResult {
    let bound = value.as_integer().ok_or(InvalidValue)?;
    Ok(Condition::AtMost { column, bound })
}

fn build_conditions<F>(filters: &SearchFilters, mut on_invalid: F) -> Result<Vec<Condition>>
where
    F: FnMut(FilterField, &FilterValue) -> Result<()>,
{
    let mut conditions = Vec::new();
    for (field, build) in FIELD_RULES {
        let Some(value) = filters.get(*field) else {
            continue;
        };
        if value.is_blank() {
            continue;
        }
        match build(field.column(), value) {
            Ok(condition) => conditions.push(condition),
            Err(InvalidValue) => on_invalid(*field, value)?,
        }
    }
    Ok(conditions)
}

/// Compile explicit filters into an AND group.
///
/// Non-numeric `founded_from`/`founded_to` values fail with
/// [`Error::InvalidFilterValue`].
pub fn compile(filters: &SearchFilters) -> Result<CompiledPredicate> {
    let conditions = build_conditions(filters, |field, value| {
        Err(Error::InvalidFilterValue {
            field: field.to_string(),
            value: value.to_string(),
        })
    })?;
    Ok(CompiledPredicate::match_all().with_group(Combinator::All, conditions))
}

/// Compile AI-derived hints into an OR group. Unusable hint values are dropped.
pub fn compile_hints(hints: &SearchFilters) -> CompiledPredicate {
    let conditions = build_conditions(hints, |field, value| {
        tracing::debug!(field = %field, value = %value, "Dropping unusable filter hint");
        Ok(())
    })
    .unwrap_or_default();
    CompiledPredicate::match_all().with_group(Combinator::Any, conditions)
}

/// Compiled explicit filters (AND) combined with AI hints (OR).
pub fn merge(explicit: CompiledPredicate, hints: Option<&SearchFilters>) -> CompiledPredicate {
    match hints {
        Some(hints) => explicit.and(compile_hints(hints)),
        None => explicit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn compile_builds_and_group_in_field_order() {
        let filters = SearchFilters::new()
            .with_text(FilterField::Country, "germany")
            .with_text(FilterField::Industry, "tech")
            .with_text(FilterField::FoundedFrom, "2010")
            .with_text(FilterField::FoundedTo, "2020");

        let predicate = compile(&filters).unwrap();
        assert_eq!(predicate.groups().len(), 1);
        let group = &predicate.groups()[0];
        assert_eq!(group.combinator, Combinator::All);
        assert_eq!(
            group.conditions,
            vec![
                Condition::Contains {
                    column: "industry",
                    needle: "tech".to_string()
                },
                Condition::Contains {
                    column: "country",
                    needle: "germany".to_string()
                },
                Condition::AtLeast {
                    column: "founded",
                    bound: 2010
                },
                Condition::AtMost {
                    column: "founded",
                    bound: 2020
                },
            ]
        );
    }

    #[test]
    fn compile_rejects_non_numeric_year() {
        let filters = SearchFilters::new().with_text(FilterField::FoundedFrom, "last year");
        match compile(&filters) {
            Err(Error::InvalidFilterValue { field, value }) => {
                assert_eq!(field, "founded_from");
                assert_eq!(value, "last year");
            }
            other => panic!("expected InvalidFilterValue, got {other:?}"),
        }
    }

    #[test]
    fn empty_filters_are_unconstrained() {
        let predicate = compile(&SearchFilters::new()).unwrap();
        assert!(predicate.is_unconstrained());
        assert!(predicate.matches(&record(json!({"name": "anything"}))));
    }

    #[test]
    fn hints_widen_instead_of_narrowing() {
        let hints = SearchFilters::new()
            .with_text(FilterField::Industry, "software")
            .with_text(FilterField::Country, "france")
            .with_text(FilterField::FoundedFrom, "recently");

        let predicate = compile_hints(&hints);
        assert_eq!(predicate.groups().len(), 1);
        assert_eq!(predicate.groups()[0].combinator, Combinator::Any);
        // The non-numeric hint is dropped rather than failing.
        assert_eq!(predicate.groups()[0].conditions.len(), 2);

        let software = record(json!({"industry": "Computer Software", "country": "spain"}));
        let french = record(json!({"industry": "retail", "country": "France"}));
        let neither = record(json!({"industry": "retail", "country": "spain"}));
        assert!(predicate.matches(&software));
        assert!(predicate.matches(&french));
        assert!(!predicate.matches(&neither));
    }

    #[test]
    fn merge_requires_explicit_and_any_hint() {
        let explicit = SearchFilters::new().with_text(FilterField::Country, "germany");
        let hints = SearchFilters::new()
            .with_text(FilterField::Industry, "tech")
            .with_text(FilterField::Size, "51-200");

        let predicate = merge(compile(&explicit).unwrap(), Some(&hints));
        assert_eq!(predicate.groups().len(), 2);
        assert_eq!(merge(compile(&explicit).unwrap(), None).groups().len(), 1);

        let berlin_tech = record(json!({"country": "Germany", "industry": "tech", "size": "1-10"}));
        let paris_tech = record(json!({"country": "France", "industry": "tech", "size": "51-200"}));
        let berlin_food = record(json!({"country": "germany", "industry": "food", "size": "11-50"}));
        assert!(predicate.matches(&berlin_tech));
        assert!(!predicate.matches(&paris_tech));
        assert!(!predicate.matches(&berlin_food));
    }

    #[test]
    fn range_conditions_are_inclusive_and_skip_nulls() {
        let filters = SearchFilters::new()
            .with(FilterField::FoundedFrom, FilterValue::Integer(2015))
            .with(FilterField::FoundedTo, FilterValue::Integer(2015));
        let predicate = compile(&filters).unwrap();
        assert!(predicate.matches(&record(json!({"founded": 2015}))));
        assert!(!predicate.matches(&record(json!({"founded": 2016}))));
        assert!(!predicate.matches(&record(json!({"founded": null}))));
    }

    #[test]
    fn describe_renders_prompt_conditions() {
        let c = Condition::Contains {
            column: "name",
            needle: "o'neil".to_string(),
        };
        assert_eq!(c.describe(), "name ILIKE '%o''neil%'");
        let c = Condition::AtLeast {
            column: "founded",
            bound: 2015,
        };
        assert_eq!(c.describe(), "founded >= 2015");
    }
}
