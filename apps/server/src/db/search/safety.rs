//! Textual safety gate for generated SQL.
//!
//! Generated statements come from an external model and are checked before they
//! reach the store. The checks are lexical, not a parser: they are conservative
//! and may reject some harmless statements. Rules run in a fixed order and the
//! first failing rule decides the rejection reason: sentinel, mutating keyword,
//! select prefix, then table allow-list.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

use crate::models::COMPANY_TABLE;

/// Marker the generator is told to emit when a request has no SQL translation.
pub const UNTRANSLATABLE_SENTINEL: &str = "NO_TRANSLATABLE_QUERY";

/// Statement keywords that modify data or schema.
pub const FORBIDDEN_OPERATIONS: &[&str] = &[
    "drop", "delete", "truncate", "update", "insert", "alter", "create",
];

lazy_static! {
    static ref FORBIDDEN_RE: Regex =
        Regex::new(r"(?i)\b(drop|delete|truncate|update|insert|alter|create)\b")
            .expect("forbidden operation pattern is valid");
    static ref TABLE_REF_RE: Regex =
        Regex::new(r#"(?i)\b(?:from|join)\s+((?:"[^"]+"|[A-Za-z_][A-Za-z0-9_$]*)(?:\s*\.\s*(?:"[^"]+"|[A-Za-z_][A-Za-z0-9_$]*))*)"#)
            .expect("table reference pattern is valid");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    Untranslatable,
    NotASelect,
    ForbiddenOperation(String),
    UnauthorizedTable(String),
}

impl RejectionReason {
    /// Reason without its detail, suitable as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            RejectionReason::Untranslatable => "untranslatable",
            RejectionReason::NotASelect => "not_a_select",
            RejectionReason::ForbiddenOperation(_) => "forbidden_operation",
            RejectionReason::UnauthorizedTable(_) => "unauthorized_table",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::ForbiddenOperation(op) => write!(f, "forbidden_operation:{op}"),
            RejectionReason::UnauthorizedTable(name) => write!(f, "unauthorized_table:{name}"),
            other => f.write_str(other.kind()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationVerdict {
    Valid,
    Rejected(RejectionReason),
}

impl ValidationVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationVerdict::Valid)
    }
}

/// Validator with an allow-list of readable tables.
#[derive(Debug, Clone)]
pub struct SqlSafetyValidator {
    allowed_tables: Vec<String>,
}

impl Default for SqlSafetyValidator {
    fn default() -> Self {
        Self::new([COMPANY_TABLE])
    }
}

impl SqlSafetyValidator {
    pub fn new<I, S>(allowed_tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_tables: allowed_tables
                .into_iter()
                .map(|t| t.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn validate(&self, sql: &str) -> ValidationVerdict {
        match self.check(sql) {
            Ok(()) => ValidationVerdict::Valid,
            Err(reason) => ValidationVerdict::Rejected(reason),
        }
    }

    fn check(&self, sql: &str) -> Result<(), RejectionReason> {
        if sql
            .to_ascii_uppercase()
            .contains(UNTRANSLATABLE_SENTINEL)
        {
            return Err(RejectionReason::Untranslatable);
        }

        // A mutating statement reports its operation, not just "not a select".
        if let Some(found) = FORBIDDEN_RE.find(sql) {
            return Err(RejectionReason::ForbiddenOperation(
                found.as_str().to_ascii_lowercase(),
            ));
        }

        let normalized = sql.trim().to_lowercase();
        if !normalized.starts_with("select") {
            return Err(RejectionReason::NotASelect);
        }

        for captures in TABLE_REF_RE.captures_iter(sql) {
            let raw = &captures[1];
            let name = normalize_table_name(raw);
            if !self.allowed_tables.iter().any(|t| *t == name) {
                return Err(RejectionReason::UnauthorizedTable(name));
            }
        }

        Ok(())
    }
}

/// Lowercased, unquoted, whitespace-free table reference. Schema-qualified
/// names keep their qualifier, so `public.companies` is not on the allow-list.
fn normalize_table_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '"')
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(sql: &str) -> ValidationVerdict {
        SqlSafetyValidator::default().validate(sql)
    }

    fn rejected(sql: &str) -> String {
        match verdict(sql) {
            ValidationVerdict::Rejected(reason) => reason.to_string(),
            ValidationVerdict::Valid => panic!("expected rejection for {sql:?}"),
        }
    }

    #[test]
    fn accepts_plain_select_on_companies() {
        assert!(verdict("SELECT * FROM companies WHERE founded > 2015").is_valid());
        assert!(verdict("  select name from Companies order by id").is_valid());
        assert!(verdict("SELECT * FROM \"companies\" WHERE created_at > now()").is_valid());
    }

    #[test]
    fn sentinel_wins_over_every_other_rule() {
        assert_eq!(rejected("NO_TRANSLATABLE_QUERY"), "untranslatable");
        assert_eq!(
            rejected("-- no_translatable_query\nDROP TABLE companies"),
            "untranslatable"
        );
    }

    #[test]
    fn mutating_statements_report_their_operation() {
        assert_eq!(rejected("DROP TABLE companies"), "forbidden_operation:drop");
        assert_eq!(
            rejected("insert into companies (name) values ('x')"),
            "forbidden_operation:insert"
        );
    }

    #[test]
    fn non_select_statements_are_rejected() {
        assert_eq!(rejected("with x as (select 1) select * from x"), "not_a_select");
        assert_eq!(rejected("EXPLAIN SELECT * FROM companies"), "not_a_select");
        assert_eq!(rejected(""), "not_a_select");
    }

    #[test]
    fn mutating_keywords_are_rejected_as_standalone_tokens() {
        for op in FORBIDDEN_OPERATIONS {
            let sql = format!("SELECT * FROM companies; {} something", op.to_uppercase());
            assert_eq!(rejected(&sql), format!("forbidden_operation:{op}"));
        }
        // Identifiers that merely contain a keyword are allowed.
        assert!(verdict("SELECT created_at, updated_at FROM companies").is_valid());
    }

    #[test]
    fn first_forbidden_keyword_is_reported() {
        assert_eq!(
            rejected("select 1; delete from companies; drop table companies"),
            "forbidden_operation:delete"
        );
    }

    #[test]
    fn tables_outside_allow_list_are_rejected() {
        assert_eq!(rejected("SELECT * FROM users"), "unauthorized_table:users");
        assert_eq!(
            rejected("SELECT * FROM companies c JOIN saved_companies s ON s.company_id = c.id"),
            "unauthorized_table:saved_companies"
        );
        assert_eq!(
            rejected("SELECT * FROM pg_catalog.pg_tables"),
            "unauthorized_table:pg_catalog.pg_tables"
        );
    }

    #[test]
    fn subqueries_are_checked_at_every_level() {
        assert!(verdict(
            "SELECT * FROM (SELECT * FROM companies WHERE founded > 2000) AS recent"
        )
        .is_valid());
        assert_eq!(
            rejected("SELECT * FROM (SELECT * FROM secrets) AS s"),
            "unauthorized_table:secrets"
        );
    }
}
