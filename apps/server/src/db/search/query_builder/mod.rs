//! SQL query builder for company searches.
//!
//! Two query shapes are produced:
//! - predicate queries rendered from a [`CompiledPredicate`] with positional binds
//! - wrappers around validated generated SQL (count, ordered page)
//!
//! Both shapes end in a top-level ordering so repeated executions page
//! identically.

use crate::db::search::predicate::CompiledPredicate;
use crate::models::{COMPANY_PRIMARY_KEY, COMPANY_TABLE};

mod bind;
mod clauses;
mod generated;

use bind::push_int;
pub use generated::prepare_for_paging;

/// Bind values for `sqlx` queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Text(String),
    Int(i64),
}

/// Renders a compiled predicate against the company table.
pub struct QueryBuilder<'a> {
    predicate: &'a CompiledPredicate,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(predicate: &'a CompiledPredicate) -> Self {
        Self { predicate }
    }

    fn push_where(&self, sql: &mut String, bind_params: &mut Vec<BindValue>) {
        let clauses: Vec<String> = self
            .predicate
            .groups()
            .iter()
            .filter_map(|group| clauses::build_group_clause(group, bind_params))
            .collect();

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
    }

    /// Page query: matching rows ordered by primary key.
    pub fn build_sql(&self, limit: u32, offset: u64) -> (String, Vec<BindValue>) {
        let mut sql = format!("SELECT c.* FROM {} c", COMPANY_TABLE);
        let mut bind_params = Vec::new();

        self.push_where(&mut sql, &mut bind_params);

        let limit_idx = push_int(&mut bind_params, i64::from(limit));
        let offset_idx = push_int(&mut bind_params, offset as i64);
        sql.push_str(&format!(
            " ORDER BY c.{} ASC LIMIT ${} OFFSET ${}",
            COMPANY_PRIMARY_KEY, limit_idx, offset_idx
        ));

        (sql, bind_params)
    }

    pub fn build_count_sql(&self) -> (String, Vec<BindValue>) {
        let mut sql = format!("SELECT COUNT(*) FROM {} c", COMPANY_TABLE);
        let mut bind_params = Vec::new();
        self.push_where(&mut sql, &mut bind_params);
        (sql, bind_params)
    }
}

/// Total row count of a statement prepared by [`prepare_for_paging`].
pub fn raw_count_sql(sql: &str) -> String {
    format!("SELECT COUNT(*) FROM ({}) AS generated_query", sql)
}

/// One page of a statement prepared by [`prepare_for_paging`]. The window is
/// applied at the statement's own level, right after its top-level ordering,
/// so rows come back in that order. Binds: `$1` limit, `$2` offset.
pub fn raw_page_sql(sql: &str) -> String {
    format!("{} LIMIT $1 OFFSET $2", sql)
}
