//! Search service - unified company search
//!
//! Decides, per request, how a page of companies is produced:
//! - no text query: explicit filters only, no model calls
//! - text query: generated SQL, gated by the safety validator
//! - any failure on the generated path: one fallback to filter search, with
//!   model-extracted hints ORed onto the explicit filters
//!
//! Failures on the generated path are logged and never reach the caller.
//! Errors on the fallback path are returned as-is.

use serde::Serialize;

use crate::{
    db::search::{
        predicate::{self, CompiledPredicate},
        Pagination, PagedExecutor, RawSqlPage, ResultPage, SqlSafetyValidator, ValidationVerdict,
    },
    metrics::{SEARCH_FALLBACKS_TOTAL, SEARCH_RESULTS, SEARCH_TOTAL, SQL_REJECTIONS_TOTAL},
    models::SearchFilters,
    services::query_generator::{FilterHint, QueryGenerator},
    Error, Result,
};

/// Which path produced the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Explicit filters only; no text query was given.
    Filters,
    /// Validated generated SQL.
    GeneratedSql,
    /// Text query given, but the generated path failed.
    FilterFallback,
}

impl SearchStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchStrategy::Filters => "filters",
            SearchStrategy::GeneratedSql => "generated_sql",
            SearchStrategy::FilterFallback => "filter_fallback",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub page: ResultPage,
    /// Executed SQL, present only when the generated path succeeded.
    pub sql_query: Option<String>,
    pub strategy: SearchStrategy,
}

pub struct SearchService {
    generator: QueryGenerator,
    validator: SqlSafetyValidator,
    executor: PagedExecutor,
}

impl SearchService {
    pub fn new(
        generator: QueryGenerator,
        validator: SqlSafetyValidator,
        executor: PagedExecutor,
    ) -> Self {
        Self {
            generator,
            validator,
            executor,
        }
    }

    /// Run one search.
    ///
    /// # Errors
    /// * `InvalidFilterValue` - explicit filters do not compile (before any model call)
    /// * store errors from the filter path
    pub async fn unified_search(
        &self,
        filters: &SearchFilters,
        text_query: Option<&str>,
        pagination: Pagination,
    ) -> Result<SearchOutcome> {
        let explicit = predicate::compile(filters)?;

        let query = text_query.map(str::trim).filter(|q| !q.is_empty());
        let outcome = match query {
            None => {
                let page = self.executor.run_predicate(&explicit, pagination).await?;
                SearchOutcome {
                    page,
                    sql_query: None,
                    strategy: SearchStrategy::Filters,
                }
            }
            Some(query) => match self.generated_sql_search(query, &explicit, pagination).await {
                Ok(RawSqlPage { page, executed_sql }) => SearchOutcome {
                    page,
                    sql_query: Some(executed_sql),
                    strategy: SearchStrategy::GeneratedSql,
                },
                Err(err) => {
                    tracing::warn!(
                        query = %query,
                        reason = err.category(),
                        error = %err,
                        "Generated SQL search failed, falling back to filter search"
                    );
                    SEARCH_FALLBACKS_TOTAL
                        .with_label_values(&[err.category()])
                        .inc();
                    self.filter_fallback(query, explicit, pagination).await?
                }
            },
        };

        SEARCH_TOTAL
            .with_label_values(&[outcome.strategy.as_str()])
            .inc();
        SEARCH_RESULTS
            .with_label_values(&[outcome.strategy.as_str()])
            .observe(outcome.page.items.len() as f64);
        tracing::info!(
            strategy = outcome.strategy.as_str(),
            total = outcome.page.total,
            current_page = outcome.page.current_page,
            "Search completed"
        );

        Ok(outcome)
    }

    /// Generate, validate and execute SQL for `query`. Every failure is
    /// returned as an error so the caller can fall back.
    async fn generated_sql_search(
        &self,
        query: &str,
        explicit: &CompiledPredicate,
        pagination: Pagination,
    ) -> Result<RawSqlPage> {
        let generated = self.generator.text_to_sql(query, explicit).await?;

        if let ValidationVerdict::Rejected(reason) = self.validator.validate(&generated.sql) {
            SQL_REJECTIONS_TOTAL.with_label_values(&[reason.kind()]).inc();
            tracing::info!(
                query = %generated.source,
                sql = %generated.sql,
                reason = %reason,
                "Generated SQL rejected"
            );
            return Err(Error::ValidationRejected(reason));
        }

        self.executor.run_raw_sql(&generated.sql, pagination).await
    }

    async fn filter_fallback(
        &self,
        query: &str,
        explicit: CompiledPredicate,
        pagination: Pagination,
    ) -> Result<SearchOutcome> {
        let hints = match self.generator.text_to_filters(query).await {
            Ok(FilterHint::Extracted(hints)) => {
                tracing::debug!(hints = hints.len(), "Applying extracted filter hints");
                Some(hints)
            }
            Ok(FilterHint::NoHint) => None,
            Err(err) => {
                tracing::warn!(error = %err, "Filter extraction failed, using explicit filters only");
                None
            }
        };
        let predicate = predicate::merge(explicit, hints.as_ref());

        let page = self.executor.run_predicate(&predicate, pagination).await?;
        Ok(SearchOutcome {
            page,
            sql_query: None,
            strategy: SearchStrategy::FilterFallback,
        })
    }
}
