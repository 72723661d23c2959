//! Paged execution of compiled predicates and validated generated SQL.

use std::sync::Arc;

use crate::db::traits::CompanyStore;
use crate::{Error, Result};

use super::paging::{Pagination, ResultPage};
use super::predicate::CompiledPredicate;
use super::query_builder::prepare_for_paging;

/// Page of a generated statement together with the SQL that produced it.
#[derive(Debug, Clone)]
pub struct RawSqlPage {
    pub page: ResultPage,
    pub executed_sql: String,
}

#[derive(Clone)]
pub struct PagedExecutor {
    store: Arc<dyn CompanyStore>,
}

impl PagedExecutor {
    pub fn new(store: Arc<dyn CompanyStore>) -> Self {
        Self { store }
    }

    pub async fn run_predicate(
        &self,
        predicate: &CompiledPredicate,
        pagination: Pagination,
    ) -> Result<ResultPage> {
        let total = self.store.count_matching(predicate).await?;
        let window = pagination.window(total);

        let items = if total == 0 {
            Vec::new()
        } else {
            self.store
                .fetch_matching(predicate, window.limit, window.offset)
                .await?
        };

        Ok(ResultPage::new(items, total, window))
    }

    /// Run a statement that already passed the safety validator.
    ///
    /// The statement is rewritten by [`prepare_for_paging`] first; the
    /// rewritten text is what runs and what is echoed back.
    ///
    /// Any store failure is reported as [`Error::Execution`] so the caller can
    /// fall back to filter search.
    pub async fn run_raw_sql(&self, sql: &str, pagination: Pagination) -> Result<RawSqlPage> {
        let executed_sql = prepare_for_paging(sql);

        let total = self
            .store
            .count_raw(&executed_sql)
            .await
            .map_err(into_execution_error)?;
        let window = pagination.window(total);

        let items = if total == 0 {
            Vec::new()
        } else {
            self.store
                .fetch_raw(&executed_sql, window.limit, window.offset)
                .await
                .map_err(into_execution_error)?
        };

        tracing::debug!(
            total,
            current_page = window.current_page,
            returned = items.len(),
            "Generated SQL executed"
        );

        Ok(RawSqlPage {
            page: ResultPage::new(items, total, window),
            executed_sql,
        })
    }
}

fn into_execution_error(err: Error) -> Error {
    match err {
        Error::Execution(msg) => Error::Execution(msg),
        Error::Database(e) => Error::Execution(e.to_string()),
        other => Error::Execution(other.to_string()),
    }
}
