//! Storage trait for the company directory
//!
//! The search pipeline, enrichment and saved companies only talk to the store
//! through [`CompanyStore`], so tests can run them against an in-memory
//! implementation.

use crate::{
    db::search::predicate::CompiledPredicate,
    models::{Company, NewCompany, Record, SavedCompany},
    Result,
};
use async_trait::async_trait;

/// Storage operations backing search, lookup, enrichment and loading.
#[async_trait]
pub trait CompanyStore: Send + Sync {
    /// Count rows satisfying the predicate
    async fn count_matching(&self, predicate: &CompiledPredicate) -> Result<u64>;

    /// Fetch one page of rows satisfying the predicate, ordered by primary key
    async fn fetch_matching(
        &self,
        predicate: &CompiledPredicate,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Record>>;

    /// Count rows of a validated read-only statement
    async fn count_raw(&self, sql: &str) -> Result<u64>;

    /// Fetch one page of a validated read-only statement
    ///
    /// The statement already carries its ordering; the store only applies
    /// `LIMIT`/`OFFSET` on top of it.
    async fn fetch_raw(&self, sql: &str, limit: u32, offset: u64) -> Result<Vec<Record>>;

    /// Look up a company by primary key
    async fn get_company(&self, id: i32) -> Result<Option<Company>>;

    /// Persist a generated summary and return the updated row
    ///
    /// # Errors
    /// * `CompanyNotFound` - if no row has this id
    async fn update_summary(&self, id: i32, summary: &str) -> Result<Company>;

    /// Total number of companies
    async fn count_all(&self) -> Result<u64>;

    /// Insert a batch of companies in one transaction, returning rows written
    async fn insert_companies(&self, batch: &[NewCompany]) -> Result<u64>;

    /// Number of companies saved by a user
    async fn count_saved(&self, user_id: i32) -> Result<u64>;

    /// One page of a user's saved companies, oldest first, companies attached
    async fn fetch_saved(
        &self,
        user_id: i32,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<SavedCompany>>;

    /// Save a company for a user
    ///
    /// Returns `None` when the user already saved this company.
    async fn insert_saved(
        &self,
        company_id: i32,
        user_id: i32,
        notes: &str,
    ) -> Result<Option<SavedCompany>>;

    /// Replace the notes of a saved company; `None` notes leave them as they are
    ///
    /// Returns `None` when no saved company has this id.
    async fn update_saved_notes(
        &self,
        id: i32,
        notes: Option<&str>,
    ) -> Result<Option<SavedCompany>>;

    /// Delete a saved company, returning whether a row was removed
    async fn delete_saved(&self, id: i32) -> Result<bool>;
}
