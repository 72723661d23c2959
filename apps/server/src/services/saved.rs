//! Saved companies - per-user bookmarks with notes
//!
//! Listings follow the search pagination contract: lenient page input, pages
//! past the end clamped to the last page.

use std::sync::Arc;

use crate::{
    db::{
        search::{Pagination, ResultPage},
        CompanyStore,
    },
    models::SavedCompany,
    Error, Result,
};

pub struct SavedCompanyService {
    store: Arc<dyn CompanyStore>,
}

impl SavedCompanyService {
    pub fn new(store: Arc<dyn CompanyStore>) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        user_id: i32,
        pagination: Pagination,
    ) -> Result<ResultPage<SavedCompany>> {
        let total = self.store.count_saved(user_id).await?;
        let window = pagination.window(total);

        let items = if total == 0 {
            Vec::new()
        } else {
            self.store
                .fetch_saved(user_id, window.limit, window.offset)
                .await?
        };

        Ok(ResultPage::new(items, total, window))
    }

    /// Save `company_id` for `user_id`.
    ///
    /// # Errors
    /// * `CompanyNotFound` - if the company does not exist
    /// * `AlreadySaved` - if the user already saved this company
    pub async fn save(&self, user_id: i32, company_id: i32, notes: &str) -> Result<SavedCompany> {
        let company = self
            .store
            .get_company(company_id)
            .await?
            .ok_or(Error::CompanyNotFound(company_id))?;

        let mut saved = self
            .store
            .insert_saved(company_id, user_id, notes)
            .await?
            .ok_or(Error::AlreadySaved {
                company_id,
                user_id,
            })?;
        saved.company.get_or_insert(company);

        tracing::info!(saved_id = saved.id, company_id, user_id, "Company saved");
        Ok(saved)
    }

    pub async fn update_notes(&self, id: i32, notes: Option<&str>) -> Result<SavedCompany> {
        self.store
            .update_saved_notes(id, notes)
            .await?
            .ok_or(Error::SavedCompanyNotFound(id))
    }

    pub async fn delete(&self, id: i32) -> Result<()> {
        if !self.store.delete_saved(id).await? {
            return Err(Error::SavedCompanyNotFound(id));
        }
        tracing::info!(saved_id = id, "Saved company deleted");
        Ok(())
    }
}
