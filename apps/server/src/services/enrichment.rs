//! Company enrichment - generated summaries
//!
//! A summary is built from the stored company fields plus the visible text of
//! the company website, then persisted as `ai_summary`. Website problems only
//! reduce the context; generation failures fail the enrichment.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::AiConfig,
    db::CompanyStore,
    metrics::ENRICHMENT_TOTAL,
    models::Company,
    services::{
        page_text::PageTextSource,
        text_generation::{complete_with_timeout, TextGenerator},
    },
    Error, Result,
};

/// Failure of one item in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchItemError {
    pub company_id: i32,
    pub category: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchEnrichment {
    pub enriched: Vec<Company>,
    pub errors: Vec<BatchItemError>,
}

pub struct EnrichmentService {
    store: Arc<dyn CompanyStore>,
    pages: Arc<dyn PageTextSource>,
    generator: Arc<dyn TextGenerator>,
    summary_max_tokens: u32,
    timeout: Duration,
}

impl EnrichmentService {
    pub fn new(
        store: Arc<dyn CompanyStore>,
        pages: Arc<dyn PageTextSource>,
        generator: Arc<dyn TextGenerator>,
        config: &AiConfig,
    ) -> Self {
        Self {
            store,
            pages,
            generator,
            summary_max_tokens: config.summary_max_tokens,
            timeout: config.generation_timeout(),
        }
    }

    /// Generate and persist a summary for one company.
    pub async fn enrich_company(&self, id: i32) -> Result<Company> {
        let result = self.enrich(id).await;
        let status = if result.is_ok() { "success" } else { "failure" };
        ENRICHMENT_TOTAL.with_label_values(&[status]).inc();
        result
    }

    async fn enrich(&self, id: i32) -> Result<Company> {
        let company = self
            .store
            .get_company(id)
            .await?
            .ok_or(Error::CompanyNotFound(id))?;

        let page_text = self.page_text(&company).await;
        let prompt = summary_prompt(&company, &page_text);

        let summary = complete_with_timeout(
            self.generator.as_ref(),
            &prompt,
            None,
            self.summary_max_tokens,
            self.timeout,
        )
        .await?;

        let updated = self.store.update_summary(id, summary.trim()).await?;
        tracing::info!(company_id = id, "Company enriched");
        Ok(updated)
    }

    async fn page_text(&self, company: &Company) -> String {
        let Some(website) = company
            .website
            .as_deref()
            .filter(|w| !w.trim().is_empty())
        else {
            return String::new();
        };

        match self.pages.fetch_text(website).await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(
                    company_id = company.id,
                    website = %website,
                    error = %err,
                    "Website text unavailable, summarizing from stored fields"
                );
                String::new()
            }
        }
    }

    /// Enrich companies one after another. A failing id is reported and the
    /// batch continues.
    ///
    /// # Errors
    /// * `Validation` - if `ids` is empty
    pub async fn batch_enrich(&self, ids: &[i32]) -> Result<BatchEnrichment> {
        if ids.is_empty() {
            return Err(Error::Validation("No company IDs provided".to_string()));
        }

        let mut report = BatchEnrichment::default();
        for &id in ids {
            match self.enrich_company(id).await {
                Ok(company) => report.enriched.push(company),
                Err(err) => {
                    tracing::warn!(company_id = id, error = %err, "Batch item failed");
                    report.errors.push(BatchItemError {
                        company_id: id,
                        category: err.category(),
                        message: err.public_message(),
                    });
                }
            }
        }

        tracing::info!(
            requested = ids.len(),
            enriched = report.enriched.len(),
            failed = report.errors.len(),
            "Batch enrichment finished"
        );
        Ok(report)
    }
}

fn field(value: Option<&str>) -> &str {
    value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or("unknown")
}

fn summary_prompt(company: &Company, page_text: &str) -> String {
    let founded = company
        .founded
        .map(|year| year.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let location = company.location();
    let website_content = if page_text.trim().is_empty() {
        "(not available)"
    } else {
        page_text
    };

    format!(
        "Based on the following company information and website content, write a concise summary.\n\n\
         Company information:\n\
         - Name: {name}\n\
         - Industry: {industry}\n\
         - Location: {location}\n\
         - Founded: {founded}\n\
         - Size: {size}\n\n\
         Website content:\n{website_content}\n\n\
         Write 2-3 sentences about what the company does and its key characteristics.",
        name = company.name,
        industry = field(company.industry.as_deref()),
        location = if location.is_empty() { "unknown" } else { &location },
        founded = founded,
        size = field(company.size.as_deref()),
        website_content = website_content,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_known_fields_and_page_text() {
        let company = Company {
            id: 1,
            website: Some("acme.io".to_string()),
            name: "Acme".to_string(),
            founded: Some(2012),
            size: None,
            locality: Some("Lyon".to_string()),
            region: None,
            country: Some("france".to_string()),
            industry: Some("robotics".to_string()),
            linkedin_url: None,
            ai_summary: None,
            created_at: None,
            updated_at: None,
        };

        let prompt = summary_prompt(&company, "We build welding robots.");
        assert!(prompt.contains("- Name: Acme"));
        assert!(prompt.contains("- Location: Lyon, france"));
        assert!(prompt.contains("- Founded: 2012"));
        assert!(prompt.contains("- Size: unknown"));
        assert!(prompt.contains("We build welding robots."));
        assert!(prompt.contains("2-3 sentences"));

        let prompt = summary_prompt(&company, "  ");
        assert!(prompt.contains("(not available)"));
    }
}
