//! Shared application state

use sqlx::PgPool;
use std::sync::Arc;

use crate::{
    db::{self, CompanyStore, PagedExecutor, PostgresCompanyStore},
    db::search::SqlSafetyValidator,
    services::{
        EnrichmentService, HttpPageFetcher, OpenAiClient, PageTextSource, QueryGenerator,
        SavedCompanyService, SearchService, TextGenerator,
    },
    Config,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Present when backed by Postgres; absent for in-memory stores.
    pub db_pool: Option<PgPool>,
    pub store: Arc<dyn CompanyStore>,
    pub search_service: Arc<SearchService>,
    pub enrichment_service: Arc<EnrichmentService>,
    pub saved_service: Arc<SavedCompanyService>,
}

impl AppState {
    /// Connect to Postgres, apply migrations and build the production services.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = db::connect(&config.database).await?;
        if config.database.run_migrations {
            db::run_migrations(&pool).await?;
        }

        let store: Arc<dyn CompanyStore> = Arc::new(PostgresCompanyStore::new(pool.clone()));
        let generator: Arc<dyn TextGenerator> = Arc::new(OpenAiClient::new(&config.ai)?);
        let pages: Arc<dyn PageTextSource> = Arc::new(HttpPageFetcher::new(&config.enrichment)?);

        if config.ai.api_key.is_none() {
            tracing::warn!("No AI API key configured; text queries will use filter search only");
        }

        Ok(Self::from_parts(config, Some(pool), store, generator, pages))
    }

    /// Assemble state from already constructed backends.
    pub fn from_parts(
        config: Config,
        db_pool: Option<PgPool>,
        store: Arc<dyn CompanyStore>,
        generator: Arc<dyn TextGenerator>,
        pages: Arc<dyn PageTextSource>,
    ) -> Self {
        let search_service = SearchService::new(
            QueryGenerator::new(generator.clone(), &config.ai),
            SqlSafetyValidator::default(),
            PagedExecutor::new(store.clone()),
        );
        let enrichment_service =
            EnrichmentService::new(store.clone(), pages, generator, &config.ai);
        let saved_service = SavedCompanyService::new(store.clone());

        Self {
            config: Arc::new(config),
            db_pool,
            store,
            search_service: Arc::new(search_service),
            enrichment_service: Arc::new(enrichment_service),
            saved_service: Arc::new(saved_service),
        }
    }
}
