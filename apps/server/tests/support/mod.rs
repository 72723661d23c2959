//! Test harness: the full router over in-memory backends.
//!
//! The store evaluates compiled predicates directly. Generated statements are
//! answered from a table of known SQL strings, each mapped to the predicate it
//! stands for; any other statement fails like a database error would. Predicate
//! queries can be switched to fail as well.

#![allow(dead_code)]

use anyhow::Context as _;
use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt as _;

use company_directory::{
    api::create_router,
    db::{search::predicate::CompiledPredicate, CompanyStore},
    models::{Company, NewCompany, Record, SavedCompany},
    services::{GenerationError, PageFetchError, PageTextSource, TextGenerator},
    AppState, Config, Error, Result,
};

pub fn company(id: i32, name: &str) -> Company {
    Company {
        id,
        website: None,
        name: name.to_string(),
        founded: None,
        size: None,
        locality: None,
        region: None,
        country: None,
        industry: None,
        linkedin_url: None,
        ai_summary: None,
        created_at: None,
        updated_at: None,
    }
}

/// A small directory covering the fields used by the search tests.
pub fn sample_companies() -> Vec<Company> {
    let rows: [(&str, &str, &str, i32); 6] = [
        ("Acme Robotics", "germany", "technology", 2016),
        ("Baltic Freight", "latvia", "logistics", 1998),
        ("Cobalt Labs", "germany", "biotech", 2019),
        ("Dune Analytics", "france", "technology", 2012),
        ("Ember Health", "germany", "health", 2004),
        ("Fjord Software", "norway", "technology", 2021),
    ];

    rows.iter()
        .enumerate()
        .map(|(idx, (name, country, industry, founded))| Company {
            country: Some(country.to_string()),
            industry: Some(industry.to_string()),
            founded: Some(*founded),
            website: Some(format!(
                "{}.example",
                name.split_whitespace().next().unwrap_or("x").to_lowercase()
            )),
            ..company(idx as i32 + 1, name)
        })
        .collect()
}

#[derive(Default)]
pub struct InMemoryStore {
    companies: Mutex<Vec<Company>>,
    raw_answers: Mutex<HashMap<String, CompiledPredicate>>,
    raw_calls: Mutex<Vec<String>>,
    fail_predicates: AtomicBool,
    predicate_calls: AtomicUsize,
    saved: Mutex<Vec<SavedCompany>>,
}

/// Driver text of a failing predicate query; must never reach a response body.
pub const STORE_FAILURE: &str = "connection to pool-7 reset by peer";

impl InMemoryStore {
    pub fn with_companies(companies: Vec<Company>) -> Self {
        let store = Self::default();
        *store.companies.lock().unwrap() = companies;
        store
    }

    /// Answer `sql` (exactly as executed) with the rows matching `predicate`.
    pub fn answer_raw(&self, sql: &str, predicate: CompiledPredicate) {
        self.raw_answers
            .lock()
            .unwrap()
            .insert(sql.to_string(), predicate);
    }

    pub fn raw_calls(&self) -> Vec<String> {
        self.raw_calls.lock().unwrap().clone()
    }

    /// Make every predicate count/fetch fail with [`STORE_FAILURE`].
    pub fn fail_predicate_queries(&self) {
        self.fail_predicates.store(true, Ordering::SeqCst);
    }

    pub fn predicate_calls(&self) -> usize {
        self.predicate_calls.load(Ordering::SeqCst)
    }

    fn predicate_query(&self) -> Result<()> {
        self.predicate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_predicates.load(Ordering::SeqCst) {
            return Err(Error::Database(sqlx::Error::Protocol(
                STORE_FAILURE.to_string(),
            )));
        }
        Ok(())
    }

    fn with_company(&self, mut saved: SavedCompany) -> SavedCompany {
        saved.company = self.company(saved.company_id);
        saved
    }

    pub fn company(&self, id: i32) -> Option<Company> {
        self.companies
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    fn matching(&self, predicate: &CompiledPredicate) -> Vec<Record> {
        let mut companies = self.companies.lock().unwrap().clone();
        companies.sort_by_key(|c| c.id);
        companies
            .into_iter()
            .map(Company::into_record)
            .filter(|record| predicate.matches(record))
            .collect()
    }

    fn raw_predicate(&self, sql: &str) -> Result<CompiledPredicate> {
        self.raw_calls.lock().unwrap().push(sql.to_string());
        self.raw_answers
            .lock()
            .unwrap()
            .get(sql)
            .cloned()
            .ok_or_else(|| {
                Error::Database(sqlx::Error::Protocol(format!(
                    "relation does not exist for statement: {sql}"
                )))
            })
    }
}

fn page_of(records: Vec<Record>, limit: u32, offset: u64) -> Vec<Record> {
    records
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect()
}

#[async_trait]
impl CompanyStore for InMemoryStore {
    async fn count_matching(&self, predicate: &CompiledPredicate) -> Result<u64> {
        self.predicate_query()?;
        Ok(self.matching(predicate).len() as u64)
    }

    async fn fetch_matching(
        &self,
        predicate: &CompiledPredicate,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Record>> {
        self.predicate_query()?;
        Ok(page_of(self.matching(predicate), limit, offset))
    }

    async fn count_raw(&self, sql: &str) -> Result<u64> {
        let predicate = self.raw_predicate(sql)?;
        Ok(self.matching(&predicate).len() as u64)
    }

    async fn fetch_raw(&self, sql: &str, limit: u32, offset: u64) -> Result<Vec<Record>> {
        let predicate = self.raw_predicate(sql)?;
        Ok(page_of(self.matching(&predicate), limit, offset))
    }

    async fn get_company(&self, id: i32) -> Result<Option<Company>> {
        Ok(self.company(id))
    }

    async fn update_summary(&self, id: i32, summary: &str) -> Result<Company> {
        let mut companies = self.companies.lock().unwrap();
        let company = companies
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(Error::CompanyNotFound(id))?;
        company.ai_summary = Some(summary.to_string());
        Ok(company.clone())
    }

    async fn count_all(&self) -> Result<u64> {
        Ok(self.companies.lock().unwrap().len() as u64)
    }

    async fn insert_companies(&self, batch: &[NewCompany]) -> Result<u64> {
        let mut companies = self.companies.lock().unwrap();
        let mut next_id = companies.iter().map(|c| c.id).max().unwrap_or(0);
        for row in batch {
            next_id += 1;
            companies.push(Company {
                website: row.website.clone(),
                founded: row.founded,
                size: row.size.clone(),
                locality: row.locality.clone(),
                region: row.region.clone(),
                country: row.country.clone(),
                industry: row.industry.clone(),
                linkedin_url: row.linkedin_url.clone(),
                ..company(next_id, &row.name)
            });
        }
        Ok(batch.len() as u64)
    }

    async fn count_saved(&self, user_id: i32) -> Result<u64> {
        let saved = self.saved.lock().unwrap();
        Ok(saved.iter().filter(|s| s.user_id == user_id).count() as u64)
    }

    async fn fetch_saved(
        &self,
        user_id: i32,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<SavedCompany>> {
        let rows: Vec<SavedCompany> = self
            .saved
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id)
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(rows.into_iter().map(|s| self.with_company(s)).collect())
    }

    async fn insert_saved(
        &self,
        company_id: i32,
        user_id: i32,
        notes: &str,
    ) -> Result<Option<SavedCompany>> {
        let mut saved = self.saved.lock().unwrap();
        if saved
            .iter()
            .any(|s| s.company_id == company_id && s.user_id == user_id)
        {
            return Ok(None);
        }
        let row = SavedCompany {
            id: saved.iter().map(|s| s.id).max().unwrap_or(0) + 1,
            company_id,
            user_id,
            notes: Some(notes.to_string()),
            company: None,
            created_at: None,
            updated_at: None,
        };
        saved.push(row.clone());
        drop(saved);
        Ok(Some(self.with_company(row)))
    }

    async fn update_saved_notes(
        &self,
        id: i32,
        notes: Option<&str>,
    ) -> Result<Option<SavedCompany>> {
        let mut saved = self.saved.lock().unwrap();
        let Some(row) = saved.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        if let Some(notes) = notes {
            row.notes = Some(notes.to_string());
        }
        let row = row.clone();
        drop(saved);
        Ok(Some(self.with_company(row)))
    }

    async fn delete_saved(&self, id: i32) -> Result<bool> {
        let mut saved = self.saved.lock().unwrap();
        let before = saved.len();
        saved.retain(|s| s.id != id);
        Ok(saved.len() < before)
    }
}

/// Canned generator behavior.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail,
    Hang,
}

impl Reply {
    pub fn text(value: impl Into<String>) -> Self {
        Reply::Text(value.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Sql,
    Filters,
    Summary,
}

/// Generator that answers by purpose, told apart by the system prompt.
pub struct ScriptedGenerator {
    sql: Reply,
    filters: Reply,
    summary: Reply,
    calls: Mutex<Vec<(Purpose, String)>>,
}

impl ScriptedGenerator {
    pub fn new(sql: Reply, filters: Reply, summary: Reply) -> Self {
        Self {
            sql,
            filters,
            summary,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call, like a deployment without an API key.
    pub fn unavailable() -> Self {
        Self::new(Reply::Fail, Reply::Fail, Reply::Fail)
    }

    pub fn calls(&self) -> Vec<(Purpose, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, purpose: Purpose) -> usize {
        self.calls().iter().filter(|(p, _)| *p == purpose).count()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        _max_tokens: u32,
    ) -> std::result::Result<String, GenerationError> {
        let purpose = match system_prompt {
            Some(system) if system.contains("PostgreSQL") => Purpose::Sql,
            Some(_) => Purpose::Filters,
            None => Purpose::Summary,
        };
        self.calls
            .lock()
            .unwrap()
            .push((purpose, prompt.to_string()));

        let reply = match purpose {
            Purpose::Sql => &self.sql,
            Purpose::Filters => &self.filters,
            Purpose::Summary => &self.summary,
        };
        match reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail => Err(GenerationError::Status {
                status: 503,
                body: "upstream unavailable".to_string(),
            }),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(GenerationError::EmptyResponse)
            }
        }
    }
}

/// Website text keyed by the stored website value; unknown sites fail.
#[derive(Default)]
pub struct FakePages {
    pages: HashMap<String, String>,
}

impl FakePages {
    pub fn with_page(mut self, website: &str, text: &str) -> Self {
        self.pages.insert(website.to_string(), text.to_string());
        self
    }
}

#[async_trait]
impl PageTextSource for FakePages {
    async fn fetch_text(&self, website: &str) -> std::result::Result<String, PageFetchError> {
        self.pages
            .get(website)
            .cloned()
            .ok_or_else(|| PageFetchError::Status(404))
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub generator: Arc<ScriptedGenerator>,
}

impl TestApp {
    pub fn new(store: InMemoryStore, generator: ScriptedGenerator) -> Self {
        Self::new_with_config(store, generator, FakePages::default(), |_| {})
    }

    pub fn new_with_config(
        store: InMemoryStore,
        generator: ScriptedGenerator,
        pages: FakePages,
        configure: impl FnOnce(&mut Config),
    ) -> Self {
        let mut config = Config::default();
        config.ai.api_key = Some("test-key".to_string());
        configure(&mut config);

        let store = Arc::new(store);
        let generator = Arc::new(generator);
        let state = AppState::from_parts(
            config,
            None,
            store.clone(),
            generator.clone(),
            Arc::new(pages),
        );
        let router = create_router(state.clone());

        Self {
            router,
            state,
            store,
            generator,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<serde_json::Value>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        let mut builder = Request::builder().method(method).uri(path_and_query);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).context("encode request body")?)
            }
            None => Body::empty(),
        };
        let request = builder.body(body).context("build request")?;

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .context("dispatch request")?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .context("read response body")?;

        Ok((status, headers, body))
    }

    pub async fn get_json(
        &self,
        path_and_query: &str,
    ) -> anyhow::Result<(StatusCode, HeaderMap, serde_json::Value)> {
        let (status, headers, body) = self.request(Method::GET, path_and_query, None).await?;
        let json = serde_json::from_slice(&body).context("decode response body")?;
        Ok((status, headers, json))
    }
}

/// Ids of the companies in a search response, in order.
pub fn company_ids(body: &serde_json::Value) -> Vec<i64> {
    body["companies"]
        .as_array()
        .map(|rows| rows.iter().filter_map(|r| r["id"].as_i64()).collect())
        .unwrap_or_default()
}
