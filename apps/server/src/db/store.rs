//! PostgreSQL implementation of [`CompanyStore`]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::Serialize;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use sqlx::{Column, PgPool, Postgres, Row, Transaction, TypeInfo};

use super::search::predicate::CompiledPredicate;
use super::search::query_builder::{self, BindValue, QueryBuilder};
use super::traits::CompanyStore;
use crate::models::{Company, NewCompany, Record, SavedCompany};
use std::collections::HashMap;
use crate::{Error, Result};

#[derive(Clone)]
pub struct PostgresCompanyStore {
    pool: PgPool,
}

impl PostgresCompanyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attach the bookmarked company rows to saved companies.
    async fn attach_companies(&self, mut saved: Vec<SavedCompany>) -> Result<Vec<SavedCompany>> {
        if saved.is_empty() {
            return Ok(saved);
        }
        let ids: Vec<i32> = saved.iter().map(|s| s.company_id).collect();
        let companies: HashMap<i32, Company> =
            sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = ANY($1)")
                .bind(&ids)
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?
                .into_iter()
                .map(|company| (company.id, company))
                .collect();

        for entry in &mut saved {
            entry.company = companies.get(&entry.company_id).cloned();
        }
        Ok(saved)
    }

    async fn attach_company(&self, saved: Option<SavedCompany>) -> Result<Option<SavedCompany>> {
        match saved {
            Some(saved) => Ok(self.attach_companies(vec![saved]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Transaction in which generated statements run; any write fails inside it.
    async fn begin_read_only(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        Ok(tx)
    }
}

fn decode_column<'r, T>(row: &'r PgRow, idx: usize) -> Result<JsonValue>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres> + Serialize,
{
    let value: Option<T> = row.try_get(idx).map_err(Error::Database)?;
    Ok(serde_json::to_value(value).unwrap_or(JsonValue::Null))
}

/// Field-keyed record from a row of arbitrary shape. Columns of types without
/// a JSON mapping come back as text when Postgres can send them as text, and
/// as `null` otherwise.
fn row_to_record(row: &PgRow) -> Result<Record> {
    let mut record = Record::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let value = match column.type_info().name() {
            "BOOL" => decode_column::<bool>(row, idx)?,
            "INT2" => decode_column::<i16>(row, idx)?,
            "INT4" => decode_column::<i32>(row, idx)?,
            "INT8" => decode_column::<i64>(row, idx)?,
            "FLOAT4" => decode_column::<f32>(row, idx)?,
            "FLOAT8" => decode_column::<f64>(row, idx)?,
            "NUMERIC" => {
                let value: Option<Decimal> = row.try_get(idx).map_err(Error::Database)?;
                value
                    .and_then(|d| d.to_f64())
                    .and_then(serde_json::Number::from_f64)
                    .map_or(JsonValue::Null, JsonValue::Number)
            }
            "TIMESTAMPTZ" => decode_column::<DateTime<Utc>>(row, idx)?,
            "TIMESTAMP" => decode_column::<NaiveDateTime>(row, idx)?,
            "DATE" => decode_column::<NaiveDate>(row, idx)?,
            "JSON" | "JSONB" => decode_column::<JsonValue>(row, idx)?,
            _ => row
                .try_get::<Option<String>, _>(idx)
                .ok()
                .flatten()
                .map_or(JsonValue::Null, JsonValue::String),
        };
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

#[async_trait]
impl CompanyStore for PostgresCompanyStore {
    async fn count_matching(&self, predicate: &CompiledPredicate) -> Result<u64> {
        let (sql, bind_values) = QueryBuilder::new(predicate).build_count_sql();

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for value in bind_values {
            query = match value {
                BindValue::Text(v) => query.bind(v),
                BindValue::Int(v) => query.bind(v),
            };
        }

        let total = query.fetch_one(&self.pool).await.map_err(Error::Database)?;
        Ok(total.max(0) as u64)
    }

    async fn fetch_matching(
        &self,
        predicate: &CompiledPredicate,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Record>> {
        let (sql, bind_values) = QueryBuilder::new(predicate).build_sql(limit, offset);

        let mut query = sqlx::query_as::<_, Company>(&sql);
        for value in bind_values {
            query = match value {
                BindValue::Text(v) => query.bind(v),
                BindValue::Int(v) => query.bind(v),
            };
        }

        let companies = query.fetch_all(&self.pool).await.map_err(Error::Database)?;
        Ok(companies.into_iter().map(Company::into_record).collect())
    }

    async fn count_raw(&self, sql: &str) -> Result<u64> {
        let mut tx = self.begin_read_only().await?;
        let total: i64 = sqlx::query_scalar(&query_builder::raw_count_sql(sql))
            .fetch_one(&mut *tx)
            .await
            .map_err(Error::Database)?;
        tx.rollback().await.map_err(Error::Database)?;
        Ok(total.max(0) as u64)
    }

    async fn fetch_raw(&self, sql: &str, limit: u32, offset: u64) -> Result<Vec<Record>> {
        let mut tx = self.begin_read_only().await?;
        let rows = sqlx::query(&query_builder::raw_page_sql(sql))
            .bind(i64::from(limit))
            .bind(offset as i64)
            .fetch_all(&mut *tx)
            .await
            .map_err(Error::Database)?;
        tx.rollback().await.map_err(Error::Database)?;

        rows.iter().map(row_to_record).collect()
    }

    async fn get_company(&self, id: i32) -> Result<Option<Company>> {
        sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn update_summary(&self, id: i32, summary: &str) -> Result<Company> {
        sqlx::query_as::<_, Company>(
            "UPDATE companies
             SET ai_summary = $1, updated_at = now()
             WHERE id = $2
             RETURNING *",
        )
        .bind(summary)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::CompanyNotFound(id))
    }

    async fn count_all(&self) -> Result<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM companies")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(total.max(0) as u64)
    }

    async fn insert_companies(&self, batch: &[NewCompany]) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let mut written = 0;

        for company in batch {
            written += sqlx::query(
                "INSERT INTO companies
                    (name, website, founded, size, locality, region, country, industry, linkedin_url)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(&company.name)
            .bind(&company.website)
            .bind(company.founded)
            .bind(&company.size)
            .bind(&company.locality)
            .bind(&company.region)
            .bind(&company.country)
            .bind(&company.industry)
            .bind(&company.linkedin_url)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?
            .rows_affected();
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(written)
    }

    async fn count_saved(&self, user_id: i32) -> Result<u64> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM saved_companies WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(total.max(0) as u64)
    }

    async fn fetch_saved(
        &self,
        user_id: i32,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<SavedCompany>> {
        let saved = sqlx::query_as::<_, SavedCompany>(
            "SELECT * FROM saved_companies
             WHERE user_id = $1
             ORDER BY id ASC
             LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        self.attach_companies(saved).await
    }

    async fn insert_saved(
        &self,
        company_id: i32,
        user_id: i32,
        notes: &str,
    ) -> Result<Option<SavedCompany>> {
        let saved = sqlx::query_as::<_, SavedCompany>(
            "INSERT INTO saved_companies (company_id, user_id, notes)
             VALUES ($1, $2, $3)
             ON CONFLICT (company_id, user_id) DO NOTHING
             RETURNING *",
        )
        .bind(company_id)
        .bind(user_id)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        self.attach_company(saved).await
    }

    async fn update_saved_notes(
        &self,
        id: i32,
        notes: Option<&str>,
    ) -> Result<Option<SavedCompany>> {
        let saved = sqlx::query_as::<_, SavedCompany>(
            "UPDATE saved_companies
             SET notes = COALESCE($1, notes), updated_at = now()
             WHERE id = $2
             RETURNING *",
        )
        .bind(notes)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        self.attach_company(saved).await
    }

    async fn delete_saved(&self, id: i32) -> Result<bool> {
        let removed = sqlx::query("DELETE FROM saved_companies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?
            .rows_affected();
        Ok(removed > 0)
    }
}
