//! `ClickHouse` reader functionality for the API
//! Handles the read-only photo queries, including the store-side random
//! sampling the pools are refilled from.

use std::time::Instant;

use clickhouse::{Client, Row};
use derive_more::Debug;
use eyre::Result;
use serde::Deserialize;
use tracing::{debug, error};
use url::Url;

use crate::models::{PhotoField, PhotoRow};

#[derive(Row, Deserialize)]
struct CountRow {
    count: u64,
}

#[derive(Row, Deserialize)]
struct CityRow {
    city: String,
}

/// `ClickHouse` reader client for the API (read-only operations)
#[derive(Clone, Debug)]
pub struct ClickhouseReader {
    /// Base client
    #[debug(skip)]
    base: Client,
    /// Database name
    db_name: String,
}

impl ClickhouseReader {
    /// Create a new `ClickHouse` reader client
    pub fn new(url: Url, db_name: String, username: String, password: String) -> Result<Self> {
        let client = Client::default()
            .with_url(url)
            .with_database(db_name.clone())
            .with_user(username)
            .with_password(password);

        Ok(Self { base: client, db_name })
    }

    async fn execute<R>(&self, query: &str) -> Result<Vec<R>>
    where
        R: Row + for<'b> Deserialize<'b>,
    {
        let client = self.base.clone();
        let start = Instant::now();

        let result = client.query(query).fetch_all::<R>().await;

        let duration_ms = start.elapsed().as_millis();
        match &result {
            Ok(rows) => {
                debug!(query = %query, duration_ms, rows = rows.len(), "ClickHouse query executed")
            }
            Err(e) => error!(query = %query, duration_ms, error = %e, "ClickHouse query failed"),
        }
        result.map_err(Into::into)
    }

    /// Fetch up to `size` photos whose `field` column is present, in
    /// store-side random order. This is the expensive full-scan class query
    /// that the sample pools amortize; handlers should not call it directly.
    pub async fn sample_photos(&self, field: PhotoField, size: usize) -> Result<Vec<PhotoRow>> {
        let query = format!(
            "SELECT name, year, city, year_options, city_options \
             FROM {db}.photos \
             WHERE isNotNull({col}) \
             ORDER BY rand() \
             LIMIT {size}",
            db = self.db_name,
            col = field.column(),
        );
        self.execute(&query).await
    }

    /// Get the sorted list of distinct city values.
    pub async fn distinct_cities(&self) -> Result<Vec<String>> {
        let query = format!(
            "SELECT DISTINCT assumeNotNull(city) AS city \
             FROM {db}.photos \
             WHERE isNotNull(city) \
             ORDER BY city",
            db = self.db_name,
        );
        let rows: Vec<CityRow> = self.execute(&query).await?;
        Ok(rows.into_iter().map(|r| r.city).collect())
    }

    /// Get the total number of photos.
    pub async fn photo_count(&self) -> Result<u64> {
        let query = format!("SELECT count() AS count FROM {db}.photos", db = self.db_name);
        let rows: Vec<CountRow> = self.execute(&query).await?;
        Ok(rows.into_iter().next().map_or(0, |r| r.count))
    }

    /// Whether at least one photo has a year.
    pub async fn has_year_photo(&self) -> Result<bool> {
        let query = format!(
            "SELECT count() AS count FROM {db}.photos WHERE isNotNull(year)",
            db = self.db_name,
        );
        let rows: Vec<CountRow> = self.execute(&query).await?;
        Ok(rows.into_iter().next().is_some_and(|r| r.count > 0))
    }
}
