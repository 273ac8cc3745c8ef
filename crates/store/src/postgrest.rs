//! Record Store client for a PostgREST endpoint (`{url}/rest/v1/...`).
//!
//! Every request carries the project key twice, as the `apikey` header and
//! as a bearer token, which is what hosted PostgREST gateways expect.

use async_trait::async_trait;
use creativestalk_core::portfolio::{
    NewPortfolioItem, PortfolioRecord, RecordPatch, PORTFOLIO_TABLE,
};
use creativestalk_core::types::Timestamp;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::record_store::RecordStore;

/// Ask PostgREST to echo the affected rows.
const RETURN_REPRESENTATION: &str = "return=representation";

/// Postgres `invalid_text_representation`: the id filter does not parse as
/// the key column's type (e.g. a uuid key filtered with `eq.does-not-exist`).
const INVALID_TEXT_REPRESENTATION: &str = "22P02";

/// HTTP client for one PostgREST project.
pub struct HttpRecordStore {
    client: reqwest::Client,
    config: StoreConfig,
}

impl HttpRecordStore {
    /// Create a client with the configured request timeout.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{PORTFOLIO_TABLE}", self.config.url)
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    fn id_filter(id: &str) -> [(&'static str, String); 1] {
        [("id", format!("eq.{id}"))]
    }

    /// Rows that fail to decode are skipped with a warning.
    fn decode_rows(rows: Vec<serde_json::Value>) -> Vec<PortfolioRecord> {
        rows.into_iter()
            .filter_map(|row| match serde_json::from_value::<PortfolioRecord>(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed portfolio row");
                    None
                }
            })
            .collect()
    }

    // ---- private helpers ----

    /// Return the response unchanged on a 2xx, or a [`StoreError::Api`]
    /// carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StoreError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), StoreError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// Whether PostgREST rejected the id filter because the id cannot be of the
/// key type at all. No row can match such an id.
fn is_unmatchable_id(err: &StoreError) -> bool {
    let StoreError::Api { status: 400, body } = err else {
        return false;
    };
    serde_json::from_str::<serde_json::Value>(body)
        .is_ok_and(|v| v["code"] == INVALID_TEXT_REPRESENTATION)
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn select_all_ordered(&self) -> Result<Vec<PortfolioRecord>, StoreError> {
        let response = self
            .request(reqwest::Method::GET, self.table_url())
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await?;

        let rows: Vec<serde_json::Value> = Self::parse_response(response).await?;
        Ok(Self::decode_rows(rows))
    }

    async fn insert(&self, item: &NewPortfolioItem) -> Result<PortfolioRecord, StoreError> {
        let response = self
            .request(reqwest::Method::POST, self.table_url())
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&item.to_insert_row())
            .send()
            .await?;

        let rows: Vec<serde_json::Value> = Self::parse_response(response).await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".into()))?;
        serde_json::from_value(row).map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn update(
        &self,
        id: &str,
        patch: &RecordPatch,
        now: Timestamp,
    ) -> Result<bool, StoreError> {
        let response = self
            .request(reqwest::Method::PATCH, self.table_url())
            .query(&Self::id_filter(id))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&patch.to_update_body(now))
            .send()
            .await?;

        match Self::parse_response::<Vec<serde_json::Value>>(response).await {
            Ok(rows) => Ok(!rows.is_empty()),
            Err(e) if is_unmatchable_id(&e) => {
                tracing::debug!(record_id = %id, "Id does not fit the key column, nothing to update");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::DELETE, self.table_url())
            .query(&Self::id_filter(id))
            .send()
            .await?;

        match Self::check_status(response).await {
            Err(e) if is_unmatchable_id(&e) => Ok(()),
            other => other,
        }
    }

    async fn select_by_id(&self, id: &str) -> Result<Option<PortfolioRecord>, StoreError> {
        let response = self
            .request(reqwest::Method::GET, self.table_url())
            .query(&Self::id_filter(id))
            .query(&[("select", "*"), ("limit", "1")])
            .send()
            .await?;

        let rows: Vec<serde_json::Value> = match Self::parse_response(response).await {
            Ok(rows) => rows,
            Err(e) if is_unmatchable_id(&e) => {
                tracing::debug!(record_id = %id, "Id does not fit the key column, no such record");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        match rows.into_iter().next() {
            None => Ok(None),
            // A row that exists but cannot be decoded is still present.
            Some(row) => serde_json::from_value(row)
                .map(Some)
                .map_err(|e| StoreError::Decode(e.to_string())),
        }
    }

    fn supports_delete_procedure(&self) -> bool {
        self.config.delete_procedure.is_some()
    }

    async fn delete_via_procedure(&self, id: &str) -> Result<(), StoreError> {
        let procedure = self
            .config
            .delete_procedure
            .as_deref()
            .ok_or(StoreError::Unsupported("delete procedure"))?;

        let response = self
            .request(
                reqwest::Method::POST,
                format!("{}/rest/v1/rpc/{procedure}", self.config.url),
            )
            .json(&serde_json::json!({ "item_id": id }))
            .send()
            .await?;

        Self::check_status(response).await
    }
}
