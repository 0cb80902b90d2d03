//! HTTP record store.
//!
//! Speaks the hosted store's REST dialect: table endpoints under
//! `/rest/v1/`, filters and ordering as query parameters, a dedicated
//! Accept header for single-row reads, and `Prefer: return=representation`
//! for insert-with-returning.
//!
//! Requests authenticate with the project's publishable key plus a
//! bearer token. The token comes from the live session when one is
//! published; otherwise the publishable key doubles as the anonymous
//! bearer, and row-level security decides what it may see.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use crate::session::Session;

use super::query::select_list;
use super::{Embed, RecordStore, Select, StoreError};

/// Path prefix for table endpoints.
const REST_PATH: &str = "rest/v1";

/// Accept header requesting exactly one row as a bare object.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// REST client for the hosted record store.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    anon_key: String,
    session: watch::Receiver<Option<Session>>,
}

impl RestStore {
    /// Create a store client for the given project URL and publishable
    /// key, reading bearer tokens from the session subscription.
    ///
    /// No request timeout is configured; remote calls rely on the
    /// transport's defaults.
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        session: watch::Receiver<Option<Session>>,
    ) -> Result<Self> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            session,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}/{}", self.base_url, REST_PATH, table)
    }

    /// The bearer for the next request: the signed-in user's token, or
    /// the publishable key when no session is published.
    fn bearer_token(&self) -> String {
        self.session
            .borrow()
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, StoreError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "apikey",
            header::HeaderValue::from_str(&self.anon_key)
                .map_err(|e| StoreError::new(format!("Invalid store key: {}", e)))?,
        );
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", self.bearer_token()))
                .map_err(|e| StoreError::new(format!("Invalid bearer token: {}", e)))?,
        );
        Ok(headers)
    }

    /// Check if a response is successful, surfacing the store's own
    /// error object if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(StoreError::from_response(status, &body))
        }
    }
}

#[async_trait]
impl RecordStore for RestStore {
    async fn fetch(&self, query: &Select) -> Result<Vec<Value>, StoreError> {
        let response = self
            .client
            .get(self.table_url(&query.table))
            .headers(self.auth_headers()?)
            .query(&query.to_params())
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let rows: Vec<Value> = response.json().await?;
        debug!(table = %query.table, count = rows.len(), "Rows fetched");
        Ok(rows)
    }

    async fn fetch_one(&self, query: &Select) -> Result<Value, StoreError> {
        let response = self
            .client
            .get(self.table_url(&query.table))
            .headers(self.auth_headers()?)
            .header(header::ACCEPT, SINGLE_OBJECT)
            .query(&query.to_params())
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        debug!(table = %query.table, "Row fetched");
        Ok(response.json().await?)
    }

    async fn insert(
        &self,
        table: &str,
        row: &Value,
        returning: &[Embed],
    ) -> Result<Value, StoreError> {
        let mut request = self
            .client
            .post(self.table_url(table))
            .headers(self.auth_headers()?)
            .header(header::ACCEPT, SINGLE_OBJECT)
            .header("Prefer", "return=representation")
            .json(row);

        if !returning.is_empty() {
            request = request.query(&[("select", select_list(returning))]);
        }

        let response = request.send().await?;
        let response = Self::check_response(response).await?;
        debug!(table = table, "Row inserted");
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionHandle;

    fn store_with(handle: &SessionHandle) -> RestStore {
        RestStore::new("https://example.test/", "anon-key", handle.subscribe())
            .expect("Failed to build store client")
    }

    #[test]
    fn test_bearer_falls_back_to_anon_key() {
        let handle = SessionHandle::new();
        let store = store_with(&handle);
        assert_eq!(store.bearer_token(), "anon-key");
    }

    #[test]
    fn test_bearer_prefers_session_token() {
        let handle = SessionHandle::new();
        let store = store_with(&handle);

        handle.set(Session {
            user_id: "user-1".to_string(),
            access_token: "jwt-token".to_string(),
            expires_at: None,
        });
        assert_eq!(store.bearer_token(), "jwt-token");

        handle.clear();
        assert_eq!(store.bearer_token(), "anon-key");
    }

    #[test]
    fn test_table_url_strips_trailing_slash() {
        let handle = SessionHandle::new();
        let store = store_with(&handle);
        assert_eq!(store.table_url("dealers"), "https://example.test/rest/v1/dealers");
    }
}
