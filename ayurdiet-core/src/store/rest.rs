//! HTTP client for the hosted backend's PostgREST API.
//!
//! Every call is one request and one response; timeouts are whatever the
//! underlying `reqwest::Client` is configured with.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;

use super::{Filter, Query, RemoteStore, Select, StoreError};

/// Error payload returned by the backend on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    code: Option<Value>,
}

impl ErrorBody {
    fn into_error(self, status: reqwest::StatusCode) -> StoreError {
        let code = self.code.map(|c| match c {
            Value::String(s) => s,
            other => other.to_string(),
        });
        let message = self
            .message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
            .unwrap_or_else(|| format!("Server returned status {}", status));
        StoreError::Rejected { message, code }
    }
}

/// Remote store backed by `{base_url}/rest/v1`.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
}

impl RestStore {
    /// Creates a store authenticated with the project's anonymous key only.
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            access_token: None,
        }
    }

    /// Sends `token` as the bearer token so row-level security sees the
    /// signed-in user.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Builds the request URL for `table` with the given query parameters.
    fn build_url(&self, table: &str, params: &[(String, String)]) -> String {
        let mut url = format!("{}/rest/v1/{}", self.base_url, table);
        for (i, (key, value)) in params.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(&urlencoding::encode(key));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", bearer))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
        Err(parsed.into_error(status))
    }

    async fn rows(response: Response) -> Result<Vec<Value>, StoreError> {
        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| StoreError::Unexpected(format!("Invalid response body: {}", e)))
    }
}

fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| (f.column.clone(), f.operand()))
        .collect()
}

fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), query.select.param())];
    params.extend(filter_params(&query.filters));
    if let Some(order) = &query.order {
        params.push(("order".to_string(), order.param()));
    }
    params
}

#[async_trait]
impl RemoteStore for RestStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, StoreError> {
        let url = self.build_url(table, &query_params(query));
        tracing::debug!(table, url = %url, "select");

        let response = self.send(self.request(Method::GET, &url)).await?;
        Self::rows(response).await
    }

    async fn insert(&self, table: &str, row: Value, select: &Select) -> Result<Value, StoreError> {
        let url = self.build_url(table, &[("select".to_string(), select.param())]);
        tracing::debug!(table, "insert");

        let request = self
            .request(Method::POST, &url)
            .header("Prefer", "return=representation")
            .json(&row);
        let response = self.send(request).await?;
        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Unexpected("Insert returned no row".to_string()))
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
        select: &Select,
    ) -> Result<Vec<Value>, StoreError> {
        let mut params = filter_params(filters);
        params.push(("select".to_string(), select.param()));
        let url = self.build_url(table, &params);
        tracing::debug!(table, url = %url, "update");

        let request = self
            .request(Method::PATCH, &url)
            .header("Prefer", "return=representation")
            .json(&patch);
        let response = self.send(request).await?;
        Self::rows(response).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), StoreError> {
        let url = self.build_url(table, &filter_params(filters));
        tracing::debug!(table, url = %url, "delete");

        self.send(self.request(Method::DELETE, &url)).await?;
        Ok(())
    }
}
