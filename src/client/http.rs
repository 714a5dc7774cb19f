use super::OrderSource;
use crate::config::OseonConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{OrderKind, PageRequest, PageResponse, Record};
use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use serde_json::Value;
use std::time::Duration;

/// Authenticated HTTP access to the Oseon v2 REST API.
pub struct OseonClient {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl OseonClient {
    pub fn new(config: &OseonConfig) -> AppResult<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers(config)?)
            .build()
            .map_err(|error| AppError::Config(format!("Failed to build HTTP client: {}", error)))?;

        tracing::info!(base_url = %config.trimmed_base_url(), "initialized oseon api client");
        tracing::debug!(username = %config.username, "oseon api credentials configured");

        Ok(Self {
            client,
            base_url: config.trimmed_base_url().to_string(),
            timeout_secs: config.timeout_secs,
        })
    }

    async fn get(&self, endpoint: &str, query: &[(&'static str, String)]) -> AppResult<Option<Value>> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::info!(%url, params = ?query, "requesting oseon api");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|error| self.transport_error(error))?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(%url, status = status.as_u16(), "oseon api request failed");
            return Err(AppError::from_status(status.as_u16(), endpoint));
        }

        let body = response
            .text()
            .await
            .map_err(|error| self.transport_error(error))?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        let value: Value = serde_json::from_str(&body)?;
        tracing::info!(
            records = value.get("records").and_then(serde_json::Value::as_u64),
            "oseon api request succeeded"
        );
        Ok(Some(value))
    }

    fn transport_error(&self, error: reqwest::Error) -> AppError {
        if error.is_timeout() {
            tracing::error!(error = %error, "oseon api request timed out");
            AppError::Timeout(format!(
                "Request to Oseon API timed out after {}s",
                self.timeout_secs
            ))
        } else if error.is_connect() {
            tracing::error!(error = %error, "oseon api connection failed");
            AppError::Connection(format!(
                "Failed to connect to Oseon API at {}. Check network and URL.",
                self.base_url
            ))
        } else {
            tracing::error!(error = %error, "oseon api request errored");
            AppError::from(error)
        }
    }
}

#[async_trait]
impl OrderSource for OseonClient {
    async fn fetch_page(&self, kind: OrderKind, request: &PageRequest) -> AppResult<PageResponse> {
        match self.get(kind.endpoint(), &request.query_pairs()).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(PageResponse::default()),
        }
    }

    async fn fetch_customer_order(&self, order_no: &str) -> AppResult<Option<Record>> {
        let endpoint = format!(
            "{}/{}",
            OrderKind::CustomerOrder.endpoint(),
            encode_path_segment(order_no)
        );
        match self.get(&endpoint, &[]).await {
            Ok(Some(Value::Object(record))) => Ok(Some(record)),
            Ok(_) | Err(AppError::NotFound(_)) => Ok(None),
            Err(error) => Err(error),
        }
    }
}

fn default_headers(config: &OseonConfig) -> AppResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(HeaderName::from_static("api-version"), header_value(&config.api_version)?);
    headers.insert(HeaderName::from_static("trumpf-user"), header_value(&config.user_header)?);
    headers.insert(
        HeaderName::from_static("trumpf-terminal"),
        header_value(&config.terminal_header)?,
    );

    let mut authorization = header_value(&basic_auth_header(&config.username, &config.password))?;
    authorization.set_sensitive(true);
    headers.insert(AUTHORIZATION, authorization);
    Ok(headers)
}

fn header_value(raw: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_str(raw)
        .map_err(|_| AppError::Config("Header values must be visible ASCII".to_string()))
}

pub fn basic_auth_header(username: &str, password: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", username, password));
    format!("Basic {}", encoded)
}

fn encode_path_segment(raw: &str) -> String {
    raw.bytes()
        .map(|byte| match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => (byte as char).to_string(),
            other => format!("%{:02X}", other),
        })
        .collect()
}
