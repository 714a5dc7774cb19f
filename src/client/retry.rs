use super::OrderSource;
use crate::config::OseonConfig;
use crate::errors::AppResult;
use crate::models::{OrderKind, PageRequest, PageResponse, Record};
use async_trait::async_trait;
use std::future::Future;
use tokio::time::{sleep, Duration};

const MAX_BACKOFF_MS: u64 = 30_000;

/// Retries transient failures of the wrapped source with exponential backoff.
pub struct RetryingSource<S> {
    inner: S,
    max_retries: u32,
    backoff_ms: u64,
}

impl<S: OrderSource> RetryingSource<S> {
    pub fn new(inner: S, max_retries: u32, backoff_ms: u64) -> Self {
        Self {
            inner,
            max_retries,
            backoff_ms,
        }
    }

    pub fn from_config(inner: S, config: &OseonConfig) -> Self {
        Self::new(inner, config.max_retries, config.retry_backoff_ms)
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let multiplier = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.backoff_ms.saturating_mul(multiplier).min(MAX_BACKOFF_MS))
    }

    async fn with_retries<T, F, Fut>(&self, operation: &str, mut call: F) -> AppResult<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = AppResult<T>> + Send,
        T: Send,
    {
        let mut attempt = 0u32;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    attempt += 1;
                    tracing::warn!(
                        operation,
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "retrying oseon request"
                    );
                    sleep(delay).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[async_trait]
impl<S: OrderSource> OrderSource for RetryingSource<S> {
    async fn fetch_page(&self, kind: OrderKind, request: &PageRequest) -> AppResult<PageResponse> {
        self.with_retries("fetch_page", || self.inner.fetch_page(kind, request))
            .await
    }

    async fn fetch_customer_order(&self, order_no: &str) -> AppResult<Option<Record>> {
        self.with_retries("fetch_customer_order", || self.inner.fetch_customer_order(order_no))
            .await
    }
}
