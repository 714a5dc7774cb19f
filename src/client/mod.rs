pub mod http;
pub mod retry;

pub use http::OseonClient;
pub use retry::RetryingSource;

use crate::errors::AppResult;
use crate::models::{OrderKind, PageRequest, PageResponse, Record};
use async_trait::async_trait;
use std::sync::Arc;

/// The single network-fetch primitive every tool goes through.
#[async_trait]
pub trait OrderSource: Send + Sync {
    async fn fetch_page(&self, kind: OrderKind, request: &PageRequest) -> AppResult<PageResponse>;

    /// Full customer order including positions. `Ok(None)` when upstream has no such order.
    async fn fetch_customer_order(&self, order_no: &str) -> AppResult<Option<Record>>;
}

#[async_trait]
impl OrderSource for Arc<dyn OrderSource> {
    async fn fetch_page(&self, kind: OrderKind, request: &PageRequest) -> AppResult<PageResponse> {
        (**self).fetch_page(kind, request).await
    }

    async fn fetch_customer_order(&self, order_no: &str) -> AppResult<Option<Record>> {
        (**self).fetch_customer_order(order_no).await
    }
}
