//! Order store access: the `OrderStore` seam and its reqwest-backed implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use shared::{
    domain::{Order, OrderId},
    error::ApiError,
    protocol::OrderUpdate,
};
use tracing::{debug, info};
use url::Url;

use crate::error::StoreError;

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Every order the store currently holds, unfiltered and unsorted.
    async fn fetch_all(&self) -> Result<Vec<Order>, StoreError>;

    /// Requests a single-field update. Local state is never touched; callers
    /// re-fetch to observe the result.
    async fn update_field(&self, order_id: &OrderId, update: OrderUpdate)
        -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct HttpOrderStore {
    http: Client,
    orders_url: Url,
}

impl HttpOrderStore {
    pub fn new(orders_url: Url, request_timeout: Duration) -> Result<Self, StoreError> {
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| StoreError::Network(format!("failed to build http client: {e}")))?;
        Ok(Self { http, orders_url })
    }

    pub fn orders_url(&self) -> &Url {
        &self.orders_url
    }

    fn order_url(&self, order_id: &OrderId) -> Result<Url, StoreError> {
        let mut url = self.orders_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                StoreError::Network(format!("orders url '{}' cannot carry a path", self.orders_url))
            })?
            .pop_if_empty()
            .push(order_id.as_str());
        Ok(url)
    }
}

#[async_trait]
impl OrderStore for HttpOrderStore {
    async fn fetch_all(&self) -> Result<Vec<Order>, StoreError> {
        debug!(url = %self.orders_url, "fetching all orders");
        let response = self
            .http
            .get(self.orders_url.clone())
            .send()
            .await
            .map_err(network_error)?;
        let response = ensure_success(response, None).await?;
        let body = response.bytes().await.map_err(network_error)?;
        let orders: Vec<Order> =
            serde_json::from_slice(&body).map_err(|e| StoreError::Decode(e.to_string()))?;
        debug!(count = orders.len(), "fetched orders");
        Ok(orders)
    }

    async fn update_field(
        &self,
        order_id: &OrderId,
        update: OrderUpdate,
    ) -> Result<(), StoreError> {
        let url = self.order_url(order_id)?;
        let response = self
            .http
            .put(url)
            .json(&update)
            .send()
            .await
            .map_err(network_error)?;
        ensure_success(response, Some(order_id)).await?;
        info!(
            order_id = %order_id,
            field = update.field_name(),
            value = update.value(),
            "order store accepted update"
        );
        Ok(())
    }
}

fn network_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::Network(format!("request timed out: {err}"))
    } else {
        StoreError::Network(err.to_string())
    }
}

async fn ensure_success(
    response: Response,
    order_id: Option<&OrderId>,
) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::NOT_FOUND {
        if let Some(order_id) = order_id {
            return Err(StoreError::NotFound(order_id.clone()));
        }
    }

    let body = response.text().await.unwrap_or_default();
    let detail = ApiError::from_body(&body)
        .map(|api_error| api_error.message)
        .unwrap_or(body);
    if detail.trim().is_empty() {
        Err(StoreError::Network(format!("server responded with {status}")))
    } else {
        Err(StoreError::Network(format!(
            "server responded with {status}: {}",
            detail.trim()
        )))
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
