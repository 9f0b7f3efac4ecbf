//! Mutation dispatch and refresh orchestration over an [`OrderStore`].

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use shared::{
    domain::{OrderId, OrderStatus, PaymentMethod},
    protocol::OrderUpdate,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    board::{BoardEvent, DateFilter, OrderBoard, SortDirection},
    error::StoreError,
    store::OrderStore,
};

/// Result of one status/payment request: what the store said, and the board
/// after the follow-up refresh.
#[derive(Debug, Clone)]
pub struct MutationReport {
    pub outcome: Result<(), StoreError>,
    pub board: Arc<OrderBoard>,
}

pub struct OrderBoardController<S> {
    store: S,
    board: RwLock<Arc<OrderBoard>>,
    next_seq: AtomicU64,
}

impl<S: OrderStore> OrderBoardController<S> {
    pub fn new(store: S, initial: OrderBoard) -> Self {
        let next_seq = initial.applied_seq() + 1;
        Self {
            store,
            board: RwLock::new(Arc::new(initial)),
            next_seq: AtomicU64::new(next_seq),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn board(&self) -> Arc<OrderBoard> {
        self.board.read().await.clone()
    }

    async fn apply(&self, event: BoardEvent) -> Arc<OrderBoard> {
        let mut guard = self.board.write().await;
        let next = Arc::new(guard.apply(event));
        *guard = next.clone();
        next
    }

    /// Re-fetches the full collection. A failed fetch is logged and leaves the
    /// displayed orders untouched.
    pub async fn refresh(&self) -> Arc<OrderBoard> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        match self.store.fetch_all().await {
            Ok(orders) => {
                info!(seq, count = orders.len(), "order board refreshed");
                self.apply(BoardEvent::Loaded { seq, orders }).await
            }
            Err(err) => {
                warn!(seq, error = %err, "failed to fetch orders");
                self.apply(BoardEvent::FetchFailed { seq, error: err }).await
            }
        }
    }

    pub async fn set_date_filter(&self, filter: DateFilter) -> Arc<OrderBoard> {
        self.apply(BoardEvent::DateFilterChanged(filter)).await
    }

    pub async fn set_sort(&self, sort: SortDirection) -> Arc<OrderBoard> {
        self.apply(BoardEvent::SortChanged(sort)).await
    }

    pub async fn request_status_change(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> MutationReport {
        self.dispatch(order_id, OrderUpdate::Status(status)).await
    }

    pub async fn request_payment_change(
        &self,
        order_id: &OrderId,
        payment: PaymentMethod,
    ) -> MutationReport {
        self.dispatch(order_id, OrderUpdate::Payment(payment)).await
    }

    async fn dispatch(&self, order_id: &OrderId, update: OrderUpdate) -> MutationReport {
        let outcome = self.store.update_field(order_id, update).await;
        if let Err(err) = &outcome {
            warn!(
                order_id = %order_id,
                field = update.field_name(),
                value = update.value(),
                error = %err,
                "order update failed"
            );
        }
        // Refresh regardless of outcome; the store is the only source of truth.
        let board = self.refresh().await;
        MutationReport { outcome, board }
    }
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
