//! Client-side order board: store access, filter/sort engine, and mutation
//! dispatch for the food-ordering admin view.

pub mod board;
pub mod dispatcher;
pub mod error;
pub mod settings;
pub mod store;

pub use board::{
    available_dates, filter_sort, BoardEvent, BoardSummary, CriteriaError, DateFilter, OrderBoard,
    ReferenceZone, SortDirection,
};
pub use dispatcher::{MutationReport, OrderBoardController};
pub use error::{SettingsError, StoreError};
pub use settings::ClientSettings;
pub use store::{HttpOrderStore, OrderStore};

/// Builds an HTTP-backed controller from validated settings.
pub fn connect(settings: &ClientSettings) -> anyhow::Result<OrderBoardController<HttpOrderStore>> {
    let store = HttpOrderStore::new(settings.orders_url()?, settings.request_timeout())?;
    let board = OrderBoard::new(settings.default_sort, settings.reference_zone()?);
    tracing::info!(url = %store.orders_url(), "order board connected");
    Ok(OrderBoardController::new(store, board))
}
