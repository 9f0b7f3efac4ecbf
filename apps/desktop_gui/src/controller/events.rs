//! Backend-to-UI events and error modeling for the order board window.

use std::sync::Arc;

use client_core::{OrderBoard, StoreError};

#[derive(Debug)]
pub enum UiEvent {
    Info(String),
    BoardUpdated(Arc<OrderBoard>),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    NotFound,
    Config,
    Decode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Refresh,
    UpdateStatus,
    UpdatePayment,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_store(context: UiErrorContext, err: &StoreError) -> Self {
        let category = match err {
            StoreError::NotFound(_) => UiErrorCategory::NotFound,
            StoreError::Network(_) => UiErrorCategory::Transport,
            StoreError::Decode(_) => UiErrorCategory::Decode,
        };
        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    /// Worker startup failures carry no store error; they come from the
    /// runtime or the settings.
    pub fn startup(message: impl Into<String>) -> Self {
        Self {
            category: UiErrorCategory::Config,
            context: UiErrorContext::BackendStartup,
            message: message.into(),
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::OrderId;

    #[test]
    fn collection_404_is_transport_not_missing_order() {
        let err = UiError::from_store(
            UiErrorContext::Refresh,
            &StoreError::Network("server responded with 404 Not Found".into()),
        );
        assert_eq!(err.category(), UiErrorCategory::Transport);
        assert_eq!(err.context(), UiErrorContext::Refresh);
    }

    #[test]
    fn missing_order_on_update_is_not_found() {
        let err = UiError::from_store(
            UiErrorContext::UpdateStatus,
            &StoreError::NotFound(OrderId::new("gone")),
        );
        assert_eq!(err.category(), UiErrorCategory::NotFound);
        assert!(err.message().contains("gone"));
    }

    #[test]
    fn unreadable_body_is_decode() {
        let err = UiError::from_store(
            UiErrorContext::Refresh,
            &StoreError::Decode("expected a sequence".into()),
        );
        assert_eq!(err.category(), UiErrorCategory::Decode);
    }

    #[test]
    fn startup_failures_are_config() {
        let err = UiError::startup("invalid settings: invalid value for base_url");
        assert_eq!(err.category(), UiErrorCategory::Config);
        assert_eq!(err.context(), UiErrorContext::BackendStartup);
    }
}
