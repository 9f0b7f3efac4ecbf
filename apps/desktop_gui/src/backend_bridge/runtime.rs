//! Runtime bridge between UI command queue and the order board controller.

use std::{sync::Arc, thread};

use client_core::{ClientSettings, OrderBoard, OrderBoardController, OrderStore};
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(settings: ClientSettings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::startup(format!(
                    "failed to build backend runtime: {err}"
                ))));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let controller = match client_core::connect(&settings) {
                Ok(controller) => Arc::new(controller),
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::startup(format!(
                        "invalid settings: {err:#}"
                    ))));
                    tracing::error!("order board worker could not start: {err:#}");
                    return;
                }
            };
            let _ = ui_tx.try_send(UiEvent::Info(format!(
                "Connected to {}",
                controller.store().orders_url()
            )));

            // Each command runs on its own task so a slow update never blocks
            // filter/sort changes or other updates.
            while let Ok(cmd) = cmd_rx.recv() {
                let controller = Arc::clone(&controller);
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    handle_command(&controller, cmd, &ui_tx).await;
                });
            }
            tracing::info!("ui command channel closed; order board worker exiting");
        });
    });
}

async fn handle_command<S: OrderStore>(
    controller: &OrderBoardController<S>,
    cmd: BackendCommand,
    ui_tx: &Sender<UiEvent>,
) {
    let board = match cmd {
        BackendCommand::Refresh => {
            let board = controller.refresh().await;
            report_fetch_failure(&board, ui_tx);
            board
        }
        BackendCommand::SetDateFilter(filter) => controller.set_date_filter(filter).await,
        BackendCommand::SetSort(sort) => controller.set_sort(sort).await,
        BackendCommand::UpdateStatus { order_id, status } => {
            let report = controller.request_status_change(&order_id, status).await;
            if let Err(err) = &report.outcome {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_store(
                    UiErrorContext::UpdateStatus,
                    err,
                )));
            }
            report_fetch_failure(&report.board, ui_tx);
            report.board
        }
        BackendCommand::UpdatePayment { order_id, payment } => {
            let report = controller.request_payment_change(&order_id, payment).await;
            if let Err(err) = &report.outcome {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_store(
                    UiErrorContext::UpdatePayment,
                    err,
                )));
            }
            report_fetch_failure(&report.board, ui_tx);
            report.board
        }
    };
    let _ = ui_tx.try_send(UiEvent::BoardUpdated(board));
}

fn report_fetch_failure(board: &OrderBoard, ui_tx: &Sender<UiEvent>) {
    if let Some(err) = board.last_error() {
        let _ = ui_tx.try_send(UiEvent::Error(UiError::from_store(
            UiErrorContext::Refresh,
            err,
        )));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use client_core::StoreError;
    use crossbeam_channel::bounded;
    use shared::{
        domain::{Order, OrderId},
        protocol::OrderUpdate,
    };

    use crate::controller::events::UiErrorCategory;

    struct MissingRouteStore;

    #[async_trait]
    impl OrderStore for MissingRouteStore {
        async fn fetch_all(&self) -> Result<Vec<Order>, StoreError> {
            Err(StoreError::Network(
                "server responded with 404 Not Found".into(),
            ))
        }

        async fn update_field(
            &self,
            order_id: &OrderId,
            _update: OrderUpdate,
        ) -> Result<(), StoreError> {
            Err(StoreError::NotFound(order_id.clone()))
        }
    }

    #[tokio::test]
    async fn refresh_failure_is_classified_from_the_store_error() {
        let controller = OrderBoardController::new(MissingRouteStore, OrderBoard::default());
        let (ui_tx, ui_rx) = bounded(8);

        handle_command(&controller, BackendCommand::Refresh, &ui_tx).await;

        let events: Vec<_> = ui_rx.try_iter().collect();
        match events.as_slice() {
            [UiEvent::Error(err), UiEvent::BoardUpdated(board)] => {
                assert_eq!(err.category(), UiErrorCategory::Transport);
                assert_eq!(err.context(), UiErrorContext::Refresh);
                assert!(board.last_error().is_some());
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_of_missing_order_is_not_found() {
        let controller = OrderBoardController::new(MissingRouteStore, OrderBoard::default());
        let (ui_tx, ui_rx) = bounded(8);

        handle_command(
            &controller,
            BackendCommand::UpdatePayment {
                order_id: OrderId::new("gone"),
                payment: shared::domain::PaymentMethod::Gpay,
            },
            &ui_tx,
        )
        .await;

        let categories: Vec<_> = ui_rx
            .try_iter()
            .filter_map(|event| match event {
                UiEvent::Error(err) => Some((err.context(), err.category())),
                _ => None,
            })
            .collect();
        assert_eq!(
            categories,
            vec![
                (UiErrorContext::UpdatePayment, UiErrorCategory::NotFound),
                (UiErrorContext::Refresh, UiErrorCategory::Transport),
            ]
        );
    }
}
