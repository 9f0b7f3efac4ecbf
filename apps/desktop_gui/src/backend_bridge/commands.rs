//! Backend commands queued from UI to backend worker.

use client_core::{DateFilter, SortDirection};
use shared::domain::{OrderId, OrderStatus, PaymentMethod};

#[derive(Debug, Clone)]
pub enum BackendCommand {
    Refresh,
    SetDateFilter(DateFilter),
    SetSort(SortDirection),
    UpdateStatus {
        order_id: OrderId,
        status: OrderStatus,
    },
    UpdatePayment {
        order_id: OrderId,
        payment: PaymentMethod,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Refresh => "refresh",
            BackendCommand::SetDateFilter(_) => "set_date_filter",
            BackendCommand::SetSort(_) => "set_sort",
            BackendCommand::UpdateStatus { .. } => "update_status",
            BackendCommand::UpdatePayment { .. } => "update_payment",
        }
    }
}
