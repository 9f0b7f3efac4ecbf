use serde::{Deserialize, Serialize};

use crate::domain::{OrderStatus, PaymentMethod};

/// Body of a single-field `PUT` against one order.
///
/// Serializes to exactly one key: `{"status": "Delivered"}` or
/// `{"payment": "Gpay"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderUpdate {
    Status(OrderStatus),
    Payment(PaymentMethod),
}

impl OrderUpdate {
    pub fn field_name(&self) -> &'static str {
        match self {
            OrderUpdate::Status(_) => "status",
            OrderUpdate::Payment(_) => "payment",
        }
    }

    pub fn value(&self) -> &'static str {
        match self {
            OrderUpdate::Status(status) => status.as_str(),
            OrderUpdate::Payment(payment) => payment.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_update_serializes_as_single_field() {
        let body = serde_json::to_value(OrderUpdate::Status(OrderStatus::Delivered)).expect("json");
        assert_eq!(body, json!({ "status": "Delivered" }));
    }

    #[test]
    fn payment_update_serializes_as_single_field() {
        let body = serde_json::to_value(OrderUpdate::Payment(PaymentMethod::Cod)).expect("json");
        assert_eq!(body, json!({ "payment": "COD" }));
        assert_eq!(OrderUpdate::Payment(PaymentMethod::Cod).field_name(), "payment");
    }
}
