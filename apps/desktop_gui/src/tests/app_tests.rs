use super::*;
use chrono::{NaiveDate, Utc};
use crossbeam_channel::bounded;
use shared::domain::OrderItem;

fn order(id: &str, status: OrderStatus, payment: PaymentMethod) -> Order {
    Order {
        id: OrderId::new(id),
        name: "Asha".into(),
        roll_no: "21CS042".into(),
        contact: "9876543210".into(),
        location: "Hostel B".into(),
        total_amount: 120.0,
        items: vec![OrderItem {
            name: "Masala Dosa".into(),
            quantity: 2,
        }],
        status,
        payment,
        created_at: Utc::now(),
    }
}

#[test]
fn draft_is_seeded_from_the_order() {
    let mut drafts = HashMap::new();
    let order = order("o1", OrderStatus::Pending, PaymentMethod::Nan);

    let draft = draft_for(&mut drafts, &order);

    assert_eq!(draft.status, OrderStatus::Pending);
    assert_eq!(draft.payment, PaymentMethod::Nan);
}

#[test]
fn unsubmitted_selection_survives_an_unchanged_reload() {
    let mut drafts = HashMap::new();
    let order = order("o1", OrderStatus::Pending, PaymentMethod::Nan);
    draft_for(&mut drafts, &order).payment = PaymentMethod::Gpay;

    let draft = draft_for(&mut drafts, &order);

    assert_eq!(draft.payment, PaymentMethod::Gpay);
}

#[test]
fn stored_change_reseeds_only_the_changed_field() {
    let mut drafts = HashMap::new();
    let before = order("o1", OrderStatus::Pending, PaymentMethod::Nan);
    draft_for(&mut drafts, &before).payment = PaymentMethod::Cod;

    let after = order("o1", OrderStatus::Delivered, PaymentMethod::Nan);
    let draft = draft_for(&mut drafts, &after);

    assert_eq!(draft.status, OrderStatus::Delivered);
    assert_eq!(draft.payment, PaymentMethod::Cod);
}

#[test]
fn date_filter_labels() {
    assert_eq!(date_filter_label(DateFilter::All), "All Dates");
    let day = NaiveDate::from_ymd_opt(2024, 1, 5).expect("date");
    assert_eq!(date_filter_label(DateFilter::On(day)), "2024-01-05");
}

#[test]
fn remembered_sort_ignores_unknown_values() {
    let stored = PersistedGuiSettings {
        sort: Some("oldest".into()),
    };
    assert_eq!(stored.remembered_sort(), Some(SortDirection::Oldest));

    let garbled = PersistedGuiSettings {
        sort: Some("sideways".into()),
    };
    assert_eq!(garbled.remembered_sort(), None);
}

#[test]
fn new_app_requests_remembered_sort_then_refresh() {
    let (cmd_tx, cmd_rx) = bounded(8);
    let (_ui_tx, ui_rx) = bounded(8);
    let persisted = PersistedGuiSettings {
        sort: Some("oldest".into()),
    };

    let _app = OrderBoardApp::new(cmd_tx, ui_rx, Some(persisted));

    let sent: Vec<_> = cmd_rx.try_iter().collect();
    assert!(matches!(
        sent.as_slice(),
        [
            BackendCommand::SetSort(SortDirection::Oldest),
            BackendCommand::Refresh
        ]
    ));
}

#[test]
fn older_snapshot_does_not_replace_newer_one() {
    let (cmd_tx, _cmd_rx) = bounded(8);
    let (ui_tx, ui_rx) = bounded(8);
    let mut app = OrderBoardApp::new(cmd_tx, ui_rx, None);

    let first = OrderBoard::default().apply(client_core::BoardEvent::Loaded {
        seq: 1,
        orders: vec![order("old", OrderStatus::Pending, PaymentMethod::Nan)],
    });
    let second = first.apply(client_core::BoardEvent::Loaded {
        seq: 2,
        orders: vec![order("new", OrderStatus::Pending, PaymentMethod::Nan)],
    });

    ui_tx
        .try_send(UiEvent::BoardUpdated(Arc::new(second)))
        .expect("send");
    ui_tx
        .try_send(UiEvent::BoardUpdated(Arc::new(first)))
        .expect("send");
    app.process_ui_events();

    assert_eq!(app.board.orders()[0].id.as_str(), "new");
}

#[test]
fn store_failures_leave_the_status_bar_neutral() {
    let (cmd_tx, _cmd_rx) = bounded(8);
    let (ui_tx, ui_rx) = bounded(8);
    let mut app = OrderBoardApp::new(cmd_tx, ui_rx, None);

    let loaded = OrderBoard::default().apply(client_core::BoardEvent::Loaded {
        seq: 1,
        orders: vec![order("o1", OrderStatus::Pending, PaymentMethod::Nan)],
    });
    ui_tx
        .try_send(UiEvent::BoardUpdated(Arc::new(loaded.clone())))
        .expect("send");
    app.process_ui_events();
    assert_eq!(app.status, "Showing 1 orders");

    let error = client_core::StoreError::Network("server responded with 404 Not Found".into());
    let failed = loaded.apply(client_core::BoardEvent::FetchFailed {
        seq: 2,
        error: error.clone(),
    });
    ui_tx
        .try_send(UiEvent::Error(UiError::from_store(
            crate::controller::events::UiErrorContext::Refresh,
            &error,
        )))
        .expect("send");
    ui_tx
        .try_send(UiEvent::BoardUpdated(Arc::new(failed)))
        .expect("send");
    app.process_ui_events();

    assert_eq!(app.status, "Showing 1 orders");
    assert_eq!(app.board.orders()[0].id.as_str(), "o1");
}
