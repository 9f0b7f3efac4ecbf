use std::{collections::HashMap, sync::Arc};

use client_core::{DateFilter, OrderBoard, SortDirection};
use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use shared::domain::{Order, OrderId, OrderStatus, PaymentMethod};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;

pub const SETTINGS_STORAGE_KEY: &str = "order_board_gui.settings";
const CARD_WIDTH: f32 = 320.0;
const DELIVERED_OPACITY: f32 = 0.6;

const DELIVERED_BADGE: egui::Color32 = egui::Color32::from_rgb(46, 204, 113);
const PENDING_BADGE: egui::Color32 = egui::Color32::from_rgb(243, 156, 18);
const AMOUNT_COLOR: egui::Color32 = egui::Color32::from_rgb(231, 76, 60);
const ITEMS_BG: egui::Color32 = egui::Color32::from_rgb(227, 244, 223);
const QUANTITY_BADGE: egui::Color32 = egui::Color32::from_rgb(255, 75, 43);

/// Window preferences kept in eframe storage. The sort is only stored once
/// the user picks one, so the configured default applies until then.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedGuiSettings {
    #[serde(default)]
    pub sort: Option<String>,
}

impl PersistedGuiSettings {
    pub fn remembered_sort(&self) -> Option<SortDirection> {
        self.sort.as_deref().and_then(|raw| raw.parse().ok())
    }
}

/// Per-card dropdown selections. They only leave the card when the matching
/// update button is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardDraft {
    pub status: OrderStatus,
    pub payment: PaymentMethod,
    seen_status: OrderStatus,
    seen_payment: PaymentMethod,
}

impl CardDraft {
    fn seeded_from(order: &Order) -> Self {
        Self {
            status: order.status,
            payment: order.payment,
            seen_status: order.status,
            seen_payment: order.payment,
        }
    }
}

/// Returns the draft for `order`, reseeding any field whose stored value
/// changed since the draft was taken.
pub fn draft_for<'a>(drafts: &'a mut HashMap<OrderId, CardDraft>, order: &Order) -> &'a mut CardDraft {
    let draft = drafts
        .entry(order.id.clone())
        .or_insert_with(|| CardDraft::seeded_from(order));
    if draft.seen_status != order.status {
        draft.status = order.status;
        draft.seen_status = order.status;
    }
    if draft.seen_payment != order.payment {
        draft.payment = order.payment;
        draft.seen_payment = order.payment;
    }
    draft
}

pub fn date_filter_label(filter: DateFilter) -> String {
    match filter {
        DateFilter::All => "All Dates".to_string(),
        DateFilter::On(_) => filter.to_string(),
    }
}

pub struct OrderBoardApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    board: Arc<OrderBoard>,
    drafts: HashMap<OrderId, CardDraft>,
    date_choice: DateFilter,
    sort_choice: SortDirection,
    remembered_sort: Option<SortDirection>,
    status: String,
}

impl OrderBoardApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        persisted: Option<PersistedGuiSettings>,
    ) -> Self {
        let remembered_sort = persisted.and_then(|settings| settings.remembered_sort());
        let mut app = Self {
            cmd_tx,
            ui_rx,
            board: Arc::new(OrderBoard::default()),
            drafts: HashMap::new(),
            date_choice: DateFilter::All,
            sort_choice: remembered_sort.unwrap_or_default(),
            remembered_sort,
            status: "Loading orders...".to_string(),
        };
        if let Some(sort) = remembered_sort {
            app.send(BackendCommand::SetSort(sort));
        }
        app.send(BackendCommand::Refresh);
        app
    }

    fn send(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::BoardUpdated(board) => self.accept_board(board),
                UiEvent::Error(err) => self.log_failure(&err),
            }
        }
    }

    /// Store failures go to the log only; the board simply keeps showing
    /// the last orders it loaded.
    fn log_failure(&self, err: &UiError) {
        tracing::warn!(
            context = ?err.context(),
            category = ?err.category(),
            "{}",
            err.message()
        );
    }

    fn accept_board(&mut self, board: Arc<OrderBoard>) {
        // Snapshots from concurrent tasks can arrive out of order.
        if board.revision() < self.board.revision() {
            return;
        }
        self.drafts
            .retain(|id, _| board.all_orders().iter().any(|order| &order.id == id));
        self.date_choice = board.date_filter();
        self.sort_choice = board.sort();
        if board.applied_seq() > 0 {
            self.status = format!("Showing {} orders", board.all_orders().len());
        }
        self.board = board;
    }

    fn show_filter_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("order_board_filters")
            .frame(egui::Frame::new().inner_margin(egui::Margin::symmetric(16, 10)))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("What The Food · Orders");
                    ui.add_space(24.0);

                    let previous_date = self.date_choice;
                    egui::ComboBox::from_id_salt("date_filter")
                        .selected_text(date_filter_label(self.date_choice))
                        .show_ui(ui, |ui| {
                            ui.selectable_value(&mut self.date_choice, DateFilter::All, "All Dates");
                            for date in self.board.available_dates() {
                                let option = DateFilter::On(date);
                                ui.selectable_value(
                                    &mut self.date_choice,
                                    option,
                                    option.to_string(),
                                );
                            }
                        });
                    if self.date_choice != previous_date {
                        self.send(BackendCommand::SetDateFilter(self.date_choice));
                    }

                    let previous_sort = self.sort_choice;
                    egui::ComboBox::from_id_salt("time_sort")
                        .selected_text(self.sort_choice.label())
                        .show_ui(ui, |ui| {
                            for sort in SortDirection::ALL {
                                ui.selectable_value(&mut self.sort_choice, sort, sort.label());
                            }
                        });
                    if self.sort_choice != previous_sort {
                        self.remembered_sort = Some(self.sort_choice);
                        self.send(BackendCommand::SetSort(self.sort_choice));
                    }

                    if ui.button("⟳ Refresh").clicked() {
                        self.send(BackendCommand::Refresh);
                    }

                    let summary = self.board.summary();
                    ui.label(format!(
                        "{} of {} orders · {} pending · {} delivered",
                        summary.shown, summary.total, summary.pending, summary.delivered
                    ));
                });
            });
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("order_board_status").show(ctx, |ui| {
            ui.label(egui::RichText::new(&self.status).small());
        });
    }

    fn show_cards(&mut self, ctx: &egui::Context) {
        let board = Arc::clone(&self.board);
        let mut commands = Vec::new();

        egui::CentralPanel::default().show(ctx, |ui| {
            if board.orders().is_empty() {
                ui.centered_and_justified(|ui| {
                    ui.label(if board.applied_seq() == 0 {
                        "Waiting for the order store..."
                    } else {
                        "No orders for this date."
                    });
                });
                return;
            }

            egui::ScrollArea::vertical()
                .id_salt("order_cards_scroll")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.spacing_mut().item_spacing = egui::vec2(20.0, 20.0);
                        for order in board.orders() {
                            let draft = draft_for(&mut self.drafts, order);
                            if let Some(cmd) = render_order_card(ui, &board, order, draft) {
                                commands.push(cmd);
                            }
                        }
                    });
                });
        });

        for cmd in commands {
            self.send(cmd);
        }
    }
}

fn render_order_card(
    ui: &mut egui::Ui,
    board: &OrderBoard,
    order: &Order,
    draft: &mut CardDraft,
) -> Option<BackendCommand> {
    let mut command = None;
    let delivered = order.is_delivered();

    ui.allocate_ui(egui::vec2(CARD_WIDTH, 0.0), |ui| {
        if delivered {
            ui.multiply_opacity(DELIVERED_OPACITY);
        }
        egui::Frame::new()
            .fill(ui.visuals().extreme_bg_color)
            .corner_radius(egui::CornerRadius::same(16))
            .inner_margin(egui::Margin::same(14))
            .show(ui, |ui| {
                ui.set_width(CARD_WIDTH - 28.0);
                ui.spacing_mut().item_spacing = egui::vec2(8.0, 4.0);

                ui.horizontal(|ui| {
                    ui.vertical(|ui| {
                        ui.strong(&order.name);
                        ui.small(format!("🎓 Roll No: {}", order.roll_no));
                        ui.small(format!("📞 Contact: {}", order.contact));
                    });
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::TOP), |ui| {
                        let badge = if delivered { DELIVERED_BADGE } else { PENDING_BADGE };
                        ui.label(
                            egui::RichText::new(order.status.as_str())
                                .strong()
                                .color(egui::Color32::WHITE)
                                .background_color(badge),
                        );
                    });
                });

                ui.label(egui::RichText::new(format!("📍 {}", order.location)).strong());
                ui.horizontal(|ui| {
                    ui.label("💰 Total:");
                    ui.label(
                        egui::RichText::new(format!("₹{}", order.total_amount))
                            .strong()
                            .color(AMOUNT_COLOR),
                    );
                    ui.label(egui::RichText::new(order.payment.as_str()).weak());
                });
                ui.small(format!(
                    "Placed {}",
                    order
                        .created_at
                        .with_timezone(&board.zone().offset())
                        .format("%Y-%m-%d %H:%M")
                ));

                egui::Frame::new()
                    .fill(ITEMS_BG)
                    .corner_radius(egui::CornerRadius::same(10))
                    .inner_margin(egui::Margin::same(10))
                    .show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        ui.label(
                            egui::RichText::new("🛒 Ordered Items")
                                .strong()
                                .color(egui::Color32::BLACK),
                        );
                        for item in &order.items {
                            ui.horizontal(|ui| {
                                ui.label(egui::RichText::new(&item.name).color(egui::Color32::BLACK));
                                ui.with_layout(
                                    egui::Layout::right_to_left(egui::Align::Center),
                                    |ui| {
                                        ui.label(
                                            egui::RichText::new(format!("× {}", item.quantity))
                                                .strong()
                                                .color(egui::Color32::WHITE)
                                                .background_color(QUANTITY_BADGE),
                                        );
                                    },
                                );
                            });
                        }
                    });

                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    egui::ComboBox::from_id_salt(("status", order.id.as_str()))
                        .selected_text(draft.status.as_str())
                        .show_ui(ui, |ui| {
                            for status in OrderStatus::ALL {
                                ui.selectable_value(&mut draft.status, *status, status.as_str());
                            }
                        });
                    if ui.button("🚚 Update Status").clicked() {
                        command = Some(BackendCommand::UpdateStatus {
                            order_id: order.id.clone(),
                            status: draft.status,
                        });
                    }
                });
                ui.horizontal(|ui| {
                    egui::ComboBox::from_id_salt(("payment", order.id.as_str()))
                        .selected_text(draft.payment.as_str())
                        .show_ui(ui, |ui| {
                            for payment in PaymentMethod::ALL {
                                ui.selectable_value(&mut draft.payment, *payment, payment.as_str());
                            }
                        });
                    if ui.button("💳 Update Payment").clicked() {
                        command = Some(BackendCommand::UpdatePayment {
                            order_id: order.id.clone(),
                            payment: draft.payment,
                        });
                    }
                });
            });
    });

    command
}

impl eframe::App for OrderBoardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.show_filter_bar(ctx);
        self.show_status_bar(ctx);
        self.show_cards(ctx);
        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = PersistedGuiSettings {
            sort: self.remembered_sort.map(|sort| sort.to_string()),
        };
        if let Ok(serialized) = serde_json::to_string(&settings) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}

#[cfg(test)]
#[path = "../tests/app_tests.rs"]
mod tests;
