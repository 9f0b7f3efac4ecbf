use std::{fmt::Write as _, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    ClientSettings, DateFilter, MutationReport, OrderBoard, ReferenceZone, SortDirection,
};
use shared::domain::{Order, OrderId, OrderStatus, PaymentMethod};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "order-board", about = "List and update canteen orders")]
struct Cli {
    /// Settings file; defaults to ./order_board.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Order store base address, overriding file and environment.
    #[arg(long)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the order board.
    List {
        #[arg(long, default_value = "all")]
        date: DateFilter,
        #[arg(long)]
        sort: Option<SortDirection>,
    },
    /// Print the calendar dates present across all orders.
    Dates,
    SetStatus {
        id: String,
        status: OrderStatus,
    },
    SetPayment {
        id: String,
        payment: PaymentMethod,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings =
        ClientSettings::load(cli.config.as_deref()).context("failed to load settings")?;
    if let Some(base_url) = cli.base_url {
        settings.base_url = base_url;
        settings.validate()?;
    }
    let controller = client_core::connect(&settings)?;

    match cli.command {
        Command::List { date, sort } => {
            controller.refresh().await;
            controller.set_date_filter(date).await;
            let board = match sort {
                Some(sort) => controller.set_sort(sort).await,
                None => controller.board().await,
            };
            if !is_loaded(&board) {
                return Ok(ExitCode::FAILURE);
            }
            print!("{}", render_board(&board));
        }
        Command::Dates => {
            let board = controller.refresh().await;
            if !is_loaded(&board) {
                return Ok(ExitCode::FAILURE);
            }
            for date in board.available_dates() {
                println!("{}", date.format("%Y-%m-%d"));
            }
        }
        Command::SetStatus { id, status } => {
            let report = controller
                .request_status_change(&OrderId::new(id), status)
                .await;
            return Ok(finish_mutation(report));
        }
        Command::SetPayment { id, payment } => {
            let report = controller
                .request_payment_change(&OrderId::new(id), payment)
                .await;
            return Ok(finish_mutation(report));
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Store failures are already logged by the controller; the exit status is
/// the only other trace of them.
fn is_loaded(board: &OrderBoard) -> bool {
    board.applied_seq() > 0
}

fn finish_mutation(report: MutationReport) -> ExitCode {
    print!("{}", render_board(&report.board));
    if report.outcome.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn render_board(board: &OrderBoard) -> String {
    let summary = board.summary();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} of {} orders ({} pending, {} delivered) | date: {} | sort: {} | total ₹{:.2}",
        summary.shown,
        summary.total,
        summary.pending,
        summary.delivered,
        board.date_filter(),
        board.sort(),
        summary.shown_amount,
    );
    for order in board.orders() {
        out.push('\n');
        out.push_str(&render_order(order, board.zone()));
    }
    out
}

fn render_order(order: &Order, zone: ReferenceZone) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[{}] {}  ({})", order.status, order.name, order.id);
    let _ = writeln!(out, "  Roll No: {}  Contact: {}", order.roll_no, order.contact);
    let _ = writeln!(out, "  Location: {}", order.location);
    let _ = writeln!(
        out,
        "  Total: ₹{}  Payment: {}  Placed: {}",
        order.total_amount,
        order.payment,
        order
            .created_at
            .with_timezone(&zone.offset())
            .format("%Y-%m-%d %H:%M %:z")
    );
    for item in &order.items {
        let _ = writeln!(out, "    {} × {}", item.name, item.quantity);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use client_core::{BoardEvent, StoreError};
    use shared::domain::OrderItem;

    fn sample_order() -> Order {
        Order {
            id: OrderId::new("65f0"),
            name: "Meera".into(),
            roll_no: "22EC019".into(),
            contact: "9123456780".into(),
            location: "Library".into(),
            total_amount: 95.0,
            items: vec![
                OrderItem {
                    name: "Samosa".into(),
                    quantity: 3,
                },
                OrderItem {
                    name: "Cold Coffee".into(),
                    quantity: 1,
                },
            ],
            status: OrderStatus::Pending,
            payment: PaymentMethod::Cod,
            created_at: "2024-01-01T10:00:00Z".parse().expect("timestamp"),
        }
    }

    #[test]
    fn renders_order_card_with_items() {
        let text = render_order(&sample_order(), ReferenceZone::utc());
        assert!(text.starts_with("[Pending] Meera  (65f0)"));
        assert!(text.contains("Roll No: 22EC019"));
        assert!(text.contains("Payment: COD"));
        assert!(text.contains("Samosa × 3"));
        assert!(text.contains("Cold Coffee × 1"));
    }

    #[test]
    fn renders_board_header_from_summary() {
        let board = OrderBoard::default().apply(BoardEvent::Loaded {
            seq: 1,
            orders: vec![sample_order()],
        });
        let text = render_board(&board);
        assert!(text.starts_with("1 of 1 orders (1 pending, 0 delivered) | date: all | sort: newest"));
    }

    #[test]
    fn placement_time_uses_the_reference_zone() {
        let mut order = sample_order();
        order.created_at = "2024-01-01T20:00:00Z".parse().expect("timestamp");
        let ist = ReferenceZone::from_offset_minutes(330).expect("zone");

        let text = render_order(&order, ist);

        assert!(text.contains("Placed: 2024-01-02 01:30 +05:30"), "{text}");
        assert!(render_order(&order, ReferenceZone::utc()).contains("Placed: 2024-01-01 20:00 +00:00"));
    }

    #[test]
    fn listed_date_matches_printed_placement_date() {
        let mut order = sample_order();
        order.created_at = "2024-01-01T20:00:00Z".parse().expect("timestamp");
        let ist = ReferenceZone::from_offset_minutes(330).expect("zone");
        let board = OrderBoard::new(SortDirection::Newest, ist)
            .apply(BoardEvent::Loaded {
                seq: 1,
                orders: vec![order],
            })
            .apply(BoardEvent::DateFilterChanged("2024-01-02".parse().expect("date")));

        let text = render_board(&board);

        assert!(text.starts_with("1 of 1 orders"));
        assert!(text.contains("Placed: 2024-01-02"));
    }

    #[test]
    fn unloaded_board_is_reported_by_status_only() {
        let board = OrderBoard::default().apply(BoardEvent::FetchFailed {
            seq: 1,
            error: StoreError::Network("connection refused".into()),
        });
        assert!(!is_loaded(&board));
        assert!(!render_board(&board).contains("connection refused"));
    }

    #[test]
    fn failed_update_exits_with_failure() {
        let board = Arc::new(OrderBoard::default());
        let failed = MutationReport {
            outcome: Err(StoreError::NotFound(OrderId::new("gone"))),
            board: Arc::clone(&board),
        };
        assert_eq!(finish_mutation(failed), ExitCode::FAILURE);

        let applied = MutationReport {
            outcome: Ok(()),
            board,
        };
        assert_eq!(finish_mutation(applied), ExitCode::SUCCESS);
    }

    #[test]
    fn parses_update_subcommands() {
        let cli = Cli::try_parse_from(["order-board", "set-payment", "65f0", "gpay"]).expect("parse");
        assert!(matches!(
            cli.command,
            Command::SetPayment {
                payment: PaymentMethod::Gpay,
                ..
            }
        ));

        let cli = Cli::try_parse_from(["order-board", "list", "--date", "2024-01-01", "--sort", "oldest"])
            .expect("parse");
        assert!(matches!(
            cli.command,
            Command::List {
                date: DateFilter::On(_),
                sort: Some(SortDirection::Oldest),
            }
        ));
    }
}
