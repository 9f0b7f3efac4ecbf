//! Filter/sort engine and the immutable order board snapshot built on top of it.

use std::{collections::HashSet, fmt, str::FromStr, sync::Arc};

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use shared::domain::{Order, OrderStatus};
use thiserror::Error;
use tracing::debug;

use crate::error::StoreError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const ALL_DATES: &str = "all";
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CriteriaError {
    #[error("invalid date filter '{0}', expected 'all' or YYYY-MM-DD")]
    DateFilter(String),
    #[error("invalid sort '{0}', expected 'newest' or 'oldest'")]
    Sort(String),
    #[error("utc offset of {0} minutes is outside +/-14h")]
    Offset(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DateFilter {
    #[default]
    All,
    On(NaiveDate),
}

impl FromStr for DateFilter {
    type Err = CriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(ALL_DATES) {
            return Ok(DateFilter::All);
        }
        NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
            .map(DateFilter::On)
            .map_err(|_| CriteriaError::DateFilter(trimmed.to_string()))
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateFilter::All => f.write_str(ALL_DATES),
            DateFilter::On(date) => write!(f, "{}", date.format(DATE_FORMAT)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Newest,
    Oldest,
}

impl SortDirection {
    pub const ALL: [SortDirection; 2] = [SortDirection::Newest, SortDirection::Oldest];

    pub fn label(self) -> &'static str {
        match self {
            SortDirection::Newest => "Newest First",
            SortDirection::Oldest => "Oldest First",
        }
    }
}

impl FromStr for SortDirection {
    type Err = CriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(SortDirection::Newest),
            "oldest" => Ok(SortDirection::Oldest),
            _ => Err(CriteriaError::Sort(s.trim().to_string())),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Newest => f.write_str("newest"),
            SortDirection::Oldest => f.write_str("oldest"),
        }
    }
}

/// The single time zone used to reduce `createdAt` to a calendar date.
///
/// Filtering and the available-dates projection both go through
/// [`ReferenceZone::calendar_date`]; nothing else truncates timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceZone(FixedOffset);

impl ReferenceZone {
    pub fn utc() -> Self {
        Self(Utc.fix())
    }

    pub fn from_offset_minutes(minutes: i32) -> Result<Self, CriteriaError> {
        if minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(CriteriaError::Offset(minutes));
        }
        FixedOffset::east_opt(minutes * 60)
            .map(Self)
            .ok_or(CriteriaError::Offset(minutes))
    }

    pub fn offset(&self) -> FixedOffset {
        self.0
    }

    pub fn calendar_date(&self, timestamp: &DateTime<Utc>) -> NaiveDate {
        timestamp.with_timezone(&self.0).date_naive()
    }
}

impl Default for ReferenceZone {
    fn default() -> Self {
        Self::utc()
    }
}

/// Derives the displayed ordering from the full collection.
///
/// The sort is stable, so orders with equal `created_at` keep the relative
/// order they had in `orders`.
pub fn filter_sort(
    orders: &[Order],
    filter: DateFilter,
    direction: SortDirection,
    zone: ReferenceZone,
) -> Vec<Order> {
    let mut view: Vec<Order> = match filter {
        DateFilter::All => orders.to_vec(),
        DateFilter::On(date) => orders
            .iter()
            .filter(|order| zone.calendar_date(&order.created_at) == date)
            .cloned()
            .collect(),
    };

    match direction {
        SortDirection::Newest => view.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortDirection::Oldest => view.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
    }
    view
}

/// Distinct calendar dates across `orders`, in order of first appearance.
pub fn available_dates(orders: &[Order], zone: ReferenceZone) -> Vec<NaiveDate> {
    let mut seen = HashSet::new();
    orders
        .iter()
        .map(|order| zone.calendar_date(&order.created_at))
        .filter(|date| seen.insert(*date))
        .collect()
}

#[derive(Debug, Clone)]
pub enum BoardEvent {
    Loaded { seq: u64, orders: Vec<Order> },
    FetchFailed { seq: u64, error: StoreError },
    DateFilterChanged(DateFilter),
    SortChanged(SortDirection),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoardSummary {
    pub shown: usize,
    pub total: usize,
    pub pending: usize,
    pub delivered: usize,
    pub shown_amount: f64,
}

/// One immutable view of the board. Every event yields a fresh snapshot.
#[derive(Debug, Clone)]
pub struct OrderBoard {
    all_orders: Arc<[Order]>,
    view: Arc<[Order]>,
    date_filter: DateFilter,
    sort: SortDirection,
    zone: ReferenceZone,
    applied_seq: u64,
    revision: u64,
    last_error: Option<StoreError>,
}

impl Default for OrderBoard {
    fn default() -> Self {
        Self::new(SortDirection::default(), ReferenceZone::default())
    }
}

impl OrderBoard {
    pub fn new(sort: SortDirection, zone: ReferenceZone) -> Self {
        Self {
            all_orders: Arc::from(Vec::new()),
            view: Arc::from(Vec::new()),
            date_filter: DateFilter::All,
            sort,
            zone,
            applied_seq: 0,
            revision: 0,
            last_error: None,
        }
    }

    pub fn apply(&self, event: BoardEvent) -> OrderBoard {
        match event {
            BoardEvent::Loaded { seq, orders } => {
                if seq < self.applied_seq {
                    debug!(seq, applied = self.applied_seq, "dropping stale order fetch");
                    return self.clone();
                }
                let all_orders: Arc<[Order]> = orders.into();
                Self {
                    view: self.project(&all_orders, self.date_filter, self.sort),
                    all_orders,
                    applied_seq: seq,
                    revision: self.revision + 1,
                    last_error: None,
                    ..self.clone()
                }
            }
            BoardEvent::FetchFailed { seq, error } => {
                if seq < self.applied_seq {
                    return self.clone();
                }
                Self {
                    revision: self.revision + 1,
                    last_error: Some(error),
                    ..self.clone()
                }
            }
            BoardEvent::DateFilterChanged(date_filter) => Self {
                view: self.project(&self.all_orders, date_filter, self.sort),
                date_filter,
                revision: self.revision + 1,
                ..self.clone()
            },
            BoardEvent::SortChanged(sort) => Self {
                view: self.project(&self.all_orders, self.date_filter, sort),
                sort,
                revision: self.revision + 1,
                ..self.clone()
            },
        }
    }

    fn project(&self, orders: &[Order], filter: DateFilter, sort: SortDirection) -> Arc<[Order]> {
        filter_sort(orders, filter, sort, self.zone).into()
    }

    /// The derived view, in display order.
    pub fn orders(&self) -> &[Order] {
        &self.view
    }

    pub fn all_orders(&self) -> &[Order] {
        &self.all_orders
    }

    pub fn available_dates(&self) -> Vec<NaiveDate> {
        available_dates(&self.all_orders, self.zone)
    }

    pub fn date_filter(&self) -> DateFilter {
        self.date_filter
    }

    pub fn sort(&self) -> SortDirection {
        self.sort
    }

    pub fn zone(&self) -> ReferenceZone {
        self.zone
    }

    pub fn applied_seq(&self) -> u64 {
        self.applied_seq
    }

    /// Bumped on every accepted event; later snapshots compare greater.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Why the most recent fetch failed, until a later fetch succeeds.
    pub fn last_error(&self) -> Option<&StoreError> {
        self.last_error.as_ref()
    }

    pub fn summary(&self) -> BoardSummary {
        let delivered = self
            .view
            .iter()
            .filter(|order| order.status == OrderStatus::Delivered)
            .count();
        BoardSummary {
            shown: self.view.len(),
            total: self.all_orders.len(),
            pending: self.view.len() - delivered,
            delivered,
            shown_amount: self.view.iter().map(|order| order.total_amount).sum(),
        }
    }
}

#[cfg(test)]
#[path = "tests/board_tests.rs"]
mod tests;
