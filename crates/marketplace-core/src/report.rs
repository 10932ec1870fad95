//! Reporting window parsing and earnings ranking.
//!
//! Both admin reports take an inclusive `[start, end]` window on the job
//! payment date. The stores filter and sum; the ranking rules (descending
//! total, deterministic tie break, row limit) live here so every store
//! orders identically.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;

use marketplace_types::{ClientSpending, ProfessionEarnings, ProfileId};

use crate::error::MarketError;

/// Message for a missing or unparseable start bound.
pub const START_INVALID: &str = "Start date not provided or invalid";

/// Message for a missing or unparseable end bound.
pub const END_INVALID: &str = "End date not provided or invalid";

/// An inclusive reporting window on payment dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRange {
    /// First instant included.
    pub start: DateTime<Utc>,
    /// Last instant included.
    pub end: DateTime<Utc>,
}

impl ReportRange {
    /// Build a range from raw query values.
    ///
    /// The start bound is checked first, so a request missing both gets the
    /// start message. A start after the end is accepted and matches nothing.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, MarketError> {
        let start = start
            .and_then(parse_instant)
            .ok_or_else(|| MarketError::validation(START_INVALID))?;
        let end = end
            .and_then(parse_instant)
            .ok_or_else(|| MarketError::validation(END_INVALID))?;
        Ok(Self { start, end })
    }

    /// Whether the instant falls inside the window.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }

    /// Whether the window matches nothing.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

/// Parse a report bound.
///
/// Accepts RFC 3339 (`2020-08-15T00:00:00.000Z`), a timestamp without
/// offset taken as UTC (`2020-08-15T10:30:00`), or a bare date taken as
/// midnight UTC (`2020-08-15`).
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Resolve the best-clients row limit.
///
/// Absent, blank, or zero means `default`. Negative or non-numeric values
/// are rejected.
pub fn resolve_limit(raw: Option<&str>, default: u32) -> Result<u32, MarketError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(default);
    };
    let limit: i64 = raw
        .parse()
        .map_err(|e| MarketError::validation(format!("Limit must be a non-negative integer: {e}")))?;
    if limit < 0 {
        return Err(MarketError::validation(
            "Limit must be a non-negative integer",
        ));
    }
    if limit == 0 {
        return Ok(default);
    }
    Ok(u32::try_from(limit).unwrap_or(u32::MAX))
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Sum job prices per profession and rank them.
///
/// Ordered by total descending, then profession ascending.
pub fn rank_professions(
    paid: impl IntoIterator<Item = (String, Decimal)>,
) -> Result<Vec<ProfessionEarnings>, MarketError> {
    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for (profession, price) in paid {
        let total = totals.entry(profession).or_insert(Decimal::ZERO);
        *total = total
            .checked_add(price)
            .ok_or_else(|| MarketError::internal("profession total overflow"))?;
    }

    let mut rows: Vec<ProfessionEarnings> = totals
        .into_iter()
        .map(|(profession, total_earnings)| ProfessionEarnings {
            profession,
            total_earnings,
        })
        .collect();
    sort_professions(&mut rows);
    Ok(rows)
}

/// Apply the profession ordering to pre-aggregated rows.
pub fn sort_professions(rows: &mut [ProfessionEarnings]) {
    rows.sort_by(|a, b| {
        b.total_earnings
            .cmp(&a.total_earnings)
            .then_with(|| a.profession.cmp(&b.profession))
    });
}

/// Sum job prices per client and keep the top `limit`.
///
/// Input rows are `(client, full name, price)`. Ordered by total
/// descending, then client id ascending.
pub fn rank_clients(
    paid: impl IntoIterator<Item = (ProfileId, String, Decimal)>,
    limit: u32,
) -> Result<Vec<ClientSpending>, MarketError> {
    let mut totals: BTreeMap<ProfileId, ClientSpending> = BTreeMap::new();
    for (id, full_name, price) in paid {
        let row = totals.entry(id).or_insert_with(|| ClientSpending {
            id,
            full_name,
            paid: Decimal::ZERO,
        });
        row.paid = row
            .paid
            .checked_add(price)
            .ok_or_else(|| MarketError::internal("client total overflow"))?;
    }

    let mut rows: Vec<ClientSpending> = totals.into_values().collect();
    sort_clients(&mut rows);
    rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    Ok(rows)
}

/// Apply the client ordering to pre-aggregated rows.
pub fn sort_clients(rows: &mut [ClientSpending]) {
    rows.sort_by(|a, b| b.paid.cmp(&a.paid).then_with(|| a.id.cmp(&b.id)));
}
