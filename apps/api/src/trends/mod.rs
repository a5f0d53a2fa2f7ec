// Search-interest analysis: momentum, geography, seasonality and related
// queries for a topic. Data comes from a pluggable `TrendsSource`; without one
// (or when it errors) the analysis degrades to a complete fallback structure.

pub mod analyzer;
pub mod catalog;
pub mod fallback;
pub mod handlers;
pub mod models;
pub mod research;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrendsError {
    #[error("Trends request failed: {0}")]
    Request(String),

    #[error("Trends rate limit hit")]
    RateLimited,
}

/// One weekly sample on the 0..=100 interest scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterestPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionInterest {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopQueryRow {
    pub query: String,
    pub value: i64,
}

/// `growth` is the raw label, e.g. `+250%` or `Breakout`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RisingQueryRow {
    pub query: String,
    pub growth: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelatedQueries {
    pub top: Vec<TopQueryRow>,
    pub rising: Vec<RisingQueryRow>,
}

/// A Google Trends style data provider. Empty results mean "no data" and are
/// handled per section; errors abort the whole analysis into fallback mode.
#[async_trait]
pub trait TrendsSource: Send + Sync {
    /// Last twelve months of US interest, oldest first.
    async fn interest_over_time(&self, keyword: &str) -> Result<Vec<InterestPoint>, TrendsError>;

    /// Country-level interest over the last three months.
    async fn interest_by_region(&self, keyword: &str) -> Result<Vec<RegionInterest>, TrendsError>;

    async fn interest_by_us_state(&self, keyword: &str)
        -> Result<Vec<RegionInterest>, TrendsError>;

    async fn related_queries(&self, keyword: &str) -> Result<RelatedQueries, TrendsError>;
}

pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// `month` is 1-based; out-of-range values clamp.
pub fn month_name(month: u32) -> &'static str {
    MONTHS[(month.clamp(1, 12) - 1) as usize]
}

/// Months from `current` until `target`, in 1..=12. The same month counts as
/// a full year away.
pub fn months_until(current: u32, target: u32) -> u32 {
    match (target + 12 - current) % 12 {
        0 => 12,
        n => n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_months_until_wraps_and_never_returns_zero() {
        assert_eq!(months_until(10, 12), 2);
        assert_eq!(months_until(11, 2), 3);
        assert_eq!(months_until(5, 5), 12);
    }

    #[test]
    fn test_month_name() {
        assert_eq!(month_name(1), "Jan");
        assert_eq!(month_name(12), "Dec");
    }
}
