use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Fixed lookback windows the dashboard simulates reinvestment over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DripWindow {
    #[serde(rename = "4w")]
    FourWeeks,
    #[serde(rename = "13w")]
    ThirteenWeeks,
    #[serde(rename = "26w")]
    TwentySixWeeks,
    #[serde(rename = "52w")]
    FiftyTwoWeeks,
}

impl DripWindow {
    pub const ALL: [DripWindow; 4] = [
        DripWindow::FourWeeks,
        DripWindow::ThirteenWeeks,
        DripWindow::TwentySixWeeks,
        DripWindow::FiftyTwoWeeks,
    ];

    pub fn days(&self) -> i64 {
        match self {
            DripWindow::FourWeeks => 28,
            DripWindow::ThirteenWeeks => 91,
            DripWindow::TwentySixWeeks => 182,
            DripWindow::FiftyTwoWeeks => 364,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DripWindow::FourWeeks => "4w",
            DripWindow::ThirteenWeeks => "13w",
            DripWindow::TwentySixWeeks => "26w",
            DripWindow::FiftyTwoWeeks => "52w",
        }
    }

    pub fn from_days(days: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.days() == days)
    }
}

impl FromStr for DripWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "4w" | "28" => Ok(DripWindow::FourWeeks),
            "13w" | "91" => Ok(DripWindow::ThirteenWeeks),
            "26w" | "182" => Ok(DripWindow::TwentySixWeeks),
            "52w" | "364" => Ok(DripWindow::FiftyTwoWeeks),
            other => Err(format!(
                "Unknown window '{}' (expected 4w, 13w, 26w or 52w)",
                other
            )),
        }
    }
}

impl fmt::Display for DripWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Knobs for the reinvestment simulation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DripOptions {
    /// Withholding applied to each cash distribution before reinvestment,
    /// e.g. 0.15 keeps 85 cents on the dollar. None means no withholding.
    pub tax_rate: Option<f64>,
}

/// Result of one reinvestment simulation. Pure output, not a database row.
///
/// `dividends_skipped` counts distributions with no close on or after their
/// ex-date in the available data; a non-zero value means the figure was
/// computed from an incomplete price history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DripOutcome {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_price: f64,
    pub end_price: f64,
    pub end_shares: f64,
    pub total_dividends: f64,
    pub growth_percent: f64,
    pub dividends_reinvested: usize,
    pub dividends_skipped: usize,
}

/// Cached simulation result, one row per (ticker, window).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DripSnapshot {
    pub id: Uuid,
    pub ticker: String,
    pub window_days: i32,
    pub as_of: NaiveDate,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_price: f64,
    pub end_price: f64,
    pub end_shares: f64,
    pub total_dividends: f64,
    pub growth_percent: f64,
    pub dividends_reinvested: i32,
    pub dividends_skipped: i32,
    pub computed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// One row of the ranking table: an active ETF with its cached growth figure.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RankingEntry {
    pub ticker: String,
    pub name: String,
    pub window_days: i32,
    pub growth_percent: f64,
    pub total_dividends: f64,
    pub end_shares: f64,
    pub as_of: NaiveDate,
    pub computed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_days_match_week_counts() {
        assert_eq!(DripWindow::FourWeeks.days(), 4 * 7);
        assert_eq!(DripWindow::ThirteenWeeks.days(), 13 * 7);
        assert_eq!(DripWindow::TwentySixWeeks.days(), 26 * 7);
        assert_eq!(DripWindow::FiftyTwoWeeks.days(), 52 * 7);
    }

    #[test]
    fn test_window_parses_labels_and_day_counts() {
        assert_eq!("4w".parse::<DripWindow>(), Ok(DripWindow::FourWeeks));
        assert_eq!("13W".parse::<DripWindow>(), Ok(DripWindow::ThirteenWeeks));
        assert_eq!("182".parse::<DripWindow>(), Ok(DripWindow::TwentySixWeeks));
        assert_eq!(" 52w ".parse::<DripWindow>(), Ok(DripWindow::FiftyTwoWeeks));
        assert!("1y".parse::<DripWindow>().is_err());
    }

    #[test]
    fn test_from_days_round_trips() {
        for window in DripWindow::ALL {
            assert_eq!(DripWindow::from_days(window.days()), Some(window));
        }
        assert_eq!(DripWindow::from_days(30), None);
    }
}
