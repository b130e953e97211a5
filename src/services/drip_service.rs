use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::{
    DividendEvent, DripOptions, DripOutcome, DripSnapshot, DripWindow, PricePoint,
};

/// Simulate a single share held over the window ending at `as_of`, with every
/// cash distribution reinvested into fractional shares at the first available
/// close on or after its ex-date.
///
/// `as_of` is an explicit input; the function never reads the clock, so
/// identical inputs always produce identical output. Dividend order does not
/// matter (events are sorted by ex-date before the scan), and per-item bad
/// data (non-finite or non-positive closes and amounts) is dropped rather
/// than failing the whole calculation.
///
/// Returns `None` when fewer than two usable closes fall inside the window.
/// With no distributions in the window the outcome degenerates to the simple
/// price return and `end_shares` stays at 1.0.
pub fn simulate_reinvestment(
    prices: &[PricePoint],
    dividends: &[DividendEvent],
    as_of: NaiveDate,
    window: DripWindow,
    opts: DripOptions,
) -> Option<DripOutcome> {
    let start_date = as_of - ChronoDuration::days(window.days());

    // Closes inside [start, as_of], ascending.
    let mut window_prices: Vec<(NaiveDate, f64)> = prices
        .iter()
        .filter(|p| p.close_price.is_finite() && p.close_price > 0.0)
        .filter(|p| p.date >= start_date && p.date <= as_of)
        .map(|p| (p.date, p.close_price))
        .collect();
    window_prices.sort_by_key(|(date, _)| *date);

    if window_prices.len() < 2 {
        return None;
    }

    let (_, start_price) = window_prices[0];
    let (_, end_price) = window_prices[window_prices.len() - 1];

    // Distributions with ex-date inside [start, as_of), ascending regardless
    // of input order.
    let mut window_dividends: Vec<(NaiveDate, f64)> = dividends
        .iter()
        .filter(|d| d.amount_per_share.is_finite() && d.amount_per_share > 0.0)
        .filter(|d| d.ex_date >= start_date && d.ex_date < as_of)
        .map(|d| (d.ex_date, d.amount_per_share))
        .collect();
    window_dividends.sort_by_key(|(ex_date, _)| *ex_date);

    let keep = match opts.tax_rate {
        Some(rate) if rate.is_finite() && rate > 0.0 && rate < 1.0 => 1.0 - rate,
        _ => 1.0,
    };

    let mut shares = 1.0_f64;
    let mut total_dividends = 0.0_f64;
    let mut reinvested = 0usize;
    let mut skipped = 0usize;

    for (ex_date, amount) in &window_dividends {
        // First close on or after the ex-date is the reinvestment price.
        let reinvest_price = window_prices
            .iter()
            .find(|(date, _)| date >= ex_date)
            .map(|(_, close)| *close);

        match reinvest_price {
            Some(price) => {
                let cash = shares * amount * keep;
                shares += cash / price;
                total_dividends += cash;
                reinvested += 1;
            }
            None => {
                // No close on or after the ex-date in the available data, so
                // there is nothing to reinvest at. Counted so callers can see
                // the calculation ran on an incomplete price history.
                skipped += 1;
            }
        }
    }

    let growth_percent = ((shares * end_price) - start_price) / start_price * 100.0;

    Some(DripOutcome {
        start_date,
        end_date: as_of,
        start_price,
        end_price,
        end_shares: shares,
        total_dividends,
        growth_percent,
        dividends_reinvested: reinvested,
        dividends_skipped: skipped,
    })
}

fn cache_ttl_hours() -> i64 {
    std::env::var("DRIP_CACHE_TTL_HOURS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(12)
}

fn default_options() -> DripOptions {
    DripOptions {
        tax_rate: std::env::var("DRIP_TAX_RATE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok()),
    }
}

/// Serve the cached snapshot when fresh, otherwise recompute from stored
/// history and cache the result. `force` skips the cache read.
pub async fn get_or_compute(
    pool: &PgPool,
    ticker: &str,
    window: DripWindow,
    force: bool,
) -> Result<DripSnapshot, AppError> {
    if !force {
        if let Some(snapshot) =
            db::drip_cache_queries::fetch_fresh(pool, ticker, window.days() as i32).await?
        {
            return Ok(snapshot);
        }
    }

    let as_of = Utc::now().date_naive();
    compute_and_store(pool, ticker, window, as_of).await
}

pub async fn compute_and_store(
    pool: &PgPool,
    ticker: &str,
    window: DripWindow,
    as_of: NaiveDate,
) -> Result<DripSnapshot, AppError> {
    let start = as_of - ChronoDuration::days(window.days());

    let prices = db::price_queries::fetch_range(pool, ticker, start, as_of).await?;
    let dividends = db::dividend_queries::fetch_range(pool, ticker, start, as_of).await?;

    let outcome = simulate_reinvestment(&prices, &dividends, as_of, window, default_options())
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Insufficient price history for {} over {}",
                ticker, window
            ))
        })?;

    // A window without a single distribution has nothing to rank a dividend
    // ETF by; callers treat it the same as missing price history.
    if outcome.dividends_reinvested == 0 && outcome.dividends_skipped == 0 {
        return Err(AppError::NotFound(format!(
            "No dividends for {} over {}",
            ticker, window
        )));
    }

    if outcome.dividends_skipped > 0 {
        warn!(
            "DRIP for {} over {} skipped {} dividend(s) with no reinvestment price",
            ticker, window, outcome.dividends_skipped
        );
    }

    let now = Utc::now();
    let snapshot = DripSnapshot {
        id: Uuid::new_v4(),
        ticker: ticker.to_string(),
        window_days: window.days() as i32,
        as_of,
        start_date: outcome.start_date,
        end_date: outcome.end_date,
        start_price: outcome.start_price,
        end_price: outcome.end_price,
        end_shares: outcome.end_shares,
        total_dividends: outcome.total_dividends,
        growth_percent: outcome.growth_percent,
        dividends_reinvested: outcome.dividends_reinvested as i32,
        dividends_skipped: outcome.dividends_skipped as i32,
        computed_at: now,
        expires_at: now + ChronoDuration::hours(cache_ttl_hours()),
    };

    db::drip_cache_queries::upsert_snapshot(pool, &snapshot).await?;

    info!(
        "Computed DRIP for {} over {}: {:.2}% growth, {:.6} shares",
        ticker, window, snapshot.growth_percent, snapshot.end_shares
    );

    Ok(snapshot)
}

/// All four windows for a ticker; windows without enough data are skipped.
pub async fn compute_all_windows(
    pool: &PgPool,
    ticker: &str,
    force: bool,
) -> Result<Vec<DripSnapshot>, AppError> {
    let mut snapshots = Vec::new();

    for window in DripWindow::ALL {
        match get_or_compute(pool, ticker, window, force).await {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(AppError::NotFound(msg)) => {
                info!("Skipping {} window for {}: {}", window, ticker, msg);
            }
            Err(e) => return Err(e),
        }
    }

    if snapshots.is_empty() {
        return Err(AppError::NotFound(format!(
            "No window had enough data for {}",
            ticker
        )));
    }

    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn price(day: &str, close: f64) -> PricePoint {
        PricePoint {
            id: Uuid::new_v4(),
            ticker: "TEST".to_string(),
            date: date(day),
            close_price: close,
            created_at: Utc::now(),
        }
    }

    fn dividend(ex_day: &str, amount: f64) -> DividendEvent {
        DividendEvent {
            id: Uuid::new_v4(),
            ticker: "TEST".to_string(),
            ex_date: date(ex_day),
            amount_per_share: amount,
            currency: "USD".to_string(),
            created_at: Utc::now(),
        }
    }

    const AS_OF: &str = "2025-06-29";

    #[test]
    fn test_no_dividend_identity_matches_price_return() {
        let prices = vec![
            price("2025-06-02", 100.0),
            price("2025-06-16", 104.0),
            price("2025-06-27", 110.0),
        ];

        let outcome = simulate_reinvestment(
            &prices,
            &[],
            date(AS_OF),
            DripWindow::FourWeeks,
            DripOptions::default(),
        )
        .unwrap();

        assert_eq!(outcome.end_shares, 1.0);
        assert_eq!(outcome.total_dividends, 0.0);
        assert!((outcome.growth_percent - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_dividend_reproducibility() {
        // Hand-check: $2 on one share reinvested at $101 buys
        // 0.0198... shares; final value 1.019802 * 110 vs 100 in.
        let prices = vec![
            price("2025-06-02", 100.0),
            price("2025-06-10", 101.0),
            price("2025-06-27", 110.0),
        ];
        let dividends = vec![dividend("2025-06-09", 2.0)];

        let outcome = simulate_reinvestment(
            &prices,
            &dividends,
            date(AS_OF),
            DripWindow::FourWeeks,
            DripOptions::default(),
        )
        .unwrap();

        let expected_shares = 1.0 + 2.0 / 101.0;
        assert!((outcome.end_shares - expected_shares).abs() < 1e-9);
        assert!((outcome.growth_percent - 12.178_217_821_782_177).abs() < 1e-6);
        assert_eq!(outcome.dividends_reinvested, 1);
        assert_eq!(outcome.dividends_skipped, 0);
    }

    #[test]
    fn test_shares_never_shrink() {
        let prices = vec![
            price("2025-06-02", 50.0),
            price("2025-06-09", 48.0),
            price("2025-06-16", 52.0),
            price("2025-06-27", 45.0),
        ];
        let dividends = vec![
            dividend("2025-06-05", 0.5),
            dividend("2025-06-12", 0.5),
            dividend("2025-06-20", 0.5),
        ];

        let outcome = simulate_reinvestment(
            &prices,
            &dividends,
            date(AS_OF),
            DripWindow::FourWeeks,
            DripOptions::default(),
        )
        .unwrap();

        assert!(outcome.end_shares >= 1.0);
        assert_eq!(outcome.dividends_reinvested, 3);
    }

    #[test]
    fn test_fewer_than_two_prices_is_no_result() {
        let prices = vec![price("2025-06-15", 100.0)];
        let dividends = vec![dividend("2025-06-16", 1.0)];

        let outcome = simulate_reinvestment(
            &prices,
            &dividends,
            date(AS_OF),
            DripWindow::FourWeeks,
            DripOptions::default(),
        );

        assert!(outcome.is_none());
    }

    #[test]
    fn test_dividend_order_does_not_matter() {
        let prices = vec![
            price("2025-06-02", 100.0),
            price("2025-06-10", 101.0),
            price("2025-06-18", 103.0),
            price("2025-06-27", 110.0),
        ];
        let sorted = vec![dividend("2025-06-09", 2.0), dividend("2025-06-17", 1.5)];
        let shuffled = vec![dividend("2025-06-17", 1.5), dividend("2025-06-09", 2.0)];

        let a = simulate_reinvestment(
            &prices,
            &sorted,
            date(AS_OF),
            DripWindow::FourWeeks,
            DripOptions::default(),
        )
        .unwrap();
        let b = simulate_reinvestment(
            &prices,
            &shuffled,
            date(AS_OF),
            DripWindow::FourWeeks,
            DripOptions::default(),
        )
        .unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_identical_inputs_give_identical_output() {
        let prices = vec![
            price("2025-06-02", 100.0),
            price("2025-06-10", 101.0),
            price("2025-06-27", 110.0),
        ];
        let dividends = vec![dividend("2025-06-09", 2.0)];

        let a = simulate_reinvestment(
            &prices,
            &dividends,
            date(AS_OF),
            DripWindow::FourWeeks,
            DripOptions::default(),
        );
        let b = simulate_reinvestment(
            &prices,
            &dividends,
            date(AS_OF),
            DripWindow::FourWeeks,
            DripOptions::default(),
        );

        assert_eq!(a, b);
    }

    #[test]
    fn test_dividend_without_forward_price_is_counted_not_hidden() {
        let prices = vec![price("2025-06-02", 100.0), price("2025-06-10", 105.0)];
        // Ex-date after the last available close: nothing to reinvest at.
        let dividends = vec![dividend("2025-06-20", 2.0)];

        let outcome = simulate_reinvestment(
            &prices,
            &dividends,
            date(AS_OF),
            DripWindow::FourWeeks,
            DripOptions::default(),
        )
        .unwrap();

        assert_eq!(outcome.end_shares, 1.0);
        assert_eq!(outcome.dividends_reinvested, 0);
        assert_eq!(outcome.dividends_skipped, 1);
        assert!((outcome.growth_percent - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_bad_closes_and_amounts_are_dropped_per_item() {
        let prices = vec![
            price("2025-06-01", 0.0),    // would otherwise be the start price
            price("2025-06-02", 100.0),
            price("2025-06-10", -3.0),
            price("2025-06-15", f64::NAN),
            price("2025-06-27", 110.0),
        ];
        let dividends = vec![dividend("2025-06-09", -1.0), dividend("2025-06-09", 0.0)];

        let outcome = simulate_reinvestment(
            &prices,
            &dividends,
            date(AS_OF),
            DripWindow::FourWeeks,
            DripOptions::default(),
        )
        .unwrap();

        assert_eq!(outcome.start_price, 100.0);
        assert_eq!(outcome.end_price, 110.0);
        assert_eq!(outcome.end_shares, 1.0);
        assert_eq!(outcome.dividends_reinvested, 0);
        assert_eq!(outcome.dividends_skipped, 0);
    }

    #[test]
    fn test_dividend_on_as_of_is_outside_the_window() {
        let prices = vec![price("2025-06-02", 100.0), price("2025-06-27", 110.0)];
        let dividends = vec![dividend(AS_OF, 2.0)];

        let outcome = simulate_reinvestment(
            &prices,
            &dividends,
            date(AS_OF),
            DripWindow::FourWeeks,
            DripOptions::default(),
        )
        .unwrap();

        assert_eq!(outcome.end_shares, 1.0);
        assert_eq!(outcome.dividends_reinvested, 0);
    }

    #[test]
    fn test_withholding_shrinks_the_reinvested_cash() {
        let prices = vec![
            price("2025-06-02", 100.0),
            price("2025-06-10", 101.0),
            price("2025-06-27", 110.0),
        ];
        let dividends = vec![dividend("2025-06-09", 2.0)];

        let outcome = simulate_reinvestment(
            &prices,
            &dividends,
            date(AS_OF),
            DripWindow::FourWeeks,
            DripOptions { tax_rate: Some(0.15) },
        )
        .unwrap();

        let expected_shares = 1.0 + (2.0 * 0.85) / 101.0;
        assert!((outcome.end_shares - expected_shares).abs() < 1e-9);
        assert!((outcome.total_dividends - 1.7).abs() < 1e-9);
    }

    #[test]
    fn test_compounding_uses_accumulated_shares() {
        // Second distribution pays on the larger post-reinvestment position.
        let prices = vec![
            price("2025-06-02", 100.0),
            price("2025-06-10", 100.0),
            price("2025-06-18", 100.0),
            price("2025-06-27", 100.0),
        ];
        let dividends = vec![dividend("2025-06-09", 10.0), dividend("2025-06-17", 10.0)];

        let outcome = simulate_reinvestment(
            &prices,
            &dividends,
            date(AS_OF),
            DripWindow::FourWeeks,
            DripOptions::default(),
        )
        .unwrap();

        // 1.0 -> 1.1 -> 1.21 at a flat $100 close and $10 payouts.
        assert!((outcome.end_shares - 1.21).abs() < 1e-12);
        assert!((outcome.total_dividends - 21.0).abs() < 1e-12);
        assert!((outcome.growth_percent - 21.0).abs() < 1e-9);
    }
}
