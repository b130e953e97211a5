use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::Deserialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::path::Path;

use crate::db;
use crate::external::market_provider::{ExternalDividend, ExternalPricePoint};

#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(rename = "Ticker")]
    ticker: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Close")]
    close: String,
}

#[derive(Debug, Deserialize)]
struct DividendRow {
    #[serde(rename = "Ticker")]
    ticker: String,
    #[serde(rename = "Ex Date")]
    ex_date: String,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Currency")]
    #[serde(default)]
    currency: String,
}

#[derive(Debug)]
pub struct ImportResult {
    pub rows_imported: usize,
    pub tickers_touched: usize,
    pub errors: Vec<String>,
}

fn parse_money_string(s: &str) -> Result<f64> {
    let cleaned = s
        .replace('$', "")
        .replace(',', "")
        .replace('%', "")
        .trim()
        .to_string();

    if cleaned.is_empty() || cleaned == "-" {
        anyhow::bail!("Empty value");
    }

    cleaned
        .parse::<f64>()
        .with_context(|| format!("Failed to parse money string: {}", s))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Failed to parse date: {}", s))
}

pub async fn import_prices_file(pool: &PgPool, file_path: &Path) -> Result<ImportResult> {
    let file_content = std::fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read file: {:?}", file_path))?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(file_content.as_bytes());

    let mut by_ticker: HashMap<String, Vec<ExternalPricePoint>> = HashMap::new();
    let mut rows_imported = 0;
    let mut errors = Vec::new();

    for (line_num, result) in reader.deserialize::<PriceRow>().enumerate() {
        match result {
            Ok(row) => match parse_price_row(&row) {
                Ok((ticker, point)) => {
                    by_ticker.entry(ticker).or_default().push(point);
                    rows_imported += 1;
                }
                Err(e) => errors.push(format!("Line {}: {}", line_num + 2, e)),
            },
            Err(e) => {
                errors.push(format!("Line {}: Failed to parse CSV row: {}", line_num + 2, e));
            }
        }
    }

    let tickers_touched = by_ticker.len();

    for (ticker, points) in &by_ticker {
        db::price_queries::upsert_external_points(pool, ticker, points)
            .await
            .with_context(|| format!("Failed to upsert prices for {}", ticker))?;
    }

    Ok(ImportResult {
        rows_imported,
        tickers_touched,
        errors,
    })
}

fn parse_price_row(row: &PriceRow) -> Result<(String, ExternalPricePoint)> {
    let ticker = row.ticker.trim().to_uppercase();
    if ticker.is_empty() {
        anyhow::bail!("Missing ticker");
    }

    let date = parse_date(&row.date)?;
    let close = parse_money_string(&row.close)?;
    if close <= 0.0 {
        anyhow::bail!("Close price must be positive, got {}", close);
    }

    Ok((ticker, ExternalPricePoint { date, close }))
}

pub async fn import_dividends_file(pool: &PgPool, file_path: &Path) -> Result<ImportResult> {
    let file_content = std::fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read file: {:?}", file_path))?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(file_content.as_bytes());

    let mut by_ticker: HashMap<String, Vec<ExternalDividend>> = HashMap::new();
    let mut rows_imported = 0;
    let mut errors = Vec::new();

    for (line_num, result) in reader.deserialize::<DividendRow>().enumerate() {
        match result {
            Ok(row) => match parse_dividend_row(&row) {
                Ok((ticker, event)) => {
                    by_ticker.entry(ticker).or_default().push(event);
                    rows_imported += 1;
                }
                Err(e) => errors.push(format!("Line {}: {}", line_num + 2, e)),
            },
            Err(e) => {
                errors.push(format!("Line {}: Failed to parse CSV row: {}", line_num + 2, e));
            }
        }
    }

    let tickers_touched = by_ticker.len();

    for (ticker, events) in &by_ticker {
        db::dividend_queries::upsert_external_events(pool, ticker, events)
            .await
            .with_context(|| format!("Failed to upsert dividends for {}", ticker))?;
    }

    Ok(ImportResult {
        rows_imported,
        tickers_touched,
        errors,
    })
}

fn parse_dividend_row(row: &DividendRow) -> Result<(String, ExternalDividend)> {
    let ticker = row.ticker.trim().to_uppercase();
    if ticker.is_empty() {
        anyhow::bail!("Missing ticker");
    }

    let ex_date = parse_date(&row.ex_date)?;
    let amount = parse_money_string(&row.amount)?;
    if amount <= 0.0 {
        anyhow::bail!("Dividend amount must be positive, got {}", amount);
    }

    let currency = if row.currency.trim().is_empty() {
        None
    } else {
        Some(row.currency.trim().to_uppercase())
    };

    Ok((
        ticker,
        ExternalDividend {
            ex_date,
            amount,
            currency,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_money_string_strips_symbols() {
        assert_eq!(parse_money_string("$1,234.56").unwrap(), 1234.56);
        assert_eq!(parse_money_string(" 0.25 ").unwrap(), 0.25);
        assert!(parse_money_string("-").is_err());
        assert!(parse_money_string("abc").is_err());
    }

    #[test]
    fn test_parse_price_row_rejects_bad_close() {
        let row = PriceRow {
            ticker: "jepi".to_string(),
            date: "2025-03-14".to_string(),
            close: "0".to_string(),
        };
        assert!(parse_price_row(&row).is_err());

        let row = PriceRow {
            ticker: "jepi".to_string(),
            date: "2025-03-14".to_string(),
            close: "$55.10".to_string(),
        };
        let (ticker, point) = parse_price_row(&row).unwrap();
        assert_eq!(ticker, "JEPI");
        assert_eq!(point.close, 55.10);
    }

    #[test]
    fn test_parse_dividend_row_normalizes_currency() {
        let row = DividendRow {
            ticker: "schd".to_string(),
            ex_date: "2025-03-26".to_string(),
            amount: "0.2645".to_string(),
            currency: "usd".to_string(),
        };
        let (ticker, event) = parse_dividend_row(&row).unwrap();
        assert_eq!(ticker, "SCHD");
        assert_eq!(event.currency.as_deref(), Some("USD"));
    }
}
