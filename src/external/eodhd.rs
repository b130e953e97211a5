use crate::external::market_provider::{
    ExternalDividend, ExternalPricePoint, MarketDataError, MarketDataProvider,
};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;

pub struct EodhdProvider {
    client: reqwest::Client,
    api_token: String,
}

impl EodhdProvider {
    pub fn from_env() -> Result<Self, MarketDataError> {
        let api_token = std::env::var("EODHD_API_TOKEN")
            .map_err(|_| MarketDataError::BadResponse("EODHD_API_TOKEN not set".into()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_token,
        })
    }
}

#[derive(Debug, Deserialize)]
struct EodhdBar {
    date: String,
    adjusted_close: Option<f64>,
    close: f64,
}

#[derive(Debug, Deserialize)]
struct EodhdDividend {
    date: String,
    value: f64,
    currency: Option<String>,
}

#[async_trait]
impl MarketDataProvider for EodhdProvider {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalPricePoint>, MarketDataError> {
        let from = Utc::now().date_naive() - Duration::days(days as i64);
        let url = format!("https://eodhd.com/api/eod/{ticker}");

        let resp = self
            .client
            .get(url)
            .query(&[
                ("api_token", self.api_token.as_str()),
                ("fmt", "json"),
                ("period", "d"),
                ("from", &from.to_string()),
            ])
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited);
        }
        if !resp.status().is_success() {
            return Err(MarketDataError::BadResponse(format!(
                "HTTP {}",
                resp.status()
            )));
        }

        let bars = resp
            .json::<Vec<EodhdBar>>()
            .await
            .map_err(|e| MarketDataError::Parse(e.to_string()))?;

        let mut out = Vec::new();

        for bar in bars {
            let date = NaiveDate::parse_from_str(&bar.date, "%Y-%m-%d")
                .map_err(|e| MarketDataError::Parse(e.to_string()))?;

            // adjusted close when present, raw close otherwise
            let close = bar.adjusted_close.unwrap_or(bar.close);

            out.push(ExternalPricePoint { date, close });
        }

        out.sort_by_key(|p| p.date);

        Ok(out)
    }

    async fn fetch_dividend_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalDividend>, MarketDataError> {
        let from = Utc::now().date_naive() - Duration::days(days as i64);
        let url = format!("https://eodhd.com/api/div/{ticker}");

        let resp = self
            .client
            .get(url)
            .query(&[
                ("api_token", self.api_token.as_str()),
                ("fmt", "json"),
                ("from", &from.to_string()),
            ])
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited);
        }
        if !resp.status().is_success() {
            return Err(MarketDataError::BadResponse(format!(
                "HTTP {}",
                resp.status()
            )));
        }

        let rows = resp
            .json::<Vec<EodhdDividend>>()
            .await
            .map_err(|e| MarketDataError::Parse(e.to_string()))?;

        let mut out = Vec::new();

        for row in rows {
            let ex_date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
                .map_err(|e| MarketDataError::Parse(e.to_string()))?;

            out.push(ExternalDividend {
                ex_date,
                amount: row.value,
                currency: row.currency,
            });
        }

        out.sort_by_key(|d| d.ex_date);

        Ok(out)
    }
}
