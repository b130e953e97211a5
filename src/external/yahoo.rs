use crate::external::market_provider::{
    ExternalDividend, ExternalPricePoint, MarketDataError, MarketDataProvider,
};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use std::collections::HashMap;

pub struct YahooProvider {
    client: reqwest::Client,
}

impl YahooProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    // Yahoo takes named ranges, not day counts.
    fn range_for(days: u32) -> &'static str {
        if days <= 30 {
            "1mo"
        } else if days <= 95 {
            "3mo"
        } else if days <= 190 {
            "6mo"
        } else if days <= 366 {
            "1y"
        } else {
            "2y"
        }
    }

    async fn fetch_chart(
        &self,
        ticker: &str,
        days: u32,
        with_dividends: bool,
    ) -> Result<YahooResult, MarketDataError> {
        let range = Self::range_for(days);
        let mut url = format!(
            "https://query1.finance.yahoo.com/v8/finance/chart/{ticker}?range={range}&interval=1d"
        );
        if with_dividends {
            url.push_str("&events=div");
        }

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited);
        }

        let body = resp
            .json::<YahooChartResponse>()
            .await
            .map_err(|e| MarketDataError::Parse(e.to_string()))?;

        if let Some(err) = body.chart.error {
            return Err(MarketDataError::BadResponse(err.to_string()));
        }

        body.chart
            .result
            .and_then(|mut r| r.pop())
            .ok_or_else(|| MarketDataError::BadResponse("missing result".into()))
    }
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Option<YahooIndicators>,
    events: Option<YahooEvents>,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct YahooEvents {
    dividends: Option<HashMap<String, YahooDividend>>,
}

#[derive(Debug, Deserialize)]
struct YahooDividend {
    amount: f64,
    date: i64,
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalPricePoint>, MarketDataError> {
        let result = self.fetch_chart(ticker, days, false).await?;

        // timestamp aligns with the close list by index
        let closes = result
            .indicators
            .ok_or_else(|| MarketDataError::BadResponse("missing indicators".into()))?
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| MarketDataError::BadResponse("missing quote".into()))?
            .close;

        let mut out = Vec::new();

        for (i, ts) in result.timestamp.iter().enumerate() {
            // skip missing closes
            let Some(close) = closes.get(i).and_then(|v| *v) else {
                continue;
            };

            let dt = DateTime::from_timestamp(*ts, 0)
                .ok_or_else(|| MarketDataError::Parse("bad timestamp".into()))?;

            out.push(ExternalPricePoint {
                date: dt.date_naive(),
                close,
            });
        }

        out.sort_by_key(|p| p.date);

        Ok(out)
    }

    async fn fetch_dividend_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalDividend>, MarketDataError> {
        let result = self.fetch_chart(ticker, days, true).await?;

        let dividends = result
            .events
            .and_then(|ev| ev.dividends)
            .unwrap_or_default();

        let mut out = Vec::new();

        for div in dividends.into_values() {
            if !div.amount.is_finite() || div.amount <= 0.0 {
                continue;
            }

            let dt = DateTime::from_timestamp(div.date, 0)
                .ok_or_else(|| MarketDataError::Parse("bad dividend timestamp".into()))?;

            out.push(ExternalDividend {
                ex_date: dt.date_naive(),
                amount: div.amount,
                currency: None,
            });
        }

        out.sort_by_key(|d| d.ex_date);

        Ok(out)
    }
}
