use crate::external::market_provider::{
    ExternalDividend, ExternalPricePoint, MarketDataError, MarketDataProvider,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Deserialize;

pub struct PolygonProvider {
    client: reqwest::Client,
    api_key: String,
}

impl PolygonProvider {
    pub fn from_env() -> Result<Self, MarketDataError> {
        let api_key = std::env::var("POLYGON_API_KEY")
            .map_err(|_| MarketDataError::BadResponse("POLYGON_API_KEY not set".into()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PolygonAggsResponse {
    status: Option<String>,
    error: Option<String>,
    results: Option<Vec<PolygonBar>>,
}

#[derive(Debug, Deserialize)]
struct PolygonBar {
    // millisecond timestamp of the bar
    t: i64,
    // close
    c: f64,
}

#[derive(Debug, Deserialize)]
struct PolygonDividendsResponse {
    status: Option<String>,
    error: Option<String>,
    results: Option<Vec<PolygonDividend>>,
}

#[derive(Debug, Deserialize)]
struct PolygonDividend {
    ex_dividend_date: String,
    cash_amount: f64,
    currency: Option<String>,
}

#[async_trait]
impl MarketDataProvider for PolygonProvider {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalPricePoint>, MarketDataError> {
        let to = Utc::now().date_naive();
        let from = to - Duration::days(days as i64);

        let url = format!(
            "https://api.polygon.io/v2/aggs/ticker/{ticker}/range/1/day/{from}/{to}?adjusted=true&sort=asc&limit=50000"
        );

        let resp = self
            .client
            .get(url)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited);
        }

        let body = resp
            .json::<PolygonAggsResponse>()
            .await
            .map_err(|e| MarketDataError::Parse(e.to_string()))?;

        if let Some(msg) = body.error {
            return Err(MarketDataError::BadResponse(msg));
        }
        if matches!(body.status.as_deref(), Some("ERROR") | Some("NOT_AUTHORIZED")) {
            return Err(MarketDataError::BadResponse(format!(
                "API returned status: {}",
                body.status.unwrap_or_default()
            )));
        }

        let mut out: Vec<ExternalPricePoint> = body
            .results
            .unwrap_or_default()
            .into_iter()
            .filter_map(|bar| {
                let dt = DateTime::from_timestamp_millis(bar.t)?;
                Some(ExternalPricePoint {
                    date: dt.date_naive(),
                    close: bar.c,
                })
            })
            .collect();

        out.sort_by_key(|p| p.date);

        Ok(out)
    }

    async fn fetch_dividend_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalDividend>, MarketDataError> {
        let cutoff = Utc::now().date_naive() - Duration::days(days as i64);

        let url = "https://api.polygon.io/v3/reference/dividends";

        let resp = self
            .client
            .get(url)
            .query(&[
                ("ticker", ticker),
                ("limit", "1000"),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited);
        }

        let body = resp
            .json::<PolygonDividendsResponse>()
            .await
            .map_err(|e| MarketDataError::Parse(e.to_string()))?;

        if let Some(msg) = body.error {
            return Err(MarketDataError::BadResponse(msg));
        }
        if matches!(body.status.as_deref(), Some("ERROR")) {
            return Err(MarketDataError::BadResponse("API returned status: ERROR".into()));
        }

        let mut out = Vec::new();

        for div in body.results.unwrap_or_default() {
            let ex_date = NaiveDate::parse_from_str(&div.ex_dividend_date, "%Y-%m-%d")
                .map_err(|e| MarketDataError::Parse(e.to_string()))?;

            if ex_date < cutoff {
                continue;
            }

            out.push(ExternalDividend {
                ex_date,
                amount: div.cash_amount,
                currency: div.currency,
            });
        }

        out.sort_by_key(|d| d.ex_date);

        Ok(out)
    }
}
