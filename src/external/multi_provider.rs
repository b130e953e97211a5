use crate::external::market_provider::{
    ExternalDividend, ExternalPricePoint, MarketDataError, MarketDataProvider,
};
use async_trait::async_trait;
use tracing::{info, warn};

/// Tries each configured provider in order until one answers.
///
/// Strategy:
/// 1. Primary (Yahoo Finance: free, no key, covers most ETFs)
/// 2. Fallback (Polygon) when the primary errors or is throttled
/// 3. Last resort (EODHD)
pub struct MultiProvider {
    primary: Box<dyn MarketDataProvider>,
    fallback: Box<dyn MarketDataProvider>,
    last_resort: Box<dyn MarketDataProvider>,
}

impl MultiProvider {
    pub fn new(
        primary: Box<dyn MarketDataProvider>,
        fallback: Box<dyn MarketDataProvider>,
        last_resort: Box<dyn MarketDataProvider>,
    ) -> Self {
        Self {
            primary,
            fallback,
            last_resort,
        }
    }
}

#[async_trait]
impl MarketDataProvider for MultiProvider {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalPricePoint>, MarketDataError> {
        match self.primary.fetch_daily_history(ticker, days).await {
            Ok(data) => {
                info!("✓ Fetched prices for {} from primary provider", ticker);
                return Ok(data);
            }
            Err(MarketDataError::RateLimited) => {
                info!("⚠️ Primary provider rate limited for {}, trying fallback", ticker);
            }
            Err(e) => {
                warn!("Primary provider error for {}: {}", ticker, e);
            }
        }

        match self.fallback.fetch_daily_history(ticker, days).await {
            Ok(data) => {
                info!("✓ Fetched prices for {} from fallback provider", ticker);
                return Ok(data);
            }
            Err(e) => {
                warn!("Fallback provider failed for {}: {}", ticker, e);
            }
        }

        match self.last_resort.fetch_daily_history(ticker, days).await {
            Ok(data) => {
                info!("✓ Fetched prices for {} from last-resort provider", ticker);
                return Ok(data);
            }
            Err(e) => {
                warn!("Last-resort provider failed for {}: {}", ticker, e);
            }
        }

        Err(MarketDataError::BadResponse(format!(
            "Failed to fetch prices for {} from all providers. \
             The ticker may not exist, or all providers are rate limited.",
            ticker
        )))
    }

    async fn fetch_dividend_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalDividend>, MarketDataError> {
        match self.primary.fetch_dividend_history(ticker, days).await {
            Ok(events) if !events.is_empty() => {
                info!("✓ Fetched dividends for {} from primary provider", ticker);
                return Ok(events);
            }
            Ok(_) => {
                // An empty list is ambiguous between "pays nothing" and
                // "provider has no event data"; let the next provider confirm.
                info!("Primary provider returned no dividends for {}, trying fallback", ticker);
            }
            Err(MarketDataError::RateLimited) => {
                info!("⚠️ Primary provider rate limited for {}, trying fallback", ticker);
            }
            Err(e) => {
                warn!("Primary provider error for {}: {}", ticker, e);
            }
        }

        match self.fallback.fetch_dividend_history(ticker, days).await {
            Ok(events) if !events.is_empty() => {
                info!("✓ Fetched dividends for {} from fallback provider", ticker);
                return Ok(events);
            }
            Ok(_) => {
                info!("Fallback provider returned no dividends for {}, trying last resort", ticker);
            }
            Err(e) => {
                warn!("Fallback provider failed for {}: {}", ticker, e);
            }
        }

        self.last_resort.fetch_dividend_history(ticker, days).await
    }
}
