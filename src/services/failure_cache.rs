use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// Information about a failed provider call for a ticker
#[derive(Debug, Clone)]
pub struct FailureInfo {
    pub failed_at: DateTime<Utc>,
    pub failure_type: FailureType,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailureType {
    NotFound,    // Ticker doesn't exist or not available in provider
    RateLimited, // Temporary rate limit
    ApiError,    // Other API errors
}

impl FailureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureType::NotFound => "not_found",
            FailureType::RateLimited => "rate_limited",
            FailureType::ApiError => "api_error",
        }
    }

    /// How long to hold off before retrying this class of failure.
    pub fn ttl_hours(&self) -> i64 {
        match self {
            FailureType::NotFound => 24,
            FailureType::RateLimited => 1,
            FailureType::ApiError => 6,
        }
    }
}

/// Thread-safe negative cache over failed ticker fetches, so known-bad
/// tickers don't burn provider quota on every request.
#[derive(Clone)]
pub struct FailureCache {
    cache: Arc<DashMap<String, FailureInfo>>,
}

impl FailureCache {
    pub fn new() -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
        }
    }

    /// Unexpired failure entry for the ticker, if any.
    pub fn is_failed(&self, ticker: &str) -> Option<FailureInfo> {
        if let Some(entry) = self.cache.get(ticker) {
            let info = entry.value().clone();
            let expiry = info.failed_at + Duration::hours(info.failure_type.ttl_hours());

            if Utc::now() < expiry {
                return Some(info);
            }
            drop(entry); // release the read lock before mutating
            self.cache.remove(ticker);
        }
        None
    }

    pub fn record_failure(&self, ticker: &str, failure_type: FailureType) {
        self.cache.insert(
            ticker.to_string(),
            FailureInfo {
                failed_at: Utc::now(),
                failure_type,
            },
        );
    }

    /// Drop a ticker from the cache, e.g. after a successful fetch.
    pub fn clear(&self, ticker: &str) {
        self.cache.remove(ticker);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_records_and_retrieves_failures() {
        let cache = FailureCache::new();

        cache.record_failure("INVALID", FailureType::NotFound);

        let result = cache.is_failed("INVALID");
        assert!(result.is_some());
        assert_eq!(result.unwrap().failure_type, FailureType::NotFound);
    }

    #[test]
    fn test_cache_clears_ticker() {
        let cache = FailureCache::new();

        cache.record_failure("TEST", FailureType::NotFound);
        assert!(cache.is_failed("TEST").is_some());

        cache.clear("TEST");
        assert!(cache.is_failed("TEST").is_none());
    }

    #[test]
    fn test_ttls_scale_with_failure_type() {
        assert_eq!(FailureType::NotFound.ttl_hours(), 24);
        assert_eq!(FailureType::RateLimited.ttl_hours(), 1);
        assert_eq!(FailureType::ApiError.ttl_hours(), 6);
    }
}
