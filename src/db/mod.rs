pub mod dividend_queries;
pub mod drip_cache_queries;
pub mod etf_queries;
pub mod fetch_failure_queries;
pub mod job_run_queries;
pub mod price_queries;
