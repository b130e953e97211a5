pub mod csv_import_service;
pub mod dividend_service;
pub mod drip_service;
pub mod etf_service;
pub mod failure_cache;
pub mod job_scheduler_service;
pub mod price_service;
pub mod ranking_service;
pub mod rate_limiter;
