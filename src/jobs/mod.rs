//! Background jobs run by the scheduler, replacing the original system's
//! rate-limited polling loops with a single nightly pipeline:
//!
//! - `market_data_refresh_job` - pulls prices and dividends for every active
//!   ETF through the provider chain
//! - `drip_cache_refresh_job` - recomputes all four reinvestment windows per
//!   active ETF into the snapshot cache
//! - `cache_cleanup_job` - drops expired snapshots and fetch-failure rows
//!
//! Jobs are idempotent, tolerate per-ticker failures, and report processed /
//! failed counts to the `job_runs` tracking table.

pub mod cache_cleanup_job;
pub mod drip_cache_refresh_job;
pub mod market_data_refresh_job;
