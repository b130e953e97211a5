mod dividend;
mod drip;
mod etf;
mod fetch_failure;
mod job_run;
mod price_point;

pub use dividend::DividendEvent;
pub use drip::{DripOptions, DripOutcome, DripSnapshot, DripWindow, RankingEntry};
pub use etf::{CreateEtf, Etf, UpdateEtf};
pub use fetch_failure::FetchFailure;
pub use job_run::JobRun;
pub use price_point::PricePoint;
