//! Pipeline entry points for ranking operations.
//!
//! - `run_collect`: Fetch items, detect books, write the ranking
//! - `run_postfilter`: Re-validate stored ISBNs and rewrite the ranking
//! - `run_health`: Summarize the stored ranking
//! - `run_show`: Print the stored ranking
//! - `run_validate`: Check configuration and stored document integrity

pub mod collect;
pub mod health;
pub mod postfilter;
pub mod show;
pub mod validate;

pub use collect::{CollectSummary, run_collect};
pub use health::run_health;
pub use postfilter::{PostfilterReport, postfilter, run_postfilter};
pub use show::run_show;
pub use validate::run_validate;
