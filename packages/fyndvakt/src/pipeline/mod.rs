//! The scoring pipeline: repair parsing, per-listing analysis, batch
//! orchestration, throttled notifications, and the monitoring cycle.

pub mod analyze;
pub mod batch;
pub mod monitor;
pub mod notify;
pub mod prompts;
pub mod repair;

pub use analyze::Analyzer;
pub use batch::{analyze_all, analyze_chunk, ChunkConfig, DriveConfig};
pub use monitor::{Monitor, MonitorStatus};
pub use notify::{format_alert, run_throttled, NotifyOutcome, ThrottleConfig};
pub use prompts::build_scoring_prompt;
pub use repair::parse_analysis;
