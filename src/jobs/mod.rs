//! ETL job orchestration

pub mod context;
pub mod orchestrator;
pub mod types;

pub use context::JobContext;
pub use orchestrator::JobOrchestrator;
pub use types::{JobCounts, PipelineState, PipelineStatus, RunEtlRequest, ScheduleEtlRequest};
