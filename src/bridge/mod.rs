//! Analytics process bridge
//!
//! Translates a logical analytics request into an external process
//! invocation and back into structured data, isolating the orchestrator
//! from process mechanics.

pub mod process;

pub use process::ProcessBridge;

use async_trait::async_trait;
use thiserror::Error;

/// One named external analytics operation, resolved to its executable
/// script by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Series extract/transform pipeline
    SeriesFetch,
    /// Statistical analysis (correlation, forecast, moving averages, volatility)
    Analysis,
    /// Raw provider series/search access
    SeriesApi,
}

impl Capability {
    pub fn script_name(&self) -> &'static str {
        match self {
            Capability::SeriesFetch => "etl_pipeline.py",
            Capability::Analysis => "analysis.py",
            Capability::SeriesApi => "fred_api.py",
        }
    }
}

/// Failures of a single bridge invocation.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("analytics capability '{0}' not found at {1}")]
    CapabilityNotFound(&'static str, String),

    #[error("analytics process '{script}' exited with code {code}: {stderr}")]
    Execution {
        script: &'static str,
        code: i32,
        stderr: String,
    },

    #[error("failed to parse output from '{script}': {reason} (output: {sample})")]
    Parse {
        script: &'static str,
        reason: String,
        sample: String,
    },

    #[error("analytics process '{script}' timed out after {seconds}s")]
    Timeout { script: &'static str, seconds: u64 },

    #[error("failed to run analytics process '{script}': {source}")]
    Spawn {
        script: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Invokes an external analytics capability and returns its parsed JSON
/// output. At-most-once; retries are the caller's concern.
#[async_trait]
pub trait AnalyticsBridge {
    async fn invoke(
        &self,
        capability: Capability,
        argv: &[String],
    ) -> Result<serde_json::Value, BridgeError>;
}
