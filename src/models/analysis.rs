use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// One named external analytics operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Correlation,
    Forecast,
    MovingAverages,
    Volatility,
}

impl AnalysisKind {
    /// Verb passed to the analytics process for this kind.
    pub fn verb(&self) -> &'static str {
        match self {
            AnalysisKind::Correlation => "correlation",
            AnalysisKind::Forecast => "forecast",
            AnalysisKind::MovingAverages => "moving_averages",
            AnalysisKind::Volatility => "volatility",
        }
    }

    /// Whether this kind's output carries the self-reported `error` field
    /// convention. Correlation output is always treated as success.
    pub fn reports_inline_error(&self) -> bool {
        !matches!(self, AnalysisKind::Correlation)
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.verb())
    }
}

impl FromStr for AnalysisKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "correlation" => Ok(AnalysisKind::Correlation),
            "forecast" => Ok(AnalysisKind::Forecast),
            "moving_averages" | "moving-averages" => Ok(AnalysisKind::MovingAverages),
            "volatility" => Ok(AnalysisKind::Volatility),
            _ => Err(()),
        }
    }
}

/// A persisted snapshot of one analytics invocation's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: AnalysisKind,
    pub indicators: Vec<String>,
    pub parameters: Value,
    pub results: Value,
    pub created_at: DateTime<Utc>,
}

/// Id-less insert shape for [`AnalysisResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnalysisResult {
    #[serde(rename = "type")]
    pub kind: AnalysisKind,
    pub indicators: Vec<String>,
    pub parameters: Value,
    pub results: Value,
    pub created_at: DateTime<Utc>,
}
