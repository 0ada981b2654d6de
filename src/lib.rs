//! Macropulse - economic time-series ETL and analysis engine
//!
//! Ingests FRED-style indicator data through an external analytics
//! capability, tracks ETL job lifecycle, and serves history and analysis
//! results over HTTP.

pub mod bridge;
pub mod config;
pub mod core;
pub mod error;
pub mod ingest;
pub mod jobs;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod store;
