//! Environment-based configuration accessors

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Current deployment environment (`ENVIRONMENT`, defaults to "sandbox")
pub fn get_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "sandbox".to_string())
}

/// HTTP listen port (`PORT`, defaults to 8080)
pub fn get_port() -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080)
}

/// Directory holding the analytics scripts (`ANALYTICS_SCRIPTS_DIR`,
/// defaults to `./analytics`)
pub fn get_scripts_dir() -> PathBuf {
    env::var("ANALYTICS_SCRIPTS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./analytics"))
}

/// Interpreter used to run the analytics scripts
/// (`ANALYTICS_INTERPRETER`, defaults to `python3`)
pub fn get_interpreter() -> String {
    env::var("ANALYTICS_INTERPRETER").unwrap_or_else(|_| "python3".to_string())
}

/// Deadline for a single analytics process invocation
/// (`ANALYTICS_TIMEOUT_SECONDS`, defaults to 300; 0 disables the deadline)
pub fn get_process_timeout() -> Option<Duration> {
    let secs: u64 = env::var("ANALYTICS_TIMEOUT_SECONDS")
        .ok()
        .and_then(|t| t.parse().ok())
        .unwrap_or(300);

    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}
