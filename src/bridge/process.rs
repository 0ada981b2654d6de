//! Subprocess-backed implementation of [`AnalyticsBridge`]

use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{AnalyticsBridge, BridgeError, Capability};
use crate::config;

/// How much raw stdout to carry in a parse failure message.
const PARSE_SAMPLE_LEN: usize = 200;

/// Runs analytics scripts as `<interpreter> <script> <argv...>`, capturing
/// both output streams fully and parsing stdout as a single JSON document.
pub struct ProcessBridge {
    interpreter: String,
    scripts_dir: PathBuf,
    timeout: Option<Duration>,
}

impl ProcessBridge {
    pub fn new(interpreter: String, scripts_dir: PathBuf, timeout: Option<Duration>) -> Self {
        Self {
            interpreter,
            scripts_dir,
            timeout,
        }
    }

    /// Bridge configured from the environment.
    pub fn from_env() -> Self {
        Self::new(
            config::get_interpreter(),
            config::get_scripts_dir(),
            config::get_process_timeout(),
        )
    }

    fn resolve(&self, capability: Capability) -> Result<PathBuf, BridgeError> {
        let path = self.scripts_dir.join(capability.script_name());
        if !path.is_file() {
            return Err(BridgeError::CapabilityNotFound(
                capability.script_name(),
                path.display().to_string(),
            ));
        }
        Ok(path)
    }
}

#[async_trait]
impl AnalyticsBridge for ProcessBridge {
    async fn invoke(
        &self,
        capability: Capability,
        argv: &[String],
    ) -> Result<Value, BridgeError> {
        let script = capability.script_name();
        let script_path = self.resolve(capability)?;

        debug!(
            script = script,
            argv = ?argv,
            "Bridge: invoking {} {} {}",
            self.interpreter,
            script_path.display(),
            argv.join(" ")
        );

        let mut command = Command::new(&self.interpreter);
        command.arg(&script_path).args(argv).kill_on_drop(true);

        let output = match self.timeout {
            Some(deadline) => tokio::time::timeout(deadline, command.output())
                .await
                .map_err(|_| BridgeError::Timeout {
                    script,
                    seconds: deadline.as_secs(),
                })?,
            None => command.output().await,
        }
        .map_err(|source| BridgeError::Spawn { script, source })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(
                script = script,
                code = code,
                "Bridge: {} exited with code {}",
                script,
                code
            );
            return Err(BridgeError::Execution {
                script,
                code,
                stderr,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let trimmed = stdout.trim();
        if trimmed.is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        serde_json::from_str(trimmed).map_err(|e| BridgeError::Parse {
            script,
            reason: e.to_string(),
            sample: truncate(trimmed, PARSE_SAMPLE_LEN),
        })
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
