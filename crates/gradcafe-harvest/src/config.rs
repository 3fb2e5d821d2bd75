//! Environment-driven configuration.

use crate::cartography::DEFAULT_BASE_URL;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

const DEFAULT_DELAY_SECS: f64 = 0.5;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_INFERENCE_TIMEOUT_SECS: u64 = 60;

fn default_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".gradcafe")
}

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub home: PathBuf,
    pub db_path: PathBuf,
    pub base_url: String,
    pub user_agent: String,
    pub delay: Duration,
    pub http_timeout: Duration,
    /// Inference is disabled when unset.
    pub ollama_url: Option<String>,
    pub ollama_model: Option<String>,
    pub inference_timeout: Duration,
    pub tables_dir: Option<PathBuf>,
}

impl HarvestConfig {
    /// Read `GRADCAFE_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let home = get("GRADCAFE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(default_home);
        let db_path = get("GRADCAFE_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join("applicants.db"));

        Self {
            db_path,
            base_url: get("GRADCAFE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            user_agent: get("GRADCAFE_USER_AGENT").unwrap_or_else(default_user_agent),
            delay: Duration::from_secs_f64(parse_or(
                "GRADCAFE_DELAY_SECS",
                get("GRADCAFE_DELAY_SECS"),
                DEFAULT_DELAY_SECS,
                |secs: &f64| secs.is_finite() && *secs >= 0.0,
            )),
            http_timeout: Duration::from_secs(parse_or(
                "GRADCAFE_HTTP_TIMEOUT_SECS",
                get("GRADCAFE_HTTP_TIMEOUT_SECS"),
                DEFAULT_HTTP_TIMEOUT_SECS,
                |_: &u64| true,
            )),
            ollama_url: get("GRADCAFE_OLLAMA_URL"),
            ollama_model: get("GRADCAFE_OLLAMA_MODEL"),
            inference_timeout: Duration::from_secs(parse_or(
                "GRADCAFE_INFERENCE_TIMEOUT_SECS",
                get("GRADCAFE_INFERENCE_TIMEOUT_SECS"),
                DEFAULT_INFERENCE_TIMEOUT_SECS,
                |_: &u64| true,
            )),
            tables_dir: get("GRADCAFE_TABLES_DIR").map(PathBuf::from),
            home,
        }
    }

    pub fn run_log_path(&self) -> PathBuf {
        self.home.join("runs.jsonl")
    }

    /// Busy flag held while a pull runs.
    pub fn lock_path(&self) -> PathBuf {
        self.home.join("pull.lock")
    }
}

fn default_user_agent() -> String {
    format!("gradcafe-harvest/{}", env!("CARGO_PKG_VERSION"))
}

fn parse_or<T: std::str::FromStr>(
    key: &str,
    value: Option<String>,
    default: T,
    valid: impl Fn(&T) -> bool,
) -> T {
    let Some(raw) = value else {
        return default;
    };
    match raw.parse::<T>() {
        Ok(v) if valid(&v) => v,
        _ => {
            warn!("ignoring invalid {key}={raw:?}");
            default
        }
    }
}
