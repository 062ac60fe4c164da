use crate::error::{NewsdeskError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const NEWSDESK_DIR: &str = ".newsdesk";
const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash-001";
const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";
/// Slack on top of a news job's poll budget for its HTTP round trips.
const TOOL_CALL_HEADROOM_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub provider: String,
    /// Unset means the provider's own default model.
    pub model: Option<String>,
    pub api_key: String,
    pub base_url: Option<String>,
    pub max_retries: usize,
    /// Bound for handshake and `tools/list` requests.
    pub request_timeout_secs: u64,
    /// Bound for a single `tools/call`, which may wait on a whole news job.
    pub tool_call_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: None,
            api_key: String::new(),
            base_url: None,
            max_retries: 3,
            request_timeout_secs: 60,
            tool_call_timeout_secs: 120,
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn model(&self) -> &str {
        match self.model.as_deref() {
            Some(model) => model,
            None if self.provider.eq_ignore_ascii_case("openai") => OPENAI_DEFAULT_MODEL,
            None => GEMINI_DEFAULT_MODEL,
        }
    }

    pub fn require_api_key(&self) -> Result<&str> {
        if self.api_key.trim().is_empty() {
            let var = match self.provider.as_str() {
                "openai" => "OPENAI_API_KEY",
                _ => "GEMINI_API_KEY",
            };
            return Err(NewsdeskError::Configuration(format!(
                "{var} not found in environment variables"
            )));
        }
        Ok(&self.api_key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub base_url: String,
    pub api_key: String,
    pub max_polls: u32,
    pub poll_interval_secs: u64,
    pub default_max_results: u32,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://data.dev.masalabs.ai".to_string(),
            api_key: String::new(),
            max_polls: 30,
            poll_interval_secs: 2,
            default_max_results: 10,
        }
    }
}

impl NewsConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Worst-case sleep time of one job: a wait follows every non-done poll.
    pub fn poll_budget(&self) -> Duration {
        self.poll_interval().saturating_mul(self.max_polls)
    }

    pub fn require_api_key(&self) -> Result<&str> {
        if self.api_key.trim().is_empty() {
            return Err(NewsdeskError::Configuration(
                "MASA_DATA_API_KEY not found in environment variables".to_string(),
            ));
        }
        Ok(&self.api_key)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub client: ClientConfig,
    pub news: NewsConfig,
}

impl Config {
    /// Defaults, then `~/.newsdesk/config.toml`, then `.env` and the process
    /// environment.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = if config_exists() {
            load_config_from(&get_config_path())?
        } else {
            Config::default()
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Timeout for `tools/call`. Never shorter than the news poll budget plus
    /// headroom, so a job timeout on the server reaches the caller as such.
    pub fn tool_call_timeout(&self) -> Duration {
        let floor = self
            .news
            .poll_budget()
            .saturating_add(Duration::from_secs(TOOL_CALL_HEADROOM_SECS));
        Duration::from_secs(self.client.tool_call_timeout_secs).max(floor)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let key_var = match self.client.provider.as_str() {
            "openai" => "OPENAI_API_KEY",
            _ => "GEMINI_API_KEY",
        };
        if let Some(key) = lookup(key_var).filter(|v| !v.is_empty()) {
            self.client.api_key = key;
        }
        if let Some(model) = lookup("NEWSDESK_MODEL").filter(|v| !v.is_empty()) {
            self.client.model = Some(model);
        }
        if let Some(key) = lookup("MASA_DATA_API_KEY").filter(|v| !v.is_empty()) {
            self.news.api_key = key;
        }
        if let Some(url) = lookup("MASA_BASE_URL").filter(|v| !v.is_empty()) {
            self.news.base_url = url;
        }
    }
}

pub fn get_newsdesk_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(NEWSDESK_DIR)
}

pub fn get_config_path() -> PathBuf {
    get_newsdesk_dir().join("config.toml")
}

pub fn config_exists() -> bool {
    get_config_path().exists()
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        NewsdeskError::Configuration(format!(
            "Failed to read config from {}: {}",
            path.display(),
            e
        ))
    })?;

    toml::from_str(&content).map_err(|e| {
        NewsdeskError::Configuration(format!(
            "Failed to parse config from {}: {}",
            path.display(),
            e
        ))
    })
}
