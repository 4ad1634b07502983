use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Typed configuration for a bot instance.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub token: String,
    pub api_base_url: String,
    pub name: Option<String>,

    // Polling
    pub poll_delay: Duration,
    pub long_poll_timeout: Duration,
    pub safe_mode: bool,
    pub cursor_file: Option<PathBuf>,

    // Transport
    pub request_timeout: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Config {
    /// Defaults for library use; only the token is required.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base_url: DEFAULT_API_URL.to_string(),
            name: None,
            poll_delay: Duration::from_secs(1),
            long_poll_timeout: Duration::ZERO,
            safe_mode: false,
            cursor_file: None,
            request_timeout: Duration::from_secs(5),
            backoff_base: Duration::from_secs(1),
            backoff_max: Duration::from_secs(60),
        }
    }

    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let mut cfg = Self::new(token.trim());

        if let Some(url) = env_str("TELEGRAM_API_URL").and_then(non_empty) {
            cfg.api_base_url = url.trim_end_matches('/').to_string();
        }
        cfg.name = env_str("TBOT_NAME").and_then(non_empty);

        if let Some(ms) = env_u64("TBOT_POLL_DELAY_MS") {
            cfg.poll_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = env_u64("TBOT_LONG_POLL_SECS") {
            cfg.long_poll_timeout = Duration::from_secs(secs);
        }
        cfg.safe_mode = env_bool("TBOT_SAFE_MODE").unwrap_or(false);
        cfg.cursor_file = env_path("TBOT_CURSOR_FILE");

        if let Some(ms) = env_u64("TBOT_REQUEST_TIMEOUT_MS") {
            cfg.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("TBOT_BACKOFF_BASE_MS") {
            cfg.backoff_base = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("TBOT_BACKOFF_MAX_MS") {
            cfg.backoff_max = Duration::from_millis(ms);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.backoff_base.is_zero() {
            return Err(Error::Config("backoff base must be positive".to_string()));
        }
        if self.backoff_max < self.backoff_base {
            return Err(Error::Config(format!(
                "backoff max ({:?}) is below backoff base ({:?})",
                self.backoff_max, self.backoff_base
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::Config("request timeout must be positive".to_string()));
        }
        Ok(())
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|s| parse_bool(&s))
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
