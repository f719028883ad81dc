use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

/// Telegram rejects `getUpdates` waits above this.
pub const MAX_POLL_WAIT_SECS: u64 = 50;

/// Long-polling knobs for the update loop.
#[derive(Clone, Debug)]
pub struct PollConfig {
    /// Server-side long-poll wait passed to `getUpdates`.
    pub wait: Duration,
    /// Extra client-side allowance on top of `wait` before a poll counts as failed.
    pub request_slack: Duration,
    /// Pause after a failed poll before retrying with the same offset.
    pub retry_delay: Duration,
    /// Pause between successful batches.
    pub batch_delay: Duration,
}

impl PollConfig {
    /// Upper bound for a single poll request.
    pub fn request_timeout(&self) -> Duration {
        self.wait.saturating_add(self.request_slack)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            wait: Duration::from_secs(20),
            request_slack: Duration::from_secs(5),
            retry_delay: Duration::from_millis(2000),
            batch_delay: Duration::from_millis(500),
        }
    }
}

/// Where and how the resolver scrapes the archive.
#[derive(Clone, Debug)]
pub struct ArchiveConfig {
    pub base_url: String,
    /// `mediatype:` filter appended to every search.
    pub mediatype: String,
    /// Audio file extension a candidate link must end with (no dot).
    pub extension: String,
    pub user_agent: String,
    pub page_timeout: Duration,
    pub head_timeout: Duration,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: "https://archive.org".to_string(),
            mediatype: "audio".to_string(),
            extension: "mp3".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            page_timeout: Duration::from_secs(15),
            head_timeout: Duration::from_secs(7),
        }
    }
}

/// Typed configuration for the bot process.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    /// Port of the liveness endpoint.
    pub port: u16,
    /// Client timeout for Telegram send calls.
    pub send_timeout: Duration,
    pub poll: PollConfig,
    pub archive: ArchiveConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (the process env in
    /// production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = lookup("TOKEN")
            .and_then(non_empty)
            .or_else(|| lookup("TELEGRAM_BOT_TOKEN").and_then(non_empty))
            .ok_or_else(|| {
                Error::Config("TOKEN environment variable is required".to_string())
            })?;

        let port = match lookup("PORT").and_then(non_empty) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| Error::Config(format!("invalid PORT {raw:?}: {e}")))?,
            None => 8080,
        };

        let send_timeout =
            Duration::from_secs(parse_u64(&lookup, "SEND_TIMEOUT_SECS")?.unwrap_or(30));

        let defaults = PollConfig::default();
        let wait = match parse_u64(&lookup, "POLL_TIMEOUT_SECS")? {
            Some(secs) if secs > MAX_POLL_WAIT_SECS => {
                return Err(Error::Config(format!(
                    "POLL_TIMEOUT_SECS must be at most {MAX_POLL_WAIT_SECS}, got {secs}"
                )));
            }
            Some(secs) => Duration::from_secs(secs),
            None => defaults.wait,
        };
        let poll = PollConfig {
            wait,
            retry_delay: parse_u64(&lookup, "POLL_RETRY_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
            batch_delay: parse_u64(&lookup, "POLL_BATCH_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.batch_delay),
            ..defaults
        };

        let defaults = ArchiveConfig::default();
        let base_url = lookup("ARCHIVE_BASE_URL")
            .and_then(non_empty)
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url.clone());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "ARCHIVE_BASE_URL must be an http(s) URL, got {base_url:?}"
            )));
        }
        let archive = ArchiveConfig {
            base_url,
            page_timeout: parse_u64(&lookup, "PAGE_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.page_timeout),
            head_timeout: parse_u64(&lookup, "HEAD_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.head_timeout),
            ..defaults
        };

        if send_timeout.is_zero() || archive.page_timeout.is_zero() || archive.head_timeout.is_zero()
        {
            return Err(Error::Config("timeouts must be greater than zero".to_string()));
        }

        Ok(Self {
            telegram_bot_token,
            port,
            send_timeout,
            poll,
            archive,
        })
    }
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    let Some(raw) = lookup(key).and_then(non_empty) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|e| Error::Config(format!("invalid {key} {raw:?}: {e}")))
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

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
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
