//! Runtime knobs for the search session, loaded from environment variables.
//!
//! - `SEARCH_PER_PAGE`          = results per page (default 5)
//! - `SUMMARY_STRATEGY`         = `polling` (default) or `direct`
//! - `SUMMARY_POLL_INTERVAL_MS` = poll cadence (default 2000)
//! - `SUMMARY_TIMEOUT_MS`       = job wall-clock timeout (default 30000)
//! - `SEARCH_DEBOUNCE_MS`       = live-search debounce delay (default 500)

use std::{fmt, str::FromStr, time::Duration};

use capstone_api::{ApiResult, ConfigError, env_opt_u64, opt_env};

/// How a summary is obtained for a new query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    /// Search returns a job id; poll its status endpoint until ready.
    #[default]
    Polling,
    /// One long-running summarize request per query, aborted on supersession.
    Direct,
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "polling" | "poll" => Ok(Self::Polling),
            "direct" => Ok(Self::Direct),
            _ => Err(ConfigError::InvalidFormat {
                var: "SUMMARY_STRATEGY",
                reason: "expected `polling` or `direct`",
            }),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Polling => "polling",
            Self::Direct => "direct",
        })
    }
}

/// Config bag for [`crate::SearchExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub per_page: u32,
    pub strategy: StrategyKind,
    pub poll_interval: Duration,
    pub job_timeout: Duration,
    pub debounce_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            per_page: 5,
            strategy: StrategyKind::Polling,
            poll_interval: Duration::from_millis(2000),
            job_timeout: Duration::from_millis(30_000),
            debounce_delay: Duration::from_millis(500),
        }
    }
}

impl SessionConfig {
    /// Build from environment variables, falling back to [`Default`] per field.
    ///
    /// # Errors
    /// [`ConfigError::InvalidNumber`] / [`ConfigError::InvalidFormat`] for
    /// values that are set but malformed.
    pub fn from_env() -> ApiResult<Self> {
        let d = Self::default();

        let per_page = match env_opt_u64("SEARCH_PER_PAGE")? {
            Some(0) => {
                return Err(ConfigError::InvalidNumber {
                    var: "SEARCH_PER_PAGE",
                    reason: "must be > 0",
                }
                .into());
            }
            Some(n) => u32::try_from(n).map_err(|_| ConfigError::InvalidNumber {
                var: "SEARCH_PER_PAGE",
                reason: "expected u32",
            })?,
            None => d.per_page,
        };

        let strategy = match opt_env("SUMMARY_STRATEGY") {
            Some(s) => s.parse()?,
            None => d.strategy,
        };

        let millis = |var: &'static str, dflt: Duration| -> ApiResult<Duration> {
            Ok(env_opt_u64(var)?.map(Duration::from_millis).unwrap_or(dflt))
        };

        Ok(Self {
            per_page,
            strategy,
            poll_interval: millis("SUMMARY_POLL_INTERVAL_MS", d.poll_interval)?,
            job_timeout: millis("SUMMARY_TIMEOUT_MS", d.job_timeout)?,
            debounce_delay: millis("SEARCH_DEBOUNCE_MS", d.debounce_delay)?,
        })
    }

    /// Same config with a different strategy.
    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }
}
