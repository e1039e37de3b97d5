//! Environment-driven configuration.

use std::net::SocketAddr;
use std::time::Duration;

use crate::matching::ExtractConfig;
use crate::push::PushConfig;
use crate::stops::AliasSource;

/// Default bind address for the HTTP surface.
const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 3000);

/// Default interval between alias mapping refreshes (6 hours).
const DEFAULT_ALIAS_REFRESH: Duration = Duration::from_secs(6 * 60 * 60);

/// Server configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP surface binds to.
    pub bind_addr: SocketAddr,

    /// Where the stop-alias mapping comes from, if anywhere.
    pub alias_source: Option<AliasSource>,

    /// How often to refresh the alias mapping.
    pub alias_refresh: Duration,

    /// Delivery engine settings.
    pub push: PushConfig,

    /// Extractor settings (replay switch).
    pub extract: ExtractConfig,
}

impl Config {
    /// Read configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    ///
    /// Variables: `BIND_ADDR`, `STOP_ALIAS_URL`, `STOP_ALIAS_FILE`,
    /// `STOP_ALIAS_REFRESH_SECS`, `PUSH_TIMEOUT_SECS`,
    /// `PUSH_MAX_CONCURRENT`, `PUSH_DEDUP_TTL_SECS`, `INCLUDE_PAST_CALLS`.
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("BIND_ADDR")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(DEFAULT_BIND_ADDR));

        // A URL source wins when both are set.
        let alias_source = std::env::var("STOP_ALIAS_URL")
            .ok()
            .map(AliasSource::Url)
            .or_else(|| {
                std::env::var("STOP_ALIAS_FILE")
                    .ok()
                    .map(|p| AliasSource::File(p.into()))
            });

        let alias_refresh = env_secs("STOP_ALIAS_REFRESH_SECS").unwrap_or(DEFAULT_ALIAS_REFRESH);

        let mut push = PushConfig::default();
        if let Some(timeout) = env_secs("PUSH_TIMEOUT_SECS") {
            push.timeout = timeout;
        }
        if let Some(max_concurrent) = env_parse::<usize>("PUSH_MAX_CONCURRENT") {
            push.max_concurrent = max_concurrent.max(1);
        }
        if let Some(dedup_ttl) = env_secs("PUSH_DEDUP_TTL_SECS") {
            push.dedup_ttl = dedup_ttl;
        }

        let extract = ExtractConfig {
            include_past_calls: env_parse::<bool>("INCLUDE_PAST_CALLS").unwrap_or(false),
        };

        Self {
            bind_addr,
            alias_source,
            alias_refresh,
            push,
            extract,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

fn env_secs(name: &str) -> Option<Duration> {
    env_parse::<u64>(name).map(Duration::from_secs)
}
