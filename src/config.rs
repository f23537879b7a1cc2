use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default port for the HTTP surface
pub const DEFAULT_PORT: u16 = 7460;

/// Runtime configuration, read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,
    /// Sessions untouched for this long are garbage collected
    pub session_idle: Duration,
    /// How often the sweeper looks for idle sessions
    pub sweep_interval: Duration,
    /// JSON file with the quote book (used when no remote API is set)
    pub quotes_file: Option<PathBuf>,
    /// Base URL of a quote book HTTP API
    pub quotes_api_url: Option<String>,
    /// JSON array of black-card prompts
    pub prompts_file: Option<PathBuf>,
    /// Let new players join a session that is already running
    pub allow_midgame_join: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            session_idle: Duration::from_secs(12 * 60 * 60),
            sweep_interval: Duration::from_secs(60),
            quotes_file: None,
            quotes_api_url: None,
            prompts_file: None,
            allow_midgame_join: false,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn flag_var(key: &str) -> Option<bool> {
    non_empty_var(key).map(|v| v != "0" && v.to_lowercase() != "false")
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = non_empty_var("QUOTE_PARTY_ADDR")
            .and_then(|addr| match addr.parse() {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    tracing::warn!("Ignoring invalid QUOTE_PARTY_ADDR '{}': {}", addr, e);
                    None
                }
            })
            .unwrap_or(defaults.bind_addr);

        let session_idle = non_empty_var("SESSION_IDLE_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.session_idle);

        let sweep_interval = non_empty_var("SWEEP_INTERVAL_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.sweep_interval);

        Self {
            bind_addr,
            session_idle,
            sweep_interval,
            quotes_file: non_empty_var("QUOTES_FILE").map(PathBuf::from),
            quotes_api_url: non_empty_var("QUOTES_API_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            prompts_file: non_empty_var("PROMPTS_FILE").map(PathBuf::from),
            allow_midgame_join: flag_var("ALLOW_MIDGAME_JOIN").unwrap_or(defaults.allow_midgame_join),
        }
    }
}
