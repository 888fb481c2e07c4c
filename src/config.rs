//! Runtime configuration
//!
//! Built once from the command line (native) or from compile-time defaults (web),
//! installed before launch and then handed to the component tree as a context.

use std::sync::Mutex;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_DEBOUNCE_MS: u64 = 400;
pub const DEFAULT_CLOSE_DELAY_MS: u64 = 1200;

lazy_static::lazy_static! {
    static ref CONFIG: Mutex<Option<Config>> = Mutex::new(None);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Origin of the admin API, without a trailing slash
    pub api_base: String,
    /// Quiet period before a search-as-you-type request goes out
    pub search_debounce: Duration,
    /// How long a success message stays up before an operation modal closes
    pub close_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base: option_env!("FUND_ADMIN_API_URL")
                .unwrap_or(DEFAULT_API_URL)
                .to_string(),
            search_debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            close_delay: Duration::from_millis(DEFAULT_CLOSE_DELAY_MS),
        }
    }
}

impl Config {
    pub fn new(api_base: &str, debounce_ms: u64, close_delay_ms: u64) -> Self {
        Config {
            api_base: api_base.trim_end_matches('/').to_string(),
            search_debounce: Duration::from_millis(debounce_ms),
            close_delay: Duration::from_millis(close_delay_ms),
        }
    }

    /// Joins an endpoint path onto the API origin
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }
}

/// Installs the process-wide configuration. Only the first call wins.
pub fn install(config: Config) {
    let Ok(mut slot) = CONFIG.lock() else {
        log::error!("Configuration lock poisoned, keeping defaults");
        return;
    };
    if slot.is_some() {
        log::warn!("Configuration already installed, keeping the first one");
        return;
    }
    *slot = Some(config);
}

pub fn current() -> Config {
    CONFIG
        .lock()
        .ok()
        .and_then(|slot| slot.clone())
        .unwrap_or_default()
}
