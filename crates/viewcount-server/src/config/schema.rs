use serde::Deserialize;
use viewcount_core::error::{Result, ViewError};
use viewcount_core::ident::DEFAULT_MAX_SLUG_LEN;

/// Environment variable consulted when `store.url` is omitted.
pub const REDIS_URL_ENV: &str = "REDIS_URL";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub rate_limit: RateLimitSection,

    #[serde(default)]
    pub dedup: DedupSection,

    #[serde(default)]
    pub views: ViewsSection,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            store: StoreSection::default(),
            rate_limit: RateLimitSection::default(),
            dedup: DedupSection::default(),
            views: ViewsSection::default(),
        }
    }
}

impl ViewConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ViewError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.store.validate()?;
        self.rate_limit.read.validate("rate_limit.read")?;
        self.rate_limit.write.validate("rate_limit.write")?;

        if !(1..=4096).contains(&self.views.max_slug_len) {
            return Err(ViewError::Config(
                "views.max_slug_len must be between 1 and 4096".into(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Redis,
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Falls back to `REDIS_URL` when omitted.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub key_prefix: String,
}

impl StoreSection {
    pub fn validate(&self) -> Result<()> {
        if self.backend == StoreBackend::Redis {
            self.redis_url()?;
        }
        Ok(())
    }

    /// Resolve the Redis URL from config or environment.
    pub fn redis_url(&self) -> Result<String> {
        if let Some(url) = self.url.as_ref().filter(|u| !u.is_empty()) {
            return Ok(url.clone());
        }
        std::env::var(REDIS_URL_ENV).map_err(|_| {
            ViewError::Config(format!(
                "store.url is not set and {REDIS_URL_ENV} is missing"
            ))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitSection {
    #[serde(default = "default_read_rule")]
    pub read: WindowRule,

    #[serde(default = "default_write_rule")]
    pub write: WindowRule,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            read: default_read_rule(),
            write: default_write_rule(),
        }
    }
}

/// Sliding-window threshold: at most `limit` requests per `window_secs`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowRule {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub limit: u64,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl WindowRule {
    pub fn validate(&self, name: &str) -> Result<()> {
        if !(1..=100_000).contains(&self.limit) {
            return Err(ViewError::Config(format!(
                "{name}.limit must be between 1 and 100000"
            )));
        }
        if !(1..=86_400).contains(&self.window_secs) {
            return Err(ViewError::Config(format!(
                "{name}.window_secs must be between 1 and 86400"
            )));
        }
        Ok(())
    }
}

fn default_read_rule() -> WindowRule {
    WindowRule {
        enabled: true,
        limit: 60,
        window_secs: default_window_secs(),
    }
}
fn default_write_rule() -> WindowRule {
    WindowRule {
        enabled: true,
        limit: 10,
        window_secs: default_window_secs(),
    }
}
fn default_window_secs() -> u64 {
    60
}
fn default_true() -> bool {
    true
}

/// How the dedup marker is consulted on the write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DedupMode {
    /// Lookup, then increment, then write the marker (racy).
    #[default]
    CheckThenSet,
    /// Atomic `SET NX` claim before the increment.
    SetIfAbsent,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DedupSection {
    #[serde(default)]
    pub mode: DedupMode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewsSection {
    #[serde(default = "default_max_slug_len")]
    pub max_slug_len: usize,
}

impl Default for ViewsSection {
    fn default() -> Self {
        Self {
            max_slug_len: default_max_slug_len(),
        }
    }
}

fn default_max_slug_len() -> usize {
    DEFAULT_MAX_SLUG_LEN
}
