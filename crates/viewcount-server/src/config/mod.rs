//! Service config loader (strict parsing).

pub mod schema;

use std::{fs, io::ErrorKind};

use viewcount_core::error::{Result, ViewError};

pub use schema::{
    DedupMode, DedupSection, RateLimitSection, ServerSection, StoreBackend, StoreSection,
    ViewConfig, ViewsSection, WindowRule, REDIS_URL_ENV,
};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "VIEWCOUNT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "viewcount.yaml";

/// Load config from `VIEWCOUNT_CONFIG` (or `viewcount.yaml`). A missing file
/// yields the defaults.
pub fn load_default() -> Result<ViewConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    match fs::read_to_string(&path) {
        Ok(s) => load_from_str(&s),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(%path, "config file not found, using defaults");
            let cfg = ViewConfig::default();
            cfg.validate()?;
            Ok(cfg)
        }
        Err(e) => Err(ViewError::Config(format!("read config failed ({path}): {e}"))),
    }
}

pub fn load_from_str(s: &str) -> Result<ViewConfig> {
    let cfg: ViewConfig = serde_yaml::from_str(s)
        .map_err(|e| ViewError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
