//! Typed configuration, loaded via `dotenvy` for an optional `.env` file,
//! then `env::var` reads with `default_*()` fallbacks and a `validate()`
//! pass, wrapped in `eyre` at this crate's boundary — library-internal
//! code never sees `eyre`.

use std::env;
use std::fmt;
use std::path::Path;

use eyre::{eyre, Result, WrapErr};

/// `infiniteFillDeadline`: the sentinel fill deadline meaning "never
/// expires", used by Phase 2's pre-fill lookback branch.
pub const INFINITE_FILL_DEADLINE: u32 = u32::MAX;

/// Engine-wide knobs.
#[derive(Clone)]
pub struct EngineConfig {
    /// Consult the persisted blob cache before recomputing a bundle.
    pub attempt_blob_cache: bool,
    /// ConfigStore version at/above which pre-fill refunds are enabled.
    pub pre_fill_min_version: u32,
    /// Out-of-band override: force pre-fill refunds on for the next
    /// reconstruction regardless of the ConfigStore version. Applies once,
    /// then the caller is expected to clear it.
    pub force_refund_prefills: bool,
    /// Cap on `bounded_probe_window`'s RPC round-trips.
    pub max_binary_search_probes: u32,
    /// Postgres connection string for `blob_cache::PostgresBlobCache`.
    /// `None` keeps the process on `InMemoryBlobCache`.
    pub database_url: Option<String>,
}

/// Custom `Debug` that redacts `database_url` so a connection string with
/// embedded credentials never lands in a log line.
impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("attempt_blob_cache", &self.attempt_blob_cache)
            .field("pre_fill_min_version", &self.pre_fill_min_version)
            .field("force_refund_prefills", &self.force_refund_prefills)
            .field("max_binary_search_probes", &self.max_binary_search_probes)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn default_pre_fill_min_version() -> u32 {
    1
}

fn default_max_binary_search_probes() -> u32 {
    7
}

impl EngineConfig {
    /// Load from environment variables, loading a `.env` file first if one
    /// is present in the working directory.
    pub fn load() -> Result<Self> {
        Self::load_from_file(".env").or_else(|_| Self::load_from_env())
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            dotenvy::from_filename(path).wrap_err_with(|| format!("failed to load .env file from {path}"))?;
        }
        Self::load_from_env()
    }

    fn load_from_env() -> Result<Self> {
        let attempt_blob_cache = env::var("ATTEMPT_BLOB_CACHE")
            .ok()
            .map(|v| v == "true" || v == "1")
            .unwrap_or(true);

        let pre_fill_min_version = env::var("PRE_FILL_MIN_VERSION")
            .ok()
            .map(|v| v.parse().wrap_err("PRE_FILL_MIN_VERSION must be a valid u32"))
            .transpose()?
            .unwrap_or_else(default_pre_fill_min_version);

        let force_refund_prefills = env::var("FORCE_REFUND_PREFILLS")
            .ok()
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let max_binary_search_probes = env::var("MAX_BINARY_SEARCH_PROBES")
            .ok()
            .map(|v| v.parse().wrap_err("MAX_BINARY_SEARCH_PROBES must be a valid u32"))
            .transpose()?
            .unwrap_or_else(default_max_binary_search_probes);

        let database_url = env::var("DATABASE_URL").ok();

        let config = EngineConfig {
            attempt_blob_cache,
            pre_fill_min_version,
            force_refund_prefills,
            max_binary_search_probes,
            database_url,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_binary_search_probes == 0 {
            return Err(eyre!("MAX_BINARY_SEARCH_PROBES must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            attempt_blob_cache: true,
            pre_fill_min_version: default_pre_fill_min_version(),
            force_refund_prefills: false,
            max_binary_search_probes: default_max_binary_search_probes(),
            database_url: None,
        }
    }
}
