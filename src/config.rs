//! Configuration for promise cells and their deferred dispatch.
//!
//! # Configuration Precedence
//!
//! 1. **Programmatic**: values set via builder methods (`max_unwrap_depth(64)`)
//! 2. **Environment variables**: values from `PLEDGE_*` env vars
//! 3. **Config file**: values loaded from a TOML file (requires `config-file` feature)
//! 4. **Defaults**: [`PromiseConfig::default()`]
//!
//! # Supported Environment Variables
//!
//! | Variable | Type | Maps to |
//! |----------|------|---------|
//! | `PLEDGE_MAX_UNWRAP_DEPTH` | `usize` or `none` | `max_unwrap_depth` |
//! | `PLEDGE_DRAIN_STEP_LIMIT` | `u64` or `none` | `drain_step_limit` |
//!
//! A value of `0` or `none` means unbounded.

/// Environment variable name for the thenable unwrap depth limit.
pub const ENV_MAX_UNWRAP_DEPTH: &str = "PLEDGE_MAX_UNWRAP_DEPTH";
/// Environment variable name for the microtask drain step limit.
pub const ENV_DRAIN_STEP_LIMIT: &str = "PLEDGE_DRAIN_STEP_LIMIT";

/// Error produced while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable held an unparseable value.
    #[error("invalid value for {var}: expected {expected}, got {value:?}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// What the parser expected.
        expected: &'static str,
        /// The raw value.
        value: String,
    },
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config file was not valid TOML.
    #[error("failed to parse TOML config: {0}")]
    Parse(String),
}

/// Configuration shared by every cell created through one [`Cx`](crate::Cx).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromiseConfig {
    /// Maximum nesting of thenable unwrapping before the target cell is
    /// rejected with `UnwrapDepthExceeded`.
    ///
    /// `None` keeps the unbounded behavior: mutually-referencing thenables
    /// may never settle.
    pub max_unwrap_depth: Option<usize>,
    /// Maximum number of tasks one `MicrotaskQueue::run_until_idle` call may
    /// run before reporting `DrainError::StepLimitExceeded`.
    pub drain_step_limit: Option<u64>,
}

impl PromiseConfig {
    /// Creates the default configuration (no limits).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_unwrap_depth: None,
            drain_step_limit: None,
        }
    }

    /// Sets the thenable unwrap depth limit. `0` means unbounded.
    #[must_use]
    pub const fn max_unwrap_depth(mut self, depth: usize) -> Self {
        self.max_unwrap_depth = if depth == 0 { None } else { Some(depth) };
        self
    }

    /// Sets the microtask drain step limit. `0` means unbounded.
    #[must_use]
    pub const fn drain_step_limit(mut self, steps: u64) -> Self {
        self.drain_step_limit = if steps == 0 { None } else { Some(steps) };
        self
    }

    /// Builds a configuration from defaults plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new();
        apply_env_overrides(&mut config)?;
        Ok(config)
    }
}

impl Default for PromiseConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply environment variable overrides to a [`PromiseConfig`].
///
/// Only variables that are set in the environment are applied.
pub fn apply_env_overrides(config: &mut PromiseConfig) -> Result<(), ConfigError> {
    if let Some(val) = read_env(ENV_MAX_UNWRAP_DEPTH) {
        config.max_unwrap_depth = parse_limit(ENV_MAX_UNWRAP_DEPTH, &val)?
            .map(|v| usize::try_from(v).unwrap_or(usize::MAX));
    }
    if let Some(val) = read_env(ENV_DRAIN_STEP_LIMIT) {
        config.drain_step_limit = parse_limit(ENV_DRAIN_STEP_LIMIT, &val)?;
    }
    Ok(())
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_limit(var: &'static str, val: &str) -> Result<Option<u64>, ConfigError> {
    let trimmed = val.trim();
    if trimmed.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    match trimmed.parse::<u64>() {
        Ok(0) => Ok(None),
        Ok(n) => Ok(Some(n)),
        Err(_) => Err(ConfigError::InvalidEnv {
            var,
            expected: "unsigned integer or `none`",
            value: val.to_string(),
        }),
    }
}

// =========================================================================
// TOML config file support (feature-gated)
// =========================================================================

/// TOML-deserializable promise configuration.
///
/// ```toml
/// [promise]
/// max_unwrap_depth = 256
/// drain_step_limit = 1000000
/// ```
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct PromiseTomlConfig {
    /// Promise settings.
    #[serde(default)]
    pub promise: PromiseToml,
}

/// Promise section of the TOML config.
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct PromiseToml {
    /// Thenable unwrap depth limit (0 = unbounded).
    pub max_unwrap_depth: Option<usize>,
    /// Microtask drain step limit (0 = unbounded).
    pub drain_step_limit: Option<u64>,
}

/// Apply a parsed TOML config to a [`PromiseConfig`].
#[cfg(feature = "config-file")]
pub fn apply_toml_config(config: &mut PromiseConfig, toml: &PromiseTomlConfig) {
    if let Some(v) = toml.promise.max_unwrap_depth {
        config.max_unwrap_depth = (v != 0).then_some(v);
    }
    if let Some(v) = toml.promise.drain_step_limit {
        config.drain_step_limit = (v != 0).then_some(v);
    }
}

/// Parse a TOML string into a [`PromiseTomlConfig`].
#[cfg(feature = "config-file")]
pub fn parse_toml_str(toml_str: &str) -> Result<PromiseTomlConfig, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Read and parse a TOML file into a [`PromiseTomlConfig`].
#[cfg(feature = "config-file")]
pub fn parse_toml_file(path: &std::path::Path) -> Result<PromiseTomlConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_toml_str(&content)
}
