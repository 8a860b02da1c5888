//! Configuration for aggregate synthesis.
//!
//! TOML-based; every section and key is optional and falls back to the
//! built-in default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AggsqlError, Result};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AggsqlConfig {
    /// Settings shared by every dialect.
    pub defaults: SynthesisDefaults,
    pub sqlserver: SqlServerConfig,
    pub mysql: MySqlConfig,
    pub postgres: PostgresConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SynthesisDefaults {
    /// Column alias of the axis bucket in Axis/AxisPivot output (default: `joinDt`).
    pub axis_alias: String,
}

/// SQL Server-specific configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SqlServerConfig {
    /// `OPTION (MAXRECURSION n)` for the date axis CTE (0 = unlimited).
    pub max_recursion: u32,
}

/// MySQL-specific configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MySqlConfig {
    /// Session `cte_max_recursion_depth` set before a date axis is generated.
    pub cte_max_recursion_depth: u64,
    /// Session `group_concat_max_len` set before pivot columns are collected.
    pub group_concat_max_len: u64,
}

/// PostgreSQL-specific configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PostgresConfig {
    /// Temporary view the pivot `DO` block creates and the script then reads.
    pub pivot_view: String,
}

impl Default for SynthesisDefaults {
    fn default() -> Self {
        Self {
            axis_alias: "joinDt".to_string(),
        }
    }
}

impl Default for MySqlConfig {
    fn default() -> Self {
        Self {
            cte_max_recursion_depth: 100_000,
            group_concat_max_len: 1_000_000,
        }
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            pivot_view: "aggsql_pivot".to_string(),
        }
    }
}

impl AggsqlConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AggsqlError::Config(format!("failed to read config file: {e}")))?;
        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(toml_str)
            .map_err(|e| AggsqlError::Config(format!("failed to parse config: {e}")))?;
        cfg.check()?;
        Ok(cfg)
    }

    /// Load from default locations (env var, cwd, user config dir, or defaults).
    ///
    /// Search order:
    /// 1. `AGGSQL_CONFIG` environment variable
    /// 2. `./aggsql.toml` (current directory)
    /// 3. `~/.config/aggsql/config.toml` (user config dir)
    /// 4. Built-in defaults
    pub fn load_default() -> Self {
        if let Ok(path) = std::env::var("AGGSQL_CONFIG") {
            match Self::from_file(&path) {
                Ok(cfg) => {
                    tracing::info!(path = %path, "loaded config from AGGSQL_CONFIG");
                    return cfg;
                }
                Err(err) => tracing::debug!(path = %path, error = %err, "ignoring AGGSQL_CONFIG"),
            }
        }

        if let Ok(cfg) = Self::from_file("aggsql.toml") {
            tracing::info!("loaded config from ./aggsql.toml");
            return cfg;
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("aggsql").join("config.toml");
            if let Ok(cfg) = Self::from_file(&user_config) {
                tracing::info!(path = %user_config.display(), "loaded config from user config dir");
                return cfg;
            }
        }

        tracing::debug!("no config file found, using defaults");
        Self::default()
    }

    fn check(&self) -> Result<()> {
        let alias = self.defaults.axis_alias.as_str();
        if alias.is_empty() || !alias.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(AggsqlError::Config(format!(
                "axis_alias must be a plain identifier, got '{alias}'"
            )));
        }
        if self.postgres.pivot_view.trim().is_empty() {
            return Err(AggsqlError::Config("postgres.pivot_view must not be empty".to_string()));
        }
        Ok(())
    }
}
