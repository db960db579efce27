//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: `PAGEWISE_`, nested keys split on `__`)
//! 2. Current working directory: ./pagewise.toml
//! 3. XDG config directory: ~/.config/pagewise/{service_name}/config.toml
//! 4. System directory: /etc/pagewise/{service_name}/config.toml
//! 5. Default values
//!
//! The `pagination` section seeds every [`PaginationPolicy`](crate::shape::PaginationPolicy)
//! built through [`Config::policy_builder`], so deployments can tighten limits
//! without touching code:
//!
//! ```toml
//! log_level = "debug"
//!
//! [pagination]
//! mode = "cursor"
//! default_limit = 25
//! max_limit = 200
//!
//! [params]
//! sort_by = "sort"
//!
//! [cursor]
//! max_token_len = 2048
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::shape::{PaginationMode, PaginationPolicy, PaginationPolicyBuilder};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Default pagination policy settings
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Names of the client-facing pagination parameters
    #[serde(default)]
    pub params: ParamNames,

    /// Cursor token settings
    #[serde(default)]
    pub cursor: CursorConfig,
}

/// Policy defaults applied to every shape built from configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Pagination mode
    #[serde(default)]
    pub mode: PaginationMode,

    /// Page size used when the client sends no limit
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    /// Largest page size a client may request
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,

    /// Honor the client's `limit` parameter
    #[serde(default = "default_true")]
    pub allow_custom_limit: bool,

    /// Honor the client's `sortBy`/`sortOrder` parameters
    #[serde(default = "default_true")]
    pub allow_custom_sort: bool,

    /// Accept more than one sort alias
    #[serde(default = "default_true")]
    pub allow_multiple_sort: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            pagination: PaginationConfig::default(),
            params: ParamNames::default(),
            cursor: CursorConfig::default(),
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            mode: PaginationMode::default(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            allow_custom_limit: true,
            allow_custom_sort: true,
            allow_multiple_sort: true,
        }
    }
}

/// Client-facing parameter names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamNames {
    /// Page number parameter
    #[serde(default = "default_page_param")]
    pub page: String,

    /// Continuation token parameter
    #[serde(default = "default_cursor_param")]
    pub cursor: String,

    /// Page size parameter
    #[serde(default = "default_limit_param")]
    pub limit: String,

    /// Comma-separated sort aliases
    #[serde(default = "default_sort_by_param")]
    pub sort_by: String,

    /// Comma-separated sort directions
    #[serde(default = "default_sort_order_param")]
    pub sort_order: String,
}

impl ParamNames {
    /// All names, in declaration order
    #[must_use]
    pub fn all(&self) -> [&str; 5] {
        [
            &self.page,
            &self.cursor,
            &self.limit,
            &self.sort_by,
            &self.sort_order,
        ]
    }

    /// Check whether `name` is one of the pagination parameters
    #[must_use]
    pub fn is_reserved(&self, name: &str) -> bool {
        self.all().contains(&name)
    }
}

impl Default for ParamNames {
    fn default() -> Self {
        Self {
            page: default_page_param(),
            cursor: default_cursor_param(),
            limit: default_limit_param(),
            sort_by: default_sort_by_param(),
            sort_order: default_sort_order_param(),
        }
    }
}

/// Cursor token settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorConfig {
    /// Tokens longer than this are rejected before decoding
    #[serde(default = "default_max_token_len")]
    pub max_token_len: usize,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            max_token_len: default_max_token_len(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_limit() -> u32 {
    10
}

fn default_max_limit() -> u32 {
    100
}

fn default_true() -> bool {
    true
}

fn default_page_param() -> String {
    "page".to_string()
}

fn default_cursor_param() -> String {
    "cursor".to_string()
}

fn default_limit_param() -> String {
    "limit".to_string()
}

fn default_sort_by_param() -> String {
    "sortBy".to_string()
}

fn default_sort_order_param() -> String {
    "sortOrder".to_string()
}

fn default_max_token_len() -> usize {
    4096
}

impl Config {
    /// Load configuration from all sources
    ///
    /// The service name is inferred from the running binary.
    pub fn load() -> Result<Self> {
        let service_name = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "pagewise".to_string());

        Self::load_for_service(&service_name)
    }

    /// Load configuration for a specific service name
    pub fn load_for_service(service_name: &str) -> Result<Self> {
        let config_paths = Self::find_config_paths(service_name);

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Lowest priority first so later files win
        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        figment = figment.merge(Env::prefixed("PAGEWISE_").split("__"));

        let config = figment.extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// Bypasses the search path. Environment variables still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("PAGEWISE_").split("__"))
            .extract()?;

        Ok(config)
    }

    /// Candidate config files, highest priority first
    fn find_config_paths(service_name: &str) -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("pagewise.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix("pagewise");
        if let Some(path) = xdg_dirs.find_config_file(Path::new(service_name).join("config.toml")) {
            paths.push(path);
        }

        paths.push(
            PathBuf::from("/etc/pagewise")
                .join(service_name)
                .join("config.toml"),
        );

        paths
    }

    /// Start a policy builder seeded with the configured defaults
    ///
    /// The cursor key column and default sort are per-shape and still have
    /// to be supplied before [`PaginationPolicyBuilder::build`].
    #[must_use]
    pub fn policy_builder(&self) -> PaginationPolicyBuilder {
        PaginationPolicy::from_config(&self.pagination).param_names(self.params.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.pagination.mode, PaginationMode::Both);
        assert_eq!(config.pagination.default_limit, 10);
        assert_eq!(config.pagination.max_limit, 100);
        assert!(config.pagination.allow_custom_limit);
        assert!(config.pagination.allow_custom_sort);
        assert!(config.pagination.allow_multiple_sort);
        assert_eq!(config.params.sort_by, "sortBy");
        assert_eq!(config.cursor.max_token_len, 4096);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            r#"
log_level = "debug"

[pagination]
mode = "offset"
default_limit = 5
max_limit = 50
allow_multiple_sort = false

[params]
sort_by = "sort"

[cursor]
max_token_len = 512
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.pagination.mode, PaginationMode::Offset);
        assert_eq!(config.pagination.default_limit, 5);
        assert_eq!(config.pagination.max_limit, 50);
        assert!(!config.pagination.allow_multiple_sort);
        assert!(config.pagination.allow_custom_sort);
        assert_eq!(config.params.sort_by, "sort");
        assert_eq!(config.params.page, "page");
        assert_eq!(config.cursor.max_token_len, 512);
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.pagination, PaginationConfig::default());
    }

    #[test]
    fn test_load_from_rejects_bad_mode() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "[pagination]\nmode = \"sideways\"").unwrap();

        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn test_param_names_reserved() {
        let names = ParamNames::default();
        assert!(names.is_reserved("page"));
        assert!(names.is_reserved("sortOrder"));
        assert!(!names.is_reserved("title"));
    }

    #[test]
    fn test_policy_builder_uses_configured_limits() {
        let mut config = Config::default();
        config.pagination.mode = PaginationMode::Offset;
        config.pagination.default_limit = 7;
        config.pagination.max_limit = 70;

        let policy = config.policy_builder().build().unwrap();
        assert_eq!(policy.mode(), PaginationMode::Offset);
        assert_eq!(policy.default_limit(), 7);
        assert_eq!(policy.max_limit(), 70);
    }
}
