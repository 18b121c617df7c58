//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/hiergraph/hiergraph.toml`
//! 3. Local config: `<project_dir>/.hiergraph.toml`
//! 4. Environment variables: `HIERGRAPH_*` prefix
//!
//! Command line flags are applied on top by the CLI layer.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{BuildOptions, DanglingPolicy, ImportPolicy, RootPolicy, DEFAULT_DELIMITER};

/// Unified configuration for hiergraph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Separator between name segments (default: ".")
    pub delimiter: String,
    /// Handling of batches with several top-level names
    pub root_policy: RootPolicy,
    /// Handling of repeated imports
    pub imports: ImportPolicy,
    /// Handling of imports that name no leaf
    pub dangling: DanglingPolicy,
    /// Sort siblings by height, then name
    pub sort_children: bool,
    /// Fail a batch on the first refused record
    pub strict: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            root_policy: RootPolicy::default(),
            imports: ImportPolicy::default(),
            dangling: DanglingPolicy::default(),
            sort_children: true,
            strict: false,
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub delimiter: Option<String>,
    pub root_policy: Option<RootPolicy>,
    pub imports: Option<ImportPolicy>,
    pub dangling: Option<DanglingPolicy>,
    pub sort_children: Option<bool>,
    pub strict: Option<bool>,
}

/// Get the XDG config directory for hiergraph.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "hiergraph").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("hiergraph.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".hiergraph.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Merge overlay config onto self (base); overlay wins where specified.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            delimiter: overlay
                .delimiter
                .clone()
                .unwrap_or_else(|| self.delimiter.clone()),
            root_policy: overlay.root_policy.unwrap_or(self.root_policy),
            imports: overlay.imports.unwrap_or(self.imports),
            dangling: overlay.dangling.unwrap_or(self.dangling),
            sort_children: overlay.sort_children.unwrap_or(self.sort_children),
            strict: overlay.strict.unwrap_or(self.strict),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional directory holding a local `.hiergraph.toml`
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let files = Self::merge_files(global_config_path().as_deref(), project_dir)?;

        // 4. Environment variables
        let current = Self::apply_env_overrides(files)?;

        current.validate()?;
        Ok(current)
    }

    /// Defaults merged with the global and local config files only,
    /// ignoring the environment.
    pub fn load_files(
        global_path: Option<&Path>,
        project_dir: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        let current = Self::merge_files(global_path, project_dir)?;
        current.validate()?;
        Ok(current)
    }

    /// A missing file is skipped.
    fn merge_files(
        global_path: Option<&Path>,
        project_dir: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_path {
            if global_path.exists() {
                let raw = load_raw_settings(global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config
        if let Some(dir) = project_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        Ok(current)
    }

    /// Apply HIERGRAPH_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("HIERGRAPH")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("delimiter") {
            settings.delimiter = val;
        }
        if let Ok(val) = config.get_string("root_policy") {
            settings.root_policy = parse_env("root_policy", &val)?;
        }
        if let Ok(val) = config.get_string("imports") {
            settings.imports = parse_env("imports", &val)?;
        }
        if let Ok(val) = config.get_string("dangling") {
            settings.dangling = parse_env("dangling", &val)?;
        }
        if let Ok(val) = config.get_bool("sort_children") {
            settings.sort_children = val;
        }
        if let Ok(val) = config.get_bool("strict") {
            settings.strict = val;
        }

        Ok(settings)
    }

    /// Reject settings the builder cannot work with.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.delimiter.is_empty() {
            return Err(ApplicationError::Config {
                message: "delimiter must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Options for the hierarchy builder.
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            delimiter: self.delimiter.clone(),
            root_policy: self.root_policy,
            import_policy: self.imports,
            sort_children: self.sort_children,
        }
    }

    /// Render the effective settings as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {}", e),
        })
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T, ApplicationError>
where
    T: FromStr<Err = String>,
{
    value.parse().map_err(|e| ApplicationError::Config {
        message: format!("HIERGRAPH_{}: {}", key.to_uppercase(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
