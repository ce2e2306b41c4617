//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/rapporteur/config.toml)
//! 3. Project config (.rapporteur/config.toml)
//! 4. Environment variables (RAPPORTEUR_* prefix, `__` separates sections)
//!
//! A `.env` file in the working directory is read into the process
//! environment first so the service credentials can live there.

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use super::types::Config;
use crate::types::{RapportError, Result};

const APP_NAME: &str = "rapporteur";
const ENV_PREFIX: &str = "RAPPORTEUR_";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain:
    /// .env → defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        Self::load_dotenv();
        Self::load_layers(
            Self::global_config_path().as_deref(),
            &Self::project_config_path(),
        )
    }

    /// Merge defaults with the given files (when present) and the environment
    pub fn load_layers(global: Option<&Path>, project: &Path) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = global
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(global_path));
        }

        if project.exists() {
            debug!("Loading project config from: {}", project.display());
            figment = figment.merge(Toml::file(project));
        }

        // RAPPORTEUR_PIPELINE__MAX_STEPS -> pipeline.max_steps
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| RapportError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| RapportError::Config(format!("Configuration error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read `.env` into the process environment; a missing file is fine
    pub fn load_dotenv() {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => debug!("Ignoring unreadable .env: {}", e),
        }
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/rapporteur/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(|p| PathBuf::from(p).join(APP_NAME))
            .or_else(|| {
                ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
            })
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    /// Get project state directory
    pub fn project_dir() -> PathBuf {
        PathBuf::from(".rapporteur")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());

        let dotenv = PathBuf::from(".env");
        let exists = if dotenv.exists() { "✓" } else { "✗" };
        println!("  Env:     {} {}", exists, dotenv.display());
    }

    /// Render the effective configuration in the requested format
    pub fn render_config(config: &Config, format: &str) -> Result<String> {
        match format {
            "json" => Ok(serde_json::to_string_pretty(config)?),
            "yaml" => Ok(serde_yaml::to_string(config)?),
            "toml" => {
                toml::to_string_pretty(config).map_err(|e| RapportError::Config(e.to_string()))
            }
            other => Err(RapportError::Config(format!(
                "Unknown format: {}. Valid values: toml, json, yaml",
                other
            ))),
        }
    }

    /// Show current effective configuration
    pub fn show_config(format: &str) -> Result<()> {
        let config = Self::load()?;
        println!("{}", Self::render_config(&config, format)?);
        Ok(())
    }

    /// Edit config file with default editor
    pub fn edit_config(global: bool) -> Result<()> {
        let path = if global {
            Self::global_config_path().ok_or_else(|| {
                RapportError::Config("Cannot determine global config path".to_string())
            })?
        } else {
            Self::project_config_path()
        };

        if !path.exists() {
            println!("Config file does not exist: {}", path.display());
            println!(
                "Run: rapporteur config init {}",
                if global { "--global" } else { "" }
            );
            return Ok(());
        }

        let editor = env::var("EDITOR").unwrap_or_else(|_| {
            if cfg!(target_os = "macos") {
                "open".to_string()
            } else if cfg!(target_os = "windows") {
                "notepad".to_string()
            } else {
                "vi".to_string()
            }
        });

        let status = Command::new(&editor).arg(&path).status().map_err(|e| {
            RapportError::Config(format!("Failed to launch editor {}: {}", editor, e))
        })?;

        if !status.success() {
            return Err(RapportError::Config("Editor exited with error".to_string()));
        }

        println!("Config saved: {}", path.display());
        Ok(())
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            RapportError::Config("Cannot determine global config directory".to_string())
        })?;

        fs::create_dir_all(&global_dir)?;

        let config_path = global_dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_global_config())?;
            info!("Created global config: {}", config_path.display());
        } else {
            info!("Global config exists: {}", config_path.display());
        }

        Ok(global_dir)
    }

    /// Initialize project state directory and config under `root`
    pub fn init_project_at(root: &Path, force: bool) -> Result<PathBuf> {
        let project_dir = root.join(Self::project_dir());
        fs::create_dir_all(&project_dir)?;

        let config_path = project_dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_project_config())?;
            info!("Created project config: {}", config_path.display());
        }

        Ok(project_dir)
    }

    /// Initialize project configuration in the working directory
    pub fn init_project(force: bool) -> Result<PathBuf> {
        Self::init_project_at(Path::new("."), force)
    }

    /// Check if project is initialized
    pub fn is_project_initialized() -> bool {
        Self::project_dir().exists()
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn default_global_config() -> String {
        r#"# Rapporteur Global Configuration
# User-wide defaults. Project settings in .rapporteur/config.toml override these.
# Credentials belong in the environment or a .env file, not here.

version = "1.0"

[llm]
provider = "azure"
timeout_secs = 120
max_tokens = 4096
"#
        .to_string()
    }

    fn default_project_config() -> String {
        r#"# Rapporteur Project Configuration
# Project-specific settings that override global defaults.

version = "1.0"

[pipeline]
max_steps = 8
# Critic-driven returns to Research (0 keeps the run strictly linear)
revision_cycles = 0
# resume | rerun | none
recovery = "resume"

[storage]
reports_dir = "reports"
export_dir = "exports"
keep_last = 10

[search]
enabled = false
call_limit = 3
max_results = 2
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecoveryStrategy;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_without_files() {
        let temp_dir = TempDir::new().unwrap();
        let config =
            ConfigLoader::load_layers(None, &temp_dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.pipeline.max_steps, 8);
    }

    #[test]
    fn test_project_file_overrides_global() {
        let temp_dir = TempDir::new().unwrap();
        let global = temp_dir.path().join("global.toml");
        let project = temp_dir.path().join("project.toml");
        fs::write(&global, "[pipeline]\nmax_steps = 12\nrevision_cycles = 1\n").unwrap();
        fs::write(&project, "[pipeline]\nmax_steps = 10\nrecovery = \"none\"\n").unwrap();

        let config = ConfigLoader::load_layers(Some(&global), &project).unwrap();
        assert_eq!(config.pipeline.max_steps, 10);
        assert_eq!(config.pipeline.revision_cycles, 1);
        assert_eq!(config.pipeline.recovery, RecoveryStrategy::None);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[pipeline]\nmax_steps = 2\n").unwrap();
        assert!(ConfigLoader::load_from_file(&path).is_err());
    }

    #[test]
    fn test_init_project_writes_loadable_config() {
        let temp_dir = TempDir::new().unwrap();
        let dir = ConfigLoader::init_project_at(temp_dir.path(), false).unwrap();
        let config_path = dir.join("config.toml");
        assert!(config_path.exists());

        let config = ConfigLoader::load_from_file(&config_path).unwrap();
        assert_eq!(config.storage.keep_last, 10);
        assert!(!config.search.enabled);
    }

    #[test]
    fn test_render_formats() {
        let config = Config::default();
        assert!(
            ConfigLoader::render_config(&config, "toml")
                .unwrap()
                .contains("[pipeline]")
        );
        assert!(
            ConfigLoader::render_config(&config, "yaml")
                .unwrap()
                .contains("max_steps: 8")
        );
        assert!(ConfigLoader::render_config(&config, "xml").is_err());
    }
}
