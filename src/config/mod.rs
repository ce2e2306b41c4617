//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/rapporteur/config.toml)
//! 3. Project config (.rapporteur/config.toml)
//! 4. Environment variables (RAPPORTEUR_*, nested with `__`)
//! 5. CLI arguments (highest priority)

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
