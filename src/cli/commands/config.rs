//! Config Command
//!
//! Usage:
//!   rapporteur config show [-g] [-f toml|json|yaml]
//!   rapporteur config path
//!   rapporteur config edit [-g]
//!   rapporteur config init [-g] [--force]

use crate::config::ConfigLoader;
use crate::types::Result;

/// Show the merged configuration, or the raw global file with `global`
pub fn show(global: bool, format: &str) -> Result<()> {
    if !global {
        return ConfigLoader::show_config(format);
    }

    match ConfigLoader::global_config_path() {
        Some(path) if path.exists() => {
            println!("# Global Config: {}\n", path.display());
            println!("{}", std::fs::read_to_string(&path)?);
        }
        Some(_) => {
            println!("No global config found.");
            println!("Run 'rapporteur config init --global' to create one.");
        }
        None => println!("Cannot determine global config directory."),
    }
    Ok(())
}

pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

pub fn edit(global: bool) -> Result<()> {
    ConfigLoader::edit_config(global)
}

pub fn init(global: bool, force: bool) -> Result<()> {
    if global {
        let dir = ConfigLoader::init_global(force)?;
        println!("✓ Initialized global configuration");
        println!("  Directory: {}", dir.display());
    } else {
        let dir = ConfigLoader::init_project(force)?;
        println!("✓ Initialized project configuration");
        println!("  Config: {}", dir.join("config.toml").display());
    }
    Ok(())
}
