//! Init Command
//!
//! Create the project state directory, its config and the checkpoint store.

use crate::cli::util::RUNS_DB;
use crate::config::ConfigLoader;
use crate::report::SqliteCheckpointer;
use crate::types::{RapportError, Result};

pub fn run(force: bool) -> Result<()> {
    if ConfigLoader::is_project_initialized() && !force {
        return Err(RapportError::Config(
            "Already initialized. Use --force to overwrite.".to_string(),
        ));
    }

    let project_dir = ConfigLoader::init_project(force)?;

    // Global config is optional; never overwrite it from here
    if let Err(e) = ConfigLoader::init_global(false) {
        tracing::debug!("Global config init skipped: {}", e);
    }

    SqliteCheckpointer::open(project_dir.join(RUNS_DB))?;

    println!("✓ Initialized Rapporteur in {}/", project_dir.display());
    println!();
    println!("Next steps:");
    println!("  1. Put AZURE_OPENAI_* (or OPENAI_API_KEY) in .env");
    println!("  2. Run 'rapporteur generate \"<votre requête>\"'");
    Ok(())
}
