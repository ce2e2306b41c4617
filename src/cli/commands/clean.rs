//! Clean Command
//!
//! Clears run checkpoints or the whole state directory. Saved reports are
//! managed with `reports clean` instead.

use crate::cli::util::CommandContext;
use crate::types::Result;

pub async fn run(all: bool, runs: bool) -> Result<()> {
    let ctx = CommandContext::load()?;
    let state_dir = ctx.config.storage.state_dir.clone();

    if all {
        if state_dir.exists() {
            tokio::fs::remove_dir_all(&state_dir).await?;
            println!("✓ Removed {}/", state_dir.display());
        } else {
            println!("Nothing to clean.");
        }
        return Ok(());
    }

    if runs {
        match ctx.existing_checkpointer()? {
            Some(checkpointer) => {
                let deleted = checkpointer.database().delete_runs()?;
                println!("✓ Cleared {} recorded runs", deleted);
            }
            None => println!("No recorded runs."),
        }
        return Ok(());
    }

    println!("Specify what to clean: --runs or --all");
    Ok(())
}
