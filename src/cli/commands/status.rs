//! Status Command
//!
//! Recent runs from the checkpoint store and a count of saved reports.

use crate::ai::{ProviderConfig, create_provider};
use crate::cli::util::CommandContext;
use crate::report::{Checkpointer, RunStatus, RunSummary};
use crate::storage::ReportIndex;
use crate::types::{Result, truncate_chars};

pub fn run(format: &str, limit: usize) -> Result<()> {
    let ctx = CommandContext::load()?;
    let runs = match ctx.existing_checkpointer()? {
        Some(checkpointer) => checkpointer.list(limit)?,
        None => Vec::new(),
    };
    let reports = if ctx.config.storage.reports_dir.exists() {
        ReportIndex::open(&ctx.config.storage.reports_dir)?
            .statistics()
            .total
    } else {
        0
    };

    if format == "json" {
        let status = serde_json::json!({
            "runs": runs,
            "reports": reports,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Rapporteur Status");
    println!("══════════════════════════════════════");
    println!("Rapports sauvegardés: {}", reports);
    println!();

    if runs.is_empty() {
        println!("Aucune exécution enregistrée.");
        return Ok(());
    }

    println!("Exécutions récentes:");
    for run in &runs {
        println!("{}", format_run(run));
        if let Some(error) = &run.last_error {
            println!("      erreur: {}", truncate_chars(error, 100));
        }
    }

    if runs.iter().any(|r| r.status == RunStatus::Failed) {
        println!();
        println!("Reprendre une exécution: rapporteur generate --resume <id>");
    }
    Ok(())
}

/// Probe the configured generation provider
pub async fn check_provider() -> Result<()> {
    let ctx = CommandContext::load()?;
    let provider = create_provider(&ProviderConfig::from_llm(&ctx.config.llm))?;

    let healthy = provider.health_check().await?;
    let mark = if healthy { "✓" } else { "✗" };
    println!("LLM: {} {} ({})", mark, provider.name(), provider.model());
    Ok(())
}

fn format_run(run: &RunSummary) -> String {
    let position = match (run.status, run.pending_stage) {
        (RunStatus::Completed, _) | (_, None) => "terminé".to_string(),
        (_, Some(stage)) => format!("à {}", stage.name()),
    };
    format!(
        "  {} [{}] {} | {} | {}",
        run.run_id,
        run.status,
        run.updated_at.format("%Y-%m-%d %H:%M"),
        position,
        truncate_chars(&run.request, 50)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Stage;
    use crate::types::RunId;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_format_run() {
        let at = Utc.with_ymd_and_hms(2024, 5, 17, 9, 3, 0).unwrap();
        let run = RunSummary {
            run_id: RunId::new("cli-1"),
            request: "Rédige un rapport".to_string(),
            status: RunStatus::Failed,
            pending_stage: Some(Stage::Math),
            last_error: Some("boom".to_string()),
            started_at: at,
            updated_at: at,
        };
        assert_eq!(
            format_run(&run),
            "  cli-1 [failed] 2024-05-17 09:03 | à Math | Rédige un rapport"
        );
    }
}
