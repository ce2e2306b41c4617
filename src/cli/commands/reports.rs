//! Reports Command
//!
//! Manage generated reports through the index.
//!
//! Usage:
//!   rapporteur reports list [--limit N]
//!   rapporteur reports stats
//!   rapporteur reports clean [--keep N]
//!   rapporteur reports export --id N [--export-dir D]
//!   rapporteur reports delete --id N

use std::path::PathBuf;

use crate::cli::ui::{Output, format_bytes};
use crate::cli::util::CommandContext;
use crate::storage::{ReportEntry, ReportIndex};
use crate::types::{RapportError, Result, truncate_chars};

fn open_index(ctx: &CommandContext) -> Result<ReportIndex> {
    ReportIndex::open(&ctx.config.storage.reports_dir)
}

pub fn list(limit: usize) -> Result<()> {
    let ctx = CommandContext::load()?;
    let index = open_index(&ctx)?;
    let reports = index.list(limit);

    if reports.is_empty() {
        println!("Aucun rapport trouvé.");
        return Ok(());
    }

    println!("\n{} derniers rapports:\n", reports.len());
    println!("{:<5} {:<20} {:<10} {:<50}", "ID", "Date", "Taille", "Requête");
    println!("{}", "-".repeat(85));
    for report in reports {
        println!("{}", format_row(report));
    }
    Ok(())
}

fn format_row(report: &ReportEntry) -> String {
    let date = truncate_chars(&report.created_at, 19).replace('T', " ");
    let query = if report.query.chars().count() > 47 {
        format!("{}...", truncate_chars(&report.query, 47))
    } else {
        report.query.clone()
    };
    format!(
        "{:<5} {:<20} {:<10} {:<50}",
        report.id,
        date,
        format_bytes(report.size),
        query
    )
}

pub fn stats() -> Result<()> {
    let ctx = CommandContext::load()?;
    let stats = open_index(&ctx)?.statistics();

    println!("\nStatistiques des rapports:\n");
    println!("  Total: {} rapports", stats.total);
    println!("  Taille totale: {} octets", format_bytes(stats.total_size));
    if stats.total > 0 {
        println!("  Taille moyenne: {} octets", format_bytes(stats.average_size));
        println!("  Plus ancien: {}", stats.oldest.unwrap_or_default());
        println!("  Plus récent: {}", stats.newest.unwrap_or_default());
        println!("  Markdown: {}", stats.markdown);
    }
    Ok(())
}

pub fn clean(keep: Option<usize>) -> Result<()> {
    let ctx = CommandContext::load()?;
    let keep = keep.unwrap_or(ctx.config.storage.keep_last);
    let deleted = open_index(&ctx)?.clean(keep)?;

    println!("{} anciens rapports supprimés.", deleted);
    println!("   {} derniers rapports conservés.", keep);
    Ok(())
}

pub fn export(id: u64, export_dir: Option<PathBuf>) -> Result<()> {
    let ctx = CommandContext::load()?;
    let export_dir = export_dir.unwrap_or_else(|| ctx.config.storage.export_dir.clone());

    match open_index(&ctx)?.export(id, &export_dir)? {
        Some(dest) => {
            Output::new().success(&format!("Rapport exporté: {}", dest.display()));
            Ok(())
        }
        None => Err(RapportError::NotFound(format!("Rapport {} introuvable", id))),
    }
}

pub fn delete(id: u64) -> Result<()> {
    let ctx = CommandContext::load()?;
    if open_index(&ctx)?.delete(id)? {
        Output::new().success(&format!("Rapport {} supprimé", id));
        Ok(())
    } else {
        Err(RapportError::NotFound(format!("Rapport {} introuvable", id)))
    }
}
