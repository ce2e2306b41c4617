//! Generate Command
//!
//! Runs the pipeline for one request, resolves the final text and hands it to
//! the report store.

use std::sync::Arc;

use serde_json::json;

use crate::ai::{ProviderConfig, create_provider};
use crate::cli::ui::{Output, format_bytes};
use crate::cli::util::{CommandContext, open_command, open_in_default_app};
use crate::cli::{ConsoleRenderer, ProgressTracker};
use crate::config::Config;
use crate::constants::report::{DEFAULT_REQUEST, PREVIEW_CHARS};
use crate::report::{
    AgentSet, CritiqueView, FallbackResolver, MathView, OutlineView, ReportPipeline,
    ResolvedReport, RunState, Slot,
};
use crate::storage::{ReportIndex, ReportStore, preview};
use crate::tools::{CallBudget, WikiSearch};
use crate::types::{RapportError, Result, RunId, truncate_chars};

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Request words; empty means the default request
    pub request: Vec<String>,
    pub save: bool,
    pub open: bool,
    pub resume: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
}

impl GenerateOptions {
    fn request(&self) -> String {
        let joined = self.request.join(" ");
        if joined.trim().is_empty() {
            DEFAULT_REQUEST.to_string()
        } else {
            joined
        }
    }
}

pub async fn run(options: GenerateOptions) -> Result<()> {
    let ctx = CommandContext::load()?;
    let config = &ctx.config;
    let output = Output::new();

    // Credentials are checked here, before any stage runs
    let provider_config = ProviderConfig::from_llm(&config.llm)
        .with_overrides(options.provider.as_deref(), options.model.as_deref());
    let provider = create_provider(&provider_config)?;

    let search = if config.search.enabled {
        let budget = Arc::new(CallBudget::new(config.search.call_limit));
        Some(Arc::new(WikiSearch::new(budget, config.search.timeout_secs)?))
    } else {
        None
    };

    let tracker = ProgressTracker::new();
    let renderer = ConsoleRenderer::new(tracker.clone()).spawn();
    let agents = AgentSet::new(provider, config, search);
    let pipeline = ReportPipeline::new(agents, config.pipeline.clone())
        .with_checkpointer(Arc::new(ctx.checkpointer()?))
        .with_progress(tracker);

    let mut state = match &options.resume {
        Some(run_id) => pipeline.load(&RunId::new(run_id.as_str()))?,
        None => pipeline.start(&options.request()),
    };

    println!("\nConfiguration:");
    println!("  - Sauvegarde fichier: {}", yes_no(options.save));
    println!("  - Ouverture auto: {}", yes_no(options.open));
    println!("  - Exécution: {}", state.run_id);
    println!("\nRequête: {}...", truncate_chars(state.request(), 100));

    output.banner("GÉNÉRATION DU RAPPORT EN COURS...");
    println!("\nProgression:\n");

    if let Err(e) = pipeline.run(&mut state).await {
        tracing::warn!("Pipeline stopped early: {}", e);
        output.warning(&format!("Pipeline interrompu: {}", e));
    }

    let resolved = FallbackResolver::new(&pipeline, config.pipeline.recovery)
        .resolve(&mut state)
        .await;

    // Dropping the last tracker closes the channel and ends the renderer
    drop(pipeline);
    if let Err(e) = renderer.await {
        tracing::debug!("Progress renderer ended abnormally: {}", e);
    }

    println!("\n{}", "=".repeat(60));

    match resolved {
        Ok(report) => {
            print_run_summary(&state);
            deliver(&report, &state, &options, config, &output)?;
            println!("\n✨ Processus terminé!");
            Ok(())
        }
        Err(RapportError::NoReport) => {
            output.error("ERREUR: Aucun rapport n'a pu être généré.");
            println!("   Vérifiez la progression ci-dessus pour identifier le problème.");
            println!(
                "   Reprise possible: rapporteur generate --resume {}",
                state.run_id
            );
            Err(RapportError::NoReport)
        }
        Err(e) => Err(e),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Oui" } else { "Non" }
}

/// One line per structured slot that parsed
fn print_run_summary(state: &RunState) {
    if let Some(outline) = OutlineView::parse(state.slot(Slot::Outline)) {
        println!(
            "\nPlan: {} ({} sections)",
            outline.title,
            outline.sections.len()
        );
    }
    if let Some(math) = MathView::parse(state.slot(Slot::Math)) {
        println!("Calculs: {}", math.computations.len());
    }
    if let Some(critique) = CritiqueView::parse(state.slot(Slot::Critique)) {
        println!(
            "Critique: {} bloquants, {} avertissements",
            critique.blocking_issues.len(),
            critique.warnings.len()
        );
    }
    if state.revisions() > 0 {
        println!("Révisions: {}", state.revisions());
    }
}

fn deliver(
    report: &ResolvedReport,
    state: &RunState,
    options: &GenerateOptions,
    config: &Config,
    output: &Output,
) -> Result<()> {
    if !report.source.is_complete() {
        output.warning("Rapport partiel: texte extrait du journal des messages");
    }

    output.section(&format!(
        "APERÇU DU RAPPORT ({} premiers caractères):",
        PREVIEW_CHARS
    ));
    println!("{}...", preview(&report.text, PREVIEW_CHARS));
    output.rule();

    if !options.save {
        output.banner("RAPPORT COMPLET:");
        println!("{}", report.text);
        println!("{}", "=".repeat(60));
        return Ok(());
    }

    let request = state.request();
    let saved = ReportStore::new(&config.storage.reports_dir).save(&report.text, request)?;
    let mut index = ReportIndex::open(&config.storage.reports_dir)?;
    let id = index.add(
        &saved.path,
        request,
        json!({
            "run_id": state.run_id.as_str(),
            "source": report.source.as_str(),
            "steps": state.steps(),
            "revisions": state.revisions(),
        }),
    )?;

    println!();
    output.success("RAPPORT SAUVEGARDÉ AVEC SUCCÈS!");
    println!("Fichier: {}", saved.path.display());
    println!("Index: #{}", id);
    println!("Taille: {} octets", format_bytes(saved.size));
    println!("Contenu: {} lignes, {} mots", saved.lines, saved.words);

    if options.open {
        match open_in_default_app(&saved.path) {
            Ok(()) => println!("Ouverture du fichier dans l'éditeur par défaut..."),
            Err(e) => {
                let (program, args) = open_command(&saved.path);
                println!("Impossible d'ouvrir automatiquement: {}", e);
                println!("\nPour ouvrir le fichier:");
                println!("   {} {}", program, args.join(" "));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_request_when_empty() {
        let options = GenerateOptions::default();
        assert_eq!(options.request(), DEFAULT_REQUEST);

        let options = GenerateOptions {
            request: vec!["  ".to_string()],
            ..GenerateOptions::default()
        };
        assert_eq!(options.request(), DEFAULT_REQUEST);
    }

    #[test]
    fn test_request_words_joined() {
        let options = GenerateOptions {
            request: vec!["Rédige".into(), "un".into(), "rapport".into()],
            ..GenerateOptions::default()
        };
        assert_eq!(options.request(), "Rédige un rapport");
    }
}
