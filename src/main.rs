use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rapporteur::cli::commands::calc::Operation;

#[derive(Parser)]
#[command(name = "rapporteur")]
#[command(
    version,
    about = "Multi-agent French report generator (Outline → Research → Math → Critic → Writer)"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a report for a request (default request when omitted)
    Generate {
        #[arg(help = "Report request")]
        request: Vec<String>,
        #[arg(long = "no-save", help = "Print the report instead of saving it")]
        no_save: bool,
        #[arg(long = "no-open", help = "Do not open the saved report")]
        no_open: bool,
        #[arg(long, value_name = "RUN_ID", help = "Resume a recorded run")]
        resume: Option<String>,
        #[arg(long, help = "LLM provider (azure, openai)")]
        provider: Option<String>,
        #[arg(long, help = "Model or deployment to use")]
        model: Option<String>,
    },

    /// Manage saved reports
    Reports {
        #[command(subcommand)]
        action: ReportsAction,
    },

    /// Query the encyclopedia search tool
    Search {
        #[arg(help = "Search query")]
        query: String,
        #[arg(long, help = "Maximum number of summaries")]
        max_results: Option<usize>,
        #[arg(long, help = "Summary language")]
        lang: Option<String>,
    },

    /// Show recorded runs
    Status {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
        #[arg(short = 'n', long, default_value = "10", help = "Runs to list")]
        limit: usize,
        #[arg(long, help = "Also probe the configured LLM provider")]
        check: bool,
    },

    /// Initialize Rapporteur in the current directory
    Init {
        #[arg(long, short, help = "Overwrite existing initialization")]
        force: bool,
    },

    /// Clean up Rapporteur state
    Clean {
        #[arg(long, help = "Remove the whole state directory")]
        all: bool,
        #[arg(long, help = "Only clear recorded runs")]
        runs: bool,
    },

    /// Arithmetic tools
    Calc {
        #[command(subcommand)]
        action: CalcAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ReportsAction {
    /// List recent reports
    List {
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },
    /// Show report statistics
    Stats,
    /// Delete all but the most recent reports
    Clean {
        #[arg(long, help = "Reports to keep (default: storage.keep_last)")]
        keep: Option<usize>,
    },
    /// Copy a report with an export header
    Export {
        #[arg(long)]
        id: u64,
        #[arg(long, help = "Destination directory (default: storage.export_dir)")]
        export_dir: Option<PathBuf>,
    },
    /// Delete one report
    Delete {
        #[arg(long)]
        id: u64,
    },
}

#[derive(Subcommand)]
enum CalcAction {
    Add { a: f64, b: f64 },
    Multiply { a: f64, b: f64 },
    Divide { a: f64, b: f64 },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json, yaml"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Edit configuration file with $EDITOR
    Edit {
        #[arg(long, short, help = "Edit global config")]
        global: bool,
    },
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mRapporteur encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Default hook prints the backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Progress goes to stdout; logs stay quiet unless asked for
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    use rapporteur::cli::commands;

    match cli.command {
        Commands::Generate {
            request,
            no_save,
            no_open,
            resume,
            provider,
            model,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::generate::run(commands::generate::GenerateOptions {
                request,
                save: !no_save,
                open: !no_open,
                resume,
                provider,
                model,
            }))?;
        }
        Commands::Reports { action } => match action {
            ReportsAction::List { limit } => commands::reports::list(limit)?,
            ReportsAction::Stats => commands::reports::stats()?,
            ReportsAction::Clean { keep } => commands::reports::clean(keep)?,
            ReportsAction::Export { id, export_dir } => {
                commands::reports::export(id, export_dir)?;
            }
            ReportsAction::Delete { id } => commands::reports::delete(id)?,
        },
        Commands::Search {
            query,
            max_results,
            lang,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::search::run(&query, max_results, lang))?;
        }
        Commands::Status {
            format,
            limit,
            check,
        } => {
            commands::status::run(&format, limit)?;
            if check {
                let rt = Runtime::new()?;
                rt.block_on(commands::status::check_provider())?;
            }
        }
        Commands::Init { force } => {
            commands::init::run(force)?;
        }
        Commands::Clean { all, runs } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::clean::run(all, runs))?;
        }
        Commands::Calc { action } => {
            let (op, a, b) = match action {
                CalcAction::Add { a, b } => (Operation::Add, a, b),
                CalcAction::Multiply { a, b } => (Operation::Multiply, a, b),
                CalcAction::Divide { a, b } => (Operation::Divide, a, b),
            };
            commands::calc::run(op, a, b)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { global, format } => {
                commands::config::show(global, &format)?;
            }
            ConfigAction::Path => {
                commands::config::path()?;
            }
            ConfigAction::Edit { global } => {
                commands::config::edit(global)?;
            }
            ConfigAction::Init { global, force } => {
                commands::config::init(global, force)?;
            }
        },
    }

    Ok(())
}
