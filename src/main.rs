use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repodoc::cli::commands::{SourceArgs, generate::GenerateOptions, scan::ScanOptions};
use repodoc::types::DocumentKind;

#[derive(Parser)]
#[command(name = "repodoc")]
#[command(
    version,
    about = "Generate handover documentation and READMEs from source repositories"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Config file used in place of .repodoc.toml")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(clap::Args)]
#[group(required = true, multiple = false)]
struct SourceFlags {
    #[arg(long, help = "GitHub URL, optionally with /tree/<ref>/<path>")]
    repo: Option<String>,
    #[arg(long, help = "Local directory to walk")]
    path: Option<PathBuf>,
    #[arg(long, help = "File of aggregated source, or - for stdin")]
    input: Option<PathBuf>,
}

impl From<SourceFlags> for SourceArgs {
    fn from(flags: SourceFlags) -> Self {
        SourceArgs {
            repo: flags.repo,
            path: flags.path,
            input: flags.input,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a handover document or README
    Generate {
        #[command(flatten)]
        source: SourceFlags,

        #[arg(long, help = "LLM provider (openai, openrouter, groq, ollama)")]
        provider: Option<String>,
        #[arg(long, help = "Model to use")]
        model: Option<String>,
        #[arg(long, env = "REPODOC_API_KEY", hide_env_values = true, help = "Provider API key")]
        api_key: Option<String>,
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, help = "GitHub token")]
        github_token: Option<String>,
        #[arg(long, help = "Sampling temperature (0.0-2.0)")]
        temperature: Option<f32>,
        #[arg(long, help = "Output token ceiling for the final document")]
        max_tokens: Option<usize>,
        #[arg(long, help = "Largest input sent in one call")]
        max_input_tokens: Option<usize>,
        #[arg(long, help = "Tokens-per-minute budget")]
        tpm: Option<usize>,
        #[arg(long, help = "Output token ceiling per batch summary")]
        summary_tokens: Option<usize>,
        #[arg(long, help = "Always summarize in batches before composing")]
        hierarchical: bool,
        #[arg(long, value_parser = parse_kind, help = "Document kind: handover, readme")]
        kind: Option<DocumentKind>,
        #[arg(long, help = "Document title")]
        title: Option<String>,
        #[arg(long, help = "Primary owner")]
        owner: Option<String>,
        #[arg(long, help = "Free-text context for the prompts")]
        context: Option<String>,
        #[arg(long, short, help = "Write the document to a file instead of stdout")]
        output: Option<PathBuf>,
        #[arg(long, help = "Emit the deterministic baseline without calling a provider")]
        baseline_only: bool,
    },

    /// Fetch sources and write the aggregated text
    Scan {
        #[command(flatten)]
        source: SourceFlags,

        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, help = "GitHub token")]
        github_token: Option<String>,
        #[arg(long, help = "Maximum files to fetch")]
        max_files: Option<usize>,
        #[arg(long, help = "Per-file byte ceiling")]
        max_bytes: Option<usize>,
        #[arg(long, help = "Parallel fetches")]
        concurrency: Option<usize>,
        #[arg(long, short, help = "Write to a file instead of stdout")]
        output: Option<PathBuf>,
        #[arg(long, help = "Print statistics only")]
        stats_only: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
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
            help = "Output format: toml, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

fn parse_kind(s: &str) -> Result<DocumentKind, String> {
    s.parse()
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
        eprintln!("\x1b[31mrepodoc encountered an unexpected error:\x1b[0m");
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

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
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

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let show_progress = !cli.quiet;

    match cli.command {
        Commands::Generate {
            source,
            provider,
            model,
            api_key,
            github_token,
            temperature,
            max_tokens,
            max_input_tokens,
            tpm,
            summary_tokens,
            hierarchical,
            kind,
            title,
            owner,
            context,
            output,
            baseline_only,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(repodoc::cli::commands::generate::run(GenerateOptions {
                source: source.into(),
                config_path: cli.config,
                provider,
                model,
                api_key,
                github_token,
                temperature,
                max_tokens,
                max_input_tokens,
                tpm,
                summary_tokens,
                hierarchical,
                kind,
                title,
                owner,
                context,
                output,
                baseline_only,
                show_progress,
            }))?;
        }
        Commands::Scan {
            source,
            github_token,
            max_files,
            max_bytes,
            concurrency,
            output,
            stats_only,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(repodoc::cli::commands::scan::run(ScanOptions {
                source: source.into(),
                config_path: cli.config,
                github_token,
                max_files,
                max_bytes,
                concurrency,
                output,
                stats_only,
                show_progress,
            }))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { global, format } => {
                repodoc::cli::commands::config::show(global, &format, cli.config.as_deref())?;
            }
            ConfigAction::Path => {
                repodoc::cli::commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                if global {
                    repodoc::cli::commands::config::init_global(force)?;
                } else {
                    repodoc::cli::commands::config::init_project(force)?;
                }
            }
        },
    }

    Ok(())
}
