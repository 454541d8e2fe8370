use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coursegen::cli::commands::{
    self, CommonOptions, generate::GenerateOptions, render::RenderCommandOptions,
    schema::SchemaOptions,
};

#[derive(Parser)]
#[command(name = "coursegen")]
#[command(
    version,
    about = "Schema-constrained course content generator backed by an LLM"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Config file (replaces .coursegen/config.toml)")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

/// Flags shared by every pipeline command
#[derive(Args)]
struct PipelineArgs {
    #[arg(long, short, help = "Root directory for generated artifacts")]
    output: Option<PathBuf>,
    #[arg(long, help = "LLM provider (openai, ollama)")]
    provider: Option<String>,
    #[arg(long, help = "Model to use")]
    model: Option<String>,
    #[arg(long, help = "Render lists of objects as tables")]
    tables: bool,
}

impl PipelineArgs {
    fn into_common(self, config: Option<PathBuf>) -> CommonOptions {
        CommonOptions {
            config,
            provider: self.provider,
            model: self.model,
            output: self.output,
            tables: self.tables,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the full course: schema, lesson content and module documents
    Generate {
        #[arg(long, help = "Outline file (YAML or JSON)", conflicts_with = "interactive")]
        outline: Option<PathBuf>,
        #[arg(long, short, help = "Enter the outline interactively")]
        interactive: bool,
        #[arg(long, short, help = "General prompt describing the lesson structure")]
        prompt: Option<String>,
        #[arg(long, help = "Read the general prompt from a file", conflicts_with = "prompt")]
        prompt_file: Option<PathBuf>,
        #[arg(long, help = "Reuse topic artifacts persisted by an earlier run")]
        skip_existing: bool,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Synthesize and persist the lesson schema only
    Schema {
        #[arg(long, short, help = "General prompt describing the lesson structure")]
        prompt: Option<String>,
        #[arg(long, help = "Read the general prompt from a file", conflicts_with = "prompt")]
        prompt_file: Option<PathBuf>,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Re-render module documents from persisted topic artifacts
    Render {
        #[arg(long, help = "Outline file (YAML or JSON)")]
        outline: PathBuf,
        #[command(flatten)]
        pipeline: PipelineArgs,
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
        eprintln!("\x1b[31mcoursegen encountered an unexpected error:\x1b[0m");
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

    match cli.command {
        Commands::Generate {
            outline,
            interactive,
            prompt,
            prompt_file,
            skip_existing,
            pipeline,
        } => {
            commands::generate::run(GenerateOptions {
                common: pipeline.into_common(cli.config),
                outline,
                interactive,
                prompt,
                prompt_file,
                skip_existing,
            })?;
        }
        Commands::Schema {
            prompt,
            prompt_file,
            pipeline,
        } => {
            commands::schema::run(SchemaOptions {
                common: pipeline.into_common(cli.config),
                prompt,
                prompt_file,
            })?;
        }
        Commands::Render { outline, pipeline } => {
            commands::render::run(RenderCommandOptions {
                common: pipeline.into_common(cli.config),
                outline,
            })?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                commands::config::show(cli.config.as_deref(), &format)?;
            }
            ConfigAction::Path => {
                commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                if global {
                    commands::config::init_global(force)?;
                } else {
                    commands::config::init_project(force)?;
                }
            }
        },
    }

    Ok(())
}
