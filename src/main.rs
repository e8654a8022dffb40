use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use smellscope::SmellKind;
use smellscope::cli::commands;
use smellscope::cli::{CommandContext, RunOptions};

/// Parse smell kind from string
fn parse_smell(s: &str) -> Result<SmellKind, String> {
    s.parse::<SmellKind>().map_err(|_| {
        let valid: Vec<&str> = SmellKind::ALL.iter().map(|smell| smell.slug()).collect();
        format!("Invalid smell '{}'. Valid values: {}", s, valid.join(", "))
    })
}

#[derive(Parser)]
#[command(name = "smellscope")]
#[command(
    version,
    about = "Benchmark LLM architectural smell detection against a static analyzer"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Config file (default: ./smellscope.toml)")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the project model from analyzer outputs
    Model {
        #[arg(help = "Project name under the repositories directory")]
        project: String,
    },

    /// Render detection prompts from the project model
    Prompts {
        project: String,
        #[arg(long, short, value_parser = parse_smell, help = "Only this smell")]
        smell: Option<SmellKind>,
    },

    /// Send prompts to an LLM engine
    Detect {
        project: String,
        #[arg(long, short, value_parser = parse_smell, help = "Only this smell")]
        smell: Option<SmellKind>,
        #[arg(
            long,
            short,
            help = "Engine name from the configuration (default: detection.default_engine)"
        )]
        engine: Option<String>,
    },

    /// Consolidate labels and score LLM detections against the analyzer
    Score {
        project: String,
        #[arg(long, short, value_parser = parse_smell, help = "Only this smell")]
        smell: Option<SmellKind>,
        #[arg(long, short, help = "Engine name from the configuration")]
        engine: Option<String>,
    },

    /// Run the whole pipeline over several projects
    Run {
        #[arg(long = "project", short, required = true, help = "Project to process (repeatable)")]
        projects: Vec<String>,
        #[arg(long, short, value_parser = parse_smell, help = "Only this smell")]
        smell: Option<SmellKind>,
        #[arg(long, short, help = "Engine name from the configuration")]
        engine: Option<String>,
        #[arg(long, help = "Call the LLM engine (otherwise score existing answers)")]
        detect: bool,
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
    /// Write ./smellscope.toml with the defaults
    Init {
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
        eprintln!("\x1b[31msmellscope encountered an unexpected error:\x1b[0m");
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
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

/// `Ok(false)` when the command finished but some units failed
fn run_cli() -> anyhow::Result<bool> {
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

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Config { action } => {
            match action {
                ConfigAction::Show { format } => commands::config::show(config_path, &format)?,
                ConfigAction::Path => commands::config::path()?,
                ConfigAction::Init { force } => commands::config::init(force)?,
            }
            Ok(true)
        }
        command => {
            let ctx = CommandContext::load(config_path)?;
            run_pipeline_command(&ctx, command)
        }
    }
}

fn run_pipeline_command(ctx: &CommandContext, command: Commands) -> anyhow::Result<bool> {
    match command {
        Commands::Model { project } => {
            commands::model::run(ctx, &project)?;
            Ok(true)
        }
        Commands::Prompts { project, smell } => {
            commands::prompts::run(ctx, &project, smell)?;
            Ok(true)
        }
        Commands::Detect {
            project,
            smell,
            engine,
        } => {
            let rt = Runtime::new()?;
            let failures =
                rt.block_on(commands::detect::run(ctx, &project, smell, engine.as_deref()))?;
            Ok(failures == 0)
        }
        Commands::Score {
            project,
            smell,
            engine,
        } => {
            commands::score::run(ctx, &project, smell, engine.as_deref())?;
            Ok(true)
        }
        Commands::Run {
            projects,
            smell,
            engine,
            detect,
        } => {
            let options = RunOptions {
                projects,
                smell,
                engine,
                detect,
            };
            let rt = Runtime::new()?;
            let failed = rt.block_on(commands::run::run(ctx, &options));
            Ok(failed.is_empty())
        }
        Commands::Config { .. } => Ok(true),
    }
}
