//! Deskpilot CLI - operator-driven desktop automation sessions
//!
//! Runs the Deskpilot session loop from the terminal. Decisions are made by
//! the operator, the desktop is read from a JSON description and actions are
//! executed as a dry run.

mod desktop;
mod operator;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use deskpilot_core::config::ConfigManager;
use deskpilot_core::experience::EXPERIENCE_DB;
use deskpilot_core::{
    Brains, CaptureFactory, Config, ExperienceIndex, RecordSummarizer, Session, SessionDeps,
    StateCapture, Status,
};

use desktop::{DryRunExecutor, JsonDesktopCapture};
use operator::{OperatorAppBrain, OperatorHostBrain, TerminalInteractor};

#[derive(Parser)]
#[command(name = "deskpilot")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Multi-agent desktop automation sessions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a session
    Run {
        /// Desktop description file
        #[arg(short, long, default_value = "desktop.json")]
        desktop: PathBuf,

        /// Task name, used for the log directory
        #[arg(short, long)]
        task: Option<String>,

        /// First request (prompted for when omitted)
        #[arg(short, long)]
        request: Option<String>,

        /// Follow the host plan step by step
        #[arg(long)]
        follower: bool,
    },

    /// Show configuration
    Config {
        /// Write the current configuration to the config file
        #[arg(long)]
        init: bool,
    },

    /// Work with saved experience
    #[command(subcommand)]
    Experience(ExperienceCommands),
}

#[derive(Subcommand)]
enum ExperienceCommands {
    /// Search saved experience
    Search {
        /// Query text
        query: String,

        /// Number of results
        #[arg(short = 'k', long, default_value_t = 3)]
        top_k: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    }
    .context("Failed to load configuration")?;

    // Logs go to stderr (warn by default so prompts stay readable) and to a
    // file under the log root at the configured level
    let _guard = init_logging(config_manager.config(), cli.verbose)?;

    match cli.command {
        Commands::Run {
            desktop,
            task,
            request,
            follower,
        } => {
            let mut config = config_manager.into_config();
            if follower {
                config.app_agent.follower_mode = true;
            }
            run_session(config, desktop, task, request).await?
        }
        Commands::Config { init } => show_config(&config_manager, init)?,
        Commands::Experience(ExperienceCommands::Search { query, top_k }) => {
            search_experience(config_manager.config(), &query, top_k)?
        }
    }

    Ok(())
}

fn init_logging(
    config: &Config,
    verbose: bool,
) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_root = &config.general.log_root;
    std::fs::create_dir_all(log_root)
        .with_context(|| format!("Failed to create log directory {}", log_root.display()))?;

    let file_appender = tracing_appender::rolling::never(log_root, "deskpilot.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_filter = if verbose {
        "info,deskpilot_core=debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::new(console_filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new(&config.general.log_level)),
        )
        .init();

    Ok(guard)
}

async fn run_session(
    config: Config,
    desktop: PathBuf,
    task: Option<String>,
    request: Option<String>,
) -> anyhow::Result<()> {
    let task = task.unwrap_or_else(|| chrono::Local::now().format("%Y%m%d-%H%M%S").to_string());

    let capture_factory: CaptureFactory = {
        let desktop = desktop.clone();
        Arc::new(move || Box::new(JsonDesktopCapture::new(desktop.clone())) as Box<dyn StateCapture>)
    };
    let deps = SessionDeps {
        brains: Brains {
            host: Arc::new(OperatorHostBrain),
            app: Arc::new(OperatorAppBrain),
        },
        executor: Arc::new(DryRunExecutor),
        capture_factory,
        interactor: Box::new(TerminalInteractor::new(request)),
        summarizer: Arc::new(RecordSummarizer),
    };

    let mut session = Session::new(task, Arc::new(config), deps).context("Failed to start session")?;
    println!(
        "{} {} {}",
        style("Session").bold(),
        style(session.task()).cyan(),
        style(format!("(logs in {})", session.log_dir().display())).dim()
    );

    let status = loop {
        match session.run().await {
            Ok(status) => break status,
            Err(e) if e.is_fatal() => return Err(e).context("Session aborted"),
            Err(e) => {
                println!("{}", style(format!("Error: {}", e)).red());
                let retry = Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt("Retry the last step?")
                    .default(true)
                    .interact()?;
                if !retry {
                    break session.status();
                }
            }
        }
    };

    let summary = match status {
        Status::Complete => style(format!("Session complete after {} steps", session.step())).green(),
        Status::MaxStepReached => style(format!("Stopped at the step limit ({})", session.step())).yellow(),
        other => style(format!("Session ended with status {}", other)).red(),
    };
    println!("{}", summary);
    Ok(())
}

fn show_config(config_manager: &ConfigManager, init: bool) -> anyhow::Result<()> {
    if init {
        config_manager.save().context("Failed to write configuration")?;
        println!(
            "{} {}",
            style("Wrote").green(),
            config_manager.config_path().display()
        );
    }

    println!("{}", style("Configuration:").bold());
    println!();
    println!(
        "  Config file: {}",
        style(config_manager.config_path().display()).green()
    );
    println!();
    let content = toml::to_string_pretty(config_manager.config())?;
    for line in content.lines() {
        println!("  {}", line);
    }
    Ok(())
}

fn search_experience(config: &Config, query: &str, top_k: usize) -> anyhow::Result<()> {
    let db = config.experience.saved_path.join(EXPERIENCE_DB);
    if !ExperienceIndex::exists(&db) {
        println!("  {}", style(format!("No experience saved in {}", db.display())).dim());
        return Ok(());
    }

    let index = ExperienceIndex::load(&db).context("Failed to load experience index")?;
    let hits = index.search(query, top_k);
    if hits.is_empty() {
        println!("  {}", style("No matching experience").dim());
        return Ok(());
    }

    for hit in hits {
        println!(
            "{} {}",
            style(format!("[{:.2}]", hit.score)).cyan(),
            style(&hit.summary.request).bold()
        );
        println!("{}", style(hit.summary.as_example()).dim());
        println!();
    }
    Ok(())
}
