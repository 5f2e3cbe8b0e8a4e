use std::sync::Arc;

use anyhow::{Context, Result};
use chorewatch::config::{ConfigSource, FileConfigSource};
use chorewatch::grocy;
use chorewatch::notify::{ConsolePresenter, DesktopPresenter, Presenter};
use chorewatch::scheduler::PollController;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "chorewatch",
    about = "Overdue chore watcher for Grocy",
    version,
    long_about = None
)]
struct Cli {
    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum Notifier {
    /// Native desktop notifications
    Desktop,
    /// Print to stdout
    Console,
}

impl Notifier {
    fn presenter(self) -> Arc<dyn Presenter> {
        match self {
            Notifier::Desktop => Arc::new(DesktopPresenter::new()),
            Notifier::Console => Arc::new(ConsolePresenter::new()),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Watch for overdue chores (timer + commands on stdin)
    Run {
        /// Where notifications go
        #[arg(long, value_enum, default_value = "desktop")]
        notifier: Notifier,
    },

    /// Check once and print overdue chores
    Check {
        /// Where the notification goes
        #[arg(long, value_enum, default_value = "console")]
        notifier: Notifier,
    },

    /// List Grocy users
    Users,

    /// Print the chores overview URL
    Web {
        /// Open it in the default browser
        #[arg(long)]
        open: bool,
    },

    /// Show the config file location and current values
    Config,
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let source = FileConfigSource::from_env().context("failed to locate config file")?;

    match cli.command {
        Commands::Run { notifier } => {
            tracing::info!("Starting chorewatch");
            chorewatch::serve(source, notifier.presenter()).await?;
        }
        Commands::Check { notifier } => {
            let controller = PollController::new(Arc::new(source), notifier.presenter());
            let outcome = controller.check_and_notify().await;
            if !outcome.completed {
                anyhow::bail!("check failed, see log for details");
            }
            if outcome.has_overdue() {
                println!("{} overdue tasks:", outcome.overdue_count);
                for name in &outcome.overdue_names {
                    println!("- {}", name);
                }
            } else {
                println!("No chores are currently overdue. Great job!");
            }
        }
        Commands::Users => {
            let config = source.load()?;
            let users = grocy::client::fetch_users(&config.grocy_url, &config.api_key).await?;
            if users.is_empty() {
                println!("No users found.");
            } else {
                println!("{:<5} | {:<20} | Name", "ID", "Username");
                println!("{:-<5}-|-{:-<20}-|-{:-<20}", "", "", "");
                for user in users {
                    println!("{:<5} | {:<20} | {}", user.id, user.username, user.label());
                }
            }
        }
        Commands::Web { open } => {
            let presenter: Arc<dyn Presenter> = if open {
                Arc::new(DesktopPresenter::new())
            } else {
                Arc::new(ConsolePresenter::new())
            };
            let controller = PollController::new(Arc::new(source), presenter.clone());
            // The user id for the link is learned from a cycle.
            controller.run_cycle().await;
            let url = controller.web_link().await?;
            presenter.open_url(&url).await?;
        }
        Commands::Config => {
            let config = source.load()?;
            if let Some(path) = source.path() {
                println!("Config file: {}", path.display());
            }
            println!("grocy_url             = {}", config.grocy_url);
            println!("api_key               = {}", config.masked_api_key());
            println!("username              = {}", config.username);
            println!("check_timeout_minutes = {}", config.check_timeout_minutes);
        }
    }

    Ok(())
}
