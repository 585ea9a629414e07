use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use finbalance_core::today_in;
use finbalance_finance::{
    EvolutionGateway, FinancialSummaryEngine, MemoryStore, MessageClassifier, RecordStore,
    SqliteStore, WebhookOrchestrator, WebhookSettings,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod records_cmd;
mod server;
mod state;

use config::Config;
use records_cmd::{GatewayCommand, ProfileCommand, TypeFilter};

#[derive(Parser, Debug)]
#[command(
    name = "finbalance",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("FINBALANCE_BUILD_SHA"), ")"),
    about = "FinBalance WhatsApp finance assistant"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the webhook endpoint
    Serve {
        /// Listen address (default from config, 0.0.0.0:8080)
        #[arg(long)]
        bind: Option<String>,

        /// Keep records in memory instead of SQLite
        #[arg(long, default_value_t = false)]
        memory: bool,
    },

    /// Classify one message and print the parsed intent as JSON
    Classify { text: String },

    /// Print the reply a question would get this month
    Summary {
        #[arg(long)]
        user: String,

        /// Question text; picks the report (default: quick summary)
        #[arg(long)]
        question: Option<String>,
    },

    /// Phone links
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },

    /// Per-account Evolution API settings
    Gateway {
        #[command(subcommand)]
        command: GatewayCommand,
    },

    /// Inbound message history, newest first
    Messages {
        #[arg(long = "type", value_enum)]
        kind: Option<TypeFilter>,

        /// Match message text or phone number
        #[arg(long)]
        search: Option<String>,

        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    /// Write or print ~/.finbalance/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config (file plus environment overrides)
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind, memory } => {
            let cfg = config::load_config()?;
            serve(cfg, bind, memory).await?;
        }

        Command::Classify { text } => {
            let classifier = MessageClassifier::new()?;
            let parsed = classifier.classify(&text);
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }

        Command::Summary { user, question } => {
            let cfg = config::load_config()?;
            let store = open_store(&cfg, false)?;
            let today = today_in(cfg.locale.timezone.as_deref())?;
            let engine = FinancialSummaryEngine::new()?;
            let question = question.unwrap_or_default();
            println!("{}", engine.answer(store.as_ref(), &user, &question, today));
            let health = engine.totals(store.as_ref(), &user, today).health();
            println!("\n{} {}", health.emoji(), health.label());
        }

        Command::Profile { command } => {
            let cfg = config::load_config()?;
            let store = open_store(&cfg, false)?;
            records_cmd::run_profile(store.as_ref(), command)?;
        }

        Command::Gateway { command } => {
            let cfg = config::load_config()?;
            let store = open_store(&cfg, false)?;
            records_cmd::run_gateway(store.as_ref(), command)?;
        }

        Command::Messages {
            kind,
            search,
            limit,
        } => {
            let cfg = config::load_config()?;
            let store = open_store(&cfg, false)?;
            records_cmd::run_messages(store.as_ref(), kind, search, limit)?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },
    }

    Ok(())
}

fn open_store(cfg: &Config, memory: bool) -> Result<Arc<dyn RecordStore>> {
    if memory {
        return Ok(Arc::new(MemoryStore::new()));
    }
    let path = cfg.db_path()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    let store =
        SqliteStore::open(&path).with_context(|| format!("open database {}", path.display()))?;
    info!(path = %path.display(), "opened record store");
    Ok(Arc::new(store))
}

async fn serve(cfg: Config, bind: Option<String>, memory: bool) -> Result<()> {
    // fail on a bad zone name now rather than on the first webhook
    today_in(cfg.locale.timezone.as_deref())?;

    let store = open_store(&cfg, memory)?;
    let http = reqwest::Client::new();
    let settings = WebhookSettings {
        fallback_gateway: cfg.fallback_gateway(),
    };
    if settings.fallback_gateway.is_none() {
        info!("no fallback gateway configured; unregistered senders get no reply");
    }
    let orchestrator =
        WebhookOrchestrator::new(store, Arc::new(EvolutionGateway::new(http)), settings)?;

    let state = server::AppState {
        orchestrator: Arc::new(orchestrator),
        timezone: cfg.locale.timezone.clone(),
    };
    let bind = bind.unwrap_or(cfg.server.bind);
    server::serve(&bind, state).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_messages_filters() {
        let cli = Cli::try_parse_from([
            "finbalance", "messages", "--type", "none", "--search", "uber", "--limit", "5",
        ])
        .unwrap();
        match cli.command {
            Command::Messages {
                kind,
                search,
                limit,
            } => {
                assert_eq!(kind, Some(TypeFilter::None));
                assert_eq!(search.as_deref(), Some("uber"));
                assert_eq!(limit, 5);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_open_store_creates_sqlite_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config::default();
        cfg.storage.db_path = Some(dir.path().join("nested").join("fb.db"));
        let store = open_store(&cfg, false).unwrap();
        assert!(store.find_user_by_phone("5511").unwrap().is_none());
        assert!(dir.path().join("nested").join("fb.db").exists());
    }
}
