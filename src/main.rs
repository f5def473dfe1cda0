use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use kasool::app::console;
use kasool::claude::{ApiKeyManager, ClaudeClient, TextGenerator, check_connection};
use kasool::config::{FileStore, Language};
use kasool::search::{CategoryFilter, group_by_subject};
use kasool::{App, Catalog, Clock, Config};
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kasool")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Catalog file to use instead of the configured or built-in one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Content language (ar or fr)
    #[arg(long, global = true)]
    lang: Option<Language>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List subjects with progress
    Subjects,
    /// List a subject's materials
    Materials {
        /// Subject id
        subject: String,
        /// Only this category (lesson, summary, video, series, exam, assignment)
        #[arg(short, long, default_value = "all")]
        category: CategoryFilter,
        /// Only materials matching this text
        #[arg(short, long, default_value = "")]
        query: String,
    },
    /// Search the whole catalog
    Search {
        /// Text to look for
        query: String,
    },
    /// Open a material and track reading time until Ctrl-C
    Open {
        /// Material id
        material: String,
        /// Print links and exit without tracking reading time
        #[arg(long)]
        no_watch: bool,
    },
    /// Take a material's quiz, generating one if needed
    Quiz {
        /// Material id
        material: String,
    },
    /// Chat with the study assistant
    Chat,
    /// Show progress for one subject or all of them
    Progress {
        /// Subject id
        subject: Option<String>,
    },
    /// Manage the API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
    /// Show the config file location and contents
    Config,
}

#[derive(Subcommand)]
enum KeyAction {
    /// Store a key in the system keyring (read from stdin if omitted)
    Set { key: Option<String> },
    /// Remove the stored key
    Clear,
    /// Show where the key comes from
    Status {
        /// Also send a minimal request to check the service accepts it
        #[arg(long)]
        check: bool,
    },
}

fn load_catalog(path: Option<&PathBuf>, config: &Config) -> Result<Catalog> {
    let catalog = match path.or(config.catalog_path.as_ref()) {
        Some(path) => Catalog::load(path),
        None => Catalog::builtin(),
    };
    catalog.context("Failed to load catalog")
}

fn connect(config: &Config) -> Option<Arc<dyn TextGenerator>> {
    let (key, source) = match ApiKeyManager::resolve(&config.api_key_env) {
        Ok(found) => found,
        Err(e) => {
            tracing::debug!("No generation service: {}", e);
            return None;
        }
    };

    match ClaudeClient::new(key, config.model, config.request_timeout()) {
        Ok(client) => {
            tracing::debug!("Using {} with key from {}", config.model.display_name(), source);
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!("Generation service unavailable: {}", e);
            None
        }
    }
}

async fn run_key(action: KeyAction, config: &Config) -> Result<()> {
    match action {
        KeyAction::Set { key } => {
            let key = match key {
                Some(key) => key,
                None => {
                    print!("API key: ");
                    std::io::stdout().flush()?;
                    let mut line = String::new();
                    std::io::stdin().read_line(&mut line)?;
                    line
                }
            };
            ApiKeyManager::set_api_key(&key)?;
            println!("Stored {}", ApiKeyManager::mask_key(key.trim()));
        }
        KeyAction::Clear => {
            ApiKeyManager::delete_api_key()?;
            println!("API key removed");
        }
        KeyAction::Status { check } => match ApiKeyManager::resolve(&config.api_key_env) {
            Ok((key, source)) => {
                println!("{} (from {})", ApiKeyManager::mask_key(&key), source);
                if check {
                    let client = ClaudeClient::new(key, config.model, config.request_timeout())?;
                    match check_connection(&client, config.request_timeout()).await {
                        Ok(()) => println!("Key accepted by {}", config.model.display_name()),
                        Err(e) => println!("{}", e.user_message()),
                    }
                }
            }
            Err(e) => println!("{}", e.user_message()),
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so listings stay clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kasool=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let Cli { catalog, lang, command } = Cli::parse();
    let mut config = Config::load()?;
    if let Some(language) = lang {
        config.language = language;
    }

    let command = match command {
        Commands::Key { action } => return run_key(action, &config).await,
        Commands::Config => {
            println!("{}", Config::config_path()?.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
            return Ok(());
        }
        other => other,
    };

    let catalog = load_catalog(catalog.as_ref(), &config)?;
    let store = FileStore::open(Config::progress_path()?)?;
    let mut app = App::new(catalog, store, &config);
    if let Some(generator) = connect(&config) {
        app = app.with_generator(generator);
    }

    let mut out = std::io::stdout();
    let mut input = BufReader::new(tokio::io::stdin());

    match command {
        Commands::Subjects => console::print_subjects(&app, &mut out)?,
        Commands::Materials { subject, category, query } => {
            let Some((subject, materials)) = app.materials(&subject, category, &query) else {
                bail!("Unknown subject: {}", subject);
            };
            writeln!(out, "{}", subject.name)?;
            console::print_materials(&app, &materials, &query, &mut out)?;
        }
        Commands::Search { query } => {
            let hits = app.search(&query);
            let groups = group_by_subject(&hits);
            console::print_search_groups(&app, &groups, &query, &mut out)?;
        }
        Commands::Open { material, no_watch } => {
            let Some(mut viewer) = app.open(&material, Clock::system()) else {
                bail!("Unknown material: {}", material);
            };
            console::print_locators(&viewer, &mut out)?;
            if !no_watch {
                console::watch_reading(&mut app, &mut viewer, Duration::from_secs(5), &mut out)
                    .await?;
            }
        }
        Commands::Quiz { material } => {
            let Some(mut viewer) = app.open(&material, Clock::system()) else {
                bail!("Unknown material: {}", material);
            };
            console::run_quiz(&mut app, &mut viewer, &mut input, &mut out).await?;
        }
        Commands::Chat => console::run_chat(&app, &mut input, &mut out).await?,
        Commands::Progress { subject } => {
            let subjects: Vec<_> = match &subject {
                Some(id) => match app.catalog().subject(id) {
                    Some(s) => vec![s],
                    None => bail!("Unknown subject: {}", id),
                },
                None => app.catalog().subjects().iter().collect(),
            };
            for subject in subjects {
                let summary = app.tracker().subject_summary(subject);
                writeln!(
                    out,
                    "{:<10} {:>3}%  {}/{} started, {} completed",
                    subject.id, summary.average, summary.started, summary.total, summary.completed
                )?;
            }
        }
        // handled before the catalog loads
        Commands::Key { .. } | Commands::Config => {}
    }

    app.store().flush()?;
    Ok(())
}
