use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use ragchat_core::{ChatClient, ChatRole, ChatView, Config, Overrides, Settings};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{AppEvent, EventHandler, Tui};

#[derive(Parser)]
#[command(name = "ragchat", version)]
#[command(about = "Chat with a retrieval-augmented question-answering backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// Backend chat endpoint (overrides RAGCHAT_ENDPOINT and the config file)
    #[arg(long, global = true)]
    endpoint: Option<String>,
    /// UI language: sv or en
    #[arg(long, global = true)]
    lang: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the reply
    Ask {
        /// Your question
        question: String,
    },
    /// Save --endpoint, --lang and the assistant name to the config file
    Config {
        /// Name shown on assistant messages (empty to reset)
        #[arg(long)]
        assistant_name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let overrides = Overrides {
        endpoint: cli.endpoint,
        language: cli.lang,
    };

    match cli.command {
        Some(Commands::Ask { question }) => {
            init_stderr_logging();
            ask_once(&load_settings(&overrides), &question).await
        }
        Some(Commands::Config { assistant_name }) => {
            init_stderr_logging();
            save_config(&overrides, assistant_name)
        }
        None => {
            let _guard = setup_file_logging().context("failed to initialize logging")?;
            run_tui(&load_settings(&overrides)).await
        }
    }
}

fn load_settings(overrides: &Overrides) -> Settings {
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read config, using defaults");
        Config::new()
    });
    let settings = config.resolve(overrides);
    tracing::info!(endpoint = %settings.endpoint, language = settings.language.as_str(), "settings resolved");
    settings
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|p| p.join("ragchat"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// The TUI owns the terminal, so logs go to a file. Nothing is written
/// unless `RUST_LOG` asks for it.
fn setup_file_logging() -> Result<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_default();

    let max_level = env_filter.max_level_hint();
    if max_level.is_none() || max_level == Some(LevelFilter::OFF) {
        let (_, guard) = NonBlocking::new(std::io::sink());
        return Ok(guard);
    }

    let dir = log_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("could not create log directory {}", dir.display()))?;

    let (non_blocking, guard) = NonBlocking::new(tracing_appender::rolling::never(dir, "ragchat.log"));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);

    Registry::default().with(env_filter).with(file_layer).init();

    Ok(guard)
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

fn save_config(overrides: &Overrides, assistant_name: Option<String>) -> Result<()> {
    let path = Config::get_config_path()?;
    let mut config = Config::load_from(&path)
        .with_context(|| format!("could not read {}", path.display()))?;

    config.apply(overrides, assistant_name);
    config.save()?;
    tracing::info!(path = %path.display(), "config saved");

    println!("{} {}", "Saved".green().bold(), path.display());
    let settings = config.resolve(&Overrides::default());
    println!("  endpoint:  {}", settings.endpoint);
    println!("  language:  {}", settings.language.as_str());
    println!("  assistant: {}", settings.assistant_name);
    Ok(())
}

async fn ask_once(settings: &Settings, question: &str) -> Result<()> {
    let client = ChatClient::new(&settings.endpoint);
    let strings = settings.language.strings();
    let mut chat = ChatView::new(strings.fallback);

    chat.set_draft(question);
    if !chat.submit(&client).await {
        bail!("question is empty");
    }

    for msg in chat.conversation() {
        let label = match msg.role {
            ChatRole::User => strings.user_label.bold().cyan(),
            ChatRole::Assistant => settings.assistant_name.as_str().bold().yellow(),
        };
        println!("{}: {}\n", label, msg.text);
    }

    Ok(())
}

async fn run_tui(settings: &Settings) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut app = App::new(settings);

    let result = run_app(&mut terminal, &mut app).await;

    tui::restore()?;
    result
}

enum Step {
    Event(Option<AppEvent>),
    Answer(Result<String>),
}

async fn run_app(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();
    app.on_state_committed();

    loop {
        terminal.draw(|frame| ui::render(app, frame))?;

        let step = tokio::select! {
            event = events.next() => Step::Event(event),
            outcome = app::wait_for_answer(&mut app.pending) => Step::Answer(outcome),
        };

        match step {
            Step::Event(Some(event)) => handler::handle_event(app, event),
            Step::Event(None) => break,
            Step::Answer(outcome) => app.finish_turn(outcome),
        }
        app.on_state_committed();

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
