mod cli;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::time::MissedTickBehavior;

use wikichat_api::{start_server, AppState};
use wikichat_chat::{validate_query, ConversationEngine, EngineOptions, Session, SessionRegistry};
use wikichat_core::config::WikiChatConfig;
use wikichat_core::error::WikiChatError;
use wikichat_core::{Language, TurnOutcome};
use wikichat_speech::GoogleTtsClient;
use wikichat_wiki::WikipediaClient;

use crate::cli::{CliArgs, Command};

/// Wire the HTTP providers into an engine.
fn build_engine(config: &WikiChatConfig) -> Result<ConversationEngine, WikiChatError> {
    let content = WikipediaClient::new(config.content.clone())?;
    let narration = GoogleTtsClient::new(config.speech.clone())?;
    Ok(ConversationEngine::new(
        Arc::new(content),
        Arc::new(narration),
        EngineOptions::from(config),
    ))
}

/// Periodically drop idle sessions.
async fn purge_loop(registry: Arc<SessionRegistry>, every: Duration) {
    tracing::info!(interval_secs = every.as_secs(), "Session purge loop started");
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;
    loop {
        interval.tick().await;
        registry.purge_expired();
    }
}

async fn serve(config: WikiChatConfig) -> Result<(), Box<dyn std::error::Error>> {
    let engine = build_engine(&config)?;
    let server = config.server.clone();
    let purge_every = config.session.purge_interval();
    tracing::info!(
        narration = config.speech.enabled,
        default_language = config.general.default_language.code(),
        "Conversation engine ready"
    );

    let state = AppState::new(config, engine);
    let registry = Arc::clone(&state.registry);
    tokio::spawn(async move {
        purge_loop(registry, purge_every).await;
    });

    start_server(&server, state).await?;
    Ok(())
}

async fn ask(
    mut config: WikiChatConfig,
    query: String,
    language: Option<String>,
    audio_out: Option<PathBuf>,
    no_audio: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let language = match language {
        Some(raw) => raw.parse::<Language>()?,
        None => config.general.default_language,
    };
    validate_query(&query, config.session.max_query_length)?;
    if no_audio {
        config.speech.enabled = false;
    }
    let engine = build_engine(&config)?;

    match engine.suggest(&query, language).await {
        Ok(titles) if !titles.is_empty() => println!("Suggestions: {}", titles.join(" | ")),
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "Suggestions unavailable"),
    }

    let session = engine.respond(Session::new(), &query, language).await;
    let Some(turn) = session.snapshot().turns.last().cloned() else {
        return Err("no turn recorded".into());
    };

    println!();
    println!("[{}] {}", language.display_name(), turn.query());
    println!("{}", turn.summary_text());
    for url in turn.image_urls() {
        println!("  image: {url}");
    }
    if let TurnOutcome::Ambiguous { candidates } = turn.outcome() {
        for candidate in candidates {
            println!("  - {candidate}");
        }
    }

    match (audio_out, turn.narration()) {
        (Some(path), Some(audio)) => {
            std::fs::write(&path, audio.as_slice())?;
            println!("Narration ({} bytes) written to {}", audio.len(), path.display());
        }
        (Some(_), None) => println!("No narration for this turn."),
        _ => {}
    }
    Ok(())
}

fn print_languages(config: &WikiChatConfig) {
    for language in Language::ALL {
        let marker = if language == config.general.default_language {
            " (default)"
        } else {
            ""
        };
        println!("{:<4}{}{}", language.code(), language.display_name(), marker);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config is read before tracing starts so its log level can apply.
    let config_file = args.resolve_config_path();
    let loaded = config_file
        .exists()
        .then(|| WikiChatConfig::load(&config_file));
    let config_level = match &loaded {
        Some(Ok(config)) => config.general.log_level.clone(),
        _ => WikiChatConfig::default().general.log_level,
    };
    let log_level = args.resolve_log_level(&config_level);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    tracing::info!("Starting wikichat v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match loaded {
        Some(Ok(config)) => {
            tracing::info!(path = %config_file.display(), "Configuration loaded");
            config
        }
        Some(Err(e)) => {
            tracing::warn!(path = %config_file.display(), error = %e, "Invalid config file, using defaults");
            WikiChatConfig::default()
        }
        None => {
            tracing::info!(path = %config_file.display(), "No config file, using defaults");
            WikiChatConfig::default()
        }
    };
    args.apply_overrides(&mut config);
    config.validate()?;

    match args.command() {
        Command::Serve { .. } => serve(config).await,
        Command::Ask {
            query,
            language,
            audio_out,
            no_audio,
        } => ask(config, query, language, audio_out, no_audio).await,
        Command::Languages => {
            print_languages(&config);
            Ok(())
        }
    }
}
