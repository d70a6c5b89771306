//! Scribe Server
//!
//! Axum server that embeds the article UI and runs the planner / writer /
//! editor crew, plus a `run` subcommand for generating from the terminal.

mod api;
mod assets;
mod state;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use scribe_core::config::{get_runtime_path, PersistedConfig};
use scribe_core::credentials::{Credential, CredentialResolver, PromptMode};
use scribe_core::crew::{ArticleCrew, CrewEvent, CrewProgress, RadkitEngine};
use scribe_core::export;
use scribe_core::models::LlmProvider;
use scribe_core::Topic;
use tokio::{net::TcpListener, sync::mpsc};
use tower_http::trace::TraceLayer;

use crate::state::{AppState, EngineSource};

const DEFAULT_LOG_FILTER: &str = "scribe_server=info,scribe_core=info,tower_http=info";

#[derive(Parser, Clone)]
#[command(author, version, about = "Scribe - Research & Write Article Agent (Planner / Writer / Editor)")]
struct Args {
    /// LLM provider (anthropic, openai, gemini, openrouter, grok, deepseek)
    #[arg(long, global = true)]
    provider: Option<LlmProvider>,
    /// Model name; defaults to the provider's default model
    #[arg(long, global = true)]
    model: Option<String>,
    /// Base URL for OpenAI-compatible endpoints
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Clone)]
enum CliCommand {
    /// Start the Scribe server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
    /// Generate one article and write it to disk (no server)
    Run {
        /// The article topic
        topic: String,
        /// Directory for the .md and .docx files
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
        /// Skip the Word document
        #[arg(long)]
        no_docx: bool,
    },
    /// Save an API key for the selected provider to .scribe/.env
    Key {
        /// The API key
        key: String,
    },
}

impl Args {
    /// Command-line selection, applied on top of the persisted config for
    /// this process only.
    fn overrides(&self) -> PersistedConfig {
        PersistedConfig {
            provider: self.provider,
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            prompt_for_key: None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so `scribe run` can print the article on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let runtime_dir = get_runtime_path();
    let mut config = PersistedConfig::load(&runtime_dir).await;
    config.merge(args.overrides());

    match args.command {
        Some(CliCommand::Run {
            topic,
            out,
            no_docx,
        }) => run_cli(&runtime_dir, &config, &topic, &out, no_docx).await,
        Some(CliCommand::Key { key }) => save_key(&runtime_dir, &config, &key),
        Some(CliCommand::Serve { port, host }) => {
            run_server(runtime_dir, config, &host, port).await
        }
        None => run_server(runtime_dir, config, "127.0.0.1", 8080).await,
    }
}

async fn run_cli(
    runtime_dir: &Path,
    config: &PersistedConfig,
    topic: &str,
    out: &Path,
    no_docx: bool,
) -> anyhow::Result<()> {
    let topic = Topic::parse(topic)?;
    let model = config.model_config();
    let prompt = if config.prompt_for_key.unwrap_or(true) {
        PromptMode::IfTerminal
    } else {
        PromptMode::Disabled
    };
    let credential = CredentialResolver::new(model.provider, runtime_dir)
        .with_prompt(prompt)
        .resolve()?;

    tracing::info!(topic = %topic, provider = ?model.provider, model = %model.model, "Running crew");
    let engine = Arc::new(RadkitEngine::new(model, credential));

    let (event_tx, mut event_rx) = mpsc::channel::<CrewEvent>(32);
    let reporter = tokio::spawn(async move {
        let mut progress = CrewProgress::new();
        while let Some(event) = event_rx.recv().await {
            progress.apply(&event);
            eprintln!("[{:>3}%] {}", progress.percent(), progress.stage.label());
        }
    });

    let crew = ArticleCrew::new(engine).with_event_channel(event_tx);
    let outcome = crew.run(&topic).await;
    drop(crew);
    if let Err(e) = reporter.await {
        tracing::warn!("Progress reporter ended abnormally: {}", e);
    }
    let article = outcome?;

    println!("{}", article.raw);

    tokio::fs::create_dir_all(out)
        .await
        .with_context(|| format!("Failed to create output directory: {:?}", out))?;
    let mut files = vec![export::markdown(&article)];
    if !no_docx {
        files.push(export::docx(&article)?);
    }
    for file in files {
        let path = out.join(&file.filename);
        tokio::fs::write(&path, &file.bytes)
            .await
            .with_context(|| format!("Failed to write {:?}", path))?;
        eprintln!("Saved {}", path.display());
    }

    let details = article.details();
    eprintln!("Topic:  {}", details.topic);
    eprintln!("Length: {}", details.length);
    Ok(())
}

fn save_key(runtime_dir: &Path, config: &PersistedConfig, key: &str) -> anyhow::Result<()> {
    let provider = config.model_config().provider;
    let resolver = CredentialResolver::new(provider, runtime_dir);
    let credential = Credential::new(provider.env_var(), key);
    resolver.persist(&credential)?;
    eprintln!(
        "{} API key {} saved to {}",
        provider.display_name(),
        credential.masked(),
        resolver.file().display()
    );
    Ok(())
}

async fn run_server(
    runtime_dir: PathBuf,
    config: PersistedConfig,
    host: &str,
    port: u16,
) -> anyhow::Result<()> {
    let model = config.model_config();
    let credential = match CredentialResolver::new(model.provider, &runtime_dir)
        .with_prompt(PromptMode::Disabled)
        .resolve()
    {
        Ok(credential) => {
            tracing::info!(source = ?credential.source(), env_var = %credential.env_var(), "API key loaded");
            Some(credential)
        }
        Err(e) => {
            tracing::warn!("{}. Set one in the UI sidebar or with `scribe key`.", e);
            None
        }
    };

    let state = Arc::new(AppState::new(
        runtime_dir,
        config,
        credential,
        EngineSource::Radkit,
    ));
    let app = api::router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid address: {}:{}", host, port))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(provider = %model.provider.id(), model = %model.model, "Scribe server running at http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
