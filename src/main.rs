use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::watch;

use docent_core::bootstrap::{build_assistant, load_config, resolve_config_path};
use docent_core::vault::EnvVaultProvider;
use docent_core::{Assistant, Config};
use docent_gateway::{ChatBackend, GatewayServer};
use docent_llm::any::AnyProvider;

const FAREWELL: &str = "Bye! Have a great day!";

#[derive(Debug, Parser)]
#[command(name = "docent", version, about = "Ask questions about your documents")]
struct Cli {
    /// Config file (defaults to $DOCENT_CONFIG, then config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP chat endpoint (default)
    Serve,
    /// Interactive terminal chat; type `bye` to leave
    Chat,
    /// Answer a single question and exit
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();
    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config.as_deref());
    let config = load_config(&config_path, &EnvVaultProvider).await?;
    let assistant = Arc::new(
        build_assistant(&config)
            .await
            .context("failed to start the assistant")?,
    );

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, assistant).await,
        Command::Chat => {
            let stdin = BufReader::new(tokio::io::stdin());
            chat_loop(assistant.as_ref(), stdin, tokio::io::stdout()).await
        }
        Command::Ask { question } => {
            let reply = assistant.reply(&question.join(" ")).await;
            println!("{reply}");
            Ok(())
        }
    }
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn serve(config: Config, assistant: Arc<Assistant<AnyProvider>>) -> anyhow::Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    let gateway = config.gateway.clone();
    spawn_reindex_on_sighup(config, Arc::clone(&assistant));

    GatewayServer::new(&gateway.bind, gateway.port, assistant, shutdown_rx)
        .with_rate_limit(gateway.rate_limit)
        .with_max_body_size(gateway.max_body_size)
        .with_cors_origins(gateway.cors_origins)
        .serve()
        .await?;
    Ok(())
}

#[cfg(unix)]
fn spawn_reindex_on_sighup(config: Config, assistant: Arc<Assistant<AnyProvider>>) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("SIGHUP re-indexing unavailable: {e}");
            return;
        }
    };
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            tracing::info!("SIGHUP received, rebuilding index");
            match assistant.reindex(&config).await {
                Ok(chunks) => tracing::info!(chunks, "re-index complete"),
                Err(e) => tracing::error!("re-index failed, keeping previous index: {e:#}"),
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_reindex_on_sighup(_config: Config, _assistant: Arc<Assistant<AnyProvider>>) {}

/// Read questions line by line until `bye` or end of input.
async fn chat_loop<R, W>(backend: &dyn ChatBackend, input: R, mut output: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    loop {
        output.write_all(b"You: ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            output.write_all(b"\n").await?;
            break;
        };
        let msg = line.trim();
        if msg.is_empty() {
            continue;
        }
        if msg.eq_ignore_ascii_case("bye") {
            output
                .write_all(format!("AI: {FAREWELL}\n").as_bytes())
                .await?;
            break;
        }

        let reply = backend.reply(msg).await;
        output.write_all(format!("AI: {reply}\n").as_bytes()).await?;
    }
    output.flush().await?;
    Ok(())
}
