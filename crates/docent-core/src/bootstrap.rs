//! Startup wiring: config resolution, provider and embedder construction, and the
//! Loader → Chunker → Index build that must finish before any request is served.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use docent_llm::any::AnyProvider;
use docent_llm::compatible::CompatibleProvider;
use docent_llm::embedder::AnyEmbedder;
use docent_llm::hashing::HashEmbedder;
use docent_llm::openai::OpenAiProvider;
use docent_llm::{EmbedFn, LlmProvider};
use docent_memory::document::UnsupportedPolicy;
use docent_memory::{
    Chunker, Degradation, DirectoryLoader, EmbeddingIndex, IndexBuild, QueryRewrite, Retriever,
};

use crate::assistant::Assistant;
use crate::composer::AnswerComposer;
use crate::config::{Config, EmbeddingBackend, ProviderKind, UnsupportedFiles};
use crate::scope;
use crate::vault::VaultProvider;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Priority: CLI `--config` > `DOCENT_CONFIG` > `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("DOCENT_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

/// Load, validate and resolve secrets. Fails fast on a missing credential.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, or a secret is missing.
pub async fn load_config(path: &Path, vault: &dyn VaultProvider) -> anyhow::Result<Config> {
    let mut config = Config::load(path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    config.validate()?;
    config.resolve_secrets(vault).await?;
    tracing::info!(config = %path.display(), "configuration loaded");
    Ok(config)
}

fn openai_provider(
    config: &Config,
    api_key: String,
    base_url: String,
    embedding_model: Option<String>,
) -> anyhow::Result<OpenAiProvider> {
    let client = docent_llm::http::build_client(Duration::from_secs(config.assistant.timeout_secs))?;
    Ok(
        OpenAiProvider::new(api_key, base_url, config.llm.model.clone(), embedding_model)?
            .with_client(client)
            .with_max_tokens(config.llm.max_tokens)
            .with_max_retries(config.llm.max_retries),
    )
}

/// # Errors
///
/// Returns an error if the API key is missing or the HTTP client cannot be built.
pub fn create_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    let api_key = config.api_key()?.expose().to_owned();
    let inner = openai_provider(config, api_key, config.llm.base_url.clone(), None)?;
    let provider = match config.llm.provider {
        ProviderKind::OpenAi => AnyProvider::OpenAi(inner),
        ProviderKind::Compatible => {
            let name = config
                .llm
                .name
                .clone()
                .context("llm.name is required for the compatible provider")?;
            AnyProvider::Compatible(CompatibleProvider::new(name, inner))
        }
    };
    tracing::info!(
        provider = provider.name(),
        model = %config.llm.model,
        "generation provider ready"
    );
    Ok(provider)
}

/// Model weights for the `candle` backend are fetched and loaded on a blocking thread.
///
/// # Errors
///
/// Returns an error if the chosen backend cannot be constructed or was not compiled in.
pub async fn create_embedder(config: &Config) -> anyhow::Result<AnyEmbedder> {
    let embedder = match config.embedding.backend {
        EmbeddingBackend::Hash => AnyEmbedder::Hash(HashEmbedder::new(config.embedding.dimension)),
        EmbeddingBackend::Provider => {
            let api_key = config.embedding_api_key()?.expose().to_owned();
            let base_url = config
                .embedding
                .base_url
                .clone()
                .unwrap_or_else(|| config.llm.base_url.clone());
            let model = Some(config.embedding.model.trim().to_owned()).filter(|m| !m.is_empty());
            let inner = openai_provider(config, api_key, base_url, model)?;
            anyhow::ensure!(
                inner.supports_embeddings(),
                "embedding backend \"provider\" needs embedding.model to name an embedding model"
            );
            AnyEmbedder::Provider(AnyProvider::OpenAi(inner))
        }
        #[cfg(feature = "candle")]
        EmbeddingBackend::Candle => {
            let repo = config.embedding.candle_model.clone();
            let model = tokio::task::spawn_blocking(move || {
                docent_llm::candle_embed::EmbedModel::load(&repo)
            })
            .await
            .context("embedding model loader panicked")?
            .context("failed to load local embedding model")?;
            AnyEmbedder::Bert(model)
        }
        #[cfg(not(feature = "candle"))]
        EmbeddingBackend::Candle => {
            anyhow::bail!("embedding backend \"candle\" requires building with --features candle")
        }
    };
    tracing::info!(embedder = ?embedder, "embedder ready");
    Ok(embedder)
}

/// Result of one Loader → Chunker → Index pass.
#[derive(Debug)]
pub struct Corpus {
    pub index: Option<EmbeddingIndex>,
    pub documents: usize,
    pub notice: Option<Degradation>,
}

fn unsupported_policy(setting: UnsupportedFiles) -> UnsupportedPolicy {
    match setting {
        UnsupportedFiles::Skip => UnsupportedPolicy::Skip,
        UnsupportedFiles::Warn => UnsupportedPolicy::Warn,
        UnsupportedFiles::Error => UnsupportedPolicy::Error,
    }
}

/// Scan the documents directory, chunk it and embed every chunk.
///
/// An empty or missing directory is a degraded state, not an error.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed, an unsupported file is rejected,
/// or embedding fails.
pub async fn build_corpus(config: &Config, embed_fn: EmbedFn) -> anyhow::Result<Corpus> {
    let loader = DirectoryLoader::new(
        unsupported_policy(config.ingest.unsupported),
        config.ingest.max_file_size,
    );
    let outcome = loader
        .load(&config.ingest.documents_dir)
        .await
        .with_context(|| {
            format!(
                "failed to load documents from {}",
                config.ingest.documents_dir.display()
            )
        })?;
    let mut notice = outcome.notice();
    let documents = outcome.documents.len();

    let chunker = Chunker::new(config.chunker_config()?);
    let chunks = chunker.split_all(&outcome.documents);
    drop(outcome);

    let index = match EmbeddingIndex::build(chunks, embed_fn)
        .await
        .context("failed to build embedding index")?
    {
        IndexBuild::Ready(index) => Some(index),
        IndexBuild::EmptyCorpus => {
            notice.get_or_insert(Degradation::EmptyCorpus);
            None
        }
    };

    if let Some(n) = notice {
        tracing::warn!(
            dir = %config.ingest.documents_dir.display(),
            "{n}: answering without document context"
        );
    }
    Ok(Corpus {
        index,
        documents,
        notice,
    })
}

/// Build an [`Assistant`] around `provider`, including the initial corpus.
///
/// # Errors
///
/// Returns an error if building the corpus fails.
pub async fn assemble<P: LlmProvider>(
    config: &Config,
    provider: P,
    embed_fn: EmbedFn,
) -> anyhow::Result<Assistant<P>> {
    let composer = AnswerComposer::new(provider)
        .with_system_prompt(config.assistant.system_prompt.clone())
        .with_timeout(Duration::from_secs(config.assistant.timeout_secs));

    let mut retriever = Retriever::new(config.assistant.top_k);
    if let Some(prefix) = &config.assistant.query_prefix {
        retriever = retriever.with_rewrite(QueryRewrite::Prefix(prefix.clone()));
    }

    let corpus = build_corpus(config, embed_fn.clone()).await?;
    let assistant = Assistant::new(composer, embed_fn)
        .with_scope(scope::from_config(&config.scope), config.scope.refusal.clone())
        .with_retriever(retriever);
    assistant.publish(corpus);
    Ok(assistant)
}

/// Full startup sequence for the configured backends.
///
/// # Errors
///
/// Returns an error if any backend cannot be created or the corpus fails to build.
pub async fn build_assistant(config: &Config) -> anyhow::Result<Assistant<AnyProvider>> {
    let provider = create_provider(config)?;
    let embedder = create_embedder(config).await?;
    assemble(config, provider, embedder.embed_fn()).await
}
