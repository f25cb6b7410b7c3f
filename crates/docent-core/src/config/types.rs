use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::vault::Secret;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub scope: ScopeConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

pub(crate) fn default_system_prompt() -> String {
    "You are an expert coding assistant. Use ONLY the provided context to answer. \
     If not in context, say you don't know."
        .into()
}

fn default_top_k() -> usize {
    3
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AssistantConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Prepended to every question before it is embedded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_prefix: Option<String>,
    /// Upper bound on one generation call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            top_k: default_top_k(),
            query_prefix: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Generation backend selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Compatible,
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}

fn default_model() -> String {
    "openai/gpt-4o-mini".into()
}

fn default_max_retries() -> u32 {
    2
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    /// Display name for a `compatible` provider, e.g. `groq`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            name: None,
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: None,
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Offline feature hashing; no model, no network.
    #[default]
    Hash,
    /// `POST {base_url}/embeddings` on an OpenAI-compatible endpoint.
    Provider,
    /// Local BERT sentence encoder (requires the `candle` feature).
    Candle,
}

fn default_dimension() -> usize {
    docent_llm::hashing::DEFAULT_DIMENSION
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

fn default_candle_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".into()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub backend: EmbeddingBackend,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Defaults to `llm.base_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_candle_model")]
    pub candle_model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            dimension: default_dimension(),
            base_url: None,
            model: default_embedding_model(),
            candle_model: default_candle_model(),
        }
    }
}

fn default_chunk_size() -> usize {
    500
}

fn default_overlap() -> usize {
    50
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeMode {
    #[default]
    AllowAll,
    Keywords,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopePreset {
    Coding,
    SqlAndCasual,
}

pub(crate) fn default_refusal() -> String {
    "This assistant only supports questions about its topic.".into()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ScopeConfig {
    #[serde(default)]
    pub mode: ScopeMode,
    /// Built-in vocabulary, merged with `keywords`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<ScopePreset>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_refusal")]
    pub refusal: String,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            mode: ScopeMode::default(),
            preset: None,
            keywords: Vec::new(),
            refusal: default_refusal(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsupportedFiles {
    #[default]
    Skip,
    Warn,
    Error,
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from("documents")
}

fn default_max_file_size() -> u64 {
    docent_memory::document::DEFAULT_MAX_FILE_SIZE
}

#[derive(Debug, Deserialize, Serialize)]
pub struct IngestConfig {
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,
    #[serde(default)]
    pub unsupported: UnsupportedFiles,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            documents_dir: default_documents_dir(),
            unsupported: UnsupportedFiles::default(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_gateway_bind() -> String {
    "127.0.0.1".into()
}

fn default_gateway_port() -> u16 {
    5002
}

fn default_gateway_rate_limit() -> u32 {
    60
}

fn default_gateway_max_body() -> usize {
    65_536
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    /// Requests per minute per client IP; 0 disables the limit.
    #[serde(default = "default_gateway_rate_limit")]
    pub rate_limit: u32,
    #[serde(default = "default_gateway_max_body")]
    pub max_body_size: usize,
    /// Origins allowed to call the API from a separate frontend; `"*"` allows any.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_gateway_bind(),
            port: default_gateway_port(),
            rate_limit: default_gateway_rate_limit(),
            max_body_size: default_gateway_max_body(),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ResolvedSecrets {
    pub api_key: Option<Secret>,
    pub embedding_api_key: Option<Secret>,
}
