use std::path::PathBuf;

use super::Config;

/// Parse a lowercase enum value the same way the TOML file would.
fn parse_enum<T: serde::de::DeserializeOwned>(name: &str, v: &str) -> Option<T> {
    let parsed = serde_json::from_value(serde_json::Value::String(v.to_owned())).ok();
    if parsed.is_none() {
        tracing::warn!("ignoring invalid {name} value: {v}");
    }
    parsed
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_llm();
        self.apply_env_overrides_pipeline();
        self.apply_env_overrides_gateway();
    }

    fn apply_env_overrides_llm(&mut self) {
        if let Ok(v) = std::env::var("DOCENT_LLM_PROVIDER")
            && let Some(kind) = parse_enum("DOCENT_LLM_PROVIDER", &v)
        {
            self.llm.provider = kind;
        }
        if let Ok(v) = std::env::var("DOCENT_LLM_NAME") {
            self.llm.name = Some(v);
        }
        if let Ok(v) = std::env::var("DOCENT_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("DOCENT_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("DOCENT_LLM_MAX_TOKENS")
            && let Ok(n) = v.parse::<u32>()
        {
            self.llm.max_tokens = Some(n);
        }
        if let Ok(v) = std::env::var("DOCENT_EMBEDDING_BACKEND")
            && let Some(backend) = parse_enum("DOCENT_EMBEDDING_BACKEND", &v)
        {
            self.embedding.backend = backend;
        }
        if let Ok(v) = std::env::var("DOCENT_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("DOCENT_EMBEDDING_BASE_URL") {
            self.embedding.base_url = Some(v);
        }
    }

    fn apply_env_overrides_pipeline(&mut self) {
        if let Ok(v) = std::env::var("DOCENT_DOCUMENTS_DIR") {
            self.ingest.documents_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("DOCENT_INGEST_UNSUPPORTED")
            && let Some(policy) = parse_enum("DOCENT_INGEST_UNSUPPORTED", &v)
        {
            self.ingest.unsupported = policy;
        }
        if let Ok(v) = std::env::var("DOCENT_CHUNK_SIZE")
            && let Ok(n) = v.parse::<usize>()
        {
            self.chunking.chunk_size = n;
        }
        if let Ok(v) = std::env::var("DOCENT_CHUNK_OVERLAP")
            && let Ok(n) = v.parse::<usize>()
        {
            self.chunking.overlap = n;
        }
        if let Ok(v) = std::env::var("DOCENT_TOP_K")
            && let Ok(n) = v.parse::<usize>()
        {
            self.assistant.top_k = n;
        }
        if let Ok(v) = std::env::var("DOCENT_TIMEOUT_SECS")
            && let Ok(secs) = v.parse::<u64>()
        {
            self.assistant.timeout_secs = secs;
        }
        if let Ok(v) = std::env::var("DOCENT_SCOPE_KEYWORDS") {
            self.scope.keywords = v
                .split(',')
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = std::env::var("DOCENT_SCOPE_MODE")
            && let Some(mode) = parse_enum("DOCENT_SCOPE_MODE", &v)
        {
            self.scope.mode = mode;
        }
    }

    fn apply_env_overrides_gateway(&mut self) {
        if let Ok(v) = std::env::var("DOCENT_GATEWAY_BIND") {
            self.gateway.bind = v;
        }
        if let Ok(v) = std::env::var("DOCENT_GATEWAY_PORT")
            && let Ok(port) = v.parse::<u16>()
        {
            self.gateway.port = port;
        }
        if let Ok(v) = std::env::var("DOCENT_GATEWAY_RATE_LIMIT")
            && let Ok(limit) = v.parse::<u32>()
        {
            self.gateway.rate_limit = limit;
        }
        if let Ok(v) = std::env::var("DOCENT_GATEWAY_MAX_BODY")
            && let Ok(bytes) = v.parse::<usize>()
        {
            self.gateway.max_body_size = bytes;
        }
        if let Ok(v) = std::env::var("DOCENT_GATEWAY_CORS_ORIGINS") {
            self.gateway.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }
}
