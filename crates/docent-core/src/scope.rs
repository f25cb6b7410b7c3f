//! Question pre-filter run before retrieval and generation.

use crate::config::{ScopeConfig, ScopeMode, ScopePreset};

/// Decides whether a question belongs to the assistant's domain.
pub trait ScopeFilter: Send + Sync {
    fn is_in_scope(&self, text: &str) -> bool;
}

/// Accepts every question.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl ScopeFilter for AllowAll {
    fn is_in_scope(&self, _text: &str) -> bool {
        true
    }
}

const CODING_KEYWORDS: &[&str] = &[
    "python",
    "java",
    "c",
    "c++",
    "javascript",
    "html",
    "css",
    "sql",
    "mysql",
    "postgresql",
    "mongodb",
    "flask",
    "spring",
    "react",
    "node",
    "api",
    "backend",
    "frontend",
    "function",
    "class",
    "object",
    "loop",
    "array",
    "string",
    "database",
    "query",
    "algorithm",
    "data structure",
    "error",
    "exception",
    "bug",
    "debug",
    "compile",
    "code",
    "program",
    "build",
    "develop",
    "implement",
];

const CASUAL_KEYWORDS: &[&str] = &[
    "hi",
    "hello",
    "how are you",
    "your name",
    "who are you",
    "good morning",
    "good evening",
    "bye",
];

const SQL_KEYWORDS: &[&str] = &[
    "sql",
    "select",
    "insert",
    "update",
    "delete",
    "join",
    "where",
    "group by",
    "order by",
    "mysql",
    "postgresql",
    "database",
];

/// Case-insensitive substring match against a fixed vocabulary.
///
/// Matching is plain containment, so short terms such as `c` or `hi` accept far more
/// than they name. Supply a tighter list when that matters.
#[derive(Debug, Clone, Default)]
pub struct KeywordScope {
    keywords: Vec<String>,
}

impl KeywordScope {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut scope = Self::default();
        scope.extend(keywords);
        scope
    }

    /// Programming vocabulary.
    #[must_use]
    pub fn coding() -> Self {
        Self::new(CODING_KEYWORDS)
    }

    /// Small talk plus SQL vocabulary.
    #[must_use]
    pub fn sql_and_casual() -> Self {
        Self::new(CASUAL_KEYWORDS.iter().chain(SQL_KEYWORDS))
    }

    pub fn extend<I, S>(&mut self, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for k in keywords {
            let k = k.as_ref().trim().to_lowercase();
            if !k.is_empty() && !self.keywords.contains(&k) {
                self.keywords.push(k);
            }
        }
    }

    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl ScopeFilter for KeywordScope {
    fn is_in_scope(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

/// Build the filter described by `[scope]`.
#[must_use]
pub fn from_config(config: &ScopeConfig) -> Box<dyn ScopeFilter> {
    match config.mode {
        ScopeMode::AllowAll => Box::new(AllowAll),
        ScopeMode::Keywords => {
            let mut scope = match config.preset {
                Some(ScopePreset::Coding) => KeywordScope::coding(),
                Some(ScopePreset::SqlAndCasual) => KeywordScope::sql_and_casual(),
                None => KeywordScope::default(),
            };
            scope.extend(&config.keywords);
            tracing::debug!(keywords = scope.keywords().len(), "keyword scope filter");
            Box::new(scope)
        }
    }
}
