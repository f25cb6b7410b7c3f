//! Docent request pipeline: configuration, scope filter, answer composition.

pub mod assistant;
pub mod bootstrap;
pub mod composer;
pub mod config;
pub mod scope;
pub mod vault;

pub use assistant::{Assistant, ChatTurn, Reply};
pub use composer::{AnswerComposer, GenerationFailure, NO_DOCUMENTS_REPLY};
pub use config::{Config, ConfigError};
pub use scope::{AllowAll, KeywordScope, ScopeFilter};
