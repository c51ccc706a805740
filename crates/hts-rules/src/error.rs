use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleSetError {
    #[error("failed to read rule set {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rule set {name}: {source}")]
    Json {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid rule set {name}: {message}")]
    InvalidRuleSet { name: String, message: String },

    #[error("unknown rule set: {name}")]
    UnknownRuleSet { name: String },
}

impl RuleSetError {
    pub(crate) fn invalid(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidRuleSet {
            name: name.to_string(),
            message: message.into(),
        }
    }
}
