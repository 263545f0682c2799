use thiserror::Error;

/// Errors raised while building a knowledge base. Answering never fails.
#[derive(Debug, Error)]
pub enum FaqError {
    /// An entry has nothing to match on.
    #[error("Knowledge entry '{id}' has no usable keywords")]
    EmptyKeywords {
        /// Entry id.
        id: String,
    },

    /// An entry pattern is not a valid regular expression.
    #[error("Knowledge entry '{id}' has invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Entry id.
        id: String,
        /// Offending pattern.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// The knowledge base document could not be parsed.
    #[error("Invalid knowledge base: {message}")]
    InvalidKnowledgeBase {
        /// Underlying serde message.
        message: String,
    },
}

impl From<serde_json::Error> for FaqError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidKnowledgeBase {
            message: err.to_string(),
        }
    }
}

/// Result alias for knowledge base construction.
pub type FaqResult<T> = std::result::Result<T, FaqError>;
