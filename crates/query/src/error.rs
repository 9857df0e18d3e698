use std::sync::Arc;

/// Errors raised while building or evaluating a query.
///
/// Only the slice bound checks fail eagerly (at builder-call time). Everything else is
/// reported when the affected element is pulled through the pipeline.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryError {
    #[error("slice start must not be negative (got {0})")]
    NegativeIndex(isize),
    #[error("slice start {from} is past slice end {to}")]
    InvertedRange { from: isize, to: isize },
    #[error("no selector compiler configured for selector `{0}`")]
    NoSelectorCompiler(String),
    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },
    #[error("unknown search strategy `{0}`")]
    UnknownStrategy(String),
    #[error("tree provider failed: {message}")]
    Provider {
        message: String,
        #[source]
        source: Option<Arc<dyn std::error::Error + Send + Sync>>, // optional chained cause
    },
}

impl QueryError {
    /// Provider failure without a chained cause.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider { message: message.into(), source: None }
    }

    pub fn selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Selector { selector: selector.into(), message: message.into() }
    }

    /// Attach a source cause. Only provider errors carry one; other variants are returned unchanged.
    #[must_use]
    pub fn with_source(self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        match self {
            Self::Provider { message, .. } => Self::Provider { message, source: Some(Arc::new(cause)) },
            other => other,
        }
    }

    /// True for the errors raised eagerly by invalid slice bounds.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::NegativeIndex(_) | Self::InvertedRange { .. })
    }
}
