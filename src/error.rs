//! Error taxonomy for the optimization pipeline.
//!
//! Internal components report failures through [`OptimizeError`]; the
//! engine converts every failure into an `OptimizationResult` rather than
//! letting it escape the public API. See the engine module for the
//! tier-by-tier handling policy.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, OptimizeError>;

/// Failures that can occur inside an optimization run.
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// Input rejected before any optimization was attempted.
    #[error("ogiltig indata: {0}")]
    InvalidInput(String),

    /// An environmental advisor could not produce data for the date.
    #[error("advisor failure ({source_name}): {message}")]
    Advisor {
        /// Which advisor failed (weather, traffic, congestion tax).
        source_name: &'static str,
        /// Underlying failure description.
        message: String,
    },

    /// Clustering could not produce a usable partition.
    #[error("clustering failed: {0}")]
    Clustering(String),

    /// The crew-size model could not produce a recommendation.
    #[error("crew sizing failed: {0}")]
    CrewSizing(String),

    /// Route construction or improvement failed.
    #[error("routing failed: {0}")]
    Routing(String),

    /// A fallback strategy failed.
    #[error("fallback strategy '{strategy}' failed: {message}")]
    Fallback {
        /// Strategy label (simple, manual, hybrid).
        strategy: &'static str,
        /// Underlying failure description.
        message: String,
    },
}

impl OptimizeError {
    /// Creates an advisor failure.
    pub fn advisor(source_name: &'static str, message: impl Into<String>) -> Self {
        Self::Advisor {
            source_name,
            message: message.into(),
        }
    }

    /// Creates a fallback-strategy failure.
    pub fn fallback(strategy: &'static str, message: impl Into<String>) -> Self {
        Self::Fallback {
            strategy,
            message: message.into(),
        }
    }
}
