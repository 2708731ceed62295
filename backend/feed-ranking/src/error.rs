use thiserror::Error;
use uuid::Uuid;

use crate::config::ConfigError;

/// Failure taxonomy for the ranking engine.
///
/// None of these ever reach the caller of feed assembly: config failures
/// substitute defaults, scoring failures floor the affected post, assembly
/// failures degrade to chronological order, and tracking failures are
/// logged and swallowed so they can never roll back the triggering action.
#[derive(Debug, Error)]
pub enum RankingError {
    #[error("config validation failed: {0}")]
    ConfigValidation(#[from] ConfigError),

    #[error("scoring failed for post {post_id}: {reason}")]
    Scoring { post_id: Uuid, reason: String },

    #[error("feed assembly failed: {0}")]
    Assembly(String),

    #[error("interaction tracking failed: {0}")]
    Tracking(String),
}

pub type Result<T> = std::result::Result<T, RankingError>;
