use thiserror::Error;

use crate::engine::Outcome;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures surfaced by the outcome engine.
///
/// Mismatch variants carry both sides so a player or auditor can see exactly
/// what was published and what the revealed seeds produce.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Rejected before any hashing happens; the session is not advanced.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("commitment mismatch: published {published}, revealed seed hashes to {recomputed}")]
    CommitmentMismatch {
        published: String,
        recomputed: String,
    },

    #[error("digest stream exhausted after {rounds} extension rounds")]
    DerivationExhaustion { rounds: u32 },

    #[error("verification mismatch: seeds produce {expected}, published {published}")]
    VerificationMismatch { expected: Outcome, published: Outcome },

    #[error("secure random source unavailable: {0}")]
    EntropyUnavailable(String),
}

impl EngineError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        EngineError::InvalidInput(msg.into())
    }
}
