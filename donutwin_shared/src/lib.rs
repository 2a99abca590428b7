use chrono::{DateTime, Utc};
use donutwin_core::{Audit, Commitment, EngineError, Outcome, Pick, Reveal, SeedRotation};
use serde::{Deserialize, Serialize};

/// Seeds for the player's next round. `commitment_hash` is the hash of the
/// server seed that round will use; it is fixed before any bet is accepted.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SeedStateResponse {
    pub commitment_hash: String,
    pub client_seed: String,
    pub nonce: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RotateSeedRequest {
    /// Player-chosen seed; a random one is generated when absent.
    pub client_seed: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RotateSeedResponse {
    pub previous_client_seed: String,
    pub rounds_played: u64,
    pub client_seed: String,
    pub nonce: u64,
    pub commitment_hash: String,
}

impl RotateSeedResponse {
    pub fn new(r: SeedRotation, next_commitment: Commitment) -> Self {
        Self {
            previous_client_seed: r.previous_client_seed.into(),
            rounds_played: r.rounds_played,
            client_seed: r.client_seed.into(),
            nonce: 0,
            commitment_hash: next_commitment.into(),
        }
    }
}

/// Sent before any outcome-affecting action.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RoundStartResponse {
    pub commitment_hash: String,
    pub client_seed: String,
    pub nonce: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CrashStartRequest {
    pub bet: f64,
    /// Auto-cashout target multiplier.
    pub cashout_at: f64,
    /// The commitment the player saw on `GET /seed`. The round is refused if
    /// the server would play a different one.
    #[serde(default)]
    pub commitment_hash: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CrashEndResponse {
    pub won: bool,
    pub payout: f64,
    pub reveal: Reveal,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MinesStartRequest {
    pub bet: f64,
    pub mine_count: u16,
    #[serde(default)]
    pub commitment_hash: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MinesPickRequest {
    pub tile: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MinesPickResponse {
    pub pick: Pick,
    /// Present once the pick ended the round.
    pub payout: Option<f64>,
    pub reveal: Option<Reveal>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MinesCashoutResponse {
    pub multiplier: f64,
    pub payout: f64,
    pub reveal: Reveal,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VerifyCrashRequest {
    pub server_seed: String,
    pub client_seed: String,
    pub nonce: u64,
    pub multiplier: f64,
    pub commitment_hash: Option<String>,
    /// Overrides the server's crash edge, for rounds published under another variant.
    pub house_edge_bps: Option<u16>,
    pub max_point: Option<f64>,
    pub epsilon: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VerifyMinesRequest {
    pub server_seed: String,
    pub client_seed: String,
    pub nonce: u64,
    pub positions: Vec<u16>,
    pub commitment_hash: Option<String>,
    pub grid_size: Option<u16>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VerifyResponse {
    pub valid: bool,
    pub commitment_valid: Option<bool>,
    pub recomputed_commitment: String,
    pub outcome_valid: bool,
    pub recomputed: Outcome,
}

impl From<Audit> for VerifyResponse {
    fn from(audit: Audit) -> Self {
        Self {
            valid: audit.is_valid(),
            commitment_valid: audit.commitment_valid,
            recomputed_commitment: audit.recomputed_commitment.into(),
            outcome_valid: audit.outcome_valid,
            recomputed: audit.recomputed,
        }
    }
}

/// A reveal that passed both checks.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VerifyRevealResponse {
    pub outcome: Outcome,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RoundLogEntry {
    pub ts: DateTime<Utc>,
    pub bet: f64,
    pub payout: f64,
    pub reveal: Reveal,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorBody {
    pub error: String,
    /// Both sides of a failed fairness check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mismatch: Option<FairnessFailure>,
}

#[derive(thiserror::Error, Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FairnessFailure {
    #[error("commitment mismatch: published {published}, revealed seed hashes to {recomputed}")]
    Commitment {
        published: String,
        recomputed: String,
    },
    #[error("outcome mismatch: seeds produce {expected}, published {published}")]
    Outcome { expected: Outcome, published: Outcome },
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Fairness(FairnessFailure),
    #[error("internal server error")]
    Internal,
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidInput(msg) => ApiError::Invalid(msg),
            EngineError::CommitmentMismatch {
                published,
                recomputed,
            } => ApiError::Fairness(FairnessFailure::Commitment {
                published,
                recomputed,
            }),
            EngineError::VerificationMismatch {
                expected,
                published,
            } => ApiError::Fairness(FairnessFailure::Outcome {
                expected,
                published,
            }),
            EngineError::DerivationExhaustion { .. } | EngineError::EntropyUnavailable(_) => {
                ApiError::Internal
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_keeps_both_sides() {
        let err = ApiError::from(EngineError::VerificationMismatch {
            expected: Outcome::Crash { multiplier: 3.2 },
            published: Outcome::Crash { multiplier: 5.0 },
        });
        let ApiError::Fairness(failure) = err else {
            panic!("expected a fairness failure");
        };
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["kind"], "outcome");
        assert_eq!(json["expected"]["multiplier"], 3.2);
        assert_eq!(json["published"]["multiplier"], 5.0);
    }
}
