//! Recomputes published outcomes from revealed seeds.
//!
//! Verification has two independent parts: the revealed server seed must hash
//! to the commitment published before the round, and the seeds must
//! reproduce the published outcome. Either failure is reported separately.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{CrashConfig, MinesConfig};
use crate::crash::crash_point;
use crate::engine::{Outcome, Reveal};
use crate::error::{EngineError, Result};
use crate::mines::mine_positions;
use crate::seed::{commit, Commitment, SeedPair, ServerSeed};

/// Crash points are exact hundredths; this only absorbs display rounding.
pub const DEFAULT_EPSILON: f64 = 1e-9;

pub fn verify_commitment(server_seed: &ServerSeed, published: &Commitment) -> Result<()> {
    let recomputed = commit(server_seed);
    if &recomputed != published {
        warn!(published = %published, recomputed = %recomputed, "commitment mismatch");
        return Err(EngineError::CommitmentMismatch {
            published: published.to_string(),
            recomputed: recomputed.to_string(),
        });
    }
    Ok(())
}

/// Recomputed crash outcome, or a `VerificationMismatch` naming both values.
pub fn check_crash(
    seeds: &SeedPair,
    published_point: f64,
    epsilon: f64,
    config: &CrashConfig,
) -> Result<Outcome> {
    let expected = Outcome::from(crash_point(seeds, config)?);
    ensure_match(expected, Outcome::Crash { multiplier: published_point }, epsilon)
}

pub fn check_mines(
    seeds: &SeedPair,
    mine_count: u16,
    published_positions: &[u16],
    config: &MinesConfig,
) -> Result<Outcome> {
    let expected = Outcome::Mines {
        positions: mine_positions(seeds, mine_count, config)?,
    };
    let mut published = published_positions.to_vec();
    published.sort_unstable();
    ensure_match(expected, Outcome::Mines { positions: published }, 0.0)
}

pub fn verify_crash(
    seeds: &SeedPair,
    published_point: f64,
    epsilon: f64,
    config: &CrashConfig,
) -> bool {
    check_crash(seeds, published_point, epsilon, config).is_ok()
}

pub fn verify_mines(
    seeds: &SeedPair,
    mine_count: u16,
    published_positions: &[u16],
    config: &MinesConfig,
) -> bool {
    check_mines(seeds, mine_count, published_positions, config).is_ok()
}

fn outcomes_match(expected: &Outcome, published: &Outcome, epsilon: f64) -> bool {
    match (expected, published) {
        (Outcome::Crash { multiplier: a }, Outcome::Crash { multiplier: b }) => {
            (a - b).abs() <= epsilon
        }
        (Outcome::Mines { positions: a }, Outcome::Mines { positions: b }) => a == b,
        _ => false,
    }
}

fn ensure_match(expected: Outcome, published: Outcome, epsilon: f64) -> Result<Outcome> {
    if outcomes_match(&expected, &published, epsilon) {
        Ok(expected)
    } else {
        warn!(expected = %expected, published = %published, "outcome mismatch");
        Err(EngineError::VerificationMismatch { expected, published })
    }
}

/// Full report for a published round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    /// `None` when no commitment was supplied.
    pub commitment_valid: Option<bool>,
    /// What the revealed server seed hashes to, whether or not a commitment
    /// was supplied.
    pub recomputed_commitment: Commitment,
    pub outcome_valid: bool,
    pub published: Outcome,
    pub recomputed: Outcome,
}

impl Audit {
    pub fn is_valid(&self) -> bool {
        self.outcome_valid && self.commitment_valid != Some(false)
    }
}

/// Audits a claimed outcome. Only malformed input is an `Err`; mismatches
/// are reported in the returned [`Audit`].
pub fn audit(
    seeds: &SeedPair,
    commitment: Option<&Commitment>,
    published: &Outcome,
    epsilon: f64,
    crash: &CrashConfig,
    mines: &MinesConfig,
) -> Result<Audit> {
    let recomputed = match published {
        Outcome::Crash { .. } => Outcome::from(crash_point(seeds, crash)?),
        Outcome::Mines { positions } => {
            let mine_count = u16::try_from(positions.len())
                .map_err(|_| EngineError::invalid("too many published positions"))?;
            Outcome::Mines {
                positions: mine_positions(seeds, mine_count, mines)?,
            }
        }
    };
    let published = match published {
        Outcome::Mines { positions } => {
            let mut sorted = positions.clone();
            sorted.sort_unstable();
            Outcome::Mines { positions: sorted }
        }
        other => other.clone(),
    };
    let recomputed_commitment = commit(&seeds.server_seed);
    let commitment_valid = commitment.map(|published| {
        let valid = *published == recomputed_commitment;
        if !valid {
            warn!(
                published = %published,
                recomputed = %recomputed_commitment,
                "commitment mismatch"
            );
        }
        valid
    });
    Ok(Audit {
        commitment_valid,
        recomputed_commitment,
        outcome_valid: outcomes_match(&recomputed, &published, epsilon),
        published,
        recomputed,
    })
}

/// Checks a reveal end to end; the first failing part becomes the error.
pub fn verify_reveal(reveal: &Reveal, crash: &CrashConfig, mines: &MinesConfig) -> Result<Outcome> {
    verify_commitment(&reveal.server_seed, &reveal.commitment)?;
    let seeds = reveal.seeds();
    match &reveal.outcome {
        Outcome::Crash { multiplier } => check_crash(&seeds, *multiplier, DEFAULT_EPSILON, crash),
        Outcome::Mines { positions } => {
            let mine_count = u16::try_from(positions.len())
                .map_err(|_| EngineError::invalid("too many published positions"))?;
            check_mines(&seeds, mine_count, positions, mines)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HouseEdge;

    fn golden() -> SeedPair {
        SeedPair::parse(&"00".repeat(32), "abc123", 1).unwrap()
    }

    #[test]
    fn crash_accepts_exact_and_rejects_drift() {
        let cfg = CrashConfig::default();
        assert!(verify_crash(&golden(), 3.20, DEFAULT_EPSILON, &cfg));
        assert!(!verify_crash(&golden(), 3.21, DEFAULT_EPSILON, &cfg));
        assert!(verify_crash(&golden(), 3.21, 0.011, &cfg));
    }

    #[test]
    fn crash_mismatch_is_structured() {
        let err =
            check_crash(&golden(), 5.0, DEFAULT_EPSILON, &CrashConfig::default()).unwrap_err();
        assert_eq!(
            err,
            EngineError::VerificationMismatch {
                expected: Outcome::Crash { multiplier: 3.2 },
                published: Outcome::Crash { multiplier: 5.0 },
            }
        );
    }

    #[test]
    fn crash_edge_must_match_published_config() {
        let legacy = CrashConfig {
            house_edge: HouseEdge::ZERO,
            ..CrashConfig::default()
        };
        assert!(verify_crash(&golden(), 3.23, DEFAULT_EPSILON, &legacy));
        assert!(!verify_crash(&golden(), 3.23, DEFAULT_EPSILON, &CrashConfig::default()));
    }

    #[test]
    fn mines_order_insensitive_exact_set() {
        let cfg = MinesConfig::default();
        assert!(verify_mines(&golden(), 5, &[22, 6, 5, 1, 0], &cfg));
        assert!(!verify_mines(&golden(), 5, &[0, 1, 5, 6, 23], &cfg));
        assert!(!verify_mines(&golden(), 5, &[0, 1, 5, 6], &cfg));
    }

    #[test]
    fn commitment_check() {
        let seed = golden().server_seed;
        assert!(verify_commitment(&seed, &commit(&seed)).is_ok());
        let other = ServerSeed::from_hex("11".repeat(32)).unwrap();
        assert!(matches!(
            verify_commitment(&seed, &commit(&other)),
            Err(EngineError::CommitmentMismatch { .. })
        ));
    }

    #[test]
    fn audit_reports_parts_separately() {
        let seeds = golden();
        let wrong_commitment = commit(&ServerSeed::from_hex("11".repeat(32)).unwrap());
        let report = audit(
            &seeds,
            Some(&wrong_commitment),
            &Outcome::Mines { positions: vec![22, 0, 1, 5, 6] },
            0.0,
            &CrashConfig::default(),
            &MinesConfig::default(),
        )
        .unwrap();
        assert_eq!(report.commitment_valid, Some(false));
        assert_eq!(report.recomputed_commitment, commit(&seeds.server_seed));
        assert_ne!(report.recomputed_commitment, wrong_commitment);
        assert!(report.outcome_valid);
        assert!(!report.is_valid());

        let report = audit(
            &seeds,
            None,
            &Outcome::Crash { multiplier: 2.0 },
            DEFAULT_EPSILON,
            &CrashConfig::default(),
            &MinesConfig::default(),
        )
        .unwrap();
        assert_eq!(report.commitment_valid, None);
        assert!(!report.outcome_valid);
        assert_eq!(report.recomputed, Outcome::Crash { multiplier: 3.2 });
    }

    #[test]
    fn reveal_with_tampered_seed_fails_commitment_first() {
        let seeds = golden();
        let reveal = Reveal {
            server_seed: ServerSeed::from_hex("11".repeat(32)).unwrap(),
            client_seed: seeds.client_seed.clone(),
            nonce: seeds.nonce,
            commitment: commit(&seeds.server_seed),
            outcome: Outcome::Crash { multiplier: 3.2 },
        };
        assert!(matches!(
            verify_reveal(&reveal, &CrashConfig::default(), &MinesConfig::default()),
            Err(EngineError::CommitmentMismatch { .. })
        ));
    }
}
