//! Browser-side verification. A player pastes the reveal bundle into the
//! page and these bindings recompute the outcome locally, without trusting
//! the server.

use donutwin_core::{
    audit, commit, crash_point as derive_crash_point, mine_positions as derive_mine_positions,
    Audit, Commitment, CrashConfig, CrashPoint, EngineError, HouseEdge, MinesConfig, Outcome,
    SeedPair, ServerSeed, DEFAULT_EPSILON,
};
use wasm_bindgen::prelude::*;

fn to_js(err: EngineError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn crash_config(house_edge_bps: u16, max_point: f64) -> Result<CrashConfig, EngineError> {
    Ok(CrashConfig {
        house_edge: HouseEdge::from_bps(house_edge_bps)?,
        max_point: CrashPoint::from_f64(max_point)?,
    })
}

#[wasm_bindgen]
pub fn commitment(server_seed: &str) -> Result<String, JsValue> {
    let seed = ServerSeed::from_hex(server_seed).map_err(to_js)?;
    Ok(commit(&seed).into())
}

#[wasm_bindgen]
pub fn crash_point(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    house_edge_bps: u16,
    max_point: f64,
) -> Result<f64, JsValue> {
    let seeds = SeedPair::parse(server_seed, client_seed, nonce).map_err(to_js)?;
    let cfg = crash_config(house_edge_bps, max_point).map_err(to_js)?;
    Ok(derive_crash_point(&seeds, &cfg).map_err(to_js)?.as_f64())
}

#[wasm_bindgen]
pub fn mine_positions(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    mine_count: u16,
    grid_size: u16,
) -> Result<Vec<u16>, JsValue> {
    let seeds = SeedPair::parse(server_seed, client_seed, nonce).map_err(to_js)?;
    derive_mine_positions(&seeds, mine_count, &MinesConfig::with_grid(grid_size)).map_err(to_js)
}

/// Outcome of checking a published round. Mismatches land here; only
/// malformed input is thrown.
#[wasm_bindgen]
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyReport {
    commitment_valid: bool,
    recomputed_commitment: String,
    outcome_valid: bool,
    recomputed: Outcome,
}

impl From<Audit> for VerifyReport {
    fn from(audit: Audit) -> Self {
        Self {
            commitment_valid: audit.commitment_valid == Some(true),
            recomputed_commitment: audit.recomputed_commitment.into(),
            outcome_valid: audit.outcome_valid,
            recomputed: audit.recomputed,
        }
    }
}

#[wasm_bindgen]
impl VerifyReport {
    #[wasm_bindgen(getter)]
    pub fn valid(&self) -> bool {
        self.commitment_valid && self.outcome_valid
    }

    #[wasm_bindgen(getter)]
    pub fn commitment_valid(&self) -> bool {
        self.commitment_valid
    }

    /// What the revealed server seed actually hashes to.
    #[wasm_bindgen(getter)]
    pub fn recomputed_commitment(&self) -> String {
        self.recomputed_commitment.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn outcome_valid(&self) -> bool {
        self.outcome_valid
    }

    #[wasm_bindgen(getter)]
    pub fn recomputed_multiplier(&self) -> Option<f64> {
        match self.recomputed {
            Outcome::Crash { multiplier } => Some(multiplier),
            Outcome::Mines { .. } => None,
        }
    }

    /// Sorted mine tiles; empty for a crash round.
    #[wasm_bindgen(getter)]
    pub fn recomputed_positions(&self) -> Vec<u16> {
        match &self.recomputed {
            Outcome::Mines { positions } => positions.clone(),
            Outcome::Crash { .. } => Vec::new(),
        }
    }
}

#[wasm_bindgen]
pub fn verify_crash(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    commitment_hash: &str,
    multiplier: f64,
    house_edge_bps: u16,
    max_point: f64,
) -> Result<VerifyReport, JsValue> {
    let seeds = SeedPair::parse(server_seed, client_seed, nonce).map_err(to_js)?;
    let published = Commitment::from_hex(commitment_hash).map_err(to_js)?;
    let cfg = crash_config(house_edge_bps, max_point).map_err(to_js)?;
    let report = audit(
        &seeds,
        Some(&published),
        &Outcome::Crash { multiplier },
        DEFAULT_EPSILON,
        &cfg,
        &MinesConfig::default(),
    )
    .map_err(to_js)?;
    Ok(report.into())
}

#[wasm_bindgen]
pub fn verify_mines(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    commitment_hash: &str,
    positions: Vec<u16>,
    grid_size: u16,
) -> Result<VerifyReport, JsValue> {
    let seeds = SeedPair::parse(server_seed, client_seed, nonce).map_err(to_js)?;
    let published = Commitment::from_hex(commitment_hash).map_err(to_js)?;
    let report = audit(
        &seeds,
        Some(&published),
        &Outcome::Mines { positions },
        0.0,
        &CrashConfig::default(),
        &MinesConfig::with_grid(grid_size),
    )
    .map_err(to_js)?;
    Ok(report.into())
}
