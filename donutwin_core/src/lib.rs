pub mod config;
pub mod crash;
pub mod engine;
pub mod error;
pub mod mines;
pub mod payout;
pub mod rng;
pub mod seed;
pub mod session;
pub mod verify;

pub use crate::config::{CrashConfig, HouseEdge, MinesConfig};
pub use crate::crash::{crash_point, point_from_sample, CrashPoint};
pub use crate::engine::{ActiveRound, Outcome, Reveal, RoundStart};
pub use crate::error::{EngineError, Result};
pub use crate::mines::{mine_positions, BoardState, MinesBoard, Pick};
pub use crate::payout::{crash_payout, mines_multiplier, validate_bet};
pub use crate::rng::{derive_hash_hex, digest, take_bits, DigestStream, HexDigest};
pub use crate::seed::{commit, ClientSeed, Commitment, SeedPair, ServerSeed};
#[cfg(feature = "entropy")]
pub use crate::seed::{new_client_seed, new_server_seed};
pub use crate::session::{PlayerSession, SeedRotation};
pub use crate::verify::{
    audit, check_crash, check_mines, verify_commitment, verify_crash, verify_mines, verify_reveal,
    Audit, DEFAULT_EPSILON,
};
