//! Seeds, the server-seed commitment and the per-round seed triple.
//!
//! Seeds travel as text: a server seed is 32 random bytes rendered as 64
//! lowercase hex characters, and both the commitment and outcome digests
//! hash that text. This keeps every published value reproducible with a
//! plain SHA-256 tool.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::rng::derive_hash_hex;

pub const SERVER_SEED_BYTES: usize = 32;
pub const CLIENT_SEED_BYTES: usize = 16;
pub const MAX_CLIENT_SEED_LEN: usize = 64;

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Secret half of the seed triple. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerSeed(String);

impl ServerSeed {
    pub fn from_hex(hex: impl Into<String>) -> Result<Self> {
        let hex = hex.into();
        if hex.len() != SERVER_SEED_BYTES * 2 || !is_lower_hex(&hex) {
            return Err(EngineError::invalid(format!(
                "server seed must be {} lowercase hex characters",
                SERVER_SEED_BYTES * 2
            )));
        }
        Ok(Self(hex))
    }

    pub fn from_bytes(bytes: [u8; SERVER_SEED_BYTES]) -> Self {
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn commitment(&self) -> Commitment {
        commit(self)
    }
}

impl fmt::Debug for ServerSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServerSeed(<redacted>)")
    }
}

impl TryFrom<String> for ServerSeed {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(value)
    }
}

impl From<ServerSeed> for String {
    fn from(seed: ServerSeed) -> String {
        seed.0
    }
}

/// Player-owned half of the seed triple. Either generated or chosen by the
/// player; `:` is refused so the `server:client:nonce` message stays
/// unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientSeed(String);

impl ClientSeed {
    pub fn new(seed: impl Into<String>) -> Result<Self> {
        let seed = seed.into();
        if seed.is_empty() || seed.len() > MAX_CLIENT_SEED_LEN {
            return Err(EngineError::invalid(format!(
                "client seed must be 1..={MAX_CLIENT_SEED_LEN} bytes"
            )));
        }
        if seed.chars().any(|c| c == ':' || c.is_control()) {
            return Err(EngineError::invalid(
                "client seed must not contain ':' or control characters",
            ));
        }
        Ok(Self(seed))
    }

    pub fn from_bytes(bytes: [u8; CLIENT_SEED_BYTES]) -> Self {
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ClientSeed {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ClientSeed> for String {
    fn from(seed: ClientSeed) -> String {
        seed.0
    }
}

/// SHA-256 of the server seed, published before the round is played.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Commitment(String);

impl Commitment {
    /// Parses a published commitment; uppercase hex is accepted and normalized.
    pub fn from_hex(hex: impl Into<String>) -> Result<Self> {
        let hex = hex.into().to_ascii_lowercase();
        if hex.len() != 64 || !is_lower_hex(&hex) {
            return Err(EngineError::invalid("commitment must be 64 hex characters"));
        }
        Ok(Self(hex))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Commitment {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(value)
    }
}

impl From<Commitment> for String {
    fn from(c: Commitment) -> String {
        c.0
    }
}

/// The inputs of one round. A triple is never used for two published outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPair {
    pub server_seed: ServerSeed,
    pub client_seed: ClientSeed,
    pub nonce: u64,
}

impl SeedPair {
    pub fn new(server_seed: ServerSeed, client_seed: ClientSeed, nonce: u64) -> Self {
        Self {
            server_seed,
            client_seed,
            nonce,
        }
    }

    /// Parses the three fields as they appear in a reveal.
    pub fn parse(server_seed: &str, client_seed: &str, nonce: u64) -> Result<Self> {
        Ok(Self::new(
            ServerSeed::from_hex(server_seed)?,
            ClientSeed::new(client_seed)?,
            nonce,
        ))
    }
}

pub fn commit(server_seed: &ServerSeed) -> Commitment {
    Commitment(derive_hash_hex(server_seed.as_str().as_bytes()))
}

#[cfg(feature = "entropy")]
fn os_random<const N: usize>() -> Result<[u8; N]> {
    use rand::RngCore;

    let mut buf = [0u8; N];
    rand::rngs::OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| EngineError::EntropyUnavailable(e.to_string()))?;
    Ok(buf)
}

/// Fresh secret seed from the operating system. There is no fallback source.
#[cfg(feature = "entropy")]
pub fn new_server_seed() -> Result<ServerSeed> {
    Ok(ServerSeed::from_bytes(os_random()?))
}

#[cfg(feature = "entropy")]
pub fn new_client_seed() -> Result<ClientSeed> {
    Ok(ClientSeed::from_bytes(os_random()?))
}
