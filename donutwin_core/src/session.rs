//! Per-player seed state.
//!
//! A session owns the client seed and the nonce that goes with it. Callers
//! keep one `PlayerSession` per player behind exclusive access; starting a
//! round consumes the current nonce, so two rounds can never share a triple.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::seed::{ClientSeed, SeedPair, ServerSeed};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSession {
    client_seed: ClientSeed,
    nonce: u64,
}

/// Audit record of a client-seed change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedRotation {
    pub previous_client_seed: ClientSeed,
    /// Rounds played with the previous seed, which is also its final nonce.
    pub rounds_played: u64,
    pub client_seed: ClientSeed,
}

impl PlayerSession {
    pub fn new(client_seed: ClientSeed) -> Self {
        Self {
            client_seed,
            nonce: 0,
        }
    }

    #[cfg(feature = "entropy")]
    pub fn generate() -> Result<Self> {
        Ok(Self::new(crate::seed::new_client_seed()?))
    }

    pub fn client_seed(&self) -> &ClientSeed {
        &self.client_seed
    }

    /// Nonce the next round will use.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Binds `server_seed` to the current client seed and nonce, then
    /// advances the nonce by one.
    pub fn next_round(&mut self, server_seed: ServerSeed) -> Result<SeedPair> {
        let next = self.nonce.checked_add(1).ok_or_else(|| {
            EngineError::invalid("nonce space exhausted; rotate the client seed")
        })?;
        let seeds = SeedPair::new(server_seed, self.client_seed.clone(), self.nonce);
        self.nonce = next;
        Ok(seeds)
    }

    /// Switches to `client_seed` and restarts the nonce at 0.
    pub fn rotate_client_seed(&mut self, client_seed: ClientSeed) -> Result<SeedRotation> {
        if client_seed == self.client_seed {
            return Err(EngineError::invalid(
                "new client seed must differ from the current one",
            ));
        }
        let previous = std::mem::replace(&mut self.client_seed, client_seed);
        let rounds_played = std::mem::replace(&mut self.nonce, 0);
        Ok(SeedRotation {
            previous_client_seed: previous,
            rounds_played,
            client_seed: self.client_seed.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_seed() -> ServerSeed {
        ServerSeed::from_hex("00".repeat(32)).unwrap()
    }

    #[test]
    fn nonces_are_consumed_once() {
        let mut session = PlayerSession::new(ClientSeed::new("abc123").unwrap());
        let nonces: Vec<u64> = (0..5)
            .map(|_| session.next_round(server_seed()).unwrap().nonce)
            .collect();
        assert_eq!(nonces, vec![0, 1, 2, 3, 4]);
        assert_eq!(session.nonce(), 5);
    }

    #[test]
    fn rotation_resets_nonce() {
        let mut session = PlayerSession::new(ClientSeed::new("abc123").unwrap());
        session.next_round(server_seed()).unwrap();
        session.next_round(server_seed()).unwrap();
        let rotation = session
            .rotate_client_seed(ClientSeed::new("fresh").unwrap())
            .unwrap();
        assert_eq!(rotation.previous_client_seed.as_str(), "abc123");
        assert_eq!(rotation.rounds_played, 2);
        assert_eq!(session.nonce(), 0);
        assert_eq!(session.client_seed().as_str(), "fresh");
    }

    #[test]
    fn rotation_to_same_seed_rejected() {
        let mut session = PlayerSession::new(ClientSeed::new("abc123").unwrap());
        session.next_round(server_seed()).unwrap();
        assert!(session
            .rotate_client_seed(ClientSeed::new("abc123").unwrap())
            .is_err());
        assert_eq!(session.nonce(), 1);
    }

    #[test]
    fn exhausted_nonce_space_is_an_error() {
        let mut session = PlayerSession {
            client_seed: ClientSeed::new("abc123").unwrap(),
            nonce: u64::MAX,
        };
        assert!(session.next_round(server_seed()).is_err());
        assert_eq!(session.nonce(), u64::MAX);
    }
}
