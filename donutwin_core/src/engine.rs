use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{CrashConfig, MinesConfig};
use crate::crash::{crash_point, CrashPoint};
use crate::error::Result;
use crate::mines::mine_positions;
use crate::seed::{commit, ClientSeed, Commitment, SeedPair, ServerSeed};
use crate::session::PlayerSession;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum Outcome {
    Crash { multiplier: f64 },
    Mines { positions: Vec<u16> },
}

impl From<CrashPoint> for Outcome {
    fn from(point: CrashPoint) -> Self {
        Outcome::Crash {
            multiplier: point.as_f64(),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Crash { multiplier } => write!(f, "crash at {multiplier:.2}x"),
            Outcome::Mines { positions } => write!(f, "mines at {positions:?}"),
        }
    }
}

/// What the player sees before the round is played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStart {
    pub commitment: Commitment,
    pub client_seed: ClientSeed,
    pub nonce: u64,
}

/// What the player receives once the round is over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reveal {
    pub server_seed: ServerSeed,
    pub client_seed: ClientSeed,
    pub nonce: u64,
    pub commitment: Commitment,
    pub outcome: Outcome,
}

impl Reveal {
    pub fn seeds(&self) -> SeedPair {
        SeedPair::new(self.server_seed.clone(), self.client_seed.clone(), self.nonce)
    }
}

/// Outcome held in its exact form until the round is revealed.
#[derive(Debug, Clone, PartialEq)]
enum Sealed {
    Crash(CrashPoint),
    Mines(Vec<u16>),
}

impl From<Sealed> for Outcome {
    fn from(sealed: Sealed) -> Self {
        match sealed {
            Sealed::Crash(point) => point.into(),
            Sealed::Mines(positions) => Outcome::Mines { positions },
        }
    }
}

/// A round whose outcome is fixed but whose server seed is still secret.
#[derive(Debug, Clone)]
pub struct ActiveRound {
    seeds: SeedPair,
    commitment: Commitment,
    sealed: Sealed,
}

impl ActiveRound {
    /// Inputs are validated before the session's nonce is consumed.
    pub fn start_crash(
        session: &mut PlayerSession,
        server_seed: ServerSeed,
        config: &CrashConfig,
    ) -> Result<Self> {
        config.validate()?;
        let seeds = session.next_round(server_seed)?;
        let point = crash_point(&seeds, config)?;
        Ok(Self::seal(seeds, Sealed::Crash(point)))
    }

    pub fn start_mines(
        session: &mut PlayerSession,
        server_seed: ServerSeed,
        mine_count: u16,
        config: &MinesConfig,
    ) -> Result<Self> {
        config.check_mine_count(mine_count)?;
        let seeds = session.next_round(server_seed)?;
        let positions = mine_positions(&seeds, mine_count, config)?;
        Ok(Self::seal(seeds, Sealed::Mines(positions)))
    }

    fn seal(seeds: SeedPair, sealed: Sealed) -> Self {
        Self {
            commitment: commit(&seeds.server_seed),
            seeds,
            sealed,
        }
    }

    pub fn announce(&self) -> RoundStart {
        RoundStart {
            commitment: self.commitment.clone(),
            client_seed: self.seeds.client_seed.clone(),
            nonce: self.seeds.nonce,
        }
    }

    pub fn commitment(&self) -> &Commitment {
        &self.commitment
    }

    /// The hidden outcome, for settling gameplay. Never send this to the
    /// player before [`ActiveRound::reveal`].
    pub fn outcome(&self) -> Outcome {
        self.sealed.clone().into()
    }

    pub fn crash_point(&self) -> Option<CrashPoint> {
        match self.sealed {
            Sealed::Crash(point) => Some(point),
            Sealed::Mines(_) => None,
        }
    }

    pub fn mines(&self) -> Option<&[u16]> {
        match &self.sealed {
            Sealed::Mines(positions) => Some(positions),
            Sealed::Crash(_) => None,
        }
    }

    pub fn reveal(self) -> Reveal {
        Reveal {
            server_seed: self.seeds.server_seed,
            client_seed: self.seeds.client_seed,
            nonce: self.seeds.nonce,
            commitment: self.commitment,
            outcome: self.sealed.into(),
        }
    }
}
