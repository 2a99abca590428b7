use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use donutwin_core::{
    commit, new_server_seed, ActiveRound, Commitment, CrashPoint, MinesBoard, PlayerSession,
    ServerSeed,
};
use donutwin_shared::{ApiError, ApiResult, RoundLogEntry};
use tokio::sync::Mutex;

use crate::config::ServerConfig;

pub struct CrashGame {
    pub round: ActiveRound,
    pub bet: f64,
    pub cashout_at: CrashPoint,
}

pub struct MinesGame {
    pub round: ActiveRound,
    pub board: MinesBoard,
    pub bet: f64,
}

/// Everything the service keeps for one player. Guarded by its own mutex so
/// reading and advancing the nonce is never interleaved between requests.
pub struct PlayerState {
    pub session: PlayerSession,
    /// Seed for the next round, drawn and committed before any bet on it.
    next_server_seed: ServerSeed,
    pub crash: Option<CrashGame>,
    pub mines: Option<MinesGame>,
    pub history: VecDeque<RoundLogEntry>,
}

impl PlayerState {
    pub fn new(session: PlayerSession, next_server_seed: ServerSeed) -> Self {
        Self {
            session,
            next_server_seed,
            crash: None,
            mines: None,
            history: VecDeque::new(),
        }
    }

    pub fn open() -> donutwin_core::Result<Self> {
        Ok(Self::new(PlayerSession::generate()?, new_server_seed()?))
    }

    pub fn next_commitment(&self) -> Commitment {
        commit(&self.next_server_seed)
    }

    /// Plays the committed seed through `start` and, only if the round
    /// starts, commits to a fresh seed for the round after.
    pub fn start_round<F>(&mut self, start: F) -> donutwin_core::Result<ActiveRound>
    where
        F: FnOnce(&mut PlayerSession, ServerSeed) -> donutwin_core::Result<ActiveRound>,
    {
        let fresh = new_server_seed()?;
        let round = start(&mut self.session, self.next_server_seed.clone())?;
        self.next_server_seed = fresh;
        Ok(round)
    }

    pub fn has_active_round(&self) -> bool {
        self.crash.is_some() || self.mines.is_some()
    }

    pub fn record(&mut self, entry: RoundLogEntry, limit: usize) {
        self.history.push_front(entry);
        self.history.truncate(limit);
    }
}

pub struct AppState {
    pub config: ServerConfig,
    players: DashMap<String, Arc<Mutex<PlayerState>>>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            players: DashMap::new(),
        }
    }

    /// Session for `player`, opened with fresh seeds if there is none yet.
    pub fn open(&self, player: &str) -> donutwin_core::Result<Arc<Mutex<PlayerState>>> {
        if let Some(existing) = self.players.get(player) {
            return Ok(existing.value().clone());
        }
        let fresh = Arc::new(Mutex::new(PlayerState::open()?));
        Ok(self
            .players
            .entry(player.to_string())
            .or_insert(fresh)
            .value()
            .clone())
    }

    pub fn player(&self, player: &str) -> ApiResult<Arc<Mutex<PlayerState>>> {
        self.players
            .get(player)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ApiError::NotFound("no session for this player, open one first".into()))
    }
}
