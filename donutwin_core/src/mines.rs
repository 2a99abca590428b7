use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::MinesConfig;
use crate::error::{EngineError, Result};
use crate::payout::mines_multiplier;
use crate::rng::DigestStream;
use crate::seed::SeedPair;

/// Hex characters consumed per placement draw (one byte).
pub const DRAW_HEX_CHARS: usize = 2;

/// Mine positions for a round, sorted ascending.
///
/// Each byte of the digest stream is reduced modulo the grid size and
/// duplicates are skipped. When a digest runs out the stream moves to the
/// next extension digest, so the placement is always reproducible from the
/// seeds alone.
pub fn mine_positions(seeds: &SeedPair, mine_count: u16, config: &MinesConfig) -> Result<Vec<u16>> {
    config.check_mine_count(mine_count)?;
    let grid = u64::from(config.grid_size);
    let mut stream = DigestStream::new(seeds);
    let mut mines = BTreeSet::new();
    while mines.len() < usize::from(mine_count) {
        match stream.next_bits(DRAW_HEX_CHARS) {
            Some(byte) => {
                mines.insert((byte % grid) as u16);
            }
            None => stream.extend()?,
        }
    }
    if stream.rounds() > 0 {
        debug!(rounds = stream.rounds(), mine_count, "mines placement used extension digests");
    }
    Ok(mines.into_iter().collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardState {
    Playing,
    Busted { tile: u16 },
    Cleared,
    CashedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Pick {
    Safe { safe_picks: u16, multiplier: f64, cleared: bool },
    Mine { tile: u16 },
}

/// Play state of one mines round: which tiles the player has opened.
#[derive(Debug, Clone)]
pub struct MinesBoard {
    config: MinesConfig,
    mines: BTreeSet<u16>,
    picks: BTreeSet<u16>,
    state: BoardState,
}

impl MinesBoard {
    pub fn new(mines: &[u16], config: &MinesConfig) -> Self {
        Self {
            config: *config,
            mines: mines.iter().copied().collect(),
            picks: BTreeSet::new(),
            state: BoardState::Playing,
        }
    }

    pub fn state(&self) -> BoardState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state != BoardState::Playing
    }

    pub fn mine_count(&self) -> u16 {
        self.mines.len() as u16
    }

    pub fn safe_picks(&self) -> u16 {
        self.picks.len() as u16
    }

    pub fn multiplier(&self) -> f64 {
        mines_multiplier(
            self.config.grid_size,
            self.mine_count(),
            self.safe_picks(),
            self.config.house_edge,
        )
    }

    pub fn pick(&mut self, tile: u16) -> Result<Pick> {
        if self.is_finished() {
            return Err(EngineError::invalid("round is already finished"));
        }
        if tile >= self.config.grid_size {
            return Err(EngineError::invalid(format!(
                "tile {tile} is outside a grid of {}",
                self.config.grid_size
            )));
        }
        if self.picks.contains(&tile) {
            return Err(EngineError::invalid(format!("tile {tile} is already open")));
        }
        if self.mines.contains(&tile) {
            self.state = BoardState::Busted { tile };
            return Ok(Pick::Mine { tile });
        }
        self.picks.insert(tile);
        let cleared = self.safe_picks() >= self.config.grid_size.saturating_sub(self.mine_count());
        if cleared {
            self.state = BoardState::Cleared;
        }
        Ok(Pick::Safe {
            safe_picks: self.safe_picks(),
            multiplier: self.multiplier(),
            cleared,
        })
    }

    /// Ends the round and returns the multiplier earned so far.
    pub fn cash_out(&mut self) -> Result<f64> {
        if self.is_finished() {
            return Err(EngineError::invalid("round is already finished"));
        }
        if self.picks.is_empty() {
            return Err(EngineError::invalid("pick at least one tile before cashing out"));
        }
        self.state = BoardState::CashedOut;
        Ok(self.multiplier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn golden() -> SeedPair {
        SeedPair::parse(&"00".repeat(32), "abc123", 1).unwrap()
    }

    #[test]
    fn golden_vector() {
        let mines = mine_positions(&golden(), 5, &MinesConfig::default()).unwrap();
        assert_eq!(mines, vec![0, 1, 5, 6, 22]);
    }

    #[test]
    fn degenerate_count_uses_extension() {
        let mines = mine_positions(&golden(), 24, &MinesConfig::default()).unwrap();
        let expected: Vec<u16> = (0..25).filter(|&t| t != 12).collect();
        assert_eq!(mines, expected);
    }

    #[test]
    fn rejects_out_of_range_counts() {
        let cfg = MinesConfig::default();
        for count in [0, 25, 40] {
            assert!(matches!(
                mine_positions(&golden(), count, &cfg),
                Err(EngineError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn smaller_grid() {
        let mines = mine_positions(&golden(), 3, &MinesConfig::with_grid(9)).unwrap();
        assert_eq!(mines, vec![0, 5, 6]);
    }

    #[test]
    fn board_bust() {
        let mut board = MinesBoard::new(&[0, 1, 5, 6, 22], &MinesConfig::default());
        assert!(matches!(board.pick(2).unwrap(), Pick::Safe { safe_picks: 1, .. }));
        assert_eq!(board.pick(5).unwrap(), Pick::Mine { tile: 5 });
        assert_eq!(board.state(), BoardState::Busted { tile: 5 });
        assert!(board.pick(3).is_err());
        assert!(board.cash_out().is_err());
    }

    #[test]
    fn board_rejects_repeat_and_outside_picks() {
        let mut board = MinesBoard::new(&[0], &MinesConfig::default());
        board.pick(3).unwrap();
        assert!(board.pick(3).is_err());
        assert!(board.pick(25).is_err());
        assert_eq!(board.safe_picks(), 1);
    }

    #[test]
    fn cash_out_needs_a_pick() {
        let mut board = MinesBoard::new(&[0], &MinesConfig::default());
        assert!(board.cash_out().is_err());
        board.pick(1).unwrap();
        let multiplier = board.cash_out().unwrap();
        assert!(multiplier > 1.0);
        assert_eq!(board.state(), BoardState::CashedOut);
    }

    #[test]
    fn board_cleared_when_all_safe_tiles_open() {
        let cfg = MinesConfig::with_grid(3);
        let mut board = MinesBoard::new(&[1], &cfg);
        board.pick(0).unwrap();
        match board.pick(2).unwrap() {
            Pick::Safe { cleared, .. } => assert!(cleared),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(board.state(), BoardState::Cleared);
    }
}
