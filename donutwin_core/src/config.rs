use serde::{Deserialize, Serialize};

use crate::crash::CrashPoint;
use crate::error::{EngineError, Result};

/// Largest grid a single digest byte can address.
pub const MAX_GRID_SIZE: u16 = 256;

/// House edge in basis points (100 = 1%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct HouseEdge(u16);

impl HouseEdge {
    pub const SCALE: u16 = 10_000;
    pub const ZERO: HouseEdge = HouseEdge(0);
    pub const CRASH_DEFAULT: HouseEdge = HouseEdge(100);
    pub const MINES_DEFAULT: HouseEdge = HouseEdge(300);

    pub fn from_bps(bps: u16) -> Result<Self> {
        if bps >= Self::SCALE {
            return Err(EngineError::invalid(format!(
                "house edge must be below {} bps, got {bps}",
                Self::SCALE
            )));
        }
        Ok(Self(bps))
    }

    pub fn bps(self) -> u16 {
        self.0
    }

    /// Share of the stake returned to players on average, e.g. 0.99 for 1%.
    pub fn keep_fraction(self) -> f64 {
        f64::from(Self::SCALE - self.0) / f64::from(Self::SCALE)
    }
}

impl TryFrom<u16> for HouseEdge {
    type Error = EngineError;

    fn try_from(bps: u16) -> Result<Self> {
        Self::from_bps(bps)
    }
}

impl From<HouseEdge> for u16 {
    fn from(edge: HouseEdge) -> u16 {
        edge.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashConfig {
    pub house_edge: HouseEdge,
    /// Ceiling on the multiplier; bounds the house's liability per round.
    pub max_point: CrashPoint,
}

impl Default for CrashConfig {
    fn default() -> Self {
        Self {
            house_edge: HouseEdge::CRASH_DEFAULT,
            max_point: CrashPoint::DEFAULT_MAX,
        }
    }
}

impl CrashConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_point < CrashPoint::MIN {
            return Err(EngineError::invalid(format!(
                "max crash point {} is below {}",
                self.max_point,
                CrashPoint::MIN
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinesConfig {
    pub grid_size: u16,
    pub min_mines: u16,
    pub max_mines: u16,
    /// Applied to the payout multiplier only; mine placement is edge-free.
    pub house_edge: HouseEdge,
}

impl Default for MinesConfig {
    fn default() -> Self {
        Self {
            grid_size: 25,
            min_mines: 1,
            max_mines: 24,
            house_edge: HouseEdge::MINES_DEFAULT,
        }
    }
}

impl MinesConfig {
    /// Config for a grid allowing every mine count from 1 to `grid_size - 1`.
    pub fn with_grid(grid_size: u16) -> Self {
        Self {
            grid_size,
            min_mines: 1,
            max_mines: grid_size.saturating_sub(1),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(2..=MAX_GRID_SIZE).contains(&self.grid_size) {
            return Err(EngineError::invalid(format!(
                "grid size must be within 2..={MAX_GRID_SIZE}, got {}",
                self.grid_size
            )));
        }
        if self.min_mines == 0
            || self.min_mines > self.max_mines
            || self.max_mines >= self.grid_size
        {
            return Err(EngineError::invalid(format!(
                "mine bounds {}..={} do not fit a grid of {}",
                self.min_mines, self.max_mines, self.grid_size
            )));
        }
        Ok(())
    }

    pub fn check_mine_count(&self, mine_count: u16) -> Result<()> {
        self.validate()?;
        if mine_count < self.min_mines || mine_count > self.max_mines {
            return Err(EngineError::invalid(format!(
                "mine count must be within {}..={}, got {mine_count}",
                self.min_mines, self.max_mines
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn house_edge_bounds() {
        assert!(HouseEdge::from_bps(0).is_ok());
        assert!(HouseEdge::from_bps(9_999).is_ok());
        assert!(HouseEdge::from_bps(10_000).is_err());
        assert!((HouseEdge::CRASH_DEFAULT.keep_fraction() - 0.99).abs() < 1e-12);
    }

    #[test]
    fn house_edge_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<HouseEdge>("250").is_ok());
        assert!(serde_json::from_str::<HouseEdge>("12000").is_err());
    }

    #[test]
    fn mine_count_bounds() {
        let cfg = MinesConfig::default();
        assert!(cfg.check_mine_count(1).is_ok());
        assert!(cfg.check_mine_count(24).is_ok());
        assert!(matches!(cfg.check_mine_count(0), Err(EngineError::InvalidInput(_))));
        assert!(matches!(cfg.check_mine_count(25), Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn grid_limits() {
        assert!(MinesConfig::with_grid(256).validate().is_ok());
        assert!(MinesConfig::with_grid(257).validate().is_err());
        assert!(MinesConfig::with_grid(1).validate().is_err());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: MinesConfig =
            serde_json::from_str(r#"{"grid_size": 36, "max_mines": 35}"#).unwrap();
        assert_eq!(cfg.min_mines, 1);
        assert_eq!(cfg.house_edge, HouseEdge::MINES_DEFAULT);
        assert!(cfg.validate().is_ok());
    }
}
