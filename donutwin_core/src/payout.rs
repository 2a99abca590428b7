use crate::config::HouseEdge;
use crate::crash::CrashPoint;
use crate::error::{EngineError, Result};

pub fn validate_bet(bet: f64) -> Result<()> {
    if !bet.is_finite() || bet <= 0.0 {
        return Err(EngineError::invalid(format!("bet must be a positive amount, got {bet}")));
    }
    Ok(())
}

/// Fair odds of surviving `safe_picks` draws without replacement, scaled by
/// the house edge. Zero picks pay 1.0 (the stake back).
pub fn mines_multiplier(grid_size: u16, mine_count: u16, safe_picks: u16, edge: HouseEdge) -> f64 {
    if safe_picks == 0 {
        return 1.0;
    }
    let safe_tiles = grid_size.saturating_sub(mine_count);
    let mut multiplier = 1.0;
    for i in 0..safe_picks.min(safe_tiles) {
        multiplier *= f64::from(grid_size - i) / f64::from(safe_tiles - i);
    }
    multiplier * edge.keep_fraction()
}

/// Payout for an auto-cashout target against the round's crash point.
pub fn crash_payout(bet: f64, cashout: CrashPoint, point: CrashPoint) -> f64 {
    if cashout <= point {
        bet * cashout.as_f64()
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mines_multiplier_matches_odds() {
        assert_eq!(mines_multiplier(25, 5, 0, HouseEdge::MINES_DEFAULT), 1.0);
        let one = mines_multiplier(25, 5, 1, HouseEdge::ZERO);
        assert!((one - 1.25).abs() < 1e-12);
        let two = mines_multiplier(25, 5, 2, HouseEdge::MINES_DEFAULT);
        assert!((two - 25.0 / 20.0 * 24.0 / 19.0 * 0.97).abs() < 1e-12);
    }

    #[test]
    fn mines_multiplier_grows_with_picks() {
        let mut last = 0.0;
        for picks in 1..=20 {
            let m = mines_multiplier(25, 5, picks, HouseEdge::MINES_DEFAULT);
            assert!(m > last);
            last = m;
        }
    }

    #[test]
    fn crash_payout_pays_only_below_point() {
        let point = CrashPoint::from_cents(320);
        assert_eq!(crash_payout(10.0, CrashPoint::from_cents(200), point), 20.0);
        assert_eq!(crash_payout(10.0, point, point), 32.0);
        assert_eq!(crash_payout(10.0, CrashPoint::from_cents(321), point), 0.0);
    }

    #[test]
    fn bets_must_be_positive() {
        assert!(validate_bet(1.0).is_ok());
        for bet in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(validate_bet(bet), Err(EngineError::InvalidInput(_))));
        }
    }
}
