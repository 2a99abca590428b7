use std::env;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::Context;
use donutwin_core::{CrashConfig, CrashPoint, HouseEdge, MinesConfig};

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub crash: CrashConfig,
    pub mines: MinesConfig,
    /// Revealed rounds kept per player.
    pub history_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            crash: CrashConfig::default(),
            mines: MinesConfig::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

fn parse_var<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{name}={raw:?}: {e}")),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("reading {name}")),
    }
}

impl ServerConfig {
    /// Reads overrides from the environment (after `.env` has been loaded).
    pub fn from_env() -> anyhow::Result<Self> {
        let mut cfg = Self::default();
        if let Some(bind) = parse_var::<String>("BIND")? {
            cfg.bind = bind;
        }
        if let Some(bps) = parse_var("CRASH_HOUSE_EDGE_BPS")? {
            cfg.crash.house_edge = HouseEdge::from_bps(bps)?;
        }
        if let Some(max) = parse_var("CRASH_MAX_POINT")? {
            cfg.crash.max_point = CrashPoint::from_f64(max)?;
        }
        if let Some(grid) = parse_var::<u16>("MINES_GRID_SIZE")? {
            cfg.mines = MinesConfig {
                house_edge: cfg.mines.house_edge,
                ..MinesConfig::with_grid(grid)
            };
        }
        if let Some(min) = parse_var("MINES_MIN_MINES")? {
            cfg.mines.min_mines = min;
        }
        if let Some(max) = parse_var("MINES_MAX_MINES")? {
            cfg.mines.max_mines = max;
        }
        if let Some(bps) = parse_var("MINES_HOUSE_EDGE_BPS")? {
            cfg.mines.house_edge = HouseEdge::from_bps(bps)?;
        }
        if let Some(limit) = parse_var("HISTORY_LIMIT")? {
            cfg.history_limit = limit;
        }
        cfg.crash.validate().context("crash config")?;
        cfg.mines.validate().context("mines config")?;
        Ok(cfg)
    }
}
