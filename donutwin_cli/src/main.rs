use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use donutwin_core::{
    audit, commit, crash_payout, crash_point, digest, mine_positions, new_client_seed,
    new_server_seed, Audit, Commitment, CrashConfig, CrashPoint, HouseEdge, MinesConfig, Outcome,
    SeedPair, ServerSeed, DEFAULT_EPSILON,
};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "donutwin-cli", about = "Derive and audit provably-fair DonutWin rounds")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SeedArgs {
    /// Revealed server seed (64 lowercase hex characters)
    #[arg(long)]
    server_seed: String,
    #[arg(long)]
    client_seed: String,
    #[arg(long)]
    nonce: u64,
}

impl SeedArgs {
    fn parse(&self) -> anyhow::Result<SeedPair> {
        Ok(SeedPair::parse(&self.server_seed, &self.client_seed, self.nonce)?)
    }
}

#[derive(Args)]
struct CrashArgs {
    /// House edge in basis points (100 = 1%)
    #[arg(long, env = "CRASH_HOUSE_EDGE_BPS", default_value_t = HouseEdge::CRASH_DEFAULT.bps())]
    house_edge_bps: u16,
    #[arg(long, env = "CRASH_MAX_POINT", default_value_t = CrashPoint::DEFAULT_MAX.as_f64())]
    max_point: f64,
}

impl CrashArgs {
    fn config(&self) -> anyhow::Result<CrashConfig> {
        let cfg = CrashConfig {
            house_edge: HouseEdge::from_bps(self.house_edge_bps)?,
            max_point: CrashPoint::from_f64(self.max_point)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(Args)]
struct MinesArgs {
    #[arg(long, env = "MINES_GRID_SIZE", default_value_t = 25)]
    grid_size: u16,
}

impl MinesArgs {
    fn config(&self) -> anyhow::Result<MinesConfig> {
        let cfg = MinesConfig::with_grid(self.grid_size);
        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a server seed, its commitment and a client seed
    NewSeed,
    /// Print the commitment for a server seed
    Commit { server_seed: String },
    /// Derive the crash point for a seed triple
    Crash {
        #[command(flatten)]
        seeds: SeedArgs,
        #[command(flatten)]
        game: CrashArgs,
    },
    /// Derive mine positions for a seed triple
    Mines {
        #[command(flatten)]
        seeds: SeedArgs,
        #[command(flatten)]
        game: MinesArgs,
        #[arg(long)]
        mines: u16,
    },
    /// Check a published crash point; exits non-zero on mismatch
    VerifyCrash {
        #[command(flatten)]
        seeds: SeedArgs,
        #[command(flatten)]
        game: CrashArgs,
        #[arg(long)]
        multiplier: f64,
        /// Commitment published before the round
        #[arg(long)]
        commitment: Option<String>,
        #[arg(long, default_value_t = DEFAULT_EPSILON)]
        epsilon: f64,
    },
    /// Check published mine positions; exits non-zero on mismatch
    VerifyMines {
        #[command(flatten)]
        seeds: SeedArgs,
        #[command(flatten)]
        game: MinesArgs,
        /// Comma-separated tile indices
        #[arg(long, value_delimiter = ',', required = true)]
        positions: Vec<u16>,
        #[arg(long)]
        commitment: Option<String>,
    },
    /// Play consecutive nonces to document the crash distribution
    Simulate {
        /// Defaults to a freshly generated seed
        #[arg(long)]
        server_seed: Option<String>,
        #[arg(long, default_value = "simulation")]
        client_seed: String,
        #[arg(long, default_value_t = 10_000)]
        rounds: u64,
        /// Auto-cashout target used to measure return to player
        #[arg(long, default_value_t = 2.0)]
        cashout: f64,
        #[command(flatten)]
        game: CrashArgs,
        /// Write every round to this CSV path
        #[arg(long)]
        csv: Option<String>,
    },
}

#[derive(Serialize)]
struct SimulatedRound<'a> {
    nonce: u64,
    digest: &'a str,
    multiplier: f64,
    payout: f64,
}

fn report(audit: &Audit) -> anyhow::Result<()> {
    match audit.commitment_valid {
        Some(true) => println!("commitment: ok"),
        Some(false) => println!("commitment: MISMATCH"),
        None => println!("commitment: not checked"),
    }
    println!("seed hash:  {}", audit.recomputed_commitment);
    println!("published:  {}", audit.published);
    println!("recomputed: {}", audit.recomputed);
    if !audit.is_valid() {
        bail!("verification failed");
    }
    println!("verified");
    Ok(())
}

fn parse_commitment(hash: Option<String>) -> anyhow::Result<Option<Commitment>> {
    Ok(hash.map(Commitment::from_hex).transpose()?)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::NewSeed => {
            let server_seed = new_server_seed()?;
            println!("server_seed={}", server_seed.as_str());
            println!("commitment={}", commit(&server_seed));
            println!("client_seed={}", new_client_seed()?);
        }
        Commands::Commit { server_seed } => {
            println!("{}", commit(&ServerSeed::from_hex(server_seed)?));
        }
        Commands::Crash { seeds, game } => {
            let seeds = seeds.parse()?;
            let point = crash_point(&seeds, &game.config()?)?;
            println!("digest={} crash_point={point}", digest(&seeds).as_str());
        }
        Commands::Mines { seeds, game, mines } => {
            let seeds = seeds.parse()?;
            let positions = mine_positions(&seeds, mines, &game.config()?)?;
            println!("digest={} positions={positions:?}", digest(&seeds).as_str());
        }
        Commands::VerifyCrash {
            seeds,
            game,
            multiplier,
            commitment,
            epsilon,
        } => {
            let commitment = parse_commitment(commitment)?;
            let crash = game.config()?;
            let audit = audit(
                &seeds.parse()?,
                commitment.as_ref(),
                &Outcome::Crash { multiplier },
                epsilon,
                &crash,
                &MinesConfig::default(),
            )?;
            report(&audit)?;
        }
        Commands::VerifyMines {
            seeds,
            game,
            positions,
            commitment,
        } => {
            let commitment = parse_commitment(commitment)?;
            let audit = audit(
                &seeds.parse()?,
                commitment.as_ref(),
                &Outcome::Mines { positions },
                0.0,
                &CrashConfig::default(),
                &game.config()?,
            )?;
            report(&audit)?;
        }
        Commands::Simulate {
            server_seed,
            client_seed,
            rounds,
            cashout,
            game,
            csv,
        } => {
            if rounds == 0 {
                bail!("rounds must be positive");
            }
            let cfg = game.config()?;
            let cashout = CrashPoint::from_f64(cashout)?;
            let server_seed = match server_seed {
                Some(hex) => ServerSeed::from_hex(hex)?,
                None => new_server_seed()?,
            };
            let mut wtr = match &csv {
                Some(path) => Some(csv::Writer::from_path(path)?),
                None => None,
            };

            let mut total = 0.0;
            let mut returned = 0.0;
            let mut busts = 0u64;
            let mut at_least_two = 0u64;
            let mut highest = CrashPoint::MIN;
            for nonce in 0..rounds {
                let seeds = SeedPair::parse(server_seed.as_str(), &client_seed, nonce)?;
                let point = crash_point(&seeds, &cfg)?;
                let payout = crash_payout(1.0, cashout, point);
                total += point.as_f64();
                returned += payout;
                busts += u64::from(point == CrashPoint::MIN);
                at_least_two += u64::from(point >= CrashPoint::from_cents(200));
                highest = highest.max(point);
                if let Some(w) = wtr.as_mut() {
                    w.serialize(SimulatedRound {
                        nonce,
                        digest: digest(&seeds).as_str(),
                        multiplier: point.as_f64(),
                        payout,
                    })?;
                }
            }
            if let Some(mut w) = wtr {
                w.flush()?;
            }

            let n = rounds as f64;
            println!("server_seed={} commitment={}", server_seed.as_str(), commit(&server_seed));
            println!("rounds={rounds} house_edge={}bps", cfg.house_edge.bps());
            println!("mean_multiplier={:.4} highest={highest}", total / n);
            println!(
                "share_at_1x={:.4} share_at_least_2x={:.4} (expected {:.4})",
                busts as f64 / n,
                at_least_two as f64 / n,
                cfg.house_edge.keep_fraction() / 2.0
            );
            println!(
                "rtp_at_{cashout}={:.4} (expected {:.4})",
                returned / n,
                cfg.house_edge.keep_fraction()
            );
            if let Some(path) = csv {
                println!("Exported {rounds} rounds to {path}");
            }
        }
    }

    Ok(())
}
