use donutwin_core::{
    new_server_seed, verify_reveal, ActiveRound, CrashConfig, MinesConfig, PlayerSession,
};

fn main() -> donutwin_core::Result<()> {
    // Example end-to-end rounds: commit, play, reveal, verify
    let mut session = PlayerSession::generate()?;
    let crash = CrashConfig::default();
    let mines = MinesConfig::default();

    let round = ActiveRound::start_crash(&mut session, new_server_seed()?, &crash)?;
    let start = round.announce();
    println!(
        "crash: commitment={} client_seed={} nonce={}",
        start.commitment, start.client_seed, start.nonce
    );
    let reveal = round.reveal();
    println!("  reveal: server_seed={} {}", reveal.server_seed.as_str(), reveal.outcome);
    println!("  verified: {}", verify_reveal(&reveal, &crash, &mines)?);

    let round = ActiveRound::start_mines(&mut session, new_server_seed()?, 5, &mines)?;
    println!("mines: commitment={} nonce={}", round.commitment(), round.announce().nonce);
    let reveal = round.reveal();
    println!("  reveal: server_seed={} {}", reveal.server_seed.as_str(), reveal.outcome);
    println!("  verified: {}", verify_reveal(&reveal, &crash, &mines)?);
    Ok(())
}
