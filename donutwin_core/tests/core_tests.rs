use donutwin_core::{
    commit, crash_point, mine_positions, verify_crash, verify_mines, ActiveRound, ClientSeed,
    CrashConfig, CrashPoint, HouseEdge, MinesConfig, PlayerSession, SeedPair, ServerSeed,
    DEFAULT_EPSILON,
};

fn golden() -> SeedPair {
    SeedPair::parse(&"00".repeat(32), "abc123", 1).unwrap()
}

#[test]
fn crash_golden_vector() {
    let seeds = golden();
    assert_eq!(
        commit(&seeds.server_seed).as_str(),
        "60e05bd1b195af2f94112fa7197a5c88289058840ce7c6df9693756bc6250f55"
    );
    let point = crash_point(&seeds, &CrashConfig::default()).unwrap();
    assert_eq!(point, CrashPoint::from_cents(320));
    assert_eq!(point.as_f64(), 3.2);
}

#[test]
fn crash_sequence_is_repeatable() {
    let expected = [164, 320, 359, 115, 284, 422];
    for (nonce, cents) in expected.into_iter().enumerate() {
        let seeds = SeedPair::parse(&"00".repeat(32), "abc123", nonce as u64).unwrap();
        let point = crash_point(&seeds, &CrashConfig::default()).unwrap();
        assert_eq!(point.cents(), cents, "nonce {nonce}");
    }
}

#[test]
fn mines_repeatable_1000_times() {
    let seeds = golden();
    let cfg = MinesConfig::default();
    let first = mine_positions(&seeds, 5, &cfg).unwrap();
    assert_eq!(first, vec![0, 1, 5, 6, 22]);
    for _ in 0..1000 {
        assert_eq!(mine_positions(&seeds, 5, &cfg).unwrap(), first);
    }
}

#[test]
fn mines_sequence_is_repeatable() {
    let expected: [[u16; 5]; 6] = [
        [2, 8, 20, 23, 24],
        [0, 1, 5, 6, 22],
        [6, 10, 14, 18, 21],
        [0, 3, 5, 12, 16],
        [0, 16, 17, 21, 22],
        [7, 12, 18, 20, 24],
    ];
    for (nonce, positions) in expected.iter().enumerate() {
        let seeds = SeedPair::parse(&"00".repeat(32), "abc123", nonce as u64).unwrap();
        assert_eq!(mine_positions(&seeds, 5, &MinesConfig::default()).unwrap(), positions.to_vec());
    }
}

#[test]
fn mines_boundary_counts() {
    let cfg = MinesConfig::default();
    let all_but_one = mine_positions(&golden(), 24, &cfg).unwrap();
    assert_eq!(all_but_one.len(), 24);
    assert!(mine_positions(&golden(), 0, &cfg).is_err());
    assert!(mine_positions(&golden(), 25, &cfg).is_err());
}

#[test]
fn mutating_any_field_breaks_verification() {
    let crash = CrashConfig::default();
    let mines = MinesConfig::default();
    let mutated = [
        SeedPair::parse(&"11".repeat(32), "abc123", 1).unwrap(),
        SeedPair::parse(&"00".repeat(32), "abc124", 1).unwrap(),
        SeedPair::parse(&"00".repeat(32), "abc123", 2).unwrap(),
    ];
    for seeds in &mutated {
        assert!(!verify_crash(seeds, 3.20, DEFAULT_EPSILON, &crash));
        assert!(!verify_mines(seeds, 5, &[0, 1, 5, 6, 22], &mines));
    }
    assert!(verify_crash(&golden(), 3.20, DEFAULT_EPSILON, &crash));
    assert!(verify_mines(&golden(), 5, &[0, 1, 5, 6, 22], &mines));
}

#[test]
fn session_rounds_never_share_a_triple() {
    let mut session = PlayerSession::new(ClientSeed::new("abc123").unwrap());
    let server_seed = ServerSeed::from_hex("00".repeat(32)).unwrap();
    let mut seen = std::collections::HashSet::new();
    for _ in 0..50 {
        let round =
            ActiveRound::start_crash(&mut session, server_seed.clone(), &CrashConfig::default())
                .unwrap();
        let start = round.announce();
        assert!(seen.insert((start.client_seed.clone(), start.nonce)));
    }
    session.rotate_client_seed(ClientSeed::new("rotated").unwrap()).unwrap();
    let round =
        ActiveRound::start_crash(&mut session, server_seed, &CrashConfig::default()).unwrap();
    assert_eq!(round.announce().nonce, 0);
    assert!(seen.insert((round.announce().client_seed, 0)));
}

#[test]
fn house_edge_shapes_distribution() {
    let rounds = 2000u64;
    let cfg = CrashConfig::default();
    let mut at_least_two = 0;
    let mut busts = 0;
    for nonce in 0..rounds {
        let seeds = SeedPair::parse(&"00".repeat(32), "abc123", nonce).unwrap();
        let point = crash_point(&seeds, &cfg).unwrap();
        assert!(point >= CrashPoint::MIN && point <= cfg.max_point);
        if point >= CrashPoint::from_cents(200) {
            at_least_two += 1;
        }
        if point == CrashPoint::MIN {
            busts += 1;
        }
    }
    // P(point >= 2) = 0.99 / 2; loose bounds for 2000 samples
    let share = at_least_two as f64 / rounds as f64;
    assert!((0.44..0.55).contains(&share), "share >= 2x was {share}");
    assert!(busts > 0 && busts < 120, "busts {busts}");
}

#[test]
fn zero_edge_is_never_below_edged_point() {
    let legacy = CrashConfig {
        house_edge: HouseEdge::ZERO,
        ..CrashConfig::default()
    };
    for nonce in 0..200 {
        let seeds = SeedPair::parse(&"00".repeat(32), "abc123", nonce).unwrap();
        let edged = crash_point(&seeds, &CrashConfig::default()).unwrap();
        assert!(crash_point(&seeds, &legacy).unwrap() >= edged);
    }
}
