use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use donutwin_core::{
    audit, crash_payout, new_client_seed, validate_bet, verify_reveal, ActiveRound, BoardState,
    ClientSeed, Commitment, CrashConfig, CrashPoint, HouseEdge, MinesBoard, MinesConfig, Outcome,
    Reveal, RoundStart, SeedPair, DEFAULT_EPSILON,
};
use donutwin_shared::{
    ApiError, CrashEndResponse, CrashStartRequest, MinesCashoutResponse, MinesPickRequest,
    MinesPickResponse, MinesStartRequest, RotateSeedRequest, RotateSeedResponse, RoundLogEntry,
    RoundStartResponse, SeedStateResponse, VerifyCrashRequest, VerifyMinesRequest, VerifyResponse,
    VerifyRevealResponse,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::AppResult;
use crate::state::{AppState, CrashGame, MinesGame, PlayerState};

type Player = TypedHeader<Authorization<Bearer>>;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/session", post(route_open_session))
        .route("/seed", get(route_seed))
        .route("/seed/rotate", post(route_rotate_seed))
        .route("/crash/start", post(route_crash_start))
        .route("/crash/end", post(route_crash_end))
        .route("/mines/start", post(route_mines_start))
        .route("/mines/pick", post(route_mines_pick))
        .route("/mines/cashout", post(route_mines_cashout))
        .route("/verify/crash", post(route_verify_crash))
        .route("/verify/mines", post(route_verify_mines))
        .route("/verify/reveal", post(route_verify_reveal))
        .route("/history", get(route_history))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

fn start_response(start: RoundStart) -> RoundStartResponse {
    RoundStartResponse {
        commitment_hash: start.commitment.into(),
        client_seed: start.client_seed.into(),
        nonce: start.nonce,
    }
}

fn log_entry(bet: f64, payout: f64, reveal: &Reveal) -> RoundLogEntry {
    RoundLogEntry {
        ts: chrono::Utc::now(),
        bet,
        payout,
        reveal: reveal.clone(),
    }
}

fn seed_state(p: &PlayerState) -> SeedStateResponse {
    SeedStateResponse {
        commitment_hash: p.next_commitment().into(),
        client_seed: p.session.client_seed().to_string(),
        nonce: p.session.nonce(),
    }
}

/// Refuses to play if the player bet against a commitment other than the
/// one the next round will use.
fn check_expected_commitment(p: &PlayerState, expected: Option<String>) -> AppResult<()> {
    let Some(hash) = expected else {
        return Ok(());
    };
    if Commitment::from_hex(hash)? != p.next_commitment() {
        return Err(ApiError::Conflict(
            "the server seed commitment has changed, fetch /seed again".into(),
        )
        .into());
    }
    Ok(())
}

async fn route_open_session(
    State(state): State<Arc<AppState>>,
    TypedHeader(Authorization(bearer)): Player,
) -> AppResult<Json<SeedStateResponse>> {
    let player = state.open(bearer.token())?;
    let p = player.lock().await;
    Ok(Json(seed_state(&p)))
}

async fn route_seed(
    State(state): State<Arc<AppState>>,
    TypedHeader(Authorization(bearer)): Player,
) -> AppResult<Json<SeedStateResponse>> {
    let player = state.player(bearer.token())?;
    let p = player.lock().await;
    Ok(Json(seed_state(&p)))
}

async fn route_rotate_seed(
    State(state): State<Arc<AppState>>,
    TypedHeader(Authorization(bearer)): Player,
    Json(req): Json<RotateSeedRequest>,
) -> AppResult<Json<RotateSeedResponse>> {
    let client_seed = match req.client_seed {
        Some(seed) => ClientSeed::new(seed)?,
        None => new_client_seed()?,
    };
    let player = state.player(bearer.token())?;
    let mut p = player.lock().await;
    if p.has_active_round() {
        return Err(
            ApiError::Conflict("finish the active round before rotating seeds".into()).into(),
        );
    }
    let rotation = p.session.rotate_client_seed(client_seed)?;
    info!(
        player = bearer.token(),
        rounds_played = rotation.rounds_played,
        "client seed rotated"
    );
    Ok(Json(RotateSeedResponse::new(rotation, p.next_commitment())))
}

async fn route_crash_start(
    State(state): State<Arc<AppState>>,
    TypedHeader(Authorization(bearer)): Player,
    Json(req): Json<CrashStartRequest>,
) -> AppResult<Json<RoundStartResponse>> {
    validate_bet(req.bet)?;
    let cashout_at = CrashPoint::from_f64(req.cashout_at)?;
    let player = state.player(bearer.token())?;
    let mut p = player.lock().await;
    if p.crash.is_some() {
        return Err(ApiError::Conflict("a crash round is already running".into()).into());
    }
    check_expected_commitment(&p, req.commitment_hash)?;
    let cfg = &state.config.crash;
    let round = p.start_round(|session, seed| ActiveRound::start_crash(session, seed, cfg))?;
    let start = round.announce();
    info!(
        player = bearer.token(),
        nonce = start.nonce,
        commitment = %start.commitment,
        "crash round started"
    );
    p.crash = Some(CrashGame {
        round,
        bet: req.bet,
        cashout_at,
    });
    Ok(Json(start_response(start)))
}

async fn route_crash_end(
    State(state): State<Arc<AppState>>,
    TypedHeader(Authorization(bearer)): Player,
) -> AppResult<Json<CrashEndResponse>> {
    let player = state.player(bearer.token())?;
    let mut p = player.lock().await;
    let game = p
        .crash
        .take()
        .ok_or_else(|| ApiError::NotFound("no crash round is running".into()))?;
    let point = game.round.crash_point().ok_or(ApiError::Internal)?;
    let payout = crash_payout(game.bet, game.cashout_at, point);
    let reveal = game.round.reveal();
    info!(player = bearer.token(), nonce = reveal.nonce, %point, payout, "crash round revealed");
    p.record(log_entry(game.bet, payout, &reveal), state.config.history_limit);
    Ok(Json(CrashEndResponse {
        won: payout > 0.0,
        payout,
        reveal,
    }))
}

async fn route_mines_start(
    State(state): State<Arc<AppState>>,
    TypedHeader(Authorization(bearer)): Player,
    Json(req): Json<MinesStartRequest>,
) -> AppResult<Json<RoundStartResponse>> {
    validate_bet(req.bet)?;
    let player = state.player(bearer.token())?;
    let mut p = player.lock().await;
    if p.mines.is_some() {
        return Err(ApiError::Conflict("a mines round is already running".into()).into());
    }
    check_expected_commitment(&p, req.commitment_hash)?;
    let cfg = &state.config.mines;
    let mine_count = req.mine_count;
    let round =
        p.start_round(|session, seed| ActiveRound::start_mines(session, seed, mine_count, cfg))?;
    let board = MinesBoard::new(round.mines().ok_or(ApiError::Internal)?, cfg);
    let start = round.announce();
    info!(
        player = bearer.token(),
        nonce = start.nonce,
        mines = req.mine_count,
        "mines round started"
    );
    p.mines = Some(MinesGame {
        round,
        board,
        bet: req.bet,
    });
    Ok(Json(start_response(start)))
}

async fn route_mines_pick(
    State(state): State<Arc<AppState>>,
    TypedHeader(Authorization(bearer)): Player,
    Json(req): Json<MinesPickRequest>,
) -> AppResult<Json<MinesPickResponse>> {
    let player = state.player(bearer.token())?;
    let mut p = player.lock().await;
    let game = p
        .mines
        .as_mut()
        .ok_or_else(|| ApiError::NotFound("no mines round is running".into()))?;
    let pick = game.board.pick(req.tile)?;
    if !game.board.is_finished() {
        return Ok(Json(MinesPickResponse {
            pick,
            payout: None,
            reveal: None,
        }));
    }
    let game = p.mines.take().ok_or(ApiError::Internal)?;
    let payout = match game.board.state() {
        BoardState::Cleared => game.bet * game.board.multiplier(),
        _ => 0.0,
    };
    let reveal = game.round.reveal();
    info!(player = bearer.token(), nonce = reveal.nonce, payout, "mines round revealed");
    p.record(log_entry(game.bet, payout, &reveal), state.config.history_limit);
    Ok(Json(MinesPickResponse {
        pick,
        payout: Some(payout),
        reveal: Some(reveal),
    }))
}

async fn route_mines_cashout(
    State(state): State<Arc<AppState>>,
    TypedHeader(Authorization(bearer)): Player,
) -> AppResult<Json<MinesCashoutResponse>> {
    let player = state.player(bearer.token())?;
    let mut p = player.lock().await;
    let game = p
        .mines
        .as_mut()
        .ok_or_else(|| ApiError::NotFound("no mines round is running".into()))?;
    let multiplier = game.board.cash_out()?;
    let game = p.mines.take().ok_or(ApiError::Internal)?;
    let payout = game.bet * multiplier;
    let reveal = game.round.reveal();
    info!(player = bearer.token(), nonce = reveal.nonce, multiplier, payout, "mines cashed out");
    p.record(log_entry(game.bet, payout, &reveal), state.config.history_limit);
    Ok(Json(MinesCashoutResponse {
        multiplier,
        payout,
        reveal,
    }))
}

fn parse_commitment(hash: Option<String>) -> AppResult<Option<Commitment>> {
    Ok(hash.map(Commitment::from_hex).transpose()?)
}

async fn route_verify_crash(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyCrashRequest>,
) -> AppResult<Json<VerifyResponse>> {
    let seeds = SeedPair::parse(&req.server_seed, &req.client_seed, req.nonce)?;
    let commitment = parse_commitment(req.commitment_hash)?;
    let mut crash: CrashConfig = state.config.crash;
    if let Some(bps) = req.house_edge_bps {
        crash.house_edge = HouseEdge::from_bps(bps)?;
    }
    if let Some(max) = req.max_point {
        crash.max_point = CrashPoint::from_f64(max)?;
    }
    let epsilon = req.epsilon.unwrap_or(DEFAULT_EPSILON);
    if !epsilon.is_finite() || epsilon < 0.0 {
        return Err(ApiError::Invalid("epsilon must be a non-negative number".into()).into());
    }
    let claimed = Outcome::Crash {
        multiplier: req.multiplier,
    };
    let report = audit(
        &seeds,
        commitment.as_ref(),
        &claimed,
        epsilon,
        &crash,
        &state.config.mines,
    )?;
    Ok(Json(report.into()))
}

async fn route_verify_mines(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyMinesRequest>,
) -> AppResult<Json<VerifyResponse>> {
    let seeds = SeedPair::parse(&req.server_seed, &req.client_seed, req.nonce)?;
    let commitment = parse_commitment(req.commitment_hash)?;
    let mines = match req.grid_size {
        Some(grid) => MinesConfig {
            house_edge: state.config.mines.house_edge,
            ..MinesConfig::with_grid(grid)
        },
        None => state.config.mines,
    };
    let claimed = Outcome::Mines {
        positions: req.positions,
    };
    let report = audit(&seeds, commitment.as_ref(), &claimed, 0.0, &state.config.crash, &mines)?;
    Ok(Json(report.into()))
}

/// Strict check of a reveal as the service issued it, under the service's
/// own game variants. A failure is a 422 carrying both sides.
async fn route_verify_reveal(
    State(state): State<Arc<AppState>>,
    Json(reveal): Json<Reveal>,
) -> AppResult<Json<VerifyRevealResponse>> {
    let outcome = verify_reveal(&reveal, &state.config.crash, &state.config.mines)?;
    Ok(Json(VerifyRevealResponse { outcome }))
}

async fn route_history(
    State(state): State<Arc<AppState>>,
    TypedHeader(Authorization(bearer)): Player,
) -> AppResult<Json<Vec<RoundLogEntry>>> {
    let player = state.player(bearer.token())?;
    let p = player.lock().await;
    Ok(Json(p.history.iter().cloned().collect()))
}
