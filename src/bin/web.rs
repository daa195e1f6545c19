//! Single binary web server: REST API over the bracket engine with an in-memory store.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env (or .env): HOST, PORT, RUST_LOG.

use actix_web::{
    get, post, put,
    http::StatusCode,
    web::{Data, Json, Path, Query},
    App, HttpResponse, HttpServer, ResponseError,
};
use bracket_engine::config::Config;
use bracket_engine::{
    BracketEngine, BracketError, Entrant, EntrantId, Forfeit, MatchId, MemoryStore, NewTournament,
    RankedEntrant, TournamentId,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

type AppState = Data<BracketEngine<MemoryStore>>;

#[derive(Debug, Error)]
enum ApiError {
    #[error(transparent)]
    Bracket(#[from] BracketError),
    #[error("Final rankings not available yet")]
    RankingsPending,
    #[error("Internal server error")]
    Internal,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        use BracketError::*;
        match self {
            ApiError::Bracket(e) => match e {
                TournamentNotFound(_) | MatchNotFound(_) | EntrantNotFound(_) => StatusCode::NOT_FOUND,
                InvalidState(_) | MatchAlreadyDecided(_) | DuplicateRegistration(_)
                | TournamentFull { .. } | RegistrationClosed => StatusCode::CONFLICT,
                InsufficientEntrants { .. } | NotAParticipant(_) | InvalidSettings(_) => {
                    StatusCode::BAD_REQUEST
                }
                Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::RankingsPending => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ApiError::Bracket(BracketError::Storage(e)) => {
                log::error!("Storage failure: {}", e);
                "Storage failure".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": message }))
    }
}

/// Engine calls take blocking locks, so run them off the async workers.
async fn blocking<T, F>(state: AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&BracketEngine<MemoryStore>) -> Result<T, BracketError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(state.get_ref()))
        .await
        .map_err(|_| ApiError::Internal)?
        .map_err(ApiError::from)
}

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct RegisterBody {
    /// Existing entrant identity, so placement stats carry over between tournaments.
    #[serde(default)]
    entrant_id: Option<EntrantId>,
    name: String,
    #[serde(default)]
    avatar: Option<String>,
}

#[derive(Deserialize)]
struct WinnerBody {
    winner_id: EntrantId,
}

#[derive(Deserialize)]
struct ExtendBody {
    registration_deadline: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RoundQuery {
    round: Option<u32>,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

/// Path segments: tournament id and entrant id (e.g. /api/tournaments/{id}/entrants/{entrant_id})
#[derive(Deserialize)]
struct TournamentEntrantPath {
    id: TournamentId,
    entrant_id: EntrantId,
}

#[derive(Deserialize)]
struct MatchPath {
    match_id: MatchId,
}

#[derive(Deserialize)]
struct EntrantPath {
    entrant_id: EntrantId,
}

#[get("/api/health")]
async fn api_health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "bracket-engine",
    })
}

#[post("/api/tournaments")]
async fn api_create_tournament(state: AppState, body: Json<NewTournament>) -> Result<HttpResponse, ApiError> {
    let settings = body.into_inner();
    let t = blocking(state, move |e| e.create_tournament(settings)).await?;
    Ok(HttpResponse::Created().json(t))
}

#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> Result<HttpResponse, ApiError> {
    let id = path.id;
    let t = blocking(state, move |e| e.tournament(id)).await?;
    Ok(HttpResponse::Ok().json(t))
}

#[get("/api/tournaments/{id}/entrants")]
async fn api_list_entrants(state: AppState, path: Path<TournamentPath>) -> Result<HttpResponse, ApiError> {
    let id = path.id;
    let entrants = blocking(state, move |e| e.entrants(id)).await?;
    Ok(HttpResponse::Ok().json(entrants))
}

/// Register an entrant (tournament must not have started).
#[post("/api/tournaments/{id}/entrants")]
async fn api_register_entrant(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<RegisterBody>,
) -> Result<HttpResponse, ApiError> {
    let id = path.id;
    let body = body.into_inner();
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Err(BracketError::InvalidSettings("entrant name must not be empty".into()).into());
    }
    let mut entrant = Entrant::with_id(body.entrant_id.unwrap_or_else(Uuid::new_v4), name);
    entrant.avatar = body.avatar;
    let created = entrant.clone();
    blocking(state, move |e| e.register_entrant(id, entrant)).await?;
    Ok(HttpResponse::Created().json(created))
}

/// Withdraw before the deadline, forfeit after it.
#[post("/api/tournaments/{id}/entrants/{entrant_id}/withdraw")]
async fn api_withdraw_entrant(
    state: AppState,
    path: Path<TournamentEntrantPath>,
) -> Result<HttpResponse, ApiError> {
    let (id, entrant_id) = (path.id, path.entrant_id);
    let status = blocking(state, move |e| e.withdraw_entrant(id, entrant_id)).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": status })))
}

/// Organizer marks an entrant's registration forfeited.
#[post("/api/tournaments/{id}/entrants/{entrant_id}/forfeit")]
async fn api_forfeit_registration(
    state: AppState,
    path: Path<TournamentEntrantPath>,
) -> Result<HttpResponse, ApiError> {
    let (id, entrant_id) = (path.id, path.entrant_id);
    blocking(state, move |e| e.forfeit_registration(id, entrant_id)).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Close registration; the tournament fails if it is short of its minimum.
#[post("/api/tournaments/{id}/registration/close")]
async fn api_close_registration(state: AppState, path: Path<TournamentPath>) -> Result<HttpResponse, ApiError> {
    let id = path.id;
    let status = blocking(state, move |e| e.close_registration(id)).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": status })))
}

#[post("/api/tournaments/{id}/registration/extend")]
async fn api_extend_registration(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<ExtendBody>,
) -> Result<HttpResponse, ApiError> {
    let (id, deadline) = (path.id, body.registration_deadline);
    blocking(state, move |e| e.extend_registration(id, deadline)).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Generate round 1 and start the tournament.
#[post("/api/tournaments/{id}/start")]
async fn api_start_tournament(state: AppState, path: Path<TournamentPath>) -> Result<HttpResponse, ApiError> {
    let id = path.id;
    let matches = blocking(state, move |e| e.generate_bracket_and_start(id)).await?;
    Ok(HttpResponse::Ok().json(matches))
}

#[get("/api/tournaments/{id}/matches")]
async fn api_list_matches(
    state: AppState,
    path: Path<TournamentPath>,
    query: Query<RoundQuery>,
) -> Result<HttpResponse, ApiError> {
    let (id, round) = (path.id, query.round);
    let matches = blocking(state, move |e| e.matches(id, round)).await?;
    Ok(HttpResponse::Ok().json(matches))
}

/// Set the winner of a pending match; advances the round when it completes.
#[put("/api/matches/{match_id}/winner")]
async fn api_set_match_winner(
    state: AppState,
    path: Path<MatchPath>,
    body: Json<WinnerBody>,
) -> Result<HttpResponse, ApiError> {
    let (match_id, winner) = (path.match_id, body.winner_id);
    let outcome = blocking(state, move |e| e.submit_match_result(match_id, winner)).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Record a single or double forfeit; advances the round when it completes.
#[post("/api/matches/{match_id}/forfeit")]
async fn api_forfeit_match(
    state: AppState,
    path: Path<MatchPath>,
    body: Json<Forfeit>,
) -> Result<HttpResponse, ApiError> {
    let (match_id, forfeit) = (path.match_id, body.into_inner());
    let outcome = blocking(state, move |e| e.forfeit_match(match_id, forfeit)).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

async fn final_rankings(state: AppState, id: TournamentId) -> Result<Vec<RankedEntrant>, ApiError> {
    blocking(state, move |e| e.tournament(id))
        .await?
        .final_rankings
        .ok_or(ApiError::RankingsPending)
}

#[get("/api/tournaments/{id}/rankings")]
async fn api_get_rankings(state: AppState, path: Path<TournamentPath>) -> Result<HttpResponse, ApiError> {
    let rankings = final_rankings(state, path.id).await?;
    Ok(HttpResponse::Ok().json(rankings))
}

/// Final standings as CSV (rank, entrant_id, name, avatar, is_forfeited).
#[get("/api/tournaments/{id}/rankings.csv")]
async fn api_get_rankings_csv(state: AppState, path: Path<TournamentPath>) -> Result<HttpResponse, ApiError> {
    let rankings = final_rankings(state, path.id).await?;
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in &rankings {
        writer.serialize(row).map_err(|_| ApiError::Internal)?;
    }
    let body = writer.into_inner().map_err(|_| ApiError::Internal)?;
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .body(body))
}

/// Manual retry path when ranking failed after the final.
#[post("/api/tournaments/{id}/rankings/recompute")]
async fn api_recompute_rankings(state: AppState, path: Path<TournamentPath>) -> Result<HttpResponse, ApiError> {
    let id = path.id;
    let rankings = blocking(state, move |e| e.compute_final_rankings(id)).await?;
    Ok(HttpResponse::Ok().json(rankings))
}

#[get("/api/entrants/{entrant_id}/stats")]
async fn api_entrant_stats(state: AppState, path: Path<EntrantPath>) -> Result<HttpResponse, ApiError> {
    let entrant_id = path.entrant_id;
    let stats = blocking(state, move |e| e.placement_stats(entrant_id)).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// Matches grouped by tournament, newest registration first.
#[get("/api/entrants/{entrant_id}/matches")]
async fn api_entrant_matches(state: AppState, path: Path<EntrantPath>) -> Result<HttpResponse, ApiError> {
    let entrant_id = path.entrant_id;
    let history = blocking(state, move |e| e.match_history(entrant_id)).await?;
    Ok(HttpResponse::Ok().json(history))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = Config::from_env().map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(config.log_filter.as_str()));

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    let state = Data::new(BracketEngine::new(MemoryStore::new()));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_list_entrants)
            .service(api_register_entrant)
            .service(api_withdraw_entrant)
            .service(api_forfeit_registration)
            .service(api_close_registration)
            .service(api_extend_registration)
            .service(api_start_tournament)
            .service(api_list_matches)
            .service(api_set_match_winner)
            .service(api_forfeit_match)
            .service(api_get_rankings_csv)
            .service(api_get_rankings)
            .service(api_recompute_rankings)
            .service(api_entrant_stats)
            .service(api_entrant_matches)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
