//! Bracket business logic: generation, advancement, ranking, results and registration.

mod advancer;
mod generator;
mod history;
mod pairing;
mod ranking;
mod registration;
mod results;

pub use advancer::{advance_round, next_round_format, RoundOutcome};
pub use generator::{generate_bracket_and_start, MIN_ENTRANTS};
pub use history::match_history;
pub use pairing::RoundPlan;
pub use ranking::{compute_final_rankings, rank_entrants};
pub use registration::{
    close_registration, create_tournament, extend_registration, forfeit_registration,
    register_entrant, withdraw_entrant,
};
pub use results::{forfeit_match, load_open_match, submit_match_result, Forfeit};

use crate::models::{BracketError, Tournament, TournamentId};
use crate::store::{BracketStore, StoreError};
use log::error;

/// Read a tournament, reporting a missing one as `TournamentNotFound`.
pub(crate) fn load_tournament<S>(store: &S, id: TournamentId) -> Result<Tournament, BracketError>
where
    S: BracketStore + ?Sized,
{
    match store.tournament(id) {
        Err(StoreError::NotFound { .. }) => Err(BracketError::TournamentNotFound(id)),
        other => other.map_err(BracketError::from),
    }
}

/// Log a storage failure with the tournament and round it hit, then wrap it.
pub(crate) fn storage_failure(tournament_id: TournamentId, round: u32, e: StoreError) -> BracketError {
    error!(
        "Storage failure in tournament {} round {}: {}",
        tournament_id, round, e
    );
    BracketError::Storage(e)
}
