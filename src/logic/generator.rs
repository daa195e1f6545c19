//! Bracket generation: round-1 pairings, bye, and the switch to `Ongoing`.

use crate::logic::{load_tournament, storage_failure, RoundPlan};
use crate::models::{
    BracketError, Match, MatchFormat, RegistrationStatus, TournamentId, TournamentStatus,
    TournamentUpdate,
};
use crate::store::{BracketStore, StoreError};
use chrono::Utc;
use log::{info, warn};
use rand::Rng;

/// Fewest entrants a bracket can be built from, whatever the tournament's own minimum.
pub const MIN_ENTRANTS: usize = 2;

/// Generate round 1 for a tournament that has not started and mark it ongoing.
///
/// 0. Refuse unless the tournament is `pending`, `registration_closed` or `extended_registration`.
/// 1. Collect active entrants; refuse below `max(2, min_players)`.
/// 2. Shuffle; an odd count gives the last entrant a finished bye match.
/// 3. Pair the rest sequentially into pending matches, format = default floored at single-game.
/// 4. Insert the batch and set status/start time in one atomic commit.
///
/// Returns the round-1 matches.
pub fn generate_bracket_and_start<S, R>(
    store: &S,
    tournament_id: TournamentId,
    rng: &mut R,
) -> Result<Vec<Match>, BracketError>
where
    S: BracketStore + ?Sized,
    R: Rng + ?Sized,
{
    let tournament = load_tournament(store, tournament_id)?;
    if !tournament.status.can_start() {
        return Err(BracketError::InvalidState(tournament.status));
    }

    let entrants = store
        .entrants(tournament_id, &[RegistrationStatus::Active])
        .map_err(|e| storage_failure(tournament_id, 1, e))?;
    let required = tournament.min_players.max(MIN_ENTRANTS);
    if entrants.len() < required {
        warn!(
            "Tournament {} does not have enough entrants to start ({} of {})",
            tournament_id,
            entrants.len(),
            required
        );
        return Err(BracketError::InsufficientEntrants {
            required,
            found: entrants.len(),
        });
    }

    let plan = RoundPlan::draw(entrants.iter().map(|e| e.id).collect(), rng);
    if let Some(bye) = plan.bye {
        info!("Entrant {} gets a bye in tournament {} round 1", bye, tournament_id);
    }
    let format = MatchFormat::SingleGame.reconcile(tournament.default_match_format);
    let matches = plan.into_matches(tournament_id, 1, format);

    match store.commit_round(
        tournament_id,
        1,
        matches.clone(),
        Some(TournamentUpdate::started(Utc::now())),
    ) {
        Ok(()) => {}
        Err(StoreError::RoundExists { .. }) => {
            return Err(BracketError::InvalidState(TournamentStatus::Ongoing));
        }
        Err(e) => return Err(storage_failure(tournament_id, 1, e)),
    }

    info!(
        "Tournament {} started with {} matches in round 1",
        tournament_id,
        matches.len()
    );
    Ok(matches)
}
