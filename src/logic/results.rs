//! Recording match outcomes: a declared winner, a single forfeit, or a double forfeit.

use crate::logic::load_tournament;
use crate::models::{BracketError, EntrantId, Match, MatchId, MatchStatus, TournamentStatus};
use crate::store::BracketStore;
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};

/// Who did not show up for a match.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "entrant_id")]
pub enum Forfeit {
    /// One player forfeits; the opponent wins.
    Player(EntrantId),
    /// Neither plays; both are eliminated.
    Both,
}

/// Load a match that is still open for a result in an ongoing tournament.
pub fn load_open_match<S>(store: &S, match_id: MatchId) -> Result<Match, BracketError>
where
    S: BracketStore + ?Sized,
{
    let m = store
        .get_match(match_id)?
        .ok_or(BracketError::MatchNotFound(match_id))?;
    if m.status.is_complete() {
        return Err(BracketError::MatchAlreadyDecided(match_id));
    }
    let tournament = load_tournament(store, m.tournament_id)?;
    if tournament.status != TournamentStatus::Ongoing {
        return Err(BracketError::InvalidState(tournament.status));
    }
    Ok(m)
}

/// Mark `winner` as the winner of a pending match. Returns the updated match.
pub fn submit_match_result<S>(
    store: &S,
    match_id: MatchId,
    winner: EntrantId,
) -> Result<Match, BracketError>
where
    S: BracketStore + ?Sized,
{
    let mut m = load_open_match(store, match_id)?;
    if m.is_bye() || !m.involves(winner) {
        return Err(BracketError::NotAParticipant(winner));
    }
    m.winner = Some(winner);
    m.status = MatchStatus::Finished;
    m.finished_at = Some(Utc::now());
    store.record_outcome(&m)?;
    info!("Match {} finished. Winner: {}", match_id, winner);
    Ok(m)
}

/// Record a forfeit on a pending match. Returns the updated match.
pub fn forfeit_match<S>(store: &S, match_id: MatchId, forfeit: Forfeit) -> Result<Match, BracketError>
where
    S: BracketStore + ?Sized,
{
    let mut m = load_open_match(store, match_id)?;
    match forfeit {
        Forfeit::Player(loser) => {
            let winner = m
                .opponent_of(loser)
                .ok_or(BracketError::NotAParticipant(loser))?;
            m.winner = Some(winner);
            m.status = MatchStatus::Finished;
            info!("Match {}: {} forfeits, {} advances", match_id, loser, winner);
        }
        Forfeit::Both => {
            m.winner = None;
            m.status = MatchStatus::Forfeited;
            info!("Match {}: double forfeit", match_id);
        }
    }
    m.finished_at = Some(Utc::now());
    store.record_outcome(&m)?;
    Ok(m)
}
