//! Round advancement: next-round pairings, escalating formats, or the champion.

use crate::logic::{load_tournament, ranking, storage_failure, RoundPlan};
use crate::models::{
    BracketError, EntrantId, Match, MatchFormat, MatchStatus, RankedEntrant, TournamentId,
    TournamentStatus, TournamentUpdate,
};
use crate::store::{BracketStore, StoreError};
use log::{debug, error, info, warn};
use rand::Rng;
use serde::Serialize;

/// What a call to [`advance_round`] did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RoundOutcome {
    /// The round still has pending matches (or no matches at all); nothing changed.
    Incomplete,
    /// The next round already exists or the tournament is already finished; nothing changed.
    AlreadyAdvanced,
    /// A new round was generated.
    NextRound { round: u32, matches: Vec<Match> },
    /// The tournament finished. `rankings` is `None` if the ranking step failed.
    Finished {
        champion: Option<EntrantId>,
        rankings: Option<Vec<RankedEntrant>>,
    },
}

/// Format for the round after `winners` advanced, where `paired` of them play pending matches.
///
/// Two winners means the championship match: always best-of-5.
pub fn next_round_format(winners: usize, paired: usize, default: MatchFormat) -> MatchFormat {
    if winners == 2 {
        return MatchFormat::BestOfFive;
    }
    MatchFormat::suggested_for(paired).reconcile(default)
}

/// Advance a tournament after `completed_round` may have finished.
///
/// Safe to call after every single result: returns [`RoundOutcome::Incomplete`] while any match
/// of the round is pending, and [`RoundOutcome::AlreadyAdvanced`] once the next round exists.
pub fn advance_round<S, R>(
    store: &S,
    tournament_id: TournamentId,
    completed_round: u32,
    rng: &mut R,
) -> Result<RoundOutcome, BracketError>
where
    S: BracketStore + ?Sized,
    R: Rng + ?Sized,
{
    let tournament = load_tournament(store, tournament_id)?;
    match tournament.status {
        TournamentStatus::Ongoing => {}
        TournamentStatus::Finished => {
            debug!(
                "Tournament {} already finished; ignoring advance of round {}",
                tournament_id, completed_round
            );
            return Ok(RoundOutcome::AlreadyAdvanced);
        }
        other => return Err(BracketError::InvalidState(other)),
    }

    let round_matches = store
        .matches(tournament_id, Some(completed_round))
        .map_err(|e| storage_failure(tournament_id, completed_round, e))?;
    if round_matches.is_empty() {
        warn!(
            "Tournament {} has no matches in round {}; skipping advance",
            tournament_id, completed_round
        );
        return Ok(RoundOutcome::Incomplete);
    }
    if round_matches.iter().any(|m| m.status == MatchStatus::Pending) {
        debug!(
            "Not all matches in round {} of tournament {} are finished; skipping advance",
            completed_round, tournament_id
        );
        return Ok(RoundOutcome::Incomplete);
    }

    let next_round = completed_round + 1;
    let existing = store
        .matches(tournament_id, Some(next_round))
        .map_err(|e| storage_failure(tournament_id, next_round, e))?;
    if !existing.is_empty() {
        debug!(
            "Round {} of tournament {} already generated",
            next_round, tournament_id
        );
        return Ok(RoundOutcome::AlreadyAdvanced);
    }

    // Double forfeits carry no winner, so they advance nobody.
    let winners: Vec<EntrantId> = round_matches
        .iter()
        .filter(|m| m.status == MatchStatus::Finished)
        .filter_map(|m| m.winner)
        .collect();

    match winners.len() {
        0 => {
            info!(
                "No winners in round {} of tournament {}; ending tournament",
                completed_round, tournament_id
            );
            finish(store, tournament_id, completed_round, None)
        }
        1 => {
            info!("Tournament {} finished. Champion: {}", tournament_id, winners[0]);
            finish(store, tournament_id, completed_round, Some(winners[0]))
        }
        n => {
            let plan = RoundPlan::draw(winners, rng);
            if let Some(bye) = plan.bye {
                info!(
                    "Entrant {} gets a bye in tournament {} round {}",
                    bye, tournament_id, next_round
                );
            }
            let format = next_round_format(n, plan.paired(), tournament.default_match_format);
            let matches = plan.into_matches(tournament_id, next_round, format);
            match store.commit_round(tournament_id, next_round, matches.clone(), None) {
                Ok(()) => {}
                Err(StoreError::RoundExists { .. }) => {
                    debug!(
                        "Round {} of tournament {} was generated concurrently",
                        next_round, tournament_id
                    );
                    return Ok(RoundOutcome::AlreadyAdvanced);
                }
                Err(e) => return Err(storage_failure(tournament_id, next_round, e)),
            }
            info!(
                "Generated {} matches ({:?}) for round {} of tournament {}",
                matches.len(),
                format,
                next_round,
                tournament_id
            );
            Ok(RoundOutcome::NextRound {
                round: next_round,
                matches,
            })
        }
    }
}

/// Commit the finished status, then rank best-effort: a ranking failure is logged, not returned.
fn finish<S>(
    store: &S,
    tournament_id: TournamentId,
    final_round: u32,
    champion: Option<EntrantId>,
) -> Result<RoundOutcome, BracketError>
where
    S: BracketStore + ?Sized,
{
    store
        .update_tournament(tournament_id, &TournamentUpdate::finished(champion))
        .map_err(|e| storage_failure(tournament_id, final_round, e))?;
    let rankings = match ranking::compute_final_rankings(store, tournament_id) {
        Ok(r) => Some(r),
        Err(e) => {
            error!(
                "Failed to compute final rankings for tournament {}: {}",
                tournament_id, e
            );
            None
        }
    };
    Ok(RoundOutcome::Finished { champion, rankings })
}
