//! Final rankings: elimination history to a total order with shared placements.

use crate::logic::load_tournament;
use crate::models::{
    BracketError, Entrant, EntrantId, Match, MatchStatus, RankedEntrant, RegistrationStatus,
    TournamentId, TournamentStatus,
};
use crate::store::BracketStore;
use log::info;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Where one entrant's run ended.
struct Standing<'a> {
    entrant: &'a Entrant,
    /// Round lost in; 0 while never eliminated. Champion gets max round + 1.
    elimination_round: u32,
    lost_to: Option<EntrantId>,
    eliminated_in_forfeited_match: bool,
    /// `elimination_round` of `lost_to`, 0 if none.
    opponent_round: u32,
}

impl Standing<'_> {
    fn is_forfeited(&self) -> bool {
        self.entrant.status == RegistrationStatus::Forfeited || self.eliminated_in_forfeited_match
    }

    /// Entrants share a rank iff their signatures are equal.
    fn signature(&self) -> (bool, u32, Option<u32>) {
        let forfeited = self.is_forfeited();
        let opponent = if forfeited { None } else { Some(self.opponent_round) };
        (forfeited, self.elimination_round, opponent)
    }
}

/// Forfeited tier last; later elimination first; then stronger eliminator first (non-forfeited only).
fn compare(a: &Standing<'_>, b: &Standing<'_>) -> Ordering {
    let (af, bf) = (a.is_forfeited(), b.is_forfeited());
    af.cmp(&bf)
        .then(b.elimination_round.cmp(&a.elimination_round))
        .then_with(|| {
            if !af && !bf {
                b.opponent_round.cmp(&a.opponent_round)
            } else {
                Ordering::Equal
            }
        })
}

/// Rank `entrants` from a tournament's full match history.
///
/// Only the first (earliest-round) elimination of an entrant counts. A double-forfeit match
/// eliminates both players and flags them into the bottom tier. Ranks are dense: equal
/// signatures share a rank and the next distinct signature gets the next number.
pub fn rank_entrants(
    entrants: &[Entrant],
    matches: &[Match],
    champion: Option<EntrantId>,
) -> Vec<RankedEntrant> {
    let mut standings: Vec<Standing<'_>> = entrants
        .iter()
        .map(|entrant| Standing {
            entrant,
            elimination_round: 0,
            lost_to: None,
            eliminated_in_forfeited_match: false,
            opponent_round: 0,
        })
        .collect();
    let index: HashMap<EntrantId, usize> = entrants
        .iter()
        .enumerate()
        .map(|(i, e)| (e.id, i))
        .collect();

    let mut history: Vec<&Match> = matches.iter().collect();
    history.sort_by_key(|m| m.round_number);

    for m in &history {
        if m.status == MatchStatus::Forfeited {
            for player in m.players() {
                if let Some(&i) = index.get(&player) {
                    let s = &mut standings[i];
                    if s.elimination_round == 0 {
                        s.elimination_round = m.round_number;
                        s.eliminated_in_forfeited_match = true;
                    }
                }
            }
            continue;
        }
        if let (Some(loser), Some(winner)) = (m.loser(), m.winner) {
            if let Some(&i) = index.get(&loser) {
                let s = &mut standings[i];
                if s.elimination_round == 0 {
                    s.elimination_round = m.round_number;
                    s.lost_to = Some(winner);
                }
            }
        }
    }

    if let Some(&i) = champion.and_then(|c| index.get(&c)) {
        let max_round = matches.iter().map(|m| m.round_number).max().unwrap_or(0);
        standings[i].elimination_round = max_round + 1;
    }

    let rounds: Vec<u32> = standings.iter().map(|s| s.elimination_round).collect();
    for s in &mut standings {
        s.opponent_round = s
            .lost_to
            .and_then(|o| index.get(&o))
            .map_or(0, |&i| rounds[i]);
    }

    standings.sort_by(compare);

    let mut rankings = Vec::with_capacity(standings.len());
    let mut rank = 0;
    let mut last_signature = None;
    for s in &standings {
        let signature = s.signature();
        if last_signature != Some(signature) {
            rank += 1;
            last_signature = Some(signature);
        }
        rankings.push(RankedEntrant {
            rank,
            entrant_id: s.entrant.id,
            name: s.entrant.name.clone(),
            avatar: s.entrant.avatar.clone(),
            is_forfeited: s.is_forfeited(),
        });
    }
    rankings
}

/// Compute, persist and return the final rankings of a finished tournament.
///
/// Also resets this tournament's placement counters for every ranked entrant and
/// re-records ranks 1-3 of the non-forfeited tier, so re-running is idempotent.
pub fn compute_final_rankings<S>(
    store: &S,
    tournament_id: TournamentId,
) -> Result<Vec<RankedEntrant>, BracketError>
where
    S: BracketStore + ?Sized,
{
    let tournament = load_tournament(store, tournament_id)?;
    if tournament.status != TournamentStatus::Finished {
        return Err(BracketError::InvalidState(tournament.status));
    }

    let matches = store.matches(tournament_id, None)?;
    let entrants = store.entrants(
        tournament_id,
        &[RegistrationStatus::Active, RegistrationStatus::Forfeited],
    )?;
    let rankings = rank_entrants(&entrants, &matches, tournament.winner);

    store.write_final_rankings(tournament_id, &rankings)?;
    info!(
        "Final rankings stored for tournament {} ({} entrants)",
        tournament_id,
        rankings.len()
    );

    let ranked: Vec<EntrantId> = rankings.iter().map(|r| r.entrant_id).collect();
    let podium: Vec<(EntrantId, u32)> = rankings
        .iter()
        .filter(|r| r.rank <= 3 && !r.is_forfeited)
        .map(|r| (r.entrant_id, r.rank))
        .collect();
    store.reset_and_apply_placements(tournament_id, &ranked, &podium)?;

    Ok(rankings)
}
