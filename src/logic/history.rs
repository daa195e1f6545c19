//! Per-entrant match history across tournaments.

use crate::models::{BracketError, EntrantId, TournamentHistory};
use crate::store::BracketStore;
use std::collections::HashMap;

/// Every tournament the entrant registered for (newest registration first), each with the
/// matches the entrant played there in round order.
///
/// An entrant with no registrations anywhere is `EntrantNotFound`.
pub fn match_history<S>(store: &S, entrant_id: EntrantId) -> Result<Vec<TournamentHistory>, BracketError>
where
    S: BracketStore + ?Sized,
{
    let registrations = store.registrations_of(entrant_id)?;
    if registrations.is_empty() {
        return Err(BracketError::EntrantNotFound(entrant_id));
    }

    let mut by_tournament: HashMap<_, Vec<_>> = HashMap::new();
    for m in store.matches_for_entrant(entrant_id)? {
        by_tournament.entry(m.tournament_id).or_default().push(m);
    }

    Ok(registrations
        .into_iter()
        .map(|(tournament, entrant)| TournamentHistory {
            matches: by_tournament.remove(&tournament.id).unwrap_or_default(),
            tournament_id: tournament.id,
            tournament_name: tournament.name,
            tournament_status: tournament.status,
            start_time: tournament.start_time,
            registration_status: entrant.status,
            registered_at: entrant.registered_at,
        })
        .collect())
}
