//! `BracketEngine`: the bracket operations behind a per-tournament serialization point.
//!
//! Every call that reads "is round N complete / does round N+1 exist" and then writes runs
//! while holding that tournament's mutex, so two results landing at once cannot both
//! generate the next round. The store's `RoundExists` check backs this up.

use crate::logic::{self, Forfeit, RoundOutcome};
use crate::models::{
    BracketError, Entrant, EntrantId, Match, MatchId, NewTournament, PlacementStats,
    RankedEntrant, RegistrationStatus, Tournament, TournamentHistory, TournamentId,
    TournamentStatus,
};
use crate::store::{BracketStore, StoreError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Bracket engine over an injected store.
pub struct BracketEngine<S> {
    store: S,
    locks: Mutex<HashMap<TournamentId, Arc<Mutex<()>>>>,
}

impl<S: BracketStore> BracketEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Direct read access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run `f` while holding the tournament's lock.
    ///
    /// Unknown tournaments fail before a lock is created, and a lock nobody else holds or
    /// waits on is dropped from the map on the way out.
    fn serialized<T>(
        &self,
        tournament_id: TournamentId,
        f: impl FnOnce() -> Result<T, BracketError>,
    ) -> Result<T, BracketError> {
        logic::load_tournament(&self.store, tournament_id)?;
        let lock = {
            let mut locks = self.locks.lock().map_err(|_| StoreError::Poisoned)?;
            locks.entry(tournament_id).or_default().clone()
        };
        let result = match lock.lock() {
            Ok(_guard) => f(),
            Err(_) => Err(StoreError::Poisoned.into()),
        };
        let mut locks = self.locks.lock().map_err(|_| StoreError::Poisoned)?;
        // The map's copy plus ours: no other caller can reach it without the map lock.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&tournament_id);
        }
        result
    }

    fn tournament_of(&self, match_id: MatchId) -> Result<TournamentId, BracketError> {
        self.store
            .get_match(match_id)?
            .map(|m| m.tournament_id)
            .ok_or(BracketError::MatchNotFound(match_id))
    }

    pub fn create_tournament(&self, settings: NewTournament) -> Result<Tournament, BracketError> {
        logic::create_tournament(&self.store, settings)
    }

    pub fn tournament(&self, tournament_id: TournamentId) -> Result<Tournament, BracketError> {
        logic::load_tournament(&self.store, tournament_id)
    }

    /// Matches of a tournament, optionally for one round.
    pub fn matches(
        &self,
        tournament_id: TournamentId,
        round: Option<u32>,
    ) -> Result<Vec<Match>, BracketError> {
        logic::load_tournament(&self.store, tournament_id)?;
        Ok(self.store.matches(tournament_id, round)?)
    }

    /// Active and forfeited entrants of a tournament.
    pub fn entrants(&self, tournament_id: TournamentId) -> Result<Vec<Entrant>, BracketError> {
        logic::load_tournament(&self.store, tournament_id)?;
        Ok(self.store.entrants(
            tournament_id,
            &[RegistrationStatus::Active, RegistrationStatus::Forfeited],
        )?)
    }

    /// Every tournament the entrant registered for, with the matches they played there.
    pub fn match_history(&self, entrant_id: EntrantId) -> Result<Vec<TournamentHistory>, BracketError> {
        logic::match_history(&self.store, entrant_id)
    }

    pub fn placement_stats(&self, entrant_id: EntrantId) -> Result<PlacementStats, BracketError> {
        Ok(self.store.placement_stats(entrant_id)?)
    }

    pub fn register_entrant(
        &self,
        tournament_id: TournamentId,
        entrant: Entrant,
    ) -> Result<(), BracketError> {
        self.serialized(tournament_id, || {
            logic::register_entrant(&self.store, tournament_id, entrant, Utc::now())
        })
    }

    pub fn withdraw_entrant(
        &self,
        tournament_id: TournamentId,
        entrant_id: EntrantId,
    ) -> Result<RegistrationStatus, BracketError> {
        self.serialized(tournament_id, || {
            logic::withdraw_entrant(&self.store, tournament_id, entrant_id, Utc::now())
        })
    }

    pub fn forfeit_registration(
        &self,
        tournament_id: TournamentId,
        entrant_id: EntrantId,
    ) -> Result<(), BracketError> {
        self.serialized(tournament_id, || {
            logic::forfeit_registration(&self.store, tournament_id, entrant_id)
        })
    }

    /// Close registration; `Failed` when too few active entrants remain.
    pub fn close_registration(
        &self,
        tournament_id: TournamentId,
    ) -> Result<TournamentStatus, BracketError> {
        self.serialized(tournament_id, || {
            logic::close_registration(&self.store, tournament_id)
        })
    }

    pub fn extend_registration(
        &self,
        tournament_id: TournamentId,
        deadline: DateTime<Utc>,
    ) -> Result<(), BracketError> {
        self.serialized(tournament_id, || {
            logic::extend_registration(&self.store, tournament_id, deadline, Utc::now())
        })
    }

    /// Generate round 1 and mark the tournament ongoing.
    pub fn generate_bracket_and_start(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<Match>, BracketError> {
        self.serialized(tournament_id, || {
            logic::generate_bracket_and_start(&self.store, tournament_id, &mut rand::thread_rng())
        })
    }

    /// Advance after `completed_round`; a no-op while the round is incomplete or already advanced.
    pub fn advance_round(
        &self,
        tournament_id: TournamentId,
        completed_round: u32,
    ) -> Result<RoundOutcome, BracketError> {
        self.serialized(tournament_id, || {
            logic::advance_round(
                &self.store,
                tournament_id,
                completed_round,
                &mut rand::thread_rng(),
            )
        })
    }

    /// Recompute and persist final rankings (retry path if ranking failed after the final).
    pub fn compute_final_rankings(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<RankedEntrant>, BracketError> {
        self.serialized(tournament_id, || {
            logic::compute_final_rankings(&self.store, tournament_id)
        })
    }

    /// Record a winner and advance the match's round under the same lock.
    pub fn submit_match_result(
        &self,
        match_id: MatchId,
        winner: EntrantId,
    ) -> Result<RoundOutcome, BracketError> {
        let tournament_id = self.tournament_of(match_id)?;
        self.serialized(tournament_id, || {
            let m = logic::submit_match_result(&self.store, match_id, winner)?;
            logic::advance_round(&self.store, tournament_id, m.round_number, &mut rand::thread_rng())
        })
    }

    /// Record a single or double forfeit and advance the match's round under the same lock.
    pub fn forfeit_match(
        &self,
        match_id: MatchId,
        forfeit: Forfeit,
    ) -> Result<RoundOutcome, BracketError> {
        let tournament_id = self.tournament_of(match_id)?;
        self.serialized(tournament_id, || {
            let m = logic::forfeit_match(&self.store, match_id, forfeit)?;
            logic::advance_round(&self.store, tournament_id, m.round_number, &mut rand::thread_rng())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use uuid::Uuid;

    fn held_locks(engine: &BracketEngine<MemoryStore>) -> usize {
        engine.locks.lock().unwrap().len()
    }

    #[test]
    fn unknown_tournament_leaves_no_lock_behind() {
        let engine = BracketEngine::new(MemoryStore::new());
        assert!(matches!(
            engine.advance_round(Uuid::new_v4(), 1),
            Err(BracketError::TournamentNotFound(_))
        ));
        assert_eq!(held_locks(&engine), 0);
    }

    #[test]
    fn locks_are_released_after_each_call() {
        let engine = BracketEngine::new(MemoryStore::new());
        let t = engine.create_tournament(NewTournament::new("Cup")).unwrap();
        engine.register_entrant(t.id, Entrant::new("A")).unwrap();
        engine.register_entrant(t.id, Entrant::new("B")).unwrap();
        let round = engine.generate_bracket_and_start(t.id).unwrap();
        let winner = round[0].player1;
        engine.submit_match_result(round[0].id, winner).unwrap();
        assert_eq!(held_locks(&engine), 0);
        assert_eq!(engine.tournament(t.id).unwrap().winner, Some(winner));
    }
}
