//! In-memory store: all tables behind one `RwLock`, so every call is atomic.

use super::{BracketStore, StoreError};
use crate::models::{
    Entrant, EntrantId, Match, MatchId, PlacementStats, RankedEntrant, RegistrationStatus,
    Tournament, TournamentId, TournamentUpdate,
};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Tournament row; `final_rankings` lives only as its JSON blob.
struct TournamentRow {
    tournament: Tournament,
    final_rankings: Option<String>,
}

#[derive(Default)]
struct Tables {
    tournaments: HashMap<TournamentId, TournamentRow>,
    /// Registrations per tournament, in registration order.
    registrations: HashMap<TournamentId, Vec<Entrant>>,
    /// All matches in creation order.
    matches: Vec<Match>,
    /// Rank per (entrant, tournament), for ranks 1-3.
    placements: HashMap<EntrantId, HashMap<TournamentId, u32>>,
}

/// Volatile backend used by the web binary and tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }
}

fn tournament_not_found(id: TournamentId) -> StoreError {
    StoreError::NotFound { kind: "tournament", id }
}

impl BracketStore for MemoryStore {
    fn create_tournament(&self, tournament: Tournament) -> Result<(), StoreError> {
        let mut g = self.write()?;
        let final_rankings = match &tournament.final_rankings {
            Some(r) => Some(serde_json::to_string(r)?),
            None => None,
        };
        let id = tournament.id;
        g.tournaments.insert(
            id,
            TournamentRow {
                tournament: Tournament {
                    final_rankings: None,
                    ..tournament
                },
                final_rankings,
            },
        );
        g.registrations.entry(id).or_default();
        Ok(())
    }

    fn tournament(&self, id: TournamentId) -> Result<Tournament, StoreError> {
        let g = self.read()?;
        let row = g.tournaments.get(&id).ok_or_else(|| tournament_not_found(id))?;
        let mut tournament = row.tournament.clone();
        tournament.final_rankings = match &row.final_rankings {
            Some(blob) => Some(serde_json::from_str(blob)?),
            None => None,
        };
        Ok(tournament)
    }

    fn update_tournament(&self, id: TournamentId, update: &TournamentUpdate) -> Result<(), StoreError> {
        let mut g = self.write()?;
        let row = g.tournaments.get_mut(&id).ok_or_else(|| tournament_not_found(id))?;
        row.tournament.apply(update);
        Ok(())
    }

    fn register_entrant(&self, tournament_id: TournamentId, entrant: Entrant) -> Result<(), StoreError> {
        let mut g = self.write()?;
        if !g.tournaments.contains_key(&tournament_id) {
            return Err(tournament_not_found(tournament_id));
        }
        let list = g.registrations.entry(tournament_id).or_default();
        match list.iter_mut().find(|e| e.id == entrant.id) {
            Some(existing) => *existing = entrant,
            None => list.push(entrant),
        }
        Ok(())
    }

    fn set_registration_status(
        &self,
        tournament_id: TournamentId,
        entrant_id: EntrantId,
        status: RegistrationStatus,
    ) -> Result<(), StoreError> {
        let mut g = self.write()?;
        let entrant = g
            .registrations
            .get_mut(&tournament_id)
            .and_then(|list| list.iter_mut().find(|e| e.id == entrant_id))
            .ok_or(StoreError::NotFound {
                kind: "registration",
                id: entrant_id,
            })?;
        entrant.status = status;
        Ok(())
    }

    fn entrants(
        &self,
        tournament_id: TournamentId,
        statuses: &[RegistrationStatus],
    ) -> Result<Vec<Entrant>, StoreError> {
        let g = self.read()?;
        let list = g
            .registrations
            .get(&tournament_id)
            .ok_or_else(|| tournament_not_found(tournament_id))?;
        Ok(list
            .iter()
            .filter(|e| statuses.contains(&e.status))
            .cloned()
            .collect())
    }

    fn matches(&self, tournament_id: TournamentId, round: Option<u32>) -> Result<Vec<Match>, StoreError> {
        let g = self.read()?;
        let mut out: Vec<Match> = g
            .matches
            .iter()
            .filter(|m| m.tournament_id == tournament_id)
            .filter(|m| round.map_or(true, |r| m.round_number == r))
            .cloned()
            .collect();
        // Stable: creation order is kept within a round.
        out.sort_by_key(|m| m.round_number);
        Ok(out)
    }

    fn get_match(&self, id: MatchId) -> Result<Option<Match>, StoreError> {
        let g = self.read()?;
        Ok(g.matches.iter().find(|m| m.id == id).cloned())
    }

    fn matches_for_entrant(&self, entrant_id: EntrantId) -> Result<Vec<Match>, StoreError> {
        let g = self.read()?;
        let mut out: Vec<Match> = g
            .matches
            .iter()
            .filter(|m| m.involves(entrant_id))
            .cloned()
            .collect();
        out.sort_by_key(|m| m.round_number);
        Ok(out)
    }

    fn registrations_of(&self, entrant_id: EntrantId) -> Result<Vec<(Tournament, Entrant)>, StoreError> {
        let g = self.read()?;
        let mut out: Vec<(Tournament, Entrant)> = g
            .registrations
            .iter()
            .filter_map(|(tid, list)| {
                let entrant = list.iter().find(|e| e.id == entrant_id)?;
                let row = g.tournaments.get(tid)?;
                Some((row.tournament.clone(), entrant.clone()))
            })
            .collect();
        out.sort_by(|a, b| b.1.registered_at.cmp(&a.1.registered_at));
        Ok(out)
    }

    fn commit_round(
        &self,
        tournament_id: TournamentId,
        round: u32,
        matches: Vec<Match>,
        update: Option<TournamentUpdate>,
    ) -> Result<(), StoreError> {
        let mut g = self.write()?;
        if !g.tournaments.contains_key(&tournament_id) {
            return Err(tournament_not_found(tournament_id));
        }
        let exists = g
            .matches
            .iter()
            .any(|m| m.tournament_id == tournament_id && m.round_number == round);
        if exists {
            return Err(StoreError::RoundExists { tournament_id, round });
        }
        g.matches.extend(matches);
        if let Some(update) = update {
            if let Some(row) = g.tournaments.get_mut(&tournament_id) {
                row.tournament.apply(&update);
            }
        }
        Ok(())
    }

    fn record_outcome(&self, m: &Match) -> Result<(), StoreError> {
        let mut g = self.write()?;
        let stored = g
            .matches
            .iter_mut()
            .find(|s| s.id == m.id)
            .ok_or(StoreError::NotFound { kind: "match", id: m.id })?;
        stored.status = m.status;
        stored.winner = m.winner;
        stored.finished_at = m.finished_at;
        Ok(())
    }

    fn write_final_rankings(
        &self,
        tournament_id: TournamentId,
        rankings: &[RankedEntrant],
    ) -> Result<(), StoreError> {
        let blob = serde_json::to_string(rankings)?;
        let mut g = self.write()?;
        let row = g
            .tournaments
            .get_mut(&tournament_id)
            .ok_or_else(|| tournament_not_found(tournament_id))?;
        row.final_rankings = Some(blob);
        Ok(())
    }

    fn reset_and_apply_placements(
        &self,
        tournament_id: TournamentId,
        entrants: &[EntrantId],
        placements: &[(EntrantId, u32)],
    ) -> Result<(), StoreError> {
        let mut g = self.write()?;
        for id in entrants {
            if let Some(per_tournament) = g.placements.get_mut(id) {
                per_tournament.remove(&tournament_id);
            }
        }
        for &(id, rank) in placements {
            if (1..=3).contains(&rank) {
                g.placements.entry(id).or_default().insert(tournament_id, rank);
            }
        }
        Ok(())
    }

    fn placement_stats(&self, entrant_id: EntrantId) -> Result<PlacementStats, StoreError> {
        let g = self.read()?;
        let mut stats = PlacementStats::default();
        if let Some(per_tournament) = g.placements.get(&entrant_id) {
            for &rank in per_tournament.values() {
                stats.record(rank);
            }
        }
        Ok(stats)
    }
}
