//! Storage interface the bracket engine runs against, plus an in-memory backend.

mod memory;

pub use memory::MemoryStore;

use crate::models::{
    Entrant, EntrantId, Match, MatchId, PlacementStats, RankedEntrant, RegistrationStatus,
    Tournament, TournamentId, TournamentUpdate,
};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },
    /// A batch targeted a round that already has matches (another caller advanced it first).
    #[error("round {round} of tournament {tournament_id} already exists")]
    RoundExists { tournament_id: TournamentId, round: u32 },
    #[error("store lock poisoned")]
    Poisoned,
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Entrant, match, tournament and profile stores consumed by the engine.
///
/// Every method is one unit of work: implementations must apply each call atomically.
pub trait BracketStore: Send + Sync {
    fn create_tournament(&self, tournament: Tournament) -> Result<(), StoreError>;

    /// Read a tournament, including its deserialized `final_rankings` if written.
    fn tournament(&self, id: TournamentId) -> Result<Tournament, StoreError>;

    fn update_tournament(&self, id: TournamentId, update: &TournamentUpdate) -> Result<(), StoreError>;

    /// Insert or replace a registration.
    fn register_entrant(&self, tournament_id: TournamentId, entrant: Entrant) -> Result<(), StoreError>;

    fn set_registration_status(
        &self,
        tournament_id: TournamentId,
        entrant_id: EntrantId,
        status: RegistrationStatus,
    ) -> Result<(), StoreError>;

    /// Entrants whose status is in `statuses`, in registration order.
    fn entrants(
        &self,
        tournament_id: TournamentId,
        statuses: &[RegistrationStatus],
    ) -> Result<Vec<Entrant>, StoreError>;

    /// Matches of a tournament ordered by round then creation, optionally filtered to one round.
    fn matches(&self, tournament_id: TournamentId, round: Option<u32>) -> Result<Vec<Match>, StoreError>;

    fn get_match(&self, id: MatchId) -> Result<Option<Match>, StoreError>;

    /// Every match the entrant played in, across tournaments, ordered by round then creation.
    fn matches_for_entrant(&self, entrant_id: EntrantId) -> Result<Vec<Match>, StoreError>;

    /// Every registration of the entrant (any status) with its tournament, newest first.
    fn registrations_of(&self, entrant_id: EntrantId) -> Result<Vec<(Tournament, Entrant)>, StoreError>;

    /// Insert one round's match batch and apply `update` in a single atomic step.
    ///
    /// Fails with [`StoreError::RoundExists`] and writes nothing if `round` already has matches.
    fn commit_round(
        &self,
        tournament_id: TournamentId,
        round: u32,
        matches: Vec<Match>,
        update: Option<TournamentUpdate>,
    ) -> Result<(), StoreError>;

    /// Persist the outcome (status, winner, finished_at) of an existing match.
    fn record_outcome(&self, m: &Match) -> Result<(), StoreError>;

    /// Replace the tournament's `final_rankings` blob.
    fn write_final_rankings(
        &self,
        tournament_id: TournamentId,
        rankings: &[RankedEntrant],
    ) -> Result<(), StoreError>;

    /// Clear this tournament's placements for `entrants`, then record `placements` (entrant, rank).
    fn reset_and_apply_placements(
        &self,
        tournament_id: TournamentId,
        entrants: &[EntrantId],
        placements: &[(EntrantId, u32)],
    ) -> Result<(), StoreError>;

    /// Cumulative placement counters across all tournaments.
    fn placement_stats(&self, entrant_id: EntrantId) -> Result<PlacementStats, StoreError>;
}
