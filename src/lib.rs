//! Single-elimination bracket engine: library with models, storage and bracket logic.

pub mod config;
pub mod engine;
pub mod logic;
pub mod models;
pub mod store;

pub use engine::BracketEngine;
pub use logic::{
    advance_round, close_registration, compute_final_rankings, extend_registration,
    forfeit_match, generate_bracket_and_start, match_history, rank_entrants, submit_match_result,
    Forfeit, RoundOutcome, RoundPlan,
};
pub use models::{
    BracketError, Entrant, EntrantId, Match, MatchFormat, MatchId, MatchStatus, NewTournament,
    PlacementStats, RankedEntrant, RegistrationStatus, Tournament, TournamentHistory,
    TournamentId, TournamentStatus, TournamentUpdate,
};
pub use store::{BracketStore, MemoryStore, StoreError};
