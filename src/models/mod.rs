//! Data structures for the bracket engine: entrants, matches, tournaments.

mod entrant;
mod game;
mod history;
mod tournament;

pub use entrant::{Entrant, EntrantId, PlacementStats, RegistrationStatus};
pub use game::{Match, MatchFormat, MatchId, MatchStatus};
pub use history::TournamentHistory;
pub use tournament::{
    BracketError, NewTournament, RankedEntrant, Tournament, TournamentId, TournamentStatus,
    TournamentUpdate,
};
