//! An entrant's match history, grouped by tournament.

use super::{Match, RegistrationStatus, TournamentId, TournamentStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One tournament an entrant registered for, with the matches they played in it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TournamentHistory {
    pub tournament_id: TournamentId,
    pub tournament_name: String,
    pub tournament_status: TournamentStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub registration_status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
    /// In round order; empty until the bracket is generated.
    pub matches: Vec<Match>,
}
