//! Tournament, TournamentStatus, final rankings and BracketError.

use crate::models::entrant::EntrantId;
use crate::models::game::{MatchFormat, MatchId};
use crate::store::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during bracket operations.
#[derive(Debug, Error)]
pub enum BracketError {
    /// Not enough active entrants to generate a bracket.
    #[error("Need at least {required} active entrants to start (have {found})")]
    InsufficientEntrants { required: usize, found: usize },
    /// Tournament is not in a status that allows this action.
    #[error("Invalid state for this action (tournament is {0})")]
    InvalidState(TournamentStatus),
    #[error("Tournament not found")]
    TournamentNotFound(TournamentId),
    #[error("Match not found")]
    MatchNotFound(MatchId),
    #[error("Match already decided")]
    MatchAlreadyDecided(MatchId),
    /// The named winner or forfeiting player does not play in the match.
    #[error("Entrant is not a player in this match")]
    NotAParticipant(EntrantId),
    #[error("Entrant not found")]
    EntrantNotFound(EntrantId),
    #[error("Entrant is already registered")]
    DuplicateRegistration(EntrantId),
    #[error("Registration is closed")]
    RegistrationClosed,
    #[error("Tournament is full ({max_players} entrants)")]
    TournamentFull { max_players: usize },
    #[error("Invalid tournament settings: {0}")]
    InvalidSettings(String),
    /// Any underlying read/write failure; safe to retry for generation and advancement.
    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),
}

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Current status of the tournament.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Registration open; not started.
    #[default]
    Pending,
    /// Registration closed with enough entrants; waiting for the bracket.
    RegistrationClosed,
    /// Registration reopened with a later deadline.
    ExtendedRegistration,
    /// Round 1 generated; rounds advance as results arrive.
    Ongoing,
    /// Champion decided (or a round ended with no winners).
    Finished,
    /// Registration closed short of the minimum; the tournament will not be played.
    Failed,
}

impl TournamentStatus {
    /// Whether the bracket has been generated.
    pub fn is_started(self) -> bool {
        matches!(self, TournamentStatus::Ongoing | TournamentStatus::Finished)
    }

    pub fn accepts_registrations(self) -> bool {
        matches!(
            self,
            TournamentStatus::Pending | TournamentStatus::ExtendedRegistration
        )
    }

    /// Whether round 1 may be generated from this status.
    pub fn can_start(self) -> bool {
        matches!(
            self,
            TournamentStatus::Pending
                | TournamentStatus::RegistrationClosed
                | TournamentStatus::ExtendedRegistration
        )
    }
}

impl std::fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentStatus::Pending => write!(f, "pending"),
            TournamentStatus::RegistrationClosed => write!(f, "registration_closed"),
            TournamentStatus::ExtendedRegistration => write!(f, "extended_registration"),
            TournamentStatus::Ongoing => write!(f, "ongoing"),
            TournamentStatus::Finished => write!(f, "finished"),
            TournamentStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One row of the final standings.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RankedEntrant {
    pub rank: u32,
    pub entrant_id: EntrantId,
    pub name: String,
    pub avatar: Option<String>,
    /// Forfeited registration, or eliminated in a double-forfeit match.
    pub is_forfeited: bool,
}

/// Settings for creating a tournament.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewTournament {
    pub name: String,
    #[serde(default = "default_min_players")]
    pub min_players: usize,
    #[serde(default = "default_max_players")]
    pub max_players: usize,
    #[serde(default)]
    pub default_match_format: MatchFormat,
    #[serde(default)]
    pub registration_deadline: Option<DateTime<Utc>>,
    /// Scheduled start; overwritten with the real start when the bracket is generated.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
}

fn default_min_players() -> usize {
    2
}

fn default_max_players() -> usize {
    64
}

impl NewTournament {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_players: default_min_players(),
            max_players: default_max_players(),
            default_match_format: MatchFormat::default(),
            registration_deadline: None,
            start_time: None,
        }
    }

    pub fn with_default_format(mut self, format: MatchFormat) -> Self {
        self.default_match_format = format;
        self
    }

    pub fn with_registration_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.registration_deadline = Some(deadline);
        self
    }

    pub fn validate(&self) -> Result<(), BracketError> {
        if self.name.trim().is_empty() {
            return Err(BracketError::InvalidSettings("name must not be empty".into()));
        }
        if self.min_players < 2 {
            return Err(BracketError::InvalidSettings("min_players must be at least 2".into()));
        }
        if self.max_players < self.min_players {
            return Err(BracketError::InvalidSettings(
                "max_players must not be below min_players".into(),
            ));
        }
        Ok(())
    }
}

/// Tournament as seen by the bracket engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub status: TournamentStatus,
    /// Floor for every generated round's format.
    pub default_match_format: MatchFormat,
    pub min_players: usize,
    pub max_players: usize,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    /// Champion, set when the tournament finishes with one remaining entrant.
    pub winner: Option<EntrantId>,
    /// Written once by the ranking calculator.
    pub final_rankings: Option<Vec<RankedEntrant>>,
}

impl Tournament {
    /// Create a new pending tournament from settings.
    pub fn new(settings: NewTournament) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: settings.name.trim().to_string(),
            status: TournamentStatus::Pending,
            default_match_format: settings.default_match_format,
            min_players: settings.min_players,
            max_players: settings.max_players,
            registration_deadline: settings.registration_deadline,
            start_time: settings.start_time,
            winner: None,
            final_rankings: None,
        }
    }

    /// Whether the registration deadline has passed at `now`.
    pub fn registration_closed_at(&self, now: DateTime<Utc>) -> bool {
        self.registration_deadline.is_some_and(|d| now > d)
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, update: &TournamentUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(winner) = update.winner {
            self.winner = Some(winner);
        }
        if let Some(start_time) = update.start_time {
            self.start_time = Some(start_time);
        }
        if let Some(deadline) = update.registration_deadline {
            self.registration_deadline = Some(deadline);
        }
    }
}

/// Partial update to a tournament's status, winner, start time and deadline.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TournamentUpdate {
    pub status: Option<TournamentStatus>,
    pub winner: Option<EntrantId>,
    pub start_time: Option<DateTime<Utc>>,
    pub registration_deadline: Option<DateTime<Utc>>,
}

impl TournamentUpdate {
    pub fn status(status: TournamentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Reopen registration until `deadline`.
    pub fn extended(deadline: DateTime<Utc>) -> Self {
        Self {
            status: Some(TournamentStatus::ExtendedRegistration),
            registration_deadline: Some(deadline),
            ..Self::default()
        }
    }

    /// Bracket generated: ongoing, started now.
    pub fn started(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(TournamentStatus::Ongoing),
            start_time: Some(at),
            ..Self::default()
        }
    }

    /// Tournament over, with or without a champion.
    pub fn finished(champion: Option<EntrantId>) -> Self {
        Self {
            status: Some(TournamentStatus::Finished),
            winner: champion,
            ..Self::default()
        }
    }
}
