//! Match, MatchStatus and MatchFormat for 1v1 bracket games.

use crate::models::entrant::EntrantId;
use crate::models::tournament::TournamentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Lifecycle of a match. Leaves `Pending` exactly once.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Pending,
    Finished,
    /// Double forfeit: both players are eliminated and nobody advances.
    Forfeited,
}

impl MatchStatus {
    pub fn is_complete(self) -> bool {
        self != MatchStatus::Pending
    }
}

/// Best-of-N format. Variants are declared in priority order, so `max` picks the stronger format.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFormat {
    #[default]
    SingleGame,
    BestOfThree,
    BestOfFive,
}

impl MatchFormat {
    /// Reconcile a suggested format with the tournament default: the higher priority wins.
    pub fn reconcile(self, default: MatchFormat) -> MatchFormat {
        self.max(default)
    }

    /// Suggested format for a round where `paired` players meet in pending matches.
    pub fn suggested_for(paired: usize) -> MatchFormat {
        match paired {
            0..=2 => MatchFormat::BestOfFive,
            3..=6 => MatchFormat::BestOfThree,
            _ => MatchFormat::SingleGame,
        }
    }
}

/// A single match between two entrants, or a bye when `player2` is `None`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    /// Round 1 is the first round.
    pub round_number: u32,
    pub player1: EntrantId,
    /// None for a bye.
    pub player2: Option<EntrantId>,
    /// None until decided, and always None for a double forfeit.
    pub winner: Option<EntrantId>,
    pub status: MatchStatus,
    pub match_format: MatchFormat,
    /// Set when the status leaves `Pending`.
    pub finished_at: Option<DateTime<Utc>>,
}

impl Match {
    /// A pending match between two entrants.
    pub fn pending(
        tournament_id: TournamentId,
        round_number: u32,
        player1: EntrantId,
        player2: EntrantId,
        match_format: MatchFormat,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            round_number,
            player1,
            player2: Some(player2),
            winner: None,
            status: MatchStatus::Pending,
            match_format,
            finished_at: None,
        }
    }

    /// A bye: created already finished with the sole player as winner.
    pub fn bye(
        tournament_id: TournamentId,
        round_number: u32,
        player: EntrantId,
        match_format: MatchFormat,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            round_number,
            player1: player,
            player2: None,
            winner: Some(player),
            status: MatchStatus::Finished,
            match_format,
            finished_at: Some(Utc::now()),
        }
    }

    pub fn is_bye(&self) -> bool {
        self.player2.is_none()
    }

    /// Whether `entrant` plays in this match.
    pub fn involves(&self, entrant: EntrantId) -> bool {
        self.player1 == entrant || self.player2 == Some(entrant)
    }

    /// The other player, if `entrant` is in this match and it is not a bye.
    pub fn opponent_of(&self, entrant: EntrantId) -> Option<EntrantId> {
        if self.player1 == entrant {
            self.player2
        } else if self.player2 == Some(entrant) {
            Some(self.player1)
        } else {
            None
        }
    }

    /// The player who lost a decided match. Byes and double forfeits have no loser.
    pub fn loser(&self) -> Option<EntrantId> {
        match (self.status, self.winner) {
            (MatchStatus::Finished, Some(w)) => self.opponent_of(w),
            _ => None,
        }
    }

    /// Both players of the match (one for a bye).
    pub fn players(&self) -> impl Iterator<Item = EntrantId> {
        std::iter::once(self.player1).chain(self.player2)
    }
}
