//! Entrant (a registered participant) and PlacementStats data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an entrant (used in matches, rankings and profile stats).
pub type EntrantId = Uuid;

/// Registration status of an entrant within one tournament.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    #[default]
    Active,
    /// Left before the registration deadline; not ranked at all.
    Withdrawn,
    /// Still ranked, but always below every non-forfeited entrant.
    Forfeited,
}

/// A participant registered in a tournament.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Entrant {
    pub id: EntrantId,
    pub name: String,
    pub avatar: Option<String>,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
}

impl Entrant {
    /// Create a new active entrant with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Create an active entrant for an existing identity (keeps profile stats across tournaments).
    pub fn with_id(id: EntrantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            avatar: None,
            status: RegistrationStatus::Active,
            registered_at: Utc::now(),
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

/// Cumulative placement counters for one entrant profile.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlacementStats {
    pub first_place_count: u32,
    pub second_place_count: u32,
    pub third_place_count: u32,
}

impl PlacementStats {
    /// Count one finish at `rank`; placements past third are not tracked.
    pub fn record(&mut self, rank: u32) {
        match rank {
            1 => self.first_place_count += 1,
            2 => self.second_place_count += 1,
            3 => self.third_place_count += 1,
            _ => {}
        }
    }
}
