//! Random pairing shared by round 1 and every later round.

use crate::models::{EntrantId, Match, MatchFormat, TournamentId};
use rand::seq::SliceRandom;
use rand::Rng;

/// Pairings for one round before formats are assigned.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundPlan {
    pub pairs: Vec<(EntrantId, EntrantId)>,
    pub bye: Option<EntrantId>,
}

impl RoundPlan {
    /// Shuffle `players` uniformly, give the last one a bye if the count is odd,
    /// and pair the rest sequentially: (1,2), (3,4), ...
    pub fn draw<R: Rng + ?Sized>(mut players: Vec<EntrantId>, rng: &mut R) -> Self {
        players.shuffle(rng);
        let bye = if players.len() % 2 == 1 { players.pop() } else { None };
        let pairs = players
            .chunks_exact(2)
            .map(|chunk| (chunk[0], chunk[1]))
            .collect();
        Self { pairs, bye }
    }

    /// Number of players meeting in pending matches (the bye player excluded).
    pub fn paired(&self) -> usize {
        self.pairs.len() * 2
    }

    /// Pending matches followed by the bye match, if any. All share `format`.
    pub fn into_matches(self, tournament_id: TournamentId, round: u32, format: MatchFormat) -> Vec<Match> {
        let mut matches: Vec<Match> = self
            .pairs
            .into_iter()
            .map(|(p1, p2)| Match::pending(tournament_id, round, p1, p2, format))
            .collect();
        if let Some(p) = self.bye {
            matches.push(Match::bye(tournament_id, round, p, format));
        }
        matches
    }
}
