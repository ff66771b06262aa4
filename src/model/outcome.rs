use serde::{Deserialize, Serialize};

use super::round::{DriverId, RaceId};

/// One row of `round_results`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Standing {
    pub position: u32,
    pub driver_id: DriverId,
    pub race_points: i32,
    pub round_points: i32,
    pub pole_bonus: i32,
    pub fastest_lap_bonus: i32,
    pub total_points: i32,
    pub positions_gained: i32,
    /// Every record the driver has in the round is a DNF
    pub dnf: bool,
}

impl Standing {
    pub fn bonus_points(&self) -> i32 {
        self.pole_bonus + self.fastest_lap_bonus
    }
}

/// One row of a best-time leaderboard.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TimedEntry {
    pub position: u32,
    pub driver_id: DriverId,
    pub time_ms: u64,
    /// Race the time was set in
    pub race_id: RaceId,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Leaderboards {
    pub qualifying_results: Vec<TimedEntry>,
    pub race_time_results: Vec<TimedEntry>,
    pub fastest_lap_results: Vec<TimedEntry>,
}

/// Standings and leaderboards for one division, or for the whole round when
/// divisions are disabled (`division` is `None`).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DivisionOutcome {
    pub division: Option<String>,
    pub round_results: Vec<Standing>,
    #[serde(flatten)]
    pub leaderboards: Leaderboards,
}

/// Everything derived from a round. Replaced wholesale on every computation.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RoundOutcome {
    pub round_id: String,
    pub divisions: Vec<DivisionOutcome>,
    /// Round-wide leaderboards over every driver regardless of division
    pub cross_division: Leaderboards,
}

impl RoundOutcome {
    /// Look up a division by id; `None` selects the undivided outcome.
    pub fn division(&self, id: Option<&str>) -> Option<&DivisionOutcome> {
        self.divisions
            .iter()
            .find(|outcome| outcome.division.as_deref() == id)
    }
}
