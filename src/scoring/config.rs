use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::PointsTable;

/// Season-level scoring configuration.
///
/// Holds what every round of a season shares: the ordered tiebreaker list,
/// the value of bonus points, and named points tables that races and rounds
/// can refer to instead of repeating the table inline.
///
/// Example YAML:
/// ```yaml
/// season:
///   tiebreakers: [best_qualifying_position, most_race_wins, head_to_head]
///   bonus_points: { pole: 1, fastest_lap: 1 }
///   points_presets:
///     sprint: { 1: 8, 2: 7, 3: 6, 4: 5, 5: 4, 6: 3, 7: 2, 8: 1 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SeasonConfig {
    /// Rule identifiers applied in order to break exact score ties
    #[serde(default = "default_tiebreakers")]
    pub tiebreakers: Option<Vec<String>>,

    /// Points awarded for pole position and fastest lap
    #[serde(default = "default_bonus_points")]
    pub bonus_points: Option<BonusPoints>,

    /// Named points tables. Declaring this map replaces the built-in `f1`
    /// preset; leaving it out keeps it.
    #[serde(default = "default_presets")]
    pub points_presets: BTreeMap<String, PointsTable>,
}

fn default_tiebreakers() -> Option<Vec<String>> {
    Some(vec![
        "best_qualifying_position".to_string(),
        "most_race_wins".to_string(),
        "head_to_head".to_string(),
    ])
}

fn default_bonus_points() -> Option<BonusPoints> {
    Some(BonusPoints::default())
}

fn default_presets() -> BTreeMap<String, PointsTable> {
    let mut presets = BTreeMap::new();
    presets.insert(
        "f1".to_string(),
        PointsTable::from([
            (1, 25),
            (2, 18),
            (3, 15),
            (4, 12),
            (5, 10),
            (6, 8),
            (7, 6),
            (8, 4),
            (9, 2),
            (10, 1),
        ]),
    );
    presets
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self {
            tiebreakers: default_tiebreakers(),
            bonus_points: default_bonus_points(),
            points_presets: default_presets(),
        }
    }
}

impl SeasonConfig {
    pub fn tiebreakers(&self) -> &[String] {
        self.tiebreakers.as_deref().unwrap_or(&[])
    }

    pub fn bonus_points(&self) -> BonusPoints {
        self.bonus_points.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BonusPoints {
    #[serde(default = "one")]
    pub pole: i32,
    #[serde(default = "one")]
    pub fastest_lap: i32,
}

fn one() -> i32 {
    1
}

impl Default for BonusPoints {
    fn default() -> Self {
        Self {
            pole: 1,
            fastest_lap: 1,
        }
    }
}
