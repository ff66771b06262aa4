use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type DriverId = u64;
pub type RaceId = u64;

/// Position → points mapping.
///
/// Serialized as a plain map so a round document can write either
/// `{1: 25, 2: 18}` (YAML) or `{"1": 25, "2": 18}` (JSON).
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PointsTable(pub BTreeMap<u32, i32>);

/// Map key that accepts both integer and string positions. JSON object keys
/// are always strings, and untagged enums lose serde_json's key coercion.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct PositionKey(u32);

impl<'de> Deserialize<'de> for PositionKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PositionVisitor;

        impl Visitor<'_> for PositionVisitor {
            type Value = PositionKey;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a finishing position")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<PositionKey, E> {
                u32::try_from(v)
                    .map(PositionKey)
                    .map_err(|_| E::custom(format!("position {} out of range", v)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<PositionKey, E> {
                u64::try_from(v)
                    .map_err(|_| E::custom(format!("position {} is negative", v)))
                    .and_then(|v| self.visit_u64(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<PositionKey, E> {
                v.trim()
                    .parse::<u32>()
                    .map(PositionKey)
                    .map_err(|_| E::custom(format!("invalid position '{}'", v)))
            }
        }

        deserializer.deserialize_any(PositionVisitor)
    }
}

impl<'de> Deserialize<'de> for PointsTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<PositionKey, i32>::deserialize(deserializer)?;
        Ok(PointsTable(
            raw.into_iter().map(|(key, points)| (key.0, points)).collect(),
        ))
    }
}

impl PointsTable {
    /// Points for a finishing position, 0 when the table has no entry.
    pub fn points_for(&self, position: u32) -> i32 {
        self.0.get(&position).copied().unwrap_or(0)
    }
}

impl<const N: usize> From<[(u32, i32); N]> for PointsTable {
    fn from(entries: [(u32, i32); N]) -> Self {
        PointsTable(entries.into_iter().collect())
    }
}

/// Where a race or round gets its points table from.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PointsSource {
    /// Name of a preset declared in the season configuration
    Preset(String),
    /// Inline table
    Table(PointsTable),
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BonusToggle {
    #[serde(default)]
    pub enabled: bool,
    /// Discard the bonus unless the driver finished inside the top 10
    #[serde(default)]
    pub top_10_only: bool,
}

impl BonusToggle {
    pub fn on() -> Self {
        BonusToggle {
            enabled: true,
            top_10_only: false,
        }
    }

    pub fn top_10() -> Self {
        BonusToggle {
            enabled: true,
            top_10_only: true,
        }
    }
}

/// Whether pole and fastest-lap bonuses are handed out once per race or
/// once for the whole round.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BonusScope {
    #[default]
    Race,
    Round,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Driver {
    pub id: DriverId,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Division {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub driver_ids: Vec<DriverId>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Race {
    pub id: RaceId,
    pub race_number: u32,
    #[serde(default)]
    pub is_qualifier: bool,
    #[serde(default)]
    pub points_system: Option<PointsSource>,
    #[serde(default)]
    pub pole: BonusToggle,
    #[serde(default)]
    pub fastest_lap: BonusToggle,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RaceResult {
    pub race_id: RaceId,
    pub driver_id: DriverId,
    /// Unset when the driver was not classified
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub dnf: bool,
    /// Best lap in a race, or the qualifying lap in a qualifier
    #[serde(default)]
    pub lap_time_ms: Option<u64>,
    /// Total time over the race distance
    #[serde(default)]
    pub race_time_ms: Option<u64>,
    #[serde(default)]
    pub has_fastest_lap: bool,
    #[serde(default)]
    pub has_pole: bool,
    #[serde(default)]
    pub positions_gained: i32,
}

impl RaceResult {
    /// Finishing position when the driver was classified and did not retire.
    pub fn finished_position(&self) -> Option<u32> {
        if self.dnf {
            None
        } else {
            self.position
        }
    }

    /// True for a non-DNF finish in positions 1..=10.
    pub fn finished_top_10(&self) -> bool {
        matches!(self.finished_position(), Some(p) if (1..=10).contains(&p))
    }
}

/// A race weekend as delivered by the result-entry side of the league.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Round {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub round_points_enabled: bool,
    #[serde(default)]
    pub points_system: Option<PointsSource>,
    #[serde(default)]
    pub bonus_scope: BonusScope,
    /// Round-level toggles, used when `bonus_scope` is `round`
    #[serde(default)]
    pub pole: BonusToggle,
    #[serde(default)]
    pub fastest_lap: BonusToggle,
    pub drivers: Vec<Driver>,
    #[serde(default)]
    pub divisions: Vec<Division>,
    pub races: Vec<Race>,
    #[serde(default)]
    pub results: Vec<RaceResult>,
}

impl Round {
    pub fn race(&self, id: RaceId) -> Option<&Race> {
        self.races.iter().find(|race| race.id == id)
    }

    pub fn driver_name(&self, id: DriverId) -> Option<&str> {
        self.drivers
            .iter()
            .find(|driver| driver.id == id)
            .map(|driver| driver.name.as_str())
    }

    pub fn has_divisions(&self) -> bool {
        !self.divisions.is_empty()
    }

    pub fn division(&self, id: &str) -> Option<&Division> {
        self.divisions.iter().find(|division| division.id == id)
    }

    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}
