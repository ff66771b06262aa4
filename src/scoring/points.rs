use std::collections::BTreeMap;

use crate::model::{PointsSource, PointsTable, RaceResult};

/// A race result with the points it earned in its own race.
#[derive(Debug, Clone, PartialEq)]
pub struct AwardedResult<'a> {
    pub result: &'a RaceResult,
    pub race_points: i32,
    /// Index of the record in the round's result list
    pub record_index: usize,
}

/// Award per-race points to a race's results.
///
/// A DNF scores nothing no matter what position was recorded; an
/// unclassified result or a position missing from the table scores 0.
pub fn award_race_points<'a>(
    results: impl IntoIterator<Item = (usize, &'a RaceResult)>,
    table: &PointsTable,
) -> Vec<AwardedResult<'a>> {
    results
        .into_iter()
        .map(|(record_index, result)| AwardedResult {
            result,
            race_points: race_points(result, table),
            record_index,
        })
        .collect()
}

fn race_points(result: &RaceResult, table: &PointsTable) -> i32 {
    result
        .finished_position()
        .map(|position| table.points_for(position))
        .unwrap_or(0)
}

/// Resolve a points source against the season's presets.
///
/// Returns a message naming the problem when the preset is unknown or the
/// table is malformed; callers prefix it with the field path.
pub fn resolve_table(
    source: &PointsSource,
    presets: &BTreeMap<String, PointsTable>,
) -> Result<PointsTable, String> {
    let table = match source {
        PointsSource::Preset(name) => presets
            .get(name)
            .cloned()
            .ok_or_else(|| format!("unknown points preset '{}'", name))?,
        PointsSource::Table(table) => table.clone(),
    };
    check_table(&table)?;
    Ok(table)
}

/// The most a single position, pole or fastest lap can award.
pub const MAX_POINTS: i32 = 10_000;

/// Positions start at 1; a table keyed on position 0 is malformed.
pub fn check_table(table: &PointsTable) -> Result<(), String> {
    if table.0.contains_key(&0) {
        return Err("points table has an entry for position 0, positions start at 1".to_string());
    }
    if let Some((position, points)) = table.0.iter().find(|(_, points)| **points < 0) {
        return Err(format!(
            "points table awards negative points ({}) for position {}",
            points, position
        ));
    }
    if let Some((position, points)) = table.0.iter().find(|(_, points)| **points > MAX_POINTS) {
        return Err(format!(
            "points table awards {} points for position {}, the limit is {}",
            points, position, MAX_POINTS
        ));
    }
    Ok(())
}
