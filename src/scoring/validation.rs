use std::collections::{BTreeMap, BTreeSet};

use crate::error::{EngineError, EngineResult};
use crate::model::{DriverId, PointsSource, Round};

use super::config::SeasonConfig;
use super::points::{check_table, resolve_table, MAX_POINTS};
use super::tiebreak::parse_rules;

/// Validate season configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_season(season: &SeasonConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Err(rule_errors) = parse_rules(season.tiebreakers()) {
        errors.extend(rule_errors);
    }

    for (name, table) in &season.points_presets {
        if let Err(e) = check_table(table) {
            errors.push(format!("season.points_presets.{}: {}", name, e));
        }
    }

    if let Some(values) = season.bonus_points {
        for (field, value) in [("pole", values.pole), ("fastest_lap", values.fastest_lap)] {
            if value < 0 {
                errors.push(format!("season.bonus_points.{}: must be non-negative", field));
            } else if value > MAX_POINTS {
                errors.push(format!(
                    "season.bonus_points.{}: {} is above the limit of {}",
                    field, value, MAX_POINTS
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check a round against the season before anything is computed.
///
/// Configuration problems are reported first; data problems are only
/// looked at once the configuration is sound.
pub fn validate_round(round: &Round, season: &SeasonConfig) -> EngineResult<()> {
    let config_errors = config_errors(round, season);
    if !config_errors.is_empty() {
        return Err(EngineError::Configuration(config_errors));
    }

    let data_errors = data_errors(round);
    if !data_errors.is_empty() {
        return Err(EngineError::DataIntegrity(data_errors));
    }

    Ok(())
}

fn config_errors(round: &Round, season: &SeasonConfig) -> Vec<String> {
    let mut errors = validate_season(season).err().unwrap_or_default();

    match round.points_system {
        Some(ref source) => {
            if let Err(e) = resolve_table(source, &season.points_presets) {
                errors.push(format!("round.points_system: {}", e));
            }
        }
        None if round.round_points_enabled => errors.push(
            "round.points_system: round points are enabled but no points table is configured"
                .to_string(),
        ),
        None => {}
    }

    for (i, race) in round.races.iter().enumerate() {
        if let Some(ref source) = race.points_system {
            if let Err(e) = resolve_table(source, &season.points_presets) {
                errors.push(format!("races[{}].points_system: {}", i, e));
            }
        }
    }

    if errors.is_empty() {
        let most = most_points_possible(round, season);
        if most > i64::from(i32::MAX) {
            errors.push(format!(
                "round: one driver could score up to {} points, more than a standing can hold",
                most
            ));
        }
    }

    errors
}

/// Upper bound on a single driver's total: the best-paying position of
/// every race and of the round, plus both bonuses in every race and once
/// more at round scope. Only meaningful once every table resolves.
fn most_points_possible(round: &Round, season: &SeasonConfig) -> i64 {
    let best = |source: &Option<PointsSource>| -> i64 {
        source
            .as_ref()
            .and_then(|source| resolve_table(source, &season.points_presets).ok())
            .and_then(|table| table.0.values().copied().max())
            .map(i64::from)
            .unwrap_or(0)
    };

    let races: i64 = round.races.iter().map(|race| best(&race.points_system)).sum();
    let round_points = if round.round_points_enabled {
        best(&round.points_system)
    } else {
        0
    };
    let values = season.bonus_points();
    let bonus_awards = round.races.len() as i64 + 1;
    let bonuses = (i64::from(values.pole) + i64::from(values.fastest_lap)) * bonus_awards;

    races + round_points + bonuses
}

fn data_errors(round: &Round) -> Vec<String> {
    let mut errors = Vec::new();

    let mut race_ids = BTreeSet::new();
    for (i, race) in round.races.iter().enumerate() {
        if !race_ids.insert(race.id) {
            errors.push(format!("races[{}].id: duplicate race id {}", i, race.id));
        }
    }

    let mut driver_ids = BTreeSet::new();
    for (i, driver) in round.drivers.iter().enumerate() {
        if !driver_ids.insert(driver.id) {
            errors.push(format!("drivers[{}].id: duplicate driver id {}", i, driver.id));
        }
    }

    let mut seen = BTreeSet::new();
    for (i, result) in round.results.iter().enumerate() {
        if !race_ids.contains(&result.race_id) {
            errors.push(format!("results[{}].race_id: unknown race {}", i, result.race_id));
        }
        if !driver_ids.contains(&result.driver_id) {
            errors.push(format!(
                "results[{}].driver_id: unknown driver {}",
                i, result.driver_id
            ));
        }
        if result.position == Some(0) {
            errors.push(format!("results[{}].position: positions start at 1", i));
        }
        if !seen.insert((result.race_id, result.driver_id)) {
            errors.push(format!(
                "results[{}]: duplicate result for driver {} in race {}",
                i, result.driver_id, result.race_id
            ));
        }
    }

    if round.has_divisions() {
        errors.extend(division_errors(round, &driver_ids));
    }

    errors
}

/// Every driver belongs to exactly one division once divisions are in use.
fn division_errors(round: &Round, driver_ids: &BTreeSet<DriverId>) -> Vec<String> {
    let mut errors = Vec::new();
    let mut membership: BTreeMap<DriverId, &str> = BTreeMap::new();
    let mut division_ids = BTreeSet::new();

    for (i, division) in round.divisions.iter().enumerate() {
        if !division_ids.insert(division.id.as_str()) {
            errors.push(format!(
                "divisions[{}].id: duplicate division '{}'",
                i, division.id
            ));
        }
        for &driver in &division.driver_ids {
            if !driver_ids.contains(&driver) {
                errors.push(format!(
                    "divisions[{}].driver_ids: unknown driver {}",
                    i, driver
                ));
            }
            match membership.get(&driver) {
                Some(&other) if other != division.id => errors.push(format!(
                    "divisions[{}].driver_ids: driver {} is already in division '{}'",
                    i, driver, other
                )),
                Some(_) => {}
                None => {
                    membership.insert(driver, &division.id);
                }
            }
        }
    }

    for (i, driver) in round.drivers.iter().enumerate() {
        if !membership.contains_key(&driver.id) {
            errors.push(format!(
                "drivers[{}]: driver {} is not in any division",
                i, driver.id
            ));
        }
    }

    errors
}
