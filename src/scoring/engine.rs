use std::collections::BTreeMap;

use crate::error::{EngineError, EngineResult};
use crate::model::{DivisionOutcome, PointsTable, RaceId, Round, RoundOutcome};

use super::aggregate::aggregate;
use super::bonus::apply_bonuses;
use super::config::SeasonConfig;
use super::points::{award_race_points, resolve_table, AwardedResult};
use super::standings::build_standings;
use super::tiebreak::{parse_rules, TiebreakerRule};
use super::validation::validate_round;
use super::view::RoundView;

/// Points tables and rules resolved once per round.
struct Resolved {
    race_tables: BTreeMap<RaceId, PointsTable>,
    round_table: Option<PointsTable>,
    rules: Vec<TiebreakerRule>,
}

/// Compute standings and leaderboards for a round.
///
/// Nothing is produced unless the round passes validation. The result only
/// depends on `round` and `season`, so computing it again yields the same
/// outcome.
pub fn compute_round(round: &Round, season: &SeasonConfig) -> EngineResult<RoundOutcome> {
    validate_round(round, season)?;
    let resolved = resolve(round, season)?;

    let awarded = award_all(round, &resolved.race_tables);

    let divisions = if round.has_divisions() {
        round
            .divisions
            .iter()
            .map(|division| {
                let members: Vec<AwardedResult> = awarded
                    .iter()
                    .filter(|a| division.driver_ids.contains(&a.result.driver_id))
                    .cloned()
                    .collect();
                compute_division(round, Some(division.id.clone()), members, &resolved, season)
            })
            .collect()
    } else {
        vec![compute_division(round, None, awarded.clone(), &resolved, season)]
    };

    let cross_division = aggregate(&RoundView::new(round, awarded));

    tracing::info!(
        round = %round.id,
        divisions = divisions.len(),
        results = round.results.len(),
        "round computed"
    );

    Ok(RoundOutcome {
        round_id: round.id.clone(),
        divisions,
        cross_division,
    })
}

fn resolve(round: &Round, season: &SeasonConfig) -> EngineResult<Resolved> {
    let presets = &season.points_presets;

    let mut race_tables = BTreeMap::new();
    for race in &round.races {
        // A race without a points system awards nothing
        let table = match race.points_system {
            Some(ref source) => resolve_table(source, presets).map_err(EngineError::configuration)?,
            None => PointsTable::default(),
        };
        race_tables.insert(race.id, table);
    }

    let round_table = round
        .points_system
        .as_ref()
        .map(|source| resolve_table(source, presets))
        .transpose()
        .map_err(EngineError::configuration)?;

    let rules = parse_rules(season.tiebreakers()).map_err(EngineError::Configuration)?;

    Ok(Resolved {
        race_tables,
        round_table,
        rules,
    })
}

fn award_all<'a>(
    round: &'a Round,
    race_tables: &BTreeMap<RaceId, PointsTable>,
) -> Vec<AwardedResult<'a>> {
    let empty = PointsTable::default();
    let mut awarded = Vec::with_capacity(round.results.len());
    for race in &round.races {
        let in_race = round
            .results
            .iter()
            .enumerate()
            .filter(|(_, result)| result.race_id == race.id);
        let table = race_tables.get(&race.id).unwrap_or(&empty);
        awarded.extend(award_race_points(in_race, table));
    }
    awarded.sort_by_key(|a| a.record_index);
    awarded
}

fn compute_division<'a>(
    round: &'a Round,
    division: Option<String>,
    awarded: Vec<AwardedResult<'a>>,
    resolved: &Resolved,
    season: &SeasonConfig,
) -> DivisionOutcome {
    let view = RoundView::new(round, awarded);
    let bonuses = apply_bonuses(&view, season.bonus_points());
    let round_results = build_standings(
        &view,
        resolved.round_table.as_ref(),
        &resolved.rules,
        &bonuses,
    );

    tracing::debug!(
        round = %round.id,
        division = division.as_deref().unwrap_or("-"),
        drivers = round_results.len(),
        "division ranked"
    );

    DivisionOutcome {
        division,
        round_results,
        leaderboards: aggregate(&view),
    }
}
