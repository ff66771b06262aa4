use anyhow::{bail, Result};

use crate::model::{DriverId, RaceResult};

use super::view::RoundView;

/// A season-level criterion for ordering drivers tied on points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiebreakerRule {
    BestQualifyingPosition,
    MostRaceWins,
    MostPodiums,
    BestRaceFinish,
    HeadToHead,
    MostFastestLaps,
    MostPoles,
    BestLapTime,
}

impl TiebreakerRule {
    pub const ALL: [TiebreakerRule; 8] = [
        TiebreakerRule::BestQualifyingPosition,
        TiebreakerRule::MostRaceWins,
        TiebreakerRule::MostPodiums,
        TiebreakerRule::BestRaceFinish,
        TiebreakerRule::HeadToHead,
        TiebreakerRule::MostFastestLaps,
        TiebreakerRule::MostPoles,
        TiebreakerRule::BestLapTime,
    ];

    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        match TiebreakerRule::ALL.iter().find(|rule| rule.id() == s) {
            Some(rule) => Ok(*rule),
            None => bail!(
                "unknown tiebreaker rule '{}' (known: {})",
                s,
                TiebreakerRule::ALL
                    .iter()
                    .map(|rule| rule.id())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            TiebreakerRule::BestQualifyingPosition => "best_qualifying_position",
            TiebreakerRule::MostRaceWins => "most_race_wins",
            TiebreakerRule::MostPodiums => "most_podiums",
            TiebreakerRule::BestRaceFinish => "best_race_finish",
            TiebreakerRule::HeadToHead => "head_to_head",
            TiebreakerRule::MostFastestLaps => "most_fastest_laps",
            TiebreakerRule::MostPoles => "most_poles",
            TiebreakerRule::BestLapTime => "best_lap_time",
        }
    }

    /// The driver's value under this rule. Lower sorts first.
    ///
    /// `group` is the set of drivers currently being separated; only
    /// head-to-head looks at it.
    pub fn key(&self, driver: DriverId, group: &[DriverId], view: &RoundView) -> i64 {
        let races = || {
            view.results()
                .iter()
                .map(|awarded| awarded.result)
                .filter(move |result| result.driver_id == driver && !view.is_qualifier(result))
        };

        match self {
            TiebreakerRule::BestQualifyingPosition => view
                .qualifier_results()
                .map(|awarded| awarded.result)
                .filter(|result| result.driver_id == driver)
                .filter_map(RaceResult::finished_position)
                .min()
                .map(i64::from)
                .unwrap_or(i64::MAX),
            TiebreakerRule::MostRaceWins => {
                -(races().filter(|r| r.finished_position() == Some(1)).count() as i64)
            }
            TiebreakerRule::MostPodiums => {
                -(races()
                    .filter(|r| matches!(r.finished_position(), Some(1..=3)))
                    .count() as i64)
            }
            TiebreakerRule::BestRaceFinish => races()
                .filter_map(RaceResult::finished_position)
                .min()
                .map(i64::from)
                .unwrap_or(i64::MAX),
            TiebreakerRule::HeadToHead => -(head_to_head_wins(driver, group, view) as i64),
            TiebreakerRule::MostFastestLaps => {
                -(races().filter(|r| r.has_fastest_lap).count() as i64)
            }
            TiebreakerRule::MostPoles => -(view
                .results_for(driver)
                .filter(|awarded| awarded.result.has_pole)
                .count() as i64),
            TiebreakerRule::BestLapTime => races()
                .filter_map(|r| r.lap_time_ms)
                .min()
                .map(|ms| i64::try_from(ms).unwrap_or(i64::MAX))
                .unwrap_or(i64::MAX),
        }
    }
}

/// Parse the season's rule list, reporting every unknown identifier.
pub fn parse_rules(ids: &[String]) -> Result<Vec<TiebreakerRule>, Vec<String>> {
    let mut rules = Vec::new();
    let mut errors = Vec::new();

    for (i, id) in ids.iter().enumerate() {
        match TiebreakerRule::parse(id) {
            Ok(rule) => rules.push(rule),
            Err(e) => errors.push(format!("season.tiebreakers[{}]: {}", i, e)),
        }
    }

    if errors.is_empty() {
        Ok(rules)
    } else {
        Err(errors)
    }
}

/// Race sessions where `driver` finished ahead of another member of `group`.
fn head_to_head_wins(driver: DriverId, group: &[DriverId], view: &RoundView) -> usize {
    let mut wins = 0;
    for race in view.races().iter().filter(|race| !race.is_qualifier) {
        let Some(own) = view.result_in(race.id, driver) else {
            continue;
        };
        for &rival in group.iter().filter(|&&rival| rival != driver) {
            if let Some(theirs) = view.result_in(race.id, rival) {
                if classification(own) < classification(theirs) {
                    wins += 1;
                }
            }
        }
    }
    wins
}

/// Finishers ahead of retirements, each ordered by recorded position.
fn classification(result: &RaceResult) -> (bool, u32) {
    (result.dnf, result.position.unwrap_or(u32::MAX))
}

/// Order drivers that share an identical primary score.
///
/// Rules are tried in order. A rule splits the group into runs of equal
/// value; each run of two or more goes on to the next rule. Whatever is left
/// after the last rule keeps earliest-recorded-result order.
pub fn resolve_ties(
    tied: &[DriverId],
    rules: &[TiebreakerRule],
    view: &RoundView,
) -> Vec<DriverId> {
    let mut group = tied.to_vec();
    group.sort_by_key(|&driver| view.first_record(driver));
    resolve_group(group, rules, view)
}

fn resolve_group(
    group: Vec<DriverId>,
    rules: &[TiebreakerRule],
    view: &RoundView,
) -> Vec<DriverId> {
    if group.len() < 2 {
        return group;
    }
    let Some((rule, rest)) = rules.split_first() else {
        tracing::debug!(?group, "tiebreakers exhausted, keeping recording order");
        return group;
    };

    let mut keyed: Vec<(i64, DriverId)> = group
        .iter()
        .map(|&driver| (rule.key(driver, &group, view), driver))
        .collect();
    // Stable: equal keys keep the incoming order
    keyed.sort_by_key(|&(key, _)| key);

    tracing::debug!(rule = rule.id(), ?keyed, "applying tiebreaker");

    let mut ordered = Vec::with_capacity(group.len());
    let mut start = 0;
    while start < keyed.len() {
        let key = keyed[start].0;
        let end = keyed[start..]
            .iter()
            .position(|&(k, _)| k != key)
            .map(|offset| start + offset)
            .unwrap_or(keyed.len());
        let run: Vec<DriverId> = keyed[start..end].iter().map(|&(_, driver)| driver).collect();
        ordered.extend(resolve_group(run, rest, view));
        start = end;
    }
    ordered
}
