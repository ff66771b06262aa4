use std::collections::BTreeMap;

use crate::model::{DriverId, PointsTable, Standing};

use super::bonus::Bonus;
use super::dnf::{is_round_complete, only_dnf};
use super::tiebreak::{resolve_ties, TiebreakerRule};
use super::view::RoundView;

/// How the primary order of a round is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Rank by summed race points plus bonuses
    PointsAggregate,
    /// Rank by finishing order in the main race
    PositionFallback,
}

impl Strategy {
    /// Pick the strategy for a view.
    ///
    /// When no result earned race points every total is zero, and ranking
    /// by totals would hand the whole field to the tiebreakers. The main
    /// race's finishing order decides instead.
    pub fn select(view: &RoundView) -> Strategy {
        if view.results().iter().any(|awarded| awarded.race_points != 0) {
            Strategy::PointsAggregate
        } else {
            Strategy::PositionFallback
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::PointsAggregate => "points-aggregate",
            Strategy::PositionFallback => "position-fallback",
        }
    }

    /// Drivers in final order.
    fn rank(
        &self,
        view: &RoundView,
        bonuses: &BTreeMap<DriverId, Bonus>,
        rules: &[TiebreakerRule],
    ) -> Vec<DriverId> {
        match self {
            Strategy::PointsAggregate => rank_by_points(view, bonuses, rules),
            Strategy::PositionFallback => rank_by_main_race(view, rules),
        }
    }
}

/// Build the ordered round standings for a view.
///
/// `round_table` maps round position to round points and is only consulted
/// when the round has round points enabled.
pub fn build_standings(
    view: &RoundView,
    round_table: Option<&PointsTable>,
    rules: &[TiebreakerRule],
    bonuses: &BTreeMap<DriverId, Bonus>,
) -> Vec<Standing> {
    let strategy = Strategy::select(view);
    tracing::debug!(round = %view.round.id, strategy = strategy.name(), "ranking round");

    let round_table = round_table.filter(|_| view.round.round_points_enabled);

    strategy
        .rank(view, bonuses, rules)
        .into_iter()
        .enumerate()
        .map(|(i, driver)| {
            let position = i as u32 + 1;
            let bonus = bonuses.get(&driver).copied().unwrap_or_default();
            let round_points = match round_table {
                Some(table) if is_round_complete(driver, view) => table.points_for(position),
                _ => 0,
            };
            let race_points = race_points(driver, view);

            Standing {
                position,
                driver_id: driver,
                race_points,
                round_points,
                pole_bonus: bonus.pole_bonus,
                fastest_lap_bonus: bonus.fastest_lap_bonus,
                total_points: race_points
                    + round_points
                    + bonus.pole_bonus
                    + bonus.fastest_lap_bonus,
                positions_gained: view
                    .session_results()
                    .filter(|awarded| awarded.result.driver_id == driver)
                    .fold(0i32, |gained, awarded| {
                        gained.saturating_add(awarded.result.positions_gained)
                    }),
                dnf: only_dnf(driver, view),
            }
        })
        .collect()
}

fn race_points(driver: DriverId, view: &RoundView) -> i32 {
    view.results_for(driver).map(|awarded| awarded.race_points).sum()
}

/// Sort by race points plus bonuses, descending. Tiebreakers only ever see
/// drivers with identical totals.
fn rank_by_points(
    view: &RoundView,
    bonuses: &BTreeMap<DriverId, Bonus>,
    rules: &[TiebreakerRule],
) -> Vec<DriverId> {
    let mut totals: BTreeMap<i32, Vec<DriverId>> = BTreeMap::new();
    for &driver in view.drivers() {
        let bonus = bonuses.get(&driver).copied().unwrap_or_default();
        let total = race_points(driver, view) + bonus.pole_bonus + bonus.fastest_lap_bonus;
        totals.entry(total).or_default().push(driver);
    }

    totals
        .into_iter()
        .rev()
        .flat_map(|(total, group)| {
            if group.len() > 1 {
                tracing::debug!(total, ?group, "resolving points tie");
            }
            resolve_ties(&group, rules, view)
        })
        .collect()
}

/// Where a driver stands in the main race: finishers by position, then
/// retirements by recorded position, then drivers who did not take part.
fn main_race_key(driver: DriverId, view: &RoundView) -> (u8, u32) {
    match view.main_race_result(driver) {
        Some(result) => match result.finished_position() {
            Some(position) => (0, position),
            None => (1, result.position.unwrap_or(u32::MAX)),
        },
        None => (2, 0),
    }
}

fn rank_by_main_race(view: &RoundView, rules: &[TiebreakerRule]) -> Vec<DriverId> {
    let mut keyed: BTreeMap<(u8, u32), Vec<DriverId>> = BTreeMap::new();
    for &driver in view.drivers() {
        keyed.entry(main_race_key(driver, view)).or_default().push(driver);
    }

    keyed
        .into_values()
        .flat_map(|group| resolve_ties(&group, rules, view))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Race, RaceResult, Round};
    use crate::scoring::view::fixtures::*;

    fn f1_top3() -> PointsTable {
        PointsTable::from([(1, 25), (2, 18), (3, 15)])
    }

    fn no_bonuses() -> BTreeMap<DriverId, Bonus> {
        BTreeMap::new()
    }

    fn order(standings: &[Standing]) -> Vec<DriverId> {
        standings.iter().map(|s| s.driver_id).collect()
    }

    #[test]
    fn test_strategy_selection() {
        let round = round(vec![race(1, 1, false)], vec![finish(1, 1, 1)]);
        assert_eq!(
            Strategy::select(&view(&round, &f1_top3())),
            Strategy::PointsAggregate
        );
        assert_eq!(
            Strategy::select(&view(&round, &PointsTable::default())),
            Strategy::PositionFallback
        );
    }

    #[test]
    fn test_points_aggregate_sums_races() {
        let round = round(
            vec![race(1, 1, false), race(2, 2, false)],
            vec![
                finish(1, 1, 1),
                finish(1, 2, 2),
                finish(1, 3, 3),
                finish(2, 2, 1),
                finish(2, 3, 2),
                finish(2, 1, 3),
            ],
        );
        let view = view(&round, &f1_top3());
        let standings = build_standings(&view, None, &[], &no_bonuses());

        // 2: 18 + 25 = 43, 1: 25 + 15 = 40, 3: 15 + 18 = 33
        assert_eq!(order(&standings), vec![2, 1, 3]);
        assert_eq!(standings[0].race_points, 43);
        assert_eq!(standings[0].total_points, 43);
        assert_eq!(
            standings.iter().map(|s| s.position).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_bonuses_count_towards_rank() {
        let round = round(
            vec![race(1, 1, false), race(2, 2, false)],
            vec![finish(1, 1, 1), finish(1, 2, 2), finish(2, 2, 1), finish(2, 1, 2)],
        );
        let view = view(&round, &f1_top3());
        let mut bonuses = BTreeMap::new();
        bonuses.insert(
            2,
            Bonus {
                pole_bonus: 0,
                fastest_lap_bonus: 1,
            },
        );
        let standings = build_standings(&view, None, &[], &bonuses);

        assert_eq!(order(&standings), vec![2, 1]);
        assert_eq!(standings[0].total_points, 44);
        assert_eq!(standings[0].fastest_lap_bonus, 1);
    }

    #[test]
    fn test_tie_resolved_by_qualifying() {
        // Both drivers on 20 points; driver 1 qualified P1, driver 2 P3
        let table = PointsTable::from([(1, 12), (2, 8)]);
        let round = round(
            vec![race(1, 1, true), race(2, 2, false), race(3, 3, false)],
            vec![
                finish(1, 2, 3),
                finish(1, 1, 1),
                finish(2, 2, 1),
                finish(2, 1, 2),
                finish(3, 1, 1),
                finish(3, 2, 2),
            ],
        );
        let view = session_view(&round, &table);

        let standings = build_standings(
            &view,
            None,
            &[TiebreakerRule::BestQualifyingPosition],
            &no_bonuses(),
        );
        assert_eq!(standings[0].total_points, 20);
        assert_eq!(standings[1].total_points, 20);
        assert_eq!(order(&standings), vec![1, 2]);
    }

    #[test]
    fn test_tiebreakers_never_reorder_untied_drivers() {
        // Driver 3 took pole but scored the fewest points
        let round = round(
            vec![race(1, 1, true), race(2, 2, false)],
            vec![
                finish(1, 3, 1),
                finish(1, 1, 2),
                finish(1, 2, 3),
                finish(2, 1, 1),
                finish(2, 2, 2),
                finish(2, 3, 3),
            ],
        );
        let view = session_view(&round, &f1_top3());
        let standings = build_standings(
            &view,
            None,
            &[TiebreakerRule::BestQualifyingPosition],
            &no_bonuses(),
        );
        assert_eq!(order(&standings), vec![1, 2, 3]);
    }

    #[test]
    fn test_qualifier_points_count_when_configured() {
        let round = round(
            vec![race(1, 1, true), race(2, 2, false)],
            vec![
                finish(1, 3, 1),
                finish(1, 1, 2),
                finish(1, 2, 3),
                finish(2, 1, 1),
                finish(2, 2, 2),
                finish(2, 3, 3),
            ],
        );
        let view = view(&round, &f1_top3());
        let standings = build_standings(&view, None, &[], &no_bonuses());
        // 1: 18 + 25, 3: 25 + 15, 2: 15 + 18
        assert_eq!(order(&standings), vec![1, 3, 2]);
    }

    fn fallback_round(results: Vec<RaceResult>, races: Vec<Race>) -> Round {
        let mut round = round(races, results);
        round.round_points_enabled = true;
        round
    }

    #[test]
    fn test_single_race_dnf_gets_no_round_points() {
        let round = fallback_round(
            vec![finish(1, 1, 1), finish(1, 2, 2), dnf(1, 3, None)],
            vec![race(1, 1, false)],
        );
        let view = view(&round, &PointsTable::default());
        let standings = build_standings(
            &view,
            Some(&f1_top3()),
            &[TiebreakerRule::BestQualifyingPosition],
            &no_bonuses(),
        );

        assert_eq!(order(&standings), vec![1, 2, 3]);
        assert_eq!(standings[0].round_points, 25);
        assert_eq!(standings[1].round_points, 18);
        assert_eq!(standings[2].round_points, 0);
        assert!(standings[2].dnf);
        assert_eq!(standings[2].total_points, 0);
    }

    #[test]
    fn test_single_race_dnf_with_recorded_position() {
        let round = fallback_round(
            vec![dnf(1, 3, Some(1)), finish(1, 1, 2), finish(1, 2, 3)],
            vec![race(1, 1, false)],
        );
        let view = view(&round, &PointsTable::default());
        let standings = build_standings(&view, Some(&f1_top3()), &[], &no_bonuses());

        assert_eq!(order(&standings), vec![1, 2, 3]);
        assert_eq!(standings[2].round_points, 0);
    }

    #[test]
    fn test_fallback_ranks_by_main_race_not_qualifying() {
        let round = fallback_round(
            vec![finish(1, 2, 1), finish(1, 1, 2), finish(2, 1, 1), finish(2, 2, 2)],
            vec![race(1, 1, true), race(2, 2, false)],
        );
        let view = view(&round, &PointsTable::default());
        let standings = build_standings(
            &view,
            Some(&f1_top3()),
            &[TiebreakerRule::BestQualifyingPosition],
            &no_bonuses(),
        );
        assert_eq!(order(&standings), vec![1, 2]);
        assert_eq!(standings[0].round_points, 25);
    }

    #[test]
    fn test_fallback_partial_dnf_stays_eligible() {
        // Driver 1 retired in the sprint but finished the main race second
        let round = fallback_round(
            vec![dnf(1, 1, None), finish(1, 2, 1), finish(2, 2, 1), finish(2, 1, 2)],
            vec![race(1, 1, false), race(2, 2, false)],
        );
        let view = view(&round, &PointsTable::default());
        let standings = build_standings(&view, Some(&f1_top3()), &[], &no_bonuses());

        assert_eq!(order(&standings), vec![2, 1]);
        assert_eq!(standings[1].round_points, 18);
        assert!(!standings[1].dnf);
    }

    #[test]
    fn test_fallback_without_round_points() {
        let round = round(
            vec![race(1, 1, false)],
            vec![finish(1, 1, 2), finish(1, 2, 1)],
        );
        let view = view(&round, &PointsTable::default());
        let standings = build_standings(&view, Some(&f1_top3()), &[], &no_bonuses());

        assert_eq!(order(&standings), vec![2, 1]);
        assert!(standings.iter().all(|s| s.round_points == 0));
    }

    #[test]
    fn test_round_points_follow_aggregate_rank() {
        let mut round = round(
            vec![race(1, 1, false), race(2, 2, false)],
            vec![dnf(1, 1, None), finish(1, 2, 1), finish(2, 1, 2), finish(2, 2, 1)],
        );
        round.round_points_enabled = true;
        let view = view(&round, &f1_top3());
        let round_table = PointsTable::from([(1, 10), (2, 5)]);
        let standings = build_standings(&view, Some(&round_table), &[], &no_bonuses());

        assert_eq!(order(&standings), vec![2, 1]);
        assert_eq!(standings[1].race_points, 18);
        assert_eq!(standings[1].round_points, 5);
        assert_eq!(standings[1].total_points, 23);
    }

    #[test]
    fn test_non_starters_in_main_race_rank_last() {
        let round = fallback_round(
            vec![finish(1, 4, 1), finish(2, 1, 1), dnf(2, 2, Some(2)), finish(2, 3, 3)],
            vec![race(1, 1, false), race(2, 2, false)],
        );
        let view = view(&round, &PointsTable::default());
        let table = PointsTable::from([(1, 25), (2, 18), (3, 15), (4, 12)]);
        let standings = build_standings(&view, Some(&table), &[], &no_bonuses());

        assert_eq!(order(&standings), vec![1, 3, 2, 4]);
        assert_eq!(standings[1].round_points, 18);
        // Driver 2 only has a DNF, driver 4 finished the sprint
        assert_eq!(standings[2].round_points, 0);
        assert_eq!(standings[3].round_points, 12);
    }

    #[test]
    fn test_positions_gained_summed_over_races() {
        let mut a = finish(1, 1, 1);
        a.positions_gained = 3;
        let mut b = finish(2, 1, 2);
        b.positions_gained = -1;
        let round = round(vec![race(1, 1, false), race(2, 2, false)], vec![a, b]);
        let view = view(&round, &f1_top3());
        let standings = build_standings(&view, None, &[], &no_bonuses());
        assert_eq!(standings[0].positions_gained, 2);
    }
}
