use std::collections::BTreeMap;

use crate::model::{BonusScope, BonusToggle, DriverId, RaceResult};

use super::config::BonusPoints;
use super::points::AwardedResult;
use super::view::RoundView;

/// Bonus points one driver collected over the round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bonus {
    pub pole_bonus: i32,
    pub fastest_lap_bonus: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Pole,
    FastestLap,
}

/// Work out pole and fastest-lap bonuses for every driver in the view.
///
/// At most one pole and one fastest-lap bonus is handed out per scope unit
/// (each race, or the round as a whole). Equal lap times go to the
/// earliest-recorded result.
pub fn apply_bonuses(view: &RoundView, values: BonusPoints) -> BTreeMap<DriverId, Bonus> {
    let mut bonuses: BTreeMap<DriverId, Bonus> = BTreeMap::new();

    match view.round.bonus_scope {
        BonusScope::Race => {
            for race in view.races() {
                let in_race = view
                    .results()
                    .iter()
                    .filter(|awarded| awarded.result.race_id == race.id);

                if race.pole.enabled {
                    if let Some(winner) = pick(in_race.clone().filter(|a| a.result.has_pole)) {
                        award(
                            &mut bonuses,
                            winner.result,
                            Some(winner.result),
                            race.pole,
                            Kind::Pole,
                            values,
                        );
                    }
                }
                if race.fastest_lap.enabled {
                    if let Some(winner) = pick(in_race.filter(|a| a.result.has_fastest_lap)) {
                        award(
                            &mut bonuses,
                            winner.result,
                            Some(winner.result),
                            race.fastest_lap,
                            Kind::FastestLap,
                            values,
                        );
                    }
                }
            }
        }
        BonusScope::Round => {
            let round = view.round;

            if round.pole.enabled {
                let winner = pick(
                    view.qualifier_results()
                        .filter(|a| a.result.lap_time_ms.is_some()),
                )
                .or_else(|| pick(view.results().iter().filter(|a| a.result.has_pole)));

                if let Some(winner) = winner {
                    let finish = view.main_race_result(winner.result.driver_id);
                    award(&mut bonuses, winner.result, finish, round.pole, Kind::Pole, values);
                }
            }
            if round.fastest_lap.enabled {
                let winner = pick(
                    view.results()
                        .iter()
                        .filter(|a| !view.is_qualifier(a.result))
                        .filter(|a| a.result.lap_time_ms.is_some()),
                )
                .or_else(|| pick(view.results().iter().filter(|a| a.result.has_fastest_lap)));

                if let Some(winner) = winner {
                    let finish = view.main_race_result(winner.result.driver_id);
                    award(
                        &mut bonuses,
                        winner.result,
                        finish,
                        round.fastest_lap,
                        Kind::FastestLap,
                        values,
                    );
                }
            }
        }
    }

    bonuses
}

/// Best candidate: lowest lap time, then earliest-recorded. Untimed
/// candidates rank behind every timed one.
fn pick<'r, 'a: 'r>(
    candidates: impl Iterator<Item = &'r AwardedResult<'a>>,
) -> Option<&'r AwardedResult<'a>> {
    candidates.min_by_key(|awarded| {
        (
            awarded.result.lap_time_ms.unwrap_or(u64::MAX),
            awarded.record_index,
        )
    })
}

/// `finish` is the result whose finishing position gates a top-10-only
/// bonus: the same race in race scope, the main race in round scope.
fn award(
    bonuses: &mut BTreeMap<DriverId, Bonus>,
    winner: &RaceResult,
    finish: Option<&RaceResult>,
    toggle: BonusToggle,
    kind: Kind,
    values: BonusPoints,
) {
    if toggle.top_10_only && !finish.is_some_and(RaceResult::finished_top_10) {
        tracing::debug!(driver = winner.driver_id, ?kind, "bonus discarded, no top 10 finish");
        return;
    }

    let entry = bonuses.entry(winner.driver_id).or_default();
    match kind {
        Kind::Pole => entry.pole_bonus += values.pole,
        Kind::FastestLap => entry.fastest_lap_bonus += values.fastest_lap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BonusScope, PointsTable, Round};
    use crate::scoring::view::fixtures::*;

    fn values() -> BonusPoints {
        BonusPoints {
            pole: 1,
            fastest_lap: 2,
        }
    }

    fn race_scoped(toggle: BonusToggle, results: Vec<RaceResult>) -> Round {
        let mut r = race(1, 1, false);
        r.pole = toggle;
        r.fastest_lap = toggle;
        round(vec![r], results)
    }

    #[test]
    fn test_race_scope_awards_flagged_drivers() {
        let mut polesitter = finish(1, 1, 2);
        polesitter.has_pole = true;
        let mut fastest = finish(1, 2, 1);
        fastest.has_fastest_lap = true;
        let round = race_scoped(BonusToggle::on(), vec![polesitter, fastest]);

        let bonuses = apply_bonuses(&view(&round, &PointsTable::default()), values());
        assert_eq!(bonuses[&1], Bonus { pole_bonus: 1, fastest_lap_bonus: 0 });
        assert_eq!(bonuses[&2], Bonus { pole_bonus: 0, fastest_lap_bonus: 2 });
    }

    #[test]
    fn test_disabled_toggle_awards_nothing() {
        let mut polesitter = finish(1, 1, 1);
        polesitter.has_pole = true;
        polesitter.has_fastest_lap = true;
        let round = race_scoped(BonusToggle::default(), vec![polesitter]);

        let bonuses = apply_bonuses(&view(&round, &PointsTable::default()), values());
        assert!(bonuses.is_empty());
    }

    #[test]
    fn test_top_10_only_discards_outside_top_10() {
        let mut fastest = finish(1, 1, 14);
        fastest.has_fastest_lap = true;
        let round = race_scoped(BonusToggle::top_10(), vec![fastest]);

        let bonuses = apply_bonuses(&view(&round, &PointsTable::default()), values());
        assert!(bonuses.is_empty());
    }

    #[test]
    fn test_top_10_only_discards_dnf() {
        let mut fastest = dnf(1, 1, Some(3));
        fastest.has_fastest_lap = true;
        let round = race_scoped(BonusToggle::top_10(), vec![fastest]);

        let bonuses = apply_bonuses(&view(&round, &PointsTable::default()), values());
        assert!(bonuses.is_empty());
    }

    #[test]
    fn test_dnf_keeps_bonus_without_top_10_rule() {
        let mut fastest = dnf(1, 1, None);
        fastest.has_fastest_lap = true;
        let round = race_scoped(BonusToggle::on(), vec![fastest]);

        let bonuses = apply_bonuses(&view(&round, &PointsTable::default()), values());
        assert_eq!(bonuses[&1].fastest_lap_bonus, 2);
    }

    #[test]
    fn test_one_bonus_per_race_when_flags_collide() {
        let mut a = timed(1, 1, 1, 85_000);
        a.has_fastest_lap = true;
        let mut b = timed(1, 2, 2, 84_900);
        b.has_fastest_lap = true;
        let round = race_scoped(BonusToggle::on(), vec![a, b]);

        let bonuses = apply_bonuses(&view(&round, &PointsTable::default()), values());
        assert_eq!(bonuses.len(), 1);
        assert_eq!(bonuses[&2].fastest_lap_bonus, 2);
    }

    #[test]
    fn test_equal_times_go_to_earliest_record() {
        let mut a = timed(1, 5, 3, 84_000);
        a.has_fastest_lap = true;
        let mut b = timed(1, 2, 1, 84_000);
        b.has_fastest_lap = true;
        let round = race_scoped(BonusToggle::on(), vec![a, b]);

        let bonuses = apply_bonuses(&view(&round, &PointsTable::default()), values());
        assert_eq!(bonuses.keys().copied().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn test_race_scope_awards_each_race() {
        let mut sprint = race(1, 1, false);
        sprint.fastest_lap = BonusToggle::on();
        let mut feature = race(2, 2, false);
        feature.fastest_lap = BonusToggle::on();
        let mut r1 = finish(1, 1, 1);
        r1.has_fastest_lap = true;
        let mut r2 = finish(2, 1, 1);
        r2.has_fastest_lap = true;
        let round = round(vec![sprint, feature], vec![r1, r2]);

        let bonuses = apply_bonuses(&view(&round, &PointsTable::default()), values());
        assert_eq!(bonuses[&1].fastest_lap_bonus, 4);
    }

    fn round_scoped(results: Vec<RaceResult>, toggle: BonusToggle) -> Round {
        let mut round = round(
            vec![race(1, 1, true), race(2, 2, false), race(3, 3, false)],
            results,
        );
        round.bonus_scope = BonusScope::Round;
        round.pole = toggle;
        round.fastest_lap = toggle;
        round
    }

    #[test]
    fn test_round_scope_uses_best_times_across_races() {
        let round = round_scoped(
            vec![
                timed(1, 1, 1, 80_000),
                timed(1, 2, 2, 80_500),
                timed(2, 1, 2, 85_000),
                timed(2, 2, 1, 84_500),
                timed(3, 1, 1, 84_600),
                timed(3, 2, 2, 84_700),
            ],
            BonusToggle::on(),
        );

        let bonuses = apply_bonuses(&view(&round, &PointsTable::default()), values());
        assert_eq!(bonuses[&1], Bonus { pole_bonus: 1, fastest_lap_bonus: 0 });
        assert_eq!(bonuses[&2], Bonus { pole_bonus: 0, fastest_lap_bonus: 2 });
    }

    #[test]
    fn test_round_scope_ignores_race_flags() {
        let mut flagged = timed(2, 1, 1, 90_000);
        flagged.has_fastest_lap = true;
        let mut round = round_scoped(vec![flagged, timed(2, 2, 2, 89_000)], BonusToggle::on());
        round.pole = BonusToggle::default();

        let bonuses = apply_bonuses(&view(&round, &PointsTable::default()), values());
        assert_eq!(bonuses.len(), 1);
        assert_eq!(bonuses[&2].fastest_lap_bonus, 2);
    }

    #[test]
    fn test_round_scope_top_10_checks_main_race() {
        let round = round_scoped(
            vec![
                timed(1, 1, 1, 80_000),
                timed(2, 1, 1, 84_000),
                finish(3, 1, 12),
                timed(3, 2, 1, 85_000),
            ],
            BonusToggle::top_10(),
        );

        let bonuses = apply_bonuses(&view(&round, &PointsTable::default()), values());
        // Driver 1 took pole and the fastest lap but finished P12 in the main race
        assert!(!bonuses.contains_key(&1));
        assert!(bonuses.is_empty());
    }

    #[test]
    fn test_round_scope_pole_falls_back_to_flag() {
        let mut polesitter = finish(1, 2, 1);
        polesitter.has_pole = true;
        let mut round = round(vec![race(1, 1, false)], vec![finish(1, 1, 2), polesitter]);
        round.bonus_scope = BonusScope::Round;
        round.pole = BonusToggle::on();

        let bonuses = apply_bonuses(&view(&round, &PointsTable::default()), values());
        assert_eq!(bonuses[&2].pole_bonus, 1);
    }
}
