use crate::model::DriverId;

use super::view::RoundView;

/// A driver is round-complete when at least one of their race-session
/// results is not a DNF. Qualifying only counts in a round that has no race
/// sessions.
pub fn is_round_complete(driver: DriverId, view: &RoundView) -> bool {
    view.session_results()
        .any(|awarded| awarded.result.driver_id == driver && !awarded.result.dnf)
}

/// True when every record the driver has in the round is a DNF.
pub fn only_dnf(driver: DriverId, view: &RoundView) -> bool {
    let mut records = view.results_for(driver).peekable();
    records.peek().is_some() && records.all(|awarded| awarded.result.dnf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PointsTable;
    use crate::scoring::view::fixtures::*;

    #[test]
    fn test_single_race_dnf_is_not_complete() {
        let round = round(
            vec![race(1, 1, false)],
            vec![finish(1, 1, 1), dnf(1, 2, Some(2))],
        );
        let view = view(&round, &PointsTable::default());
        assert!(is_round_complete(1, &view));
        assert!(!is_round_complete(2, &view));
    }

    #[test]
    fn test_partial_dnf_is_complete() {
        let round = round(
            vec![race(1, 1, false), race(2, 2, false)],
            vec![dnf(1, 1, None), finish(2, 1, 2)],
        );
        let view = view(&round, &PointsTable::default());
        assert!(is_round_complete(1, &view));
        assert!(!only_dnf(1, &view));
    }

    #[test]
    fn test_qualifying_alone_is_not_complete() {
        let round = round(
            vec![race(1, 1, true), race(2, 2, false)],
            vec![finish(1, 1, 1), dnf(2, 1, None)],
        );
        let view = view(&round, &PointsTable::default());
        assert!(!is_round_complete(1, &view));
        // The qualifying finish still means not every record is a DNF
        assert!(!only_dnf(1, &view));
    }

    #[test]
    fn test_qualifier_only_round_counts_qualifying() {
        let round = round(vec![race(1, 1, true)], vec![finish(1, 1, 1)]);
        let view = view(&round, &PointsTable::default());
        assert!(is_round_complete(1, &view));
    }

    #[test]
    fn test_only_dnf_across_races() {
        let round = round(
            vec![race(1, 1, false), race(2, 2, false)],
            vec![dnf(1, 4, Some(9)), dnf(2, 4, None)],
        );
        let view = view(&round, &PointsTable::default());
        assert!(only_dnf(4, &view));
        assert!(!only_dnf(5, &view));
    }
}
