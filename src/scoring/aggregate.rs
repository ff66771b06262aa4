use std::collections::BTreeMap;

use crate::model::{DriverId, Leaderboards, RaceResult, TimedEntry};

use super::view::RoundView;

/// Best time a driver set, with the record it came from.
#[derive(Debug, Clone, Copy)]
struct Best {
    time_ms: u64,
    race_id: u64,
    record_index: usize,
}

/// Collapse every timed record of the view into one best entry per driver
/// for each leaderboard.
pub fn aggregate(view: &RoundView) -> Leaderboards {
    let qualifying = view.results().iter().filter(|a| view.is_qualifier(a.result));
    let sessions = view.results().iter().filter(|a| !view.is_qualifier(a.result));

    Leaderboards {
        qualifying_results: leaderboard(
            qualifying.map(|a| (a.record_index, a.result)),
            |result| result.lap_time_ms,
        ),
        race_time_results: leaderboard(
            sessions
                .clone()
                .filter(|a| !a.result.dnf)
                .map(|a| (a.record_index, a.result)),
            |result| result.race_time_ms,
        ),
        // A retirement still counts here when the driver set a lap
        fastest_lap_results: leaderboard(
            sessions.map(|a| (a.record_index, a.result)),
            |result| result.lap_time_ms,
        ),
    }
}

fn leaderboard<'a, F>(
    records: impl Iterator<Item = (usize, &'a RaceResult)>,
    time_of: F,
) -> Vec<TimedEntry>
where
    F: Fn(&RaceResult) -> Option<u64>,
{
    let mut best: BTreeMap<DriverId, Best> = BTreeMap::new();

    for (record_index, result) in records {
        let Some(time_ms) = time_of(result) else {
            continue;
        };
        let candidate = Best {
            time_ms,
            race_id: result.race_id,
            record_index,
        };
        best.entry(result.driver_id)
            .and_modify(|current| {
                // Strictly faster only, so the earlier record wins a dead heat
                if candidate.time_ms < current.time_ms {
                    *current = candidate;
                }
            })
            .or_insert(candidate);
    }

    let mut entries: Vec<(DriverId, Best)> = best.into_iter().collect();
    entries.sort_by_key(|(_, best)| (best.time_ms, best.record_index));

    entries
        .into_iter()
        .enumerate()
        .map(|(i, (driver_id, best))| TimedEntry {
            position: i as u32 + 1,
            driver_id,
            time_ms: best.time_ms,
            race_id: best.race_id,
        })
        .collect()
}
