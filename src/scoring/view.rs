use std::collections::btree_map::{BTreeMap, Entry};

use crate::model::{DriverId, Race, RaceId, RaceResult, Round};

use super::points::AwardedResult;

/// The slice of a round one computation works on: every race of the round
/// and the (division-filtered) results that already carry their race points.
///
/// Results are kept in recording order; `record_index` points back into the
/// round's full result list and doubles as the deterministic fallback order.
#[derive(Debug, Clone)]
pub struct RoundView<'a> {
    pub round: &'a Round,
    races: Vec<&'a Race>,
    results: Vec<AwardedResult<'a>>,
    /// Distinct drivers in order of their first recorded result
    drivers: Vec<DriverId>,
    first_records: BTreeMap<DriverId, usize>,
}

impl<'a> RoundView<'a> {
    pub fn new(round: &'a Round, mut results: Vec<AwardedResult<'a>>) -> Self {
        let mut races: Vec<&Race> = round.races.iter().collect();
        races.sort_by_key(|race| (race.race_number, race.id));
        results.sort_by_key(|awarded| awarded.record_index);

        let mut drivers = Vec::new();
        let mut first_records = BTreeMap::new();
        for awarded in &results {
            let driver = awarded.result.driver_id;
            if let Entry::Vacant(entry) = first_records.entry(driver) {
                entry.insert(awarded.record_index);
                drivers.push(driver);
            }
        }

        Self {
            round,
            races,
            results,
            drivers,
            first_records,
        }
    }

    /// Races ordered by race number.
    pub fn races(&self) -> &[&'a Race] {
        &self.races
    }

    pub fn results(&self) -> &[AwardedResult<'a>] {
        &self.results
    }

    pub fn race(&self, id: RaceId) -> Option<&'a Race> {
        self.races.iter().copied().find(|race| race.id == id)
    }

    pub fn is_qualifier(&self, result: &RaceResult) -> bool {
        self.race(result.race_id)
            .map(|race| race.is_qualifier)
            .unwrap_or(false)
    }

    pub fn has_race_sessions(&self) -> bool {
        self.races.iter().any(|race| !race.is_qualifier)
    }

    /// The non-qualifier race with the highest race number. A round made of
    /// qualifiers only falls back to its last session.
    pub fn main_race(&self) -> Option<&'a Race> {
        self.races
            .iter()
            .rev()
            .find(|race| !race.is_qualifier)
            .or_else(|| self.races.last())
            .copied()
    }

    /// Distinct drivers in order of their first recorded result.
    pub fn drivers(&self) -> &[DriverId] {
        &self.drivers
    }

    /// Index of the driver's earliest-recorded result.
    pub fn first_record(&self, driver: DriverId) -> usize {
        self.first_records.get(&driver).copied().unwrap_or(usize::MAX)
    }

    pub fn results_for(&self, driver: DriverId) -> impl Iterator<Item = &AwardedResult<'a>> + '_ {
        self.results
            .iter()
            .filter(move |awarded| awarded.result.driver_id == driver)
    }

    /// Results from race sessions, or from every session when the round has
    /// no race sessions at all.
    pub fn session_results(&self) -> impl Iterator<Item = &AwardedResult<'a>> + '_ {
        let has_sessions = self.has_race_sessions();
        self.results
            .iter()
            .filter(move |awarded| !has_sessions || !self.is_qualifier(awarded.result))
    }

    pub fn qualifier_results(&self) -> impl Iterator<Item = &AwardedResult<'a>> + '_ {
        self.results
            .iter()
            .filter(move |awarded| self.is_qualifier(awarded.result))
    }

    pub fn result_in(&self, race: RaceId, driver: DriverId) -> Option<&'a RaceResult> {
        self.results
            .iter()
            .find(|awarded| awarded.result.race_id == race && awarded.result.driver_id == driver)
            .map(|awarded| awarded.result)
    }

    pub fn main_race_result(&self, driver: DriverId) -> Option<&'a RaceResult> {
        self.main_race()
            .and_then(|race| self.result_in(race.id, driver))
    }
}
