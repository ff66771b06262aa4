pub mod outcome;
pub mod round;

pub use outcome::{DivisionOutcome, Leaderboards, RoundOutcome, Standing, TimedEntry};
pub use round::{
    BonusScope, BonusToggle, Division, Driver, DriverId, PointsSource, PointsTable, Race, RaceId,
    RaceResult, Round,
};
