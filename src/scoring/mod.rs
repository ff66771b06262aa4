pub mod aggregate;
pub mod bonus;
pub mod config;
pub mod dnf;
pub mod engine;
pub mod points;
pub mod standings;
pub mod tiebreak;
pub mod validation;
pub mod view;

pub use config::*;
pub use engine::compute_round;
pub use tiebreak::TiebreakerRule;
pub use validation::{validate_round, validate_season};
