pub mod formatter;

pub use formatter::{
    format_lap_time, format_leaderboard, format_leaderboard_tsv, format_standings,
    format_standings_tsv, should_use_colors,
};
