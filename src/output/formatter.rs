use std::io::IsTerminal;
use owo_colors::OwoColorize;
use terminal_size::{Width, terminal_size};

use crate::model::{DriverId, Round, Standing, TimedEntry};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format milliseconds as a lap time: "1:24.500", or "42:05.123" for race
/// distances. Minutes are never rolled into hours.
pub fn format_lap_time(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!("{}:{:02}.{:03}", minutes, seconds, millis)
}

/// Driver name from the round roster, "#id" when the roster has no entry
fn driver_label(round: &Round, driver: DriverId) -> String {
    round
        .driver_name(driver)
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{}", driver))
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Width of the name column: the longest name, capped so a row fits the
/// terminal when there is one.
fn name_width(names: &[String], fixed_width: usize) -> usize {
    let longest = names.iter().map(|n| n.chars().count()).max().unwrap_or(0);
    match get_terminal_width() {
        Some(width) if width > fixed_width + 10 => longest.min(width - fixed_width),
        // Very narrow terminal
        Some(_) => longest.min(20),
        // No terminal (pipe), don't truncate
        None => longest,
    }
}

/// Format round standings, one driver per line
/// Columns: Index, Driver, Total, breakdown (race/round/bonus), DNF marker
/// No headers; index is right-aligned with a trailing dot
pub fn format_standings(standings: &[Standing], round: &Round, use_colors: bool) -> String {
    if standings.is_empty() {
        return "No results recorded.".to_string();
    }

    let names: Vec<String> = standings
        .iter()
        .map(|s| driver_label(round, s.driver_id))
        .collect();
    // Index 3 + total 4 + " pts" + breakdown ~32 + separators
    let width = name_width(&names, 48);

    standings
        .iter()
        .zip(&names)
        .map(|(standing, name)| {
            let index_str = format!("{:>2}.", standing.position);
            let name = format!("{:<width$}", truncate_name(name, width), width = width);
            let total = format!("{:>4} pts", standing.total_points);
            let breakdown = format!(
                "race {}, round {}, bonus {}",
                standing.race_points,
                standing.round_points,
                standing.bonus_points()
            );
            let dnf = if standing.dnf { "  DNF" } else { "" };

            if use_colors {
                format!(
                    "{} {}  {}  {}{}",
                    index_str.dimmed(),
                    name,
                    total.bold(),
                    breakdown.dimmed(),
                    dnf.red()
                )
            } else {
                format!("{} {}  {}  {}{}", index_str, name, total, breakdown, dnf)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format one best-time leaderboard under a title line
pub fn format_leaderboard(
    title: &str,
    entries: &[TimedEntry],
    round: &Round,
    use_colors: bool,
) -> String {
    let heading = if use_colors {
        title.bold().to_string()
    } else {
        title.to_string()
    };

    if entries.is_empty() {
        return format!("{}\n  No times recorded.", heading);
    }

    let names: Vec<String> = entries
        .iter()
        .map(|e| driver_label(round, e.driver_id))
        .collect();
    let width = name_width(&names, 20);

    let rows = entries
        .iter()
        .zip(&names)
        .map(|(entry, name)| {
            let index_str = format!("{:>2}.", entry.position);
            let name = format!("{:<width$}", truncate_name(name, width), width = width);
            let time = format!("{:>10}", format_lap_time(entry.time_ms));

            if use_colors {
                format!("{} {}  {}", index_str.dimmed(), name, time.cyan())
            } else {
                format!("{} {}  {}", index_str, name, time)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("{}\n{}", heading, rows)
}

/// Format standings as tab-separated values for scripting
/// Columns: position, driver_id, name, race, round, pole, fastest_lap,
/// total, dnf (no headers, no colors)
pub fn format_standings_tsv(standings: &[Standing], round: &Round) -> String {
    standings
        .iter()
        .map(|s| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                s.position,
                s.driver_id,
                driver_label(round, s.driver_id),
                s.race_points,
                s.round_points,
                s.pole_bonus,
                s.fastest_lap_bonus,
                s.total_points,
                s.dnf
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a leaderboard as tab-separated values
/// Columns: board, position, driver_id, name, time_ms, race_id
pub fn format_leaderboard_tsv(board: &str, entries: &[TimedEntry], round: &Round) -> String {
    entries
        .iter()
        .map(|e| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                board,
                e.position,
                e.driver_id,
                driver_label(round, e.driver_id),
                e.time_ms,
                e.race_id
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
