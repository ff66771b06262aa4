use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs;
use std::path::Path;

use crate::model::{Round, RoundOutcome};

/// Load a round document
///
/// `.json` files are read as JSON; anything else is read as YAML.
pub fn load_round(path: &Path) -> Result<Round> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read round file at {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let round: Round = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse round: invalid JSON in {}", path.display()))?
    } else {
        serde_saphyr::from_str(&content)
            .with_context(|| format!("Failed to parse round: invalid YAML in {}", path.display()))?
    };

    tracing::debug!(
        path = %path.display(),
        round = %round.id,
        races = round.races.len(),
        results = round.results.len(),
        "loaded round"
    );
    Ok(round)
}

/// Save a round outcome to a JSON file atomically
///
/// The previous file stays in place until the new one is fully written, so
/// readers never see a half-written outcome.
pub fn save_outcome(path: &Path, outcome: &RoundOutcome) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, outcome).context("Failed to serialize round outcome")?;

    file.commit().context("Failed to save round outcome")?;

    tracing::debug!(path = %path.display(), round = %outcome.round_id, "saved outcome");
    Ok(())
}
