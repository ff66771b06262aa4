/// Errors that abort a round computation before any output is produced.
///
/// Both variants carry every problem found, not just the first, so a league
/// admin can fix a round document in one pass.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Missing or malformed points table, unknown preset, or an unknown
    /// tiebreaker rule identifier
    #[error("configuration error: {}", .0.join("; "))]
    Configuration(Vec<String>),

    /// A result that does not line up with the round's races, drivers or
    /// divisions
    #[error("data integrity error: {}", .0.join("; "))]
    DataIntegrity(Vec<String>),
}

impl EngineError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        EngineError::Configuration(vec![msg.into()])
    }

    /// All messages carried by the error.
    pub fn messages(&self) -> &[String] {
        match self {
            EngineError::Configuration(msgs) | EngineError::DataIntegrity(msgs) => msgs,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
