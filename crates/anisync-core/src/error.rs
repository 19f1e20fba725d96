use thiserror::Error;

/// Failure of one user's sync for one playback event.
///
/// None of these stop the orchestrator; they end the unit of work they occur in.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Search or relation resolution produced no usable catalog entry.
    #[error("not found: {0}")]
    NotFound(String),

    /// A call to the catalog service failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// A planned command could not be built from the records at hand.
    #[error("inconsistent state: {0}")]
    InconsistentState(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
