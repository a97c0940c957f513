/// Result alias that carries the custom [`FretboardError`] type.
pub type Result<T> = std::result::Result<T, FretboardError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum FretboardError {
    /// A name that does not belong to one of the closed enumerations
    /// (note, scale, chord, mode, ...).
    #[error("unknown {kind} `{value}`")]
    UnknownName { kind: &'static str, value: String },
    /// A numeric identifier outside its fixed range.
    #[error("{kind} must be between {min} and {max}, got {value}")]
    OutOfRange {
        kind: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    /// Tempo outside the 1..=400 bpm range both schedulers accept.
    #[error("tempo must be between 1 and 400 bpm, got {0}")]
    InvalidBpm(u32),
    /// The intent targets a control that is disabled in the active mode.
    #[error("`{control}` cannot be changed in {mode} mode")]
    ControlLocked {
        control: &'static str,
        mode: &'static str,
    },
    /// A timing setting that cannot drive a scheduler.
    #[error("`{field}` {reason}")]
    InvalidTiming {
        field: &'static str,
        reason: &'static str,
    },
    /// Reading a configuration file failed.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The configuration document is not valid JSON for [`crate::AppConfig`].
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl FretboardError {
    pub(crate) fn unknown(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownName {
            kind,
            value: value.into(),
        }
    }
}
