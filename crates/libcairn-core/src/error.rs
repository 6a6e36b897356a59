use thiserror::Error;

/// Main error type for cairn storage operations
#[derive(Debug, Error)]
pub enum CairnError {
    /// The named object, reference, or file does not exist. Many callers
    /// treat this as "try the next candidate" or "use an empty default".
    #[error("not found: {0}")]
    NotFound(String),

    /// On-disk bytes violate the format they claim to carry. Always fatal;
    /// the message names the offending hash or file.
    #[error("malformed: {0}")]
    Malformed(String),

    /// Reference resolution produced more than one candidate.
    #[error("ambiguous reference '{name}': candidates {candidates:?}")]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },

    /// A caller-visible precondition does not hold (checkout destination
    /// occupied, unsupported index version, ...).
    #[error("precondition violated: {0}")]
    PreconditionViolated(String),

    /// The format is recognized but this engine does not implement it.
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl CairnError {
    /// Exit code for the CLI layer.
    pub fn exit_code(&self) -> i32 {
        match self {
            CairnError::NotFound(_) => 3,
            CairnError::Ambiguous { .. } => 4,
            CairnError::InvalidInput(_) => 2,
            CairnError::Malformed(_) => 5,
            CairnError::PreconditionViolated(_) => 2,
            CairnError::Unsupported(_) => 5,
            CairnError::Io(_) => 5,
            CairnError::TomlParse(_) => 5,
            CairnError::TomlSerialize(_) => 5,
        }
    }
}
