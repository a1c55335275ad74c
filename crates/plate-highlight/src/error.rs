use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("invalid range: {0}")]
    InvalidRange(String),
}

impl From<PathError> for ApplyError {
    fn from(value: PathError) -> Self {
        ApplyError::InvalidPath(value.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct PathError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("duplicate node spec kind: {0}")]
    DuplicateNodeKind(String),
    #[error("duplicate command id: {0}")]
    DuplicateCommand(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("command {id} failed: {source}")]
    Apply {
        id: String,
        #[source]
        source: ApplyError,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("highlight option has an empty model name")]
    EmptyModel,
    #[error("duplicate highlight option: {0}")]
    DuplicateModel(String),
    #[error("invalid color {color:?} for highlight option {model}")]
    InvalidColor { model: String, color: String },
}
