#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("pregnancy tracking is already closed; an outcome has been recorded")]
    InvalidState,
    #[error("pregnancy tracking has no LMP date; gestational computation requires one")]
    MissingLmp,
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("no active pregnancy tracking found")]
    NoActiveTracking,
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to create record directory: {0}")]
    RecordDirCreation(std::io::Error),
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),

    #[error(transparent)]
    Text(#[from] mhr_types::TextError),
}

pub type RecordResult<T> = std::result::Result<T, RecordError>;
