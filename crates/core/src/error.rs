use crate::validation::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum RentalError {
    #[error("the given data was invalid")]
    Validation(ValidationErrors),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("{0}")]
    Conflict(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid id: {0}")]
    Id(#[from] rentdesk_uuid::IdError),
    #[error("invalid value: {0}")]
    Text(#[from] rentdesk_types::TextError),

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to remove record directory: {0}")]
    FileRemove(std::io::Error),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("record store lock poisoned")]
    StorePoisoned,

    #[error("failed to hash password: {0}")]
    PasswordHash(String),
}

impl RentalError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

pub type RentalResult<T> = std::result::Result<T, RentalError>;
