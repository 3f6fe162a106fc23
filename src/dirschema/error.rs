use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirError {
    #[error("Attribute '{attribute}' is constructed and cannot be modified")]
    InvalidOperation { attribute: String },

    #[error("Attribute '{attribute}' is single-valued and cannot hold more than one value")]
    ConstraintViolation { attribute: String },

    #[error("Attribute '{attribute}' has no free value slot left")]
    SlotsExhausted { attribute: String },

    #[error("Referral limit reached while searching '{base}' with filter {filter}")]
    ReferralLimit { base: String, filter: String },

    #[error("Value conversion error: {0}")]
    Conversion(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DirError {
    /// Whether this error aborts a schema build outright.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DirError::ReferralLimit { .. })
    }
}

pub type Result<T> = std::result::Result<T, DirError>;
