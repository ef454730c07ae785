//! Error types for renown.

/// Top-level error type, returned while bringing the engine up.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Title registry errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Title already reserved: {title}")]
    AlreadyReserved { title: String },

    #[error("Title store IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Candidate generation errors.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Word pools exhausted: found {found} of {wanted} candidates in {attempts} attempts")]
    Exhausted {
        found: usize,
        wanted: usize,
        attempts: usize,
    },
}

/// Messaging gateway errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Failed to send on channel {channel}: {reason}")]
    SendFailed { channel: String, reason: String },

    #[error("Not permitted to {action}: {reason}")]
    Forbidden { action: String, reason: String },
}

/// Errors that end an onboarding session without assigning an identity.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Exhausted(#[from] GenerationError),

    #[error("Title {title} was reserved by another session")]
    ReservationConflict { title: String },

    #[error("Title store failure: {0}")]
    Store(std::io::Error),

    #[error("Could not reach member: {0}")]
    Delivery(#[from] GatewayError),
}

impl From<RegistryError> for SessionError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::AlreadyReserved { title } => Self::ReservationConflict { title },
            RegistryError::Io(e) => Self::Store(e),
        }
    }
}

/// Result type alias for renown.
pub type Result<T> = std::result::Result<T, Error>;
