use crate::db::error::DbError;
use thiserror::Error;

pub type AppResult<T> = Result<T, DomainError>;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Infra(#[from] InfraError),

    #[error(transparent)]
    Password(#[from] password_hash::Error),

    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Error)]
pub enum ConfigErrorKind {
    #[error("failed to read file: {0}")]
    Read(std::io::Error),

    #[error("failed to parse file: {0}")]
    Parse(toml::de::Error),

    #[error("missing environment variable: {0}")]
    MissingEnv(String),

    #[error("invalid environment variable {0}: {1}")]
    InvalidEnv(String, String),
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("invalid configuration in {path}: {source}")]
    Config {
        path: std::path::PathBuf,
        #[source]
        source: ConfigErrorKind,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Form fields that must be present for a signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupField {
    Username,
    Password,
    ConfirmPassword,
    SessionId,
    IqScore,
}

/// Everything that can stop a signup. Validation failures are 400s, a taken
/// username is a 409 and anything else is flattened into `Internal` (500).
#[derive(Debug, Error)]
pub enum SignupError {
    #[error("missing field: {0:?}")]
    MissingField(SignupField),

    #[error("invalid username format")]
    InvalidUsername,

    #[error("username rejected by moderation")]
    ModerationRejected,

    #[error("password too short")]
    PasswordTooShort,

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("invalid iq score format")]
    InvalidIqFormat,

    #[error("iq session not found or incomplete")]
    SessionNotFound,

    #[error("iq score does not match session")]
    IqMismatch,

    #[error("username already taken")]
    UsernameTaken,

    #[error(transparent)]
    Internal(#[from] DomainError),
}

impl SignupError {
    /// HTTP status code for this failure
    pub fn status(&self) -> u16 {
        match self {
            SignupError::UsernameTaken => 409,
            SignupError::Internal(_) => 500,
            _ => 400,
        }
    }

    /// User facing message. Internal errors never leak their cause.
    pub fn message(&self) -> &'static str {
        match self {
            SignupError::MissingField(SignupField::Username) => "Username is required",
            SignupError::MissingField(SignupField::Password) => "Password is required",
            SignupError::MissingField(SignupField::ConfirmPassword) => "Password confirmation is required",
            SignupError::MissingField(SignupField::SessionId) => "IQ test session ID is missing",
            SignupError::MissingField(SignupField::IqScore) => "IQ score is missing",
            SignupError::InvalidUsername => "Invalid username format",
            SignupError::ModerationRejected => "Username contains inappropriate content",
            SignupError::PasswordTooShort => "Password must be at least 8 characters",
            SignupError::PasswordMismatch => "Passwords do not match",
            SignupError::InvalidIqFormat => "Invalid IQ score format",
            SignupError::SessionNotFound => "IQ test session not found or incomplete",
            SignupError::IqMismatch => "IQ score validation failed",
            SignupError::UsernameTaken => "Username already taken",
            SignupError::Internal(_) => "Internal server error. Please try again later.",
        }
    }

    /// Whether the submitted username is sent back with the error so the form can be refilled.
    /// Moderation rejections deliberately do not echo the name.
    pub fn echoes_username(&self) -> bool {
        !matches!(
            self,
            SignupError::MissingField(SignupField::Username)
                | SignupError::ModerationRejected
                | SignupError::Internal(_)
        )
    }
}

impl From<DbError> for SignupError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::UniqueViolation => SignupError::UsernameTaken,
            other => SignupError::Internal(DomainError::Db(other)),
        }
    }
}

impl From<password_hash::Error> for SignupError {
    fn from(e: password_hash::Error) -> Self {
        SignupError::Internal(DomainError::Password(e))
    }
}
