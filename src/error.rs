use thiserror::Error;

/// Broad failure classes used when reporting a scenario outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing credentials, base URL or unreadable config.
    Configuration,
    /// A condition never held within its bound.
    Synchronization,
    /// A value was present but wrong.
    Assertion,
    /// HTTP API returned an unusable answer.
    Remote,
    /// The browser automation process misbehaved.
    Collaborator,
    /// The page under test raised uncaught errors.
    Application,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Configuration => "ConfigurationError",
            ErrorCategory::Synchronization => "SynchronizationTimeout",
            ErrorCategory::Assertion => "AssertionMismatch",
            ErrorCategory::Remote => "RemoteCallFailure",
            ErrorCategory::Collaborator => "CollaboratorFailure",
            ErrorCategory::Application => "ApplicationError",
        }
    }
}

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing credentials: {missing} (set STOREFRONT_USERNAME/STOREFRONT_PASSWORD)")]
    MissingCredentials { missing: String },

    #[error("Timed out after {waited_ms} ms waiting for {condition} (last seen: {last_seen})")]
    Timeout {
        condition: String,
        last_seen: String,
        waited_ms: u128,
    },

    #[error("Assertion failed for {subject}: expected {expected:?}, actual {actual:?}")]
    Assertion {
        subject: String,
        expected: String,
        actual: String,
    },

    #[error("Remote call failed (status {status}): {detail}")]
    Remote { status: u16, detail: String },

    #[error("API returned no product for SKU '{sku}'")]
    NoProduct { sku: String },

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Uncaught page error(s): {}", .0.join("; "))]
    PageErrors(Vec<String>),

    #[error("Browser command '{command}' failed: {error}")]
    Driver { command: String, error: String },

    #[error("Browser session I/O: {0}")]
    SessionIo(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;

impl E2eError {
    /// Build an assertion mismatch from anything displayable.
    pub fn mismatch(
        subject: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        E2eError::Assertion {
            subject: subject.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn driver(command: &str, error: impl Into<String>) -> Self {
        E2eError::Driver {
            command: command.to_string(),
            error: error.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            E2eError::Config(_) | E2eError::MissingCredentials { .. } | E2eError::Yaml(_) => {
                ErrorCategory::Configuration
            }
            E2eError::Timeout { .. } => ErrorCategory::Synchronization,
            E2eError::Assertion { .. } | E2eError::LoginFailed(_) => ErrorCategory::Assertion,
            E2eError::Remote { .. } | E2eError::NoProduct { .. } | E2eError::Http(_) => {
                ErrorCategory::Remote
            }
            E2eError::PageErrors(_) => ErrorCategory::Application,
            E2eError::Driver { .. } | E2eError::SessionIo(_) | E2eError::Json(_) | E2eError::Io(_) => {
                ErrorCategory::Collaborator
            }
        }
    }
}
