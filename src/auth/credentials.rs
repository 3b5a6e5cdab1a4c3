use std::fmt;

use crate::error::{E2eError, E2eResult};
use crate::trace::event::REDACTED;

pub const USERNAME_ENV: &str = "STOREFRONT_USERNAME";
pub const PASSWORD_ENV: &str = "STOREFRONT_PASSWORD";

/// Account identity plus its secret. The secret is never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Both values must be present and non-blank.
    pub fn resolve(username: Option<String>, password: Option<String>) -> E2eResult<Self> {
        let username = username.filter(|u| !u.trim().is_empty());
        let password = password.filter(|p| !p.is_empty());
        match (username, password) {
            (Some(u), Some(p)) => Ok(Self::new(u, p)),
            (None, None) => Err(E2eError::MissingCredentials {
                missing: format!("{} and {}", USERNAME_ENV, PASSWORD_ENV),
            }),
            (None, Some(_)) => Err(E2eError::MissingCredentials {
                missing: USERNAME_ENV.into(),
            }),
            (Some(_), None) => Err(E2eError::MissingCredentials {
                missing: PASSWORD_ENV.into(),
            }),
        }
    }

    pub fn from_env() -> E2eResult<Self> {
        Self::resolve(std::env::var(USERNAME_ENV).ok(), std::env::var(PASSWORD_ENV).ok())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &REDACTED)
            .finish()
    }
}
