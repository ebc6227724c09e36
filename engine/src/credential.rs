use std::{env, fmt};

use crate::{
    API_KEY_ENV,
    error::{Error, Result},
};

/// The service API key. Never printed.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn from_env() -> Result<Self> {
        Self::from_value(env::var(API_KEY_ENV).ok())
    }

    pub fn from_value(value: Option<String>) -> Result<Self> {
        match value {
            Some(key) if !key.trim().is_empty() => Ok(Self(key.trim().to_string())),
            _ => Err(Error::MissingCredential),
        }
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}
