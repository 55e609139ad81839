//! Backend login state, kept in the OS keyring.
//!
//! `POMOFOCUS_TOKEN` takes precedence over the stored token so scripts and
//! CI can run without a keyring.

use crate::error::Result;
use crate::models::{AuthSession, User};

const SERVICE: &str = "pomofocus";
const TOKEN_KEY: &str = "api_token";
const USER_KEY: &str = "api_user";

/// Thin wrapper around the OS keyring for credential storage.
pub mod keyring_store {
    use super::SERVICE;
    use crate::error::Result;

    pub fn get(key: &str) -> Result<Option<String>> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<()> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)?;
        Ok(())
    }

    pub fn delete(key: &str) -> Result<()> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Token to send with authenticated requests, if any.
pub fn load_token() -> Result<Option<String>> {
    if let Ok(token) = std::env::var("POMOFOCUS_TOKEN") {
        if !token.is_empty() {
            return Ok(Some(token));
        }
    }
    keyring_store::get(TOKEN_KEY)
}

/// The user of the stored login, if any.
pub fn load_user() -> Result<Option<User>> {
    match keyring_store::get(USER_KEY)? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

pub fn store(auth: &AuthSession) -> Result<()> {
    keyring_store::set(TOKEN_KEY, &auth.token)?;
    keyring_store::set(USER_KEY, &serde_json::to_string(&auth.user)?)?;
    Ok(())
}

pub fn clear() -> Result<()> {
    keyring_store::delete(TOKEN_KEY)?;
    keyring_store::delete(USER_KEY)?;
    Ok(())
}
