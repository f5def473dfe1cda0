//! API key lookup: environment first, then the system keyring

use keyring::Entry;

use super::error::ServiceError;

const SERVICE_NAME: &str = "kasool";
const API_KEY_ENTRY: &str = "anthropic-api-key";

/// Where a resolved key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    Keyring,
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Environment => write!(f, "environment"),
            Self::Keyring => write!(f, "keyring"),
        }
    }
}

/// Manages the API key
pub struct ApiKeyManager;

impl ApiKeyManager {
    /// Find a key, checking `env_var` before the keyring
    pub fn resolve(env_var: &str) -> Result<(String, KeySource), ServiceError> {
        Self::pick(std::env::var(env_var).ok(), Self::get_stored_key)
    }

    fn pick(
        env_value: Option<String>,
        stored: impl FnOnce() -> Result<String, ServiceError>,
    ) -> Result<(String, KeySource), ServiceError> {
        if let Some(key) = env_value.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) {
            return Ok((key, KeySource::Environment));
        }
        stored().map(|key| (key, KeySource::Keyring))
    }

    fn entry() -> Result<Entry, ServiceError> {
        Entry::new(SERVICE_NAME, API_KEY_ENTRY).map_err(|e| ServiceError::Keyring(e.to_string()))
    }

    /// Key stored in the keyring
    pub fn get_stored_key() -> Result<String, ServiceError> {
        Self::entry()?.get_password().map_err(|e| match e {
            keyring::Error::NoEntry => ServiceError::MissingCredential,
            _ => ServiceError::Keyring(e.to_string()),
        })
    }

    /// Store a key in the keyring after checking its shape
    pub fn set_api_key(key: &str) -> Result<(), ServiceError> {
        let key = key.trim();
        if !Self::validate_key_format(key) {
            return Err(ServiceError::InvalidCredential);
        }

        Self::entry()?.set_password(key).map_err(|e| ServiceError::Keyring(e.to_string()))?;
        tracing::info!("Stored API key {}", Self::mask_key(key));
        Ok(())
    }

    /// Remove the stored key
    pub fn delete_api_key() -> Result<(), ServiceError> {
        Self::entry()?.delete_credential().map_err(|e| match e {
            keyring::Error::NoEntry => ServiceError::MissingCredential,
            _ => ServiceError::Keyring(e.to_string()),
        })
    }

    /// Anthropic keys start with "sk-ant-"
    pub fn validate_key_format(key: &str) -> bool {
        key.starts_with("sk-ant-") && key.len() > 20
    }

    /// Mask a key for display, keeping the first 8 and last 4 characters
    pub fn mask_key(key: &str) -> String {
        if key.len() <= 12 || !key.is_ascii() {
            return "*".repeat(key.chars().count());
        }
        format!("{}...{}", &key[..8], &key[key.len() - 4..])
    }
}
