//! Credential handling using the secrecy crate
//!
//! API keys for PurpleAir, Eagle.io and AQS are held as [`SecretString`]:
//! zeroized on drop, redacted in `Debug` output, and only readable through
//! `expose_secret()`. Credentials are passed explicitly with each request; there
//! is no process-wide key.
//!
//! # Example
//!
//! ```rust
//! use lavendair::config::{secret_string, SecretString};
//! use secrecy::ExposeSecret;
//!
//! let key: SecretString = secret_string("purpleair-read-key".to_string());
//! assert_eq!(key.expose_secret().as_ref(), "purpleair-read-key");
//! println!("{:?}", key); // Secret([REDACTED ...])
//! ```

use secrecy::{CloneableSecret, DebugSecret, ExposeSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// String wrapper implementing the traits `Secret` needs
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// A zeroizing, redacted secret string
pub type SecretString = Secret<SecretValue>;

/// Wraps a plain string as a [`SecretString`]
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

/// Reads a secret from an environment variable
///
/// Returns `None` if the variable is unset or blank. Schedules store only the
/// variable name, and this resolves it at run time.
pub fn secret_from_env(var: &str) -> Option<SecretString> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(secret_string)
}

/// True if the secret is absent or blank
pub fn is_blank(secret: Option<&SecretString>) -> bool {
    secret.map(|s| s.expose_secret().is_empty()).unwrap_or(true)
}
