//! Value objects: equality by value, not identity.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values
/// (`CurrencyCode("USD") == CurrencyCode("USD")`), unlike entities which are
/// compared by id.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// ISO 4217 currency code (three upper-case ASCII letters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

/// ISO 3166-1 alpha-2 country code (two upper-case ASCII letters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

fn normalize_alpha(raw: &str, len: usize, what: &str) -> Result<String, DomainError> {
    let code = raw.trim().to_ascii_uppercase();
    if code.len() != len || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(DomainError::invalid_id(format!(
            "{what} must be {len} ASCII letters, got {raw:?}"
        )));
    }
    Ok(code)
}

macro_rules! impl_alpha_code {
    ($t:ident, $len:literal, $what:literal) => {
        impl $t {
            pub fn new(raw: &str) -> Result<Self, DomainError> {
                normalize_alpha(raw, $len, $what).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ValueObject for $t {}

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(&value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }
    };
}

impl_alpha_code!(CurrencyCode, 3, "currency code");
impl_alpha_code!(CountryCode, 2, "country code");

impl CountryCode {
    /// Argentina.
    pub fn argentina() -> Self {
        Self("AR".to_string())
    }
}
