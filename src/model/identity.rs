use std::fmt::Display;
use std::str::FromStr;

use data_encoding::HEXLOWER;
use hmac::{Hmac, Mac};
use rocket::request::FromParam;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

pub type HmacSha256 = Hmac<Sha256>;

/// Number of digits in a national-ID identifier.
pub const LENGTH: usize = 12;

/// How many trailing digits remain visible when an identifier is displayed.
const VISIBLE_SUFFIX: usize = 4;

/// A voter's national-ID number: exactly [`LENGTH`] ASCII digits.
///
/// This is the primary key for eligibility, vote-uniqueness, and lockout.
/// The `Display` impl masks all but the last four digits, so formatting an
/// identifier into a log line or error message never leaks the full number;
/// use [`Identifier::as_str`] where the raw value is genuinely needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// The full, unmasked identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier with everything but the last four digits masked.
    pub fn masked(&self) -> String {
        format!(
            "{}{}",
            "*".repeat(LENGTH - VISIBLE_SUFFIX),
            &self.0[LENGTH - VISIBLE_SUFFIX..]
        )
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.masked())
    }
}

impl FromStr for Identifier {
    type Err = ParseError;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let len = string.chars().count();
        if len != LENGTH {
            return Err(ParseError::InvalidLength(len));
        }
        if let Some(c) = string.chars().find(|c| !c.is_ascii_digit()) {
            return Err(ParseError::InvalidChar(c));
        }
        Ok(Self(string.to_string()))
    }
}

impl TryFrom<String> for Identifier {
    type Error = ParseError;

    fn try_from(string: String) -> Result<Self, Self::Error> {
        string.parse()
    }
}

impl From<Identifier> for String {
    fn from(identifier: Identifier) -> Self {
        identifier.0
    }
}

impl<'r> FromParam<'r> for Identifier {
    type Error = ParseError;

    fn from_param(param: &'r str) -> Result<Self, Self::Error> {
        param.parse()
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("identifier must contain exactly {LENGTH} characters, got {0}")]
    InvalidLength(usize),
    #[error("identifier must contain only digits, found '{0}'")]
    InvalidChar(char),
}

/// A keyed pseudonym for an identifier: hex-encoded HMAC-SHA256.
///
/// Used wherever an identifier must be stored or shown without revealing the
/// raw number, e.g. as the owner tag on biometric gallery entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdDigest(String);

impl IdDigest {
    pub fn new(identifier: &Identifier, key: &[u8]) -> Self {
        let mut mac =
            HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
        mac.update(identifier.as_str().as_bytes());
        Self(HEXLOWER.encode(&mac.finalize().into_bytes()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for IdDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
