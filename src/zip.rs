//! Postal code handling and pre-admission validation
//!
//! A monitor is admitted in two steps: the textual format check performed by
//! [`PostalCode::parse`], then a single remote check through
//! [`GridStatusSource::validate_zip`]. Everything downstream takes a
//! [`PostalCode`], so the format is never re-checked.

use crate::error::{GridwatchError, Result};
use crate::grid::GridStatusSource;
use crate::logging::get_logger;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of digits in a German postal code
pub const ZIP_CODE_LEN: usize = 5;

/// A five digit German postal code
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostalCode(String);

impl PostalCode {
    /// Check the `^\d{5}$` format and wrap the value
    pub fn parse(raw: &str) -> Result<Self> {
        if is_valid_format(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(GridwatchError::validation(
                "zip",
                "Invalid postal code format",
            ))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Whether `raw` is exactly five ASCII digits
pub fn is_valid_format(raw: &str) -> bool {
    raw.len() == ZIP_CODE_LEN && raw.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PostalCode {
    type Err = GridwatchError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PostalCode {
    type Error = GridwatchError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<PostalCode> for String {
    fn from(value: PostalCode) -> Self {
        value.0
    }
}

/// Format-check `raw`, then confirm the remote service accepts it.
pub async fn admit(source: &dyn GridStatusSource, raw: &str) -> Result<PostalCode> {
    let logger = get_logger("zip");
    let zip = PostalCode::parse(raw).inspect_err(|_| {
        logger.warn(&format!("Rejected postal code with invalid format: {:?}", raw));
    })?;

    logger.info(&format!("Validating postal code {}", zip));
    if let Err(e) = source.validate_zip(&zip).await {
        logger.error(&format!("Postal code {} failed validation: {}", zip, e));
        return Err(e);
    }
    Ok(zip)
}
