//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the contract
//! service, so request handling never reads process-wide environment variables.

use crate::constants::{CREATE_ACCREDITATION, DEFAULT_UTC_OFFSET_SECONDS, MAX_ACCREDITATION};
use crate::error::{ContractingError, ContractingResult};
use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    timezone: FixedOffset,
    create_accreditation: u8,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(timezone: FixedOffset, create_accreditation: u8) -> ContractingResult<Self> {
        if !(1..=MAX_ACCREDITATION).contains(&create_accreditation) {
            return Err(ContractingError::InvalidInput(format!(
                "create accreditation must be between 1 and {MAX_ACCREDITATION}, got {create_accreditation}"
            )));
        }

        Ok(Self {
            timezone,
            create_accreditation,
        })
    }

    pub fn timezone(&self) -> FixedOffset {
        self.timezone
    }

    pub fn create_accreditation(&self) -> u8 {
        self.create_accreditation
    }

    /// Current time in the configured offset.
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.timezone)
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            create_accreditation: CREATE_ACCREDITATION,
        }
    }
}

fn default_timezone() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECONDS).unwrap_or_else(utc_offset)
}

/// Parse a UTC offset from an optional string value.
///
/// Accepts `Z`, `UTC`, `+HH`, `+HHMM` and `+HH:MM` (and the `-` forms). If `value` is `None` or
/// empty/whitespace, returns the default offset.
pub fn timezone_from_env_value(value: Option<String>) -> ContractingResult<FixedOffset> {
    let Some(value) = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
    else {
        return Ok(default_timezone());
    };

    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return Ok(utc_offset());
    }

    let invalid = || ContractingError::InvalidInput(format!("invalid UTC offset: {value}"));

    let (sign, rest) = if let Some(rest) = value.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = value.strip_prefix('-') {
        (-1, rest)
    } else {
        return Err(invalid());
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) || !matches!(digits.len(), 2 | 4) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = if digits.len() == 4 {
        digits[2..].parse().map_err(|_| invalid())?
    } else {
        0
    };
    if minutes >= 60 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Parse the create accreditation level from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`CREATE_ACCREDITATION`].
pub fn accreditation_from_env_value(value: Option<String>) -> ContractingResult<u8> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value
        .map(|v| {
            v.parse::<u8>().map_err(|_| {
                ContractingError::InvalidInput(format!("invalid accreditation level: {v}"))
            })
        })
        .transpose()?;

    Ok(parsed.unwrap_or(CREATE_ACCREDITATION))
}
