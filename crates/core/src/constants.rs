//! Constants used throughout the contracting core crate.

/// Broker accreditation level required to create contracts.
pub const CREATE_ACCREDITATION: u8 = 3;

/// Highest broker accreditation level.
pub const MAX_ACCREDITATION: u8 = 5;

/// Offset applied to "now" when none is configured (Kyiv, standard time).
pub const DEFAULT_UTC_OFFSET_SECONDS: i32 = 2 * 3600;

/// Environment variable holding the UTC offset, e.g. `+03:00`.
pub const TZ_ENV: &str = "CONTRACTING_TZ";

/// Environment variable holding the accreditation level required to create contracts.
pub const CREATE_ACCREDITATION_ENV: &str = "CONTRACTING_CREATE_ACCREDITATION";

/// Principal every requester carries.
pub const EVERYONE: &str = "system.Everyone";

/// Principal of every logged-in requester.
pub const AUTHENTICATED: &str = "system.Authenticated";

/// Prefix of group principals.
pub const GROUP_PREFIX: &str = "g:";
