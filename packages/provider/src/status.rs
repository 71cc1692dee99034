//! Provider response status classification.
//!
//! Places and geocoding responses carry a top-level `status` string. Each
//! status falls into one of three buckets:
//!
//! | Status | Outcome |
//! |--------|---------|
//! | `OK` | data |
//! | `ZERO_RESULTS` | data (empty) |
//! | `OVER_QUERY_LIMIT`, `UNKNOWN_ERROR` | [`Upstream::Unavailable`](crate::Upstream::Unavailable) |
//! | anything else | [`UpstreamError::Rejected`](crate::UpstreamError::Rejected) |

use strum_macros::{AsRefStr, Display, EnumString};

/// Top-level status of a places or geocoding response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderStatus {
    /// At least one result.
    Ok,
    /// Valid request, nothing matched.
    ZeroResults,
    /// Quota exhausted for now.
    OverQueryLimit,
    /// Server-side failure; retrying may succeed.
    UnknownError,
    /// Key missing, invalid, or not authorized.
    RequestDenied,
    /// Malformed request parameters.
    InvalidRequest,
    /// A referenced location or place id does not exist.
    NotFound,
}

/// What a status means for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Results (possibly none) are present.
    Success,
    /// The provider is temporarily unable to answer.
    Transient,
    /// The request will not succeed as made.
    Permanent,
}

impl ProviderStatus {
    /// Buckets this status.
    #[must_use]
    pub const fn class(self) -> StatusClass {
        match self {
            Self::Ok | Self::ZeroResults => StatusClass::Success,
            Self::OverQueryLimit | Self::UnknownError => StatusClass::Transient,
            Self::RequestDenied | Self::InvalidRequest | Self::NotFound => StatusClass::Permanent,
        }
    }
}

/// Classifies a raw status string. Statuses this crate does not know are
/// permanent.
#[must_use]
pub fn classify_status(raw: &str) -> StatusClass {
    raw.parse::<ProviderStatus>()
        .map_or(StatusClass::Permanent, ProviderStatus::class)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_strings() {
        assert_eq!(
            "ZERO_RESULTS".parse::<ProviderStatus>().unwrap(),
            ProviderStatus::ZeroResults
        );
        assert_eq!(ProviderStatus::OverQueryLimit.as_ref(), "OVER_QUERY_LIMIT");
        assert_eq!(ProviderStatus::Ok.to_string(), "OK");
    }

    #[test]
    fn buckets() {
        assert_eq!(classify_status("OK"), StatusClass::Success);
        assert_eq!(classify_status("ZERO_RESULTS"), StatusClass::Success);
        assert_eq!(classify_status("OVER_QUERY_LIMIT"), StatusClass::Transient);
        assert_eq!(classify_status("UNKNOWN_ERROR"), StatusClass::Transient);
        assert_eq!(classify_status("REQUEST_DENIED"), StatusClass::Permanent);
        assert_eq!(classify_status("INVALID_REQUEST"), StatusClass::Permanent);
        assert_eq!(classify_status("SOMETHING_NEW"), StatusClass::Permanent);
    }
}
