//! Property-valuation provider message codes.
//!
//! The valuation provider wraps every response in a message block with a
//! numeric code. `0` is success and a small set of codes mean the service
//! is temporarily down; every other code is a hard failure.

use crate::{Upstream, UpstreamError};

/// Message codes that signal a temporary outage.
pub const TRANSIENT_CODES: &[i32] = &[502, 504, 506, 507];

/// Classifies a valuation message code.
///
/// # Errors
///
/// Returns [`UpstreamError::Rejected`] for any non-zero code outside
/// [`TRANSIENT_CODES`].
pub fn check_code(code: i32, text: Option<&str>) -> Result<Upstream<()>, UpstreamError> {
    if code == 0 {
        return Ok(Upstream::Data(()));
    }
    if TRANSIENT_CODES.contains(&code) {
        log::warn!("Valuation provider temporarily unavailable: {code}");
        return Ok(Upstream::Unavailable {
            status: code.to_string(),
        });
    }
    Err(UpstreamError::Rejected {
        status: code.to_string(),
        message: text.map(String::from),
    })
}
