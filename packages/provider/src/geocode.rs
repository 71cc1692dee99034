//! Geocoding response decoding.

use crate::places::{parse_location, response_status};
use crate::status::{StatusClass, classify_status};
use crate::{GeocodeResult, Upstream, UpstreamError};

/// Decodes a geocoding response for `address`, taking the first result.
///
/// # Errors
///
/// Returns [`UpstreamError::InvalidAddress`] when the geocoder found
/// nothing (or returned a result without a location), and
/// [`UpstreamError::Rejected`] for a permanent status.
pub fn decode_geocode(
    address: &str,
    body: &serde_json::Value,
) -> Result<Upstream<GeocodeResult>, UpstreamError> {
    let status = response_status(body)?;
    let invalid = || UpstreamError::InvalidAddress {
        address: address.to_string(),
    };

    match classify_status(status) {
        StatusClass::Success => {}
        StatusClass::Transient => {
            log::warn!("Geocoder unavailable: {status}");
            return Ok(Upstream::Unavailable {
                status: status.to_string(),
            });
        }
        StatusClass::Permanent => {
            return Err(UpstreamError::Rejected {
                status: status.to_string(),
                message: body["error_message"].as_str().map(String::from),
            });
        }
    }

    let first = body["results"]
        .as_array()
        .and_then(|r| r.first())
        .ok_or_else(invalid)?;
    let coordinate = parse_location(first).ok_or_else(invalid)?;

    Ok(Upstream::Data(GeocodeResult {
        coordinate,
        formatted_address: first["formatted_address"].as_str().map(String::from),
    }))
}
