//! Nearby-search response decoding.
//!
//! Turns a nearby-search JSON body into [`Candidate`]s, keeping the
//! provider's result order. Results missing a name, type list, or location
//! are dropped rather than failing the whole response.

use homie_proximity_models::{Candidate, Coordinate};

use crate::status::{StatusClass, classify_status};
use crate::{Upstream, UpstreamError};

/// Decodes a nearby-search response body.
///
/// # Errors
///
/// Returns [`UpstreamError::Rejected`] for a permanent status or a body
/// without a `status` field.
pub fn decode_nearby(body: &serde_json::Value) -> Result<Upstream<Vec<Candidate>>, UpstreamError> {
    let status = response_status(body)?;

    match classify_status(status) {
        StatusClass::Success => {}
        StatusClass::Transient => {
            log::warn!("Places provider unavailable: {status}");
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

    let Some(results) = body["results"].as_array() else {
        return Ok(Upstream::Data(Vec::new()));
    };

    let candidates: Vec<Candidate> = results.iter().filter_map(parse_result).collect();
    if candidates.len() < results.len() {
        log::debug!(
            "Dropped {} malformed place results",
            results.len() - candidates.len()
        );
    }

    Ok(Upstream::Data(candidates))
}

/// Reads the top-level `status` string.
pub(crate) fn response_status(body: &serde_json::Value) -> Result<&str, UpstreamError> {
    body["status"]
        .as_str()
        .ok_or_else(|| UpstreamError::Rejected {
            status: "MISSING_STATUS".to_string(),
            message: Some("response has no status field".to_string()),
        })
}

/// Reads `geometry.location` as a coordinate.
pub(crate) fn parse_location(value: &serde_json::Value) -> Option<Coordinate> {
    let location = &value["geometry"]["location"];
    let lat = location["lat"].as_f64()?;
    let lng = location["lng"].as_f64()?;
    Some(Coordinate::new(lat, lng))
}

fn parse_result(value: &serde_json::Value) -> Option<Candidate> {
    let name = value["name"].as_str()?;
    let types: Vec<&str> = value["types"]
        .as_array()?
        .iter()
        .filter_map(serde_json::Value::as_str)
        .collect();
    let location = parse_location(value)?;

    Some(Candidate::new(name, types, location))
}
