//! Query documents for a geo-indexed document store.
//!
//! An [`EventStore`](crate::EventStore) backed by a document database answers
//! a [`GeoQuery`] with a single `$geoNear` aggregation stage over legacy
//! `[lng, lat]` points. The stage's `maxDistance` is a central angle, and
//! `distanceMultiplier` turns the returned angle back into miles, so the
//! `dist` field on each document is already in miles. Time bounds are
//! extended-JSON `$date` values so they compare against stored dates.

use homie_proximity::distance::{EARTH_RADIUS_MILES, miles_to_radians};
use homie_proximity_models::{GeoQuery, RecencyWindow};
use serde_json::{Value, json};

/// Field the store writes each document's distance into.
pub const DISTANCE_FIELD: &str = "dist";

/// Builds the aggregation pipeline for `query`.
#[must_use]
pub fn geo_near_pipeline(query: &GeoQuery) -> Value {
    let mut stage = json!({
        "near": [query.center.longitude, query.center.latitude],
        "spherical": true,
        "maxDistance": miles_to_radians(query.max_radius_miles),
        "distanceField": DISTANCE_FIELD,
        "distanceMultiplier": EARTH_RADIUS_MILES,
    });
    if let Some(window) = &query.recency {
        stage["query"] = recency_filter(window);
    }

    json!([{ "$geoNear": stage }])
}

fn recency_filter(window: &RecencyWindow) -> Value {
    match window {
        RecencyWindow::Since { after } => {
            json!({ "time": { "$gt": { "$date": after.to_rfc3339() } } })
        }
        RecencyWindow::YearAfter { year } => json!({ "year": { "$gt": year } }),
    }
}
