//! Merging of the crime and collision feeds.
//!
//! Both feeds arrive from the event store already ordered by ascending
//! distance and restricted to a recency window. The merger bounds how many
//! records each feed contributes and re-ranks the union by distance. It does
//! not apply a radius; that belongs to the store query.

use std::cmp::Ordering;

use homie_proximity_models::{IncidentRecord, VEHICLE_INCIDENT_CATEGORY};

/// Records taken from each feed when the caller has no preference.
pub const DEFAULT_PER_FEED_LIMIT: usize = 5;

/// Merges the nearest `per_feed_limit` records of each feed into one list
/// sorted by ascending distance.
///
/// Every record from `collision_feed` is tagged as a vehicle incident with
/// the [`VEHICLE_INCIDENT_CATEGORY`] label, whatever it carried before.
/// The sort is stable, so equal distances keep crime records ahead of
/// collisions and each feed's own order. The result never holds more than
/// `2 * per_feed_limit` records.
#[must_use]
pub fn merge<C, V>(crime_feed: C, collision_feed: V, per_feed_limit: usize) -> Vec<IncidentRecord>
where
    C: IntoIterator<Item = IncidentRecord>,
    V: IntoIterator<Item = IncidentRecord>,
{
    let collisions = collision_feed
        .into_iter()
        .take(per_feed_limit)
        .map(|mut record| {
            record.is_vehicle_incident = true;
            VEHICLE_INCIDENT_CATEGORY.clone_into(&mut record.category);
            record
        });

    let mut merged: Vec<IncidentRecord> = crime_feed
        .into_iter()
        .take(per_feed_limit)
        .chain(collisions)
        .collect();

    // NaN distances sort last instead of poisoning the comparison.
    merged.sort_by(|a, b| {
        a.distance_miles
            .partial_cmp(&b.distance_miles)
            .unwrap_or_else(|| a.distance_miles.is_nan().cmp(&b.distance_miles.is_nan()))
    });

    log::debug!("Merged incident feed: {} records", merged.len());
    merged
}

/// Whether `feed` is ordered by non-decreasing distance, the precondition
/// both feeds must satisfy for the per-feed limit to keep the nearest
/// events.
#[must_use]
pub fn is_distance_ordered(feed: &[IncidentRecord]) -> bool {
    feed.windows(2).all(|w| {
        w[0].distance_miles
            .partial_cmp(&w[1].distance_miles)
            .is_some_and(Ordering::is_le)
    })
}
