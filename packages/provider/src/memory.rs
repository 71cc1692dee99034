//! In-memory collaborators.
//!
//! [`MemoryPlaces`] and [`MemoryEventStore`] answer queries over a fixed set
//! of records with the same ordering and filtering guarantees as the real
//! provider and store: nearest first, radius-bounded, recency-filtered. The
//! CLI uses them to run the engine over exported JSON, and tests use them as
//! fakes.

use std::path::Path;

use async_trait::async_trait;
use homie_proximity::distance::distance;
use homie_proximity_models::{Candidate, CollisionEvent, Coordinate, CrimeEvent, GeoQuery};

use crate::places::decode_nearby;
use crate::{EventStore, PlacesProvider, PlacesQuery, Upstream, UpstreamError};

/// A places provider backed by a list of candidates.
#[derive(Debug, Clone, Default)]
pub struct MemoryPlaces {
    places: Vec<Candidate>,
}

impl MemoryPlaces {
    /// Wraps `places`.
    #[must_use]
    pub const fn new(places: Vec<Candidate>) -> Self {
        Self { places }
    }

    /// Reads either a JSON array of candidates or a recorded nearby-search
    /// response. A recorded response with a transient status yields no
    /// places.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the file cannot be read or parsed, or if
    /// a recorded response carries a permanent failure status.
    pub fn from_json_file(path: &Path) -> Result<Self, UpstreamError> {
        let contents = std::fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&contents)?;
        if value.is_array() {
            return Ok(Self::new(serde_json::from_value(value)?));
        }
        let places = decode_nearby(&value)?.data().unwrap_or_default();
        Ok(Self::new(places))
    }
}

#[async_trait]
impl PlacesProvider for MemoryPlaces {
    async fn search(&self, query: &PlacesQuery) -> Result<Upstream<Vec<Candidate>>, UpstreamError> {
        let types: Vec<&str> = query.types().collect();
        let mut matches: Vec<(f64, &Candidate)> = self
            .places
            .iter()
            .filter(|c| types.iter().any(|t| c.has_tag(t)))
            .map(|c| (distance(query.center, c.location), c))
            .collect();

        matches.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(Upstream::Data(
            matches.into_iter().map(|(_, c)| c.clone()).collect(),
        ))
    }
}

/// An event store backed by in-memory crime and collision documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventStore {
    crimes: Vec<CrimeEvent>,
    collisions: Vec<CollisionEvent>,
}

impl MemoryEventStore {
    /// Wraps the two collections.
    #[must_use]
    pub const fn new(crimes: Vec<CrimeEvent>, collisions: Vec<CollisionEvent>) -> Self {
        Self { crimes, collisions }
    }

    /// Reads the two collections from JSON arrays of store documents.
    /// A missing path means an empty collection.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if a file cannot be read or parsed.
    pub fn from_json_files(
        crimes: Option<&Path>,
        collisions: Option<&Path>,
    ) -> Result<Self, UpstreamError> {
        Ok(Self::new(read_json_array(crimes)?, read_json_array(collisions)?))
    }
}

fn read_json_array<T: serde::de::DeserializeOwned>(
    path: Option<&Path>,
) -> Result<Vec<T>, UpstreamError> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Keeps events within the query radius, stamps their distance, and orders
/// them nearest first (stable for ties).
fn nearest<T: Clone>(
    events: &[T],
    query: &GeoQuery,
    coord: impl Fn(&T) -> Coordinate,
    in_window: impl Fn(&T) -> bool,
    set_distance: impl Fn(&mut T, f64),
) -> Vec<T> {
    let mut hits: Vec<(f64, T)> = events
        .iter()
        .filter(|e| in_window(e))
        .filter_map(|e| {
            let d = distance(query.center, coord(e));
            (d <= query.max_radius_miles).then(|| (d, e.clone()))
        })
        .collect();
    hits.sort_by(|a, b| a.0.total_cmp(&b.0));

    hits.into_iter()
        .map(|(d, mut event)| {
            set_distance(&mut event, d);
            event
        })
        .collect()
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn crimes(&self, query: &GeoQuery) -> Result<Vec<CrimeEvent>, UpstreamError> {
        Ok(nearest(
            &self.crimes,
            query,
            |e| e.coord,
            |e| query.recency.is_none_or(|w| w.admits_time(e.time)),
            |e, d| e.distance_miles = d,
        ))
    }

    async fn collisions(&self, query: &GeoQuery) -> Result<Vec<CollisionEvent>, UpstreamError> {
        Ok(nearest(
            &self.collisions,
            query,
            |e| e.coord,
            |e| {
                query
                    .recency
                    .is_none_or(|w| w.admits_year_month(e.year, e.month))
            },
            |e, d| e.distance_miles = d,
        ))
    }
}
