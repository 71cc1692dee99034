#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Collaborator contracts for the proximity engine.
//!
//! The engine never talks to the network. It consumes what three external
//! collaborators return:
//!
//! 1. **Geocoder** ([`Geocoder`]): resolves an address to a coordinate.
//! 2. **Nearby-places provider** ([`PlacesProvider`]): candidates near a
//!    point for a category filter, nearest first.
//! 3. **Geo-indexed event store** ([`EventStore`]): crime and collision
//!    documents within a radius and recency window, nearest first.
//!
//! Provider responses are decoded by [`places`] and [`geocode`], whose
//! status strings are classified by [`status`]. [`valuation`] classifies the
//! property-valuation provider's message codes. [`store`] builds the
//! aggregation a document-store-backed [`EventStore`] runs. [`memory`] holds in-memory
//! implementations that honor the same contracts for offline runs and tests.

pub mod geocode;
pub mod memory;
pub mod places;
pub mod status;
pub mod store;
pub mod valuation;

use async_trait::async_trait;
use homie_proximity_models::{Candidate, CollisionEvent, Coordinate, CrimeEvent, GeoQuery};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from collaborator calls that must not be swallowed.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The provider refused the request with a non-transient status.
    #[error("Upstream rejected request: {status}")]
    Rejected {
        /// Provider status string or code.
        status: String,
        /// Provider-supplied detail, if any.
        message: Option<String>,
    },

    /// The address could not be geocoded.
    #[error("Invalid address: {address}")]
    InvalidAddress {
        /// The address as given.
        address: String,
    },

    /// The response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading a local data file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of a collaborator call that succeeded at the protocol level.
///
/// A transient outage is a value, not an error, so callers can degrade to
/// an empty section instead of failing the whole request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upstream<T> {
    /// The provider answered. An empty collection is a normal answer.
    Data(T),
    /// The provider is temporarily unable to answer.
    Unavailable {
        /// Provider status string or code that signalled the outage.
        status: String,
    },
}

impl<T> Upstream<T> {
    /// Returns the data, or `None` if the provider was unavailable.
    #[must_use]
    pub fn data(self) -> Option<T> {
        match self {
            Self::Data(data) => Some(data),
            Self::Unavailable { .. } => None,
        }
    }

    /// Whether the provider was unavailable.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    /// Maps the contained data.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Upstream<U> {
        match self {
            Self::Data(data) => Upstream::Data(f(data)),
            Self::Unavailable { status } => Upstream::Unavailable { status },
        }
    }
}

/// A nearby-places search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacesQuery {
    /// Search center.
    pub center: Coordinate,
    /// `|`-separated provider types.
    pub filter: String,
}

impl PlacesQuery {
    /// A distance-ranked query for `filter` around `center`.
    #[must_use]
    pub fn nearest(center: Coordinate, filter: impl Into<String>) -> Self {
        Self {
            center,
            filter: filter.into(),
        }
    }

    /// The provider types in the filter.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.filter.split('|').map(str::trim).filter(|t| !t.is_empty())
    }
}

/// A resolved address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResult {
    /// Resolved point.
    pub coordinate: Coordinate,
    /// Canonical address string returned by the geocoder.
    pub formatted_address: Option<String>,
}

/// Resolves free-form addresses to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Geocodes `address`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::InvalidAddress`] when nothing matches and
    /// [`UpstreamError::Rejected`] for non-transient provider failures.
    async fn geocode(&self, address: &str) -> Result<Upstream<GeocodeResult>, UpstreamError>;
}

/// Searches for places near a point.
#[async_trait]
pub trait PlacesProvider: Send + Sync {
    /// Returns candidates matching the query, in the query's rank order.
    /// No matches is `Upstream::Data(vec![])`, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Rejected`] for non-transient failures.
    async fn search(&self, query: &PlacesQuery) -> Result<Upstream<Vec<Candidate>>, UpstreamError>;
}

/// Geo-indexed crime and collision collections.
///
/// Both methods return events within `query.max_radius_miles` of
/// `query.center` that fall inside `query.recency`, nearest first, with
/// `distance_miles` filled in.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Crimes near the query center.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the store cannot be queried.
    async fn crimes(&self, query: &GeoQuery) -> Result<Vec<CrimeEvent>, UpstreamError>;

    /// Collisions near the query center.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the store cannot be queried.
    async fn collisions(&self, query: &GeoQuery) -> Result<Vec<CollisionEvent>, UpstreamError>;
}
