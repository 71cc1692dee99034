#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Neighborhood report assembly.
//!
//! A report is everything shown for one address: one ranked place list per
//! configured domain plus the merged incident feed. [`assemble`] fetches
//! from the collaborators (one places search per domain and both event
//! collections, all concurrently, with at most
//! [`ReportOptions::max_in_flight`] places searches outstanding) and hands
//! the results to [`build_report`], which is pure.

use chrono::{DateTime, Utc};
use futures::StreamExt as _;
use homie_proximity::merge::{DEFAULT_PER_FEED_LIMIT, is_distance_ordered};
use homie_proximity::{CategoryCapTable, DomainConfig, merge, rank_domain};
use homie_proximity_models::{
    Candidate, CollisionEvent, Coordinate, CrimeEvent, GeoQuery, IncidentRecord, PlaceRecord,
};
use homie_provider::{EventStore, Geocoder, PlacesProvider, PlacesQuery, Upstream, UpstreamError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that fail a whole report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A collaborator failed permanently.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The geocoder is temporarily down, so there is no center to report on.
    #[error("Geocoder unavailable: {status}")]
    GeocoderUnavailable {
        /// Status the geocoder reported.
        status: String,
    },
}

/// Knobs for [`assemble`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Records taken from each incident feed before merging.
    pub per_feed_limit: usize,
    /// Maximum concurrent places searches.
    pub max_in_flight: usize,
    /// Reference time for recency windows. `None` means now.
    pub now: Option<DateTime<Utc>>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            per_feed_limit: DEFAULT_PER_FEED_LIMIT,
            max_in_flight: 4,
            now: None,
        }
    }
}

/// One domain's ranked places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainSection {
    /// Domain id.
    pub id: String,
    /// Human-readable domain name.
    pub name: String,
    /// Ranked, capped places.
    pub places: Vec<PlaceRecord>,
}

/// Everything shown for one address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeighborhoodReport {
    /// The geocoded center.
    pub center: Coordinate,
    /// One section per configured domain, in table order.
    pub domains: Vec<DomainSection>,
    /// Ids of domains whose provider was temporarily unavailable. Their
    /// sections are present but empty.
    pub unavailable: Vec<String>,
    /// Merged crime and collision feed, nearest first.
    pub incidents: Vec<IncidentRecord>,
}

impl NeighborhoodReport {
    /// Looks up a domain section by id.
    #[must_use]
    pub fn section(&self, id: &str) -> Option<&DomainSection> {
        self.domains.iter().find(|s| s.id == id)
    }
}

/// Builds a report from already-fetched collaborator results.
///
/// `domain_results` pairs each domain with its places search outcome.
/// Collision documents with an impossible month are dropped.
#[must_use]
pub fn build_report(
    center: Coordinate,
    domain_results: Vec<(&DomainConfig, Upstream<Vec<Candidate>>)>,
    crimes: Vec<CrimeEvent>,
    collisions: &[CollisionEvent],
    per_feed_limit: usize,
) -> NeighborhoodReport {
    let mut domains = Vec::with_capacity(domain_results.len());
    let mut unavailable = Vec::new();

    for (domain, outcome) in domain_results {
        let places = match outcome {
            Upstream::Data(candidates) => rank_domain(center, &candidates, domain),
            Upstream::Unavailable { status } => {
                log::warn!("[{}] places unavailable ({status})", domain.id);
                unavailable.push(domain.id.clone());
                Vec::new()
            }
        };
        domains.push(DomainSection {
            id: domain.id.clone(),
            name: domain.name.clone(),
            places,
        });
    }

    let collision_records: Vec<IncidentRecord> = collisions
        .iter()
        .filter_map(|event| {
            let record = IncidentRecord::from_collision(event);
            if record.is_none() {
                log::debug!(
                    "Dropping collision with invalid date {}-{}",
                    event.year,
                    event.month
                );
            }
            record
        })
        .collect();

    let crime_records: Vec<IncidentRecord> =
        crimes.into_iter().map(IncidentRecord::from_crime).collect();
    for (feed, records) in [("crime", &crime_records), ("collision", &collision_records)] {
        if !is_distance_ordered(records) {
            log::warn!("{feed} feed is not nearest-first; per-feed limit may drop nearer events");
        }
    }

    let incidents = merge(crime_records, collision_records, per_feed_limit);

    NeighborhoodReport {
        center,
        domains,
        unavailable,
        incidents,
    }
}

/// Fetches everything for `center` and builds the report.
///
/// A domain whose provider is temporarily unavailable yields an empty
/// section and is listed in [`NeighborhoodReport::unavailable`].
///
/// # Errors
///
/// Returns [`ReportError::Upstream`] if any collaborator fails
/// permanently.
pub async fn assemble(
    center: Coordinate,
    table: &CategoryCapTable,
    places: &dyn PlacesProvider,
    store: &dyn EventStore,
    options: ReportOptions,
) -> Result<NeighborhoodReport, ReportError> {
    let now = options.now.unwrap_or_else(Utc::now);
    let crime_query = GeoQuery::crimes(center, now);
    let collision_query = GeoQuery::collisions(center, now);

    log::info!(
        "Assembling report for {},{} across {} domains",
        center.latitude,
        center.longitude,
        table.domains().len()
    );

    let searches = futures::stream::iter(table.domains())
        .map(|domain| async move {
            let query = PlacesQuery::nearest(center, domain.filter.as_str());
            places.search(&query).await.map(|outcome| (domain, outcome))
        })
        .buffered(options.max_in_flight.max(1))
        .collect::<Vec<_>>();

    let events = futures::future::try_join(
        store.crimes(&crime_query),
        store.collisions(&collision_query),
    );

    let (searches, events) = futures::future::join(searches, events).await;
    let domain_results = searches.into_iter().collect::<Result<Vec<_>, _>>()?;
    let (crimes, collisions) = events?;

    Ok(build_report(
        center,
        domain_results,
        crimes,
        &collisions,
        options.per_feed_limit,
    ))
}

/// Geocodes `address` and assembles its report.
///
/// # Errors
///
/// Returns [`UpstreamError::InvalidAddress`] (wrapped) when the address
/// cannot be resolved, [`ReportError::GeocoderUnavailable`] when the
/// geocoder is down, and anything [`assemble`] returns.
pub async fn assemble_for_address(
    address: &str,
    geocoder: &dyn Geocoder,
    table: &CategoryCapTable,
    places: &dyn PlacesProvider,
    store: &dyn EventStore,
    options: ReportOptions,
) -> Result<NeighborhoodReport, ReportError> {
    let center = match geocoder.geocode(address).await? {
        Upstream::Data(result) => result.coordinate,
        Upstream::Unavailable { status } => {
            return Err(ReportError::GeocoderUnavailable { status });
        }
    };
    assemble(center, table, places, store, options).await
}
