#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Value types for proximity ranking.
//!
//! Every record here is request-scoped: built from a provider or event-store
//! response, consumed once while assembling a report, then dropped. Nothing
//! is mutated after construction.

use chrono::{DateTime, Datelike as _, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Category label given to every collision-origin incident.
pub const VEHICLE_INCIDENT_CATEGORY: &str = "Vehicle Collision";

/// Default search radius for event-store queries, in miles.
pub const DEFAULT_RADIUS_MILES: f64 = 10.0;

/// Crimes older than this many days are outside the default recency window.
pub const CRIME_RECENCY_DAYS: i64 = 3 * 365;

/// Collisions must be newer than `current_year - COLLISION_RECENCY_YEARS`.
pub const COLLISION_RECENCY_YEARS: i32 = 3;

/// A WGS84 point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude.
    #[serde(rename = "lat")]
    pub latitude: f64,
    /// Longitude.
    #[serde(rename = "lng")]
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate. Ranges are not validated.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite numbers.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Serde adapter for coordinates stored as a legacy `[lng, lat]` pair, the
/// layout geo-indexed document stores use for 2d-sphere points.
pub mod lng_lat {
    use serde::{Deserialize as _, Deserializer, Serialize as _, Serializer};

    use crate::Coordinate;

    /// Serializes a [`Coordinate`] as `[lng, lat]`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(coord: &Coordinate, serializer: S) -> Result<S::Ok, S::Error> {
        (coord.longitude, coord.latitude).serialize(serializer)
    }

    /// Deserializes a `[lng, lat]` pair into a [`Coordinate`].
    ///
    /// # Errors
    ///
    /// Fails if the input is not a two-element numeric array.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Coordinate, D::Error> {
        let (longitude, latitude) = <(f64, f64)>::deserialize(deserializer)?;
        Ok(Coordinate::new(latitude, longitude))
    }
}

/// A raw point of interest from the nearby-places provider, not yet
/// classified or ranked.
///
/// Position within the provider's result list encodes its ranking (nearest
/// first), so candidate sequences must keep provider order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Display name.
    pub name: String,
    /// Provider-specific type tags, in provider order.
    pub raw_tags: Vec<String>,
    /// Where the place is.
    pub location: Coordinate,
}

impl Candidate {
    /// Creates a candidate from any iterable of tags.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        raw_tags: impl IntoIterator<Item = impl Into<String>>,
        location: Coordinate,
    ) -> Self {
        Self {
            name: name.into(),
            raw_tags: raw_tags.into_iter().map(Into::into).collect(),
            location,
        }
    }

    /// Whether `tag` is among the raw tags.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.raw_tags.iter().any(|t| t == tag)
    }
}

/// A ranked place as returned to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRecord {
    /// Display name.
    pub name: String,
    /// Canonical category, or the comma-joined raw tags when nothing matched.
    pub category: String,
    /// Great-circle distance from the query center.
    pub distance_miles: f64,
}

/// Which event collection an incident came from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentKind {
    /// Reported crime
    Crime,
    /// Vehicle collision
    Collision,
}

/// A crime document as returned by the geo-indexed event store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeEvent {
    /// Location as stored (`[lng, lat]`).
    #[serde(with = "lng_lat")]
    pub coord: Coordinate,
    /// Source crime subtype, e.g. `"Thefts"`.
    #[serde(rename = "type")]
    pub crime_type: String,
    /// When the crime occurred.
    pub time: DateTime<Utc>,
    /// Distance from the query center, already converted to miles. Absent
    /// on documents that have not been through a proximity query.
    #[serde(rename = "dist", default)]
    pub distance_miles: f64,
}

/// A collision document as returned by the geo-indexed event store.
///
/// Collisions are only recorded to month precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    /// Location as stored (`[lng, lat]`).
    #[serde(with = "lng_lat")]
    pub coord: Coordinate,
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
    /// Distance from the query center, already converted to miles. Absent
    /// on documents that have not been through a proximity query.
    #[serde(rename = "dist", default)]
    pub distance_miles: f64,
}

impl CollisionEvent {
    /// First instant of the collision's month, or `None` for an impossible
    /// year/month pair.
    #[must_use]
    pub fn month_start(&self) -> Option<DateTime<Utc>> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }
}

/// One entry of the merged incident feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    /// Where the incident happened.
    pub coordinate: Coordinate,
    /// Crime subtype, or [`VEHICLE_INCIDENT_CATEGORY`] for collisions.
    pub category: String,
    /// When it happened (day 1 of the month for collisions).
    pub timestamp: DateTime<Utc>,
    /// Distance from the query center.
    pub distance_miles: f64,
    /// `true` for collision-origin records.
    pub is_vehicle_incident: bool,
}

impl IncidentRecord {
    /// Builds a crime-origin record.
    #[must_use]
    pub fn from_crime(event: CrimeEvent) -> Self {
        Self {
            coordinate: event.coord,
            category: event.crime_type,
            timestamp: event.time,
            distance_miles: event.distance_miles,
            is_vehicle_incident: false,
        }
    }

    /// Builds a collision-origin record, or `None` if the event's
    /// year/month does not name a real month.
    #[must_use]
    pub fn from_collision(event: &CollisionEvent) -> Option<Self> {
        Some(Self {
            coordinate: event.coord,
            category: VEHICLE_INCIDENT_CATEGORY.to_string(),
            timestamp: event.month_start()?,
            distance_miles: event.distance_miles,
            is_vehicle_incident: true,
        })
    }

    /// Which collection this record originated from.
    #[must_use]
    pub const fn kind(&self) -> IncidentKind {
        if self.is_vehicle_incident {
            IncidentKind::Collision
        } else {
            IncidentKind::Crime
        }
    }
}

/// How far back an event-store query looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecencyWindow {
    /// Events strictly after this instant.
    Since {
        /// Exclusive lower bound.
        after: DateTime<Utc>,
    },
    /// Events whose calendar year is strictly greater than this.
    YearAfter {
        /// Exclusive lower bound.
        year: i32,
    },
}

impl RecencyWindow {
    /// Whether an event at `time` falls inside the window.
    ///
    /// A year window compares the event's calendar year.
    #[must_use]
    pub fn admits_time(&self, time: DateTime<Utc>) -> bool {
        match self {
            Self::Since { after } => time > *after,
            Self::YearAfter { year } => time.year() > *year,
        }
    }

    /// Whether an event known only to month precision falls inside the
    /// window. A `Since` window admits the month if any part of it is after
    /// the bound.
    #[must_use]
    pub fn admits_year_month(&self, year: i32, month: u32) -> bool {
        match self {
            Self::YearAfter { year: bound } => year > *bound,
            Self::Since { after } => {
                let next = if month >= 12 {
                    year.checked_add(1).map(|y| (y, 1))
                } else {
                    Some((year, month + 1))
                };
                next.and_then(|(y, m)| NaiveDate::from_ymd_opt(y, m, 1))
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .is_some_and(|end| end.and_utc() > *after)
            }
        }
    }
}

/// The shape of a proximity query an event store must answer: nearest
/// events to `center` within `max_radius_miles`, optionally restricted to
/// a recency window, ordered by ascending distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoQuery {
    /// Query center.
    pub center: Coordinate,
    /// Search radius.
    pub max_radius_miles: f64,
    /// Optional recency restriction.
    pub recency: Option<RecencyWindow>,
}

impl GeoQuery {
    /// Crime query: default radius, crimes within the last three years.
    #[must_use]
    pub fn crimes(center: Coordinate, now: DateTime<Utc>) -> Self {
        Self {
            center,
            max_radius_miles: DEFAULT_RADIUS_MILES,
            recency: Some(RecencyWindow::Since {
                after: now - Duration::days(CRIME_RECENCY_DAYS),
            }),
        }
    }

    /// Collision query: default radius, year newer than three years ago.
    #[must_use]
    pub fn collisions(center: Coordinate, now: DateTime<Utc>) -> Self {
        Self {
            center,
            max_radius_miles: DEFAULT_RADIUS_MILES,
            recency: Some(RecencyWindow::YearAfter {
                year: now.year() - COLLISION_RECENCY_YEARS,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    #[test]
    fn collision_timestamp_is_first_of_month() {
        let event = CollisionEvent {
            coord: Coordinate::new(39.95, -75.16),
            year: 2016,
            month: 7,
            distance_miles: 0.4,
        };
        let record = IncidentRecord::from_collision(&event).unwrap();
        assert_eq!(
            record.timestamp,
            Utc.with_ymd_and_hms(2016, 7, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(record.category, VEHICLE_INCIDENT_CATEGORY);
        assert!(record.is_vehicle_incident);
        assert_eq!(record.kind(), IncidentKind::Collision);
    }

    #[test]
    fn impossible_collision_month_is_dropped() {
        let event = CollisionEvent {
            coord: Coordinate::new(39.95, -75.16),
            year: 2016,
            month: 13,
            distance_miles: 0.4,
        };
        assert!(IncidentRecord::from_collision(&event).is_none());
    }

    #[test]
    fn crime_event_reads_store_document() {
        let doc = serde_json::json!({
            "coord": [-75.16, 39.95],
            "type": "Thefts",
            "time": "2017-03-04T12:00:00Z",
            "dist": 1.25
        });
        let event: CrimeEvent = serde_json::from_value(doc).unwrap();
        assert!((event.coord.latitude - 39.95).abs() < f64::EPSILON);
        assert!((event.coord.longitude - -75.16).abs() < f64::EPSILON);

        let record = IncidentRecord::from_crime(event);
        assert_eq!(record.category, "Thefts");
        assert_eq!(record.kind(), IncidentKind::Crime);
    }

    #[test]
    fn incident_record_serializes_camel_case() {
        let record = IncidentRecord {
            coordinate: Coordinate::new(1.0, 2.0),
            category: "Thefts".to_string(),
            timestamp: Utc.with_ymd_and_hms(2017, 3, 4, 0, 0, 0).unwrap(),
            distance_miles: 0.5,
            is_vehicle_incident: false,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["coordinate"]["lat"], 1.0);
        assert_eq!(value["distanceMiles"], 0.5);
        assert_eq!(value["isVehicleIncident"], false);
        assert_eq!(value["timestamp"], "2017-03-04T00:00:00Z");
    }

    #[test]
    fn crime_window_spans_three_years() {
        let now = Utc.with_ymd_and_hms(2017, 6, 1, 0, 0, 0).unwrap();
        let query = GeoQuery::crimes(Coordinate::new(0.0, 0.0), now);
        let window = query.recency.unwrap();

        assert!(window.admits_time(Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap()));
        assert!(!window.admits_time(Utc.with_ymd_and_hms(2014, 5, 1, 0, 0, 0).unwrap()));
        assert!((query.max_radius_miles - DEFAULT_RADIUS_MILES).abs() < f64::EPSILON);
    }

    #[test]
    fn collision_window_is_year_exclusive() {
        let now = Utc.with_ymd_and_hms(2017, 6, 1, 0, 0, 0).unwrap();
        let window = GeoQuery::collisions(Coordinate::new(0.0, 0.0), now)
            .recency
            .unwrap();

        assert_eq!(window, RecencyWindow::YearAfter { year: 2014 });
        assert!(window.admits_year_month(2015, 1));
        assert!(!window.admits_year_month(2014, 12));
    }

    #[test]
    fn since_window_admits_partially_covered_month() {
        let window = RecencyWindow::Since {
            after: Utc.with_ymd_and_hms(2016, 3, 15, 0, 0, 0).unwrap(),
        };
        assert!(window.admits_year_month(2016, 3));
        assert!(!window.admits_year_month(2016, 2));
        assert!(window.admits_year_month(2016, 12));
    }

    #[test]
    fn since_window_rejects_unrepresentable_years() {
        let window = RecencyWindow::Since {
            after: Utc.with_ymd_and_hms(2016, 3, 15, 0, 0, 0).unwrap(),
        };
        assert!(!window.admits_year_month(i32::MAX, 12));
        assert!(!window.admits_year_month(i32::MAX, 6));
    }

    #[test]
    fn incident_kind_strings() {
        assert_eq!(IncidentKind::Collision.as_ref(), "COLLISION");
        assert_eq!("CRIME".parse::<IncidentKind>().unwrap(), IncidentKind::Crime);
    }
}
