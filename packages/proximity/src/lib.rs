#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Proximity aggregation engine.
//!
//! Turns already-fetched provider and event-store results into bounded,
//! ranked records for display:
//!
//! - [`distance`]: haversine distance in miles.
//! - [`classify`]: maps a raw tag set to one canonical category using an
//!   ordered priority table.
//! - [`rank`]: applies per-category quotas, optional name deduplication,
//!   and distance annotation while keeping provider order.
//! - [`merge`]: combines the crime and collision feeds into one
//!   distance-sorted feed under a count cap.
//! - [`domain`]: the category cap table, loaded from TOML.
//!
//! Everything here is synchronous and pure. Callers can share a
//! [`domain::CategoryCapTable`] across threads and call into the engine from
//! any number of concurrent requests.

pub mod classify;
pub mod distance;
pub mod domain;
pub mod merge;
pub mod rank;

pub use classify::classify;
pub use distance::distance;
pub use domain::{CategoryCapTable, DomainConfig, DomainConfigError, PriorityEntry};
pub use merge::merge;
pub use rank::{rank, rank_domain};
