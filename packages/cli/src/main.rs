#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Runs the proximity engine over exported JSON files.
//!
//! ```text
//! homie domains
//! homie classify --domain emergency hospital clinic
//! homie rank --domain transportation --center 39.95,-75.16 --places places.json --quota 2
//! homie incidents --center 39.95,-75.16 --crimes crimes.json --collisions collisions.json
//! homie report --center 39.95,-75.16 --places places.json --crimes crimes.json
//! homie pipeline --center 39.95,-75.16
//! ```
//!
//! `--places` takes either a JSON array of candidates or a recorded
//! nearby-search response.
//!
//! `--domains <file>` swaps the embedded category cap table for a TOML file
//! with a `[[domains]]` array. Output is pretty-printed JSON on stdout.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use homie_proximity::merge::DEFAULT_PER_FEED_LIMIT;
use homie_proximity::{CategoryCapTable, DomainConfig, classify, merge, rank_domain};
use homie_proximity_models::{Coordinate, GeoQuery, IncidentRecord};
use homie_provider::memory::{MemoryEventStore, MemoryPlaces};
use homie_provider::store::geo_near_pipeline;
use homie_provider::{EventStore as _, PlacesProvider as _, PlacesQuery};
use homie_report::{ReportOptions, assemble};

#[derive(Parser)]
#[command(name = "homie", about = "Neighborhood proximity engine")]
struct Cli {
    /// Domain table TOML file (defaults to the built-in table)
    #[arg(long, global = true)]
    domains: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the configured domains
    Domains,
    /// Classify a tag set within a domain
    Classify {
        /// Domain id
        #[arg(long)]
        domain: String,
        /// Raw provider tags
        tags: Vec<String>,
    },
    /// Rank nearby places for one domain
    Rank {
        /// Domain id
        #[arg(long)]
        domain: String,
        #[command(flatten)]
        center: CenterArg,
        /// Candidate places: a JSON array or a recorded nearby-search response
        #[arg(long)]
        places: PathBuf,
        /// Override the domain's per-category quota
        #[arg(long)]
        quota: Option<usize>,
        /// Override how many leading provider results are considered
        #[arg(long)]
        max_candidates: Option<usize>,
    },
    /// Merge nearby crimes and collisions into one feed
    Incidents {
        #[command(flatten)]
        center: CenterArg,
        #[command(flatten)]
        events: EventArgs,
    },
    /// Print the event-store aggregations for a center
    Pipeline {
        #[command(flatten)]
        center: CenterArg,
        /// Reference time for recency windows (RFC 3339, defaults to now)
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// Build a full neighborhood report
    Report {
        #[command(flatten)]
        center: CenterArg,
        /// Candidate places: a JSON array or a recorded nearby-search response
        #[arg(long)]
        places: Option<PathBuf>,
        #[command(flatten)]
        events: EventArgs,
        /// Maximum concurrent places searches
        #[arg(long, default_value_t = ReportOptions::default().max_in_flight)]
        max_in_flight: usize,
    },
}

#[derive(Args)]
struct CenterArg {
    /// Query center as `lat,lng`
    #[arg(long, value_parser = parse_center, allow_hyphen_values = true)]
    center: Coordinate,
}

#[derive(Args)]
struct EventArgs {
    /// JSON array of crime documents
    #[arg(long)]
    crimes: Option<PathBuf>,
    /// JSON array of collision documents
    #[arg(long)]
    collisions: Option<PathBuf>,
    /// Records taken from each feed
    #[arg(long, default_value_t = DEFAULT_PER_FEED_LIMIT)]
    per_feed_limit: usize,
    /// Reference time for recency windows (RFC 3339, defaults to now)
    #[arg(long)]
    now: Option<DateTime<Utc>>,
}

impl EventArgs {
    fn store(&self) -> Result<MemoryEventStore, homie_provider::UpstreamError> {
        MemoryEventStore::from_json_files(self.crimes.as_deref(), self.collisions.as_deref())
    }
}

fn parse_center(value: &str) -> Result<Coordinate, String> {
    let (lat, lng) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `lat,lng`, got `{value}`"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("bad latitude `{lat}`: {e}"))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|e| format!("bad longitude `{lng}`: {e}"))?;

    let center = Coordinate::new(lat, lng);
    if !center.is_finite() || lat.abs() > 90.0 || lng.abs() > 180.0 {
        return Err(format!("coordinate out of range: `{value}`"));
    }
    Ok(center)
}

fn find_domain<'a>(
    table: &'a CategoryCapTable,
    id: &str,
) -> Result<&'a DomainConfig, Box<dyn std::error::Error>> {
    table.get(id).ok_or_else(|| {
        let known: Vec<&str> = table.ids().collect();
        format!("Unknown domain '{id}' (known: {})", known.join(", ")).into()
    })
}

fn with_overrides(
    domain: &DomainConfig,
    quota: Option<usize>,
    max_candidates: Option<usize>,
) -> Result<DomainConfig, Box<dyn std::error::Error>> {
    let mut domain = domain.clone();
    if let Some(quota) = quota {
        if quota == 0 {
            return Err("--quota must be at least 1".into());
        }
        domain = domain.with_quota(quota);
    }
    if let Some(max_candidates) = max_candidates {
        domain = domain.with_max_candidates(max_candidates);
    }
    Ok(domain)
}

fn print_json(value: &impl serde::Serialize) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let table = match &cli.domains {
        Some(path) => {
            log::info!("Loading domain table from {}", path.display());
            CategoryCapTable::load(path)?
        }
        None => CategoryCapTable::embedded(),
    };

    match cli.command {
        Commands::Domains => print_json(&table.domains())?,
        Commands::Classify { domain, tags } => {
            let domain = find_domain(&table, &domain)?;
            println!("{}", classify(&tags, &domain.priority));
        }
        Commands::Rank {
            domain,
            center,
            places,
            quota,
            max_candidates,
        } => {
            let domain = with_overrides(find_domain(&table, &domain)?, quota, max_candidates)?;
            let provider = MemoryPlaces::from_json_file(&places)?;
            let query = PlacesQuery::nearest(center.center, domain.filter.as_str());
            let candidates = provider.search(&query).await?.data().unwrap_or_default();
            print_json(&rank_domain(center.center, &candidates, &domain))?;
        }
        Commands::Incidents { center, events } => {
            let store = events.store()?;
            let now = events.now.unwrap_or_else(Utc::now);
            let crimes = store.crimes(&GeoQuery::crimes(center.center, now)).await?;
            let collisions = store
                .collisions(&GeoQuery::collisions(center.center, now))
                .await?;

            let feed = merge(
                crimes.into_iter().map(IncidentRecord::from_crime),
                collisions.iter().filter_map(IncidentRecord::from_collision),
                events.per_feed_limit,
            );
            print_json(&feed)?;
        }
        Commands::Pipeline { center, now } => {
            let now = now.unwrap_or_else(Utc::now);
            print_json(&serde_json::json!({
                "crimes": geo_near_pipeline(&GeoQuery::crimes(center.center, now)),
                "collisions": geo_near_pipeline(&GeoQuery::collisions(center.center, now)),
            }))?;
        }
        Commands::Report {
            center,
            places,
            events,
            max_in_flight,
        } => {
            let provider = match &places {
                Some(path) => MemoryPlaces::from_json_file(path)?,
                None => MemoryPlaces::default(),
            };
            let store = events.store()?;
            let options = ReportOptions {
                per_feed_limit: events.per_feed_limit,
                max_in_flight,
                now: events.now,
            };

            let report = assemble(center.center, &table, &provider, &store, options).await?;
            print_json(&report)?;
        }
    }

    Ok(())
}
