//! Category-capped ranking of provider candidates.
//!
//! The places provider already returns candidates nearest first, so the
//! ranker never re-sorts. It walks the list once, deciding for each
//! candidate whether it is admitted:
//!
//! 1. Only the first [`DomainConfig::max_candidates`] are considered.
//! 2. With deduplication on, a name already admitted is skipped, so a stop
//!    tagged with several transit modes only appears once.
//! 3. The candidate is classified against the domain's priority table.
//! 4. If its category already holds [`DomainConfig::quota`] records it is
//!    dropped without consuming anything.
//! 5. Admitted candidates are annotated with their distance from `center`.
//!
//! Feeding the ranker a list that is not in provider distance order still
//! works, but changes which candidates win the quota slots.

use std::collections::{BTreeMap, BTreeSet};

use homie_proximity_models::{Candidate, Coordinate, PlaceRecord};

use crate::classify::classify;
use crate::distance::distance;
use crate::domain::DomainConfig;

/// Ranks `candidates` for `domain` using the domain's own deduplication
/// setting.
#[must_use]
pub fn rank_domain(
    center: Coordinate,
    candidates: &[Candidate],
    domain: &DomainConfig,
) -> Vec<PlaceRecord> {
    rank(center, candidates, domain, domain.dedupe_by_name)
}

/// Applies per-category quotas, optional name deduplication, and distance
/// annotation to `candidates`, keeping their order.
///
/// Never fails: an empty input yields an empty list, and candidates with
/// non-finite coordinates are skipped.
#[must_use]
pub fn rank(
    center: Coordinate,
    candidates: &[Candidate],
    domain: &DomainConfig,
    dedupe_by_name: bool,
) -> Vec<PlaceRecord> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut admitted_names: BTreeSet<&str> = BTreeSet::new();
    let mut out = Vec::new();

    for candidate in candidates.iter().take(domain.max_candidates) {
        if !candidate.location.is_finite() {
            log::debug!(
                "[{}] skipping '{}': non-finite location",
                domain.id,
                candidate.name
            );
            continue;
        }

        if dedupe_by_name && admitted_names.contains(candidate.name.as_str()) {
            continue;
        }

        let category = classify(&candidate.raw_tags, &domain.priority);

        let count = counts.entry(category.clone()).or_insert(0);
        if *count >= domain.quota {
            log::trace!(
                "[{}] '{}' over quota for {category}",
                domain.id,
                candidate.name
            );
            continue;
        }
        *count += 1;

        admitted_names.insert(candidate.name.as_str());
        out.push(PlaceRecord {
            name: candidate.name.clone(),
            category,
            distance_miles: distance(center, candidate.location),
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CategoryCapTable, PriorityEntry};

    const CENTER: Coordinate = Coordinate::new(39.9526, -75.1652);

    /// `n`-th point a little further north of the center each step.
    fn at(n: u32) -> Coordinate {
        Coordinate::new(CENTER.latitude + f64::from(n) * 0.001, CENTER.longitude)
    }

    fn candidate(name: &str, tags: &[&str], n: u32) -> Candidate {
        Candidate::new(name, tags.iter().copied(), at(n))
    }

    fn emergency() -> DomainConfig {
        CategoryCapTable::embedded()
            .get("emergency")
            .cloned()
            .unwrap()
    }

    fn names(records: &[PlaceRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn fifth_hospital_is_dropped() {
        let candidates: Vec<Candidate> = ["A", "B", "C", "D", "E"]
            .iter()
            .zip(1..)
            .map(|(name, n)| candidate(name, &["hospital"], n))
            .collect();

        let out = rank(CENTER, &candidates, &emergency(), false);
        assert_eq!(names(&out), ["A", "B", "C", "D"]);
        assert!(out.iter().all(|r| r.category == "hospital"));
    }

    #[test]
    fn dropped_candidate_does_not_consume_a_slot() {
        let candidates = vec![
            candidate("H1", &["hospital"], 1),
            candidate("H2", &["hospital"], 2),
            candidate("P1", &["police"], 3),
            candidate("P2", &["police"], 4),
        ];
        let domain = emergency().with_quota(1);

        let out = rank(CENTER, &candidates, &domain, false);
        assert_eq!(names(&out), ["H1", "P1"]);
    }

    #[test]
    fn no_category_exceeds_quota() {
        let tags: [&[&str]; 4] = [&["hospital"], &["police"], &["fire_station"], &["bakery"]];
        let candidates: Vec<Candidate> = (0..20)
            .map(|n| candidate(&format!("place {n}"), tags[n as usize % tags.len()], n))
            .collect();

        for quota in 1..=6 {
            let out = rank(CENTER, &candidates, &emergency().with_quota(quota), false);
            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for record in &out {
                *counts.entry(record.category.as_str()).or_default() += 1;
            }
            assert!(counts.values().all(|&c| c <= quota), "quota {quota}: {counts:?}");
        }
    }

    #[test]
    fn output_keeps_provider_order() {
        // Provider order is not strictly by distance here; the ranker must
        // not re-sort.
        let candidates = vec![
            candidate("far", &["police"], 9),
            candidate("near", &["hospital"], 1),
            candidate("mid", &["fire_station"], 5),
        ];
        let out = rank(CENTER, &candidates, &emergency(), false);
        assert_eq!(names(&out), ["far", "near", "mid"]);
    }

    #[test]
    fn annotates_distance_from_center() {
        let candidates = vec![candidate("A", &["hospital"], 10)];
        let out = rank(CENTER, &candidates, &emergency(), false);
        let expected = distance(CENTER, at(10));
        assert!((out[0].distance_miles - expected).abs() < 1e-12);
        assert!(out[0].distance_miles > 0.0);
    }

    #[test]
    fn dedupe_admits_one_per_name() {
        let candidates = vec![
            candidate("30th Street Station", &["train_station", "transit_station"], 1),
            candidate("30th Street Station", &["subway_station", "transit_station"], 1),
            candidate("Market St & 30th", &["bus_station"], 2),
        ];
        let transportation = CategoryCapTable::embedded()
            .get("transportation")
            .cloned()
            .unwrap();

        let out = rank_domain(CENTER, &candidates, &transportation);
        assert_eq!(names(&out), ["30th Street Station", "Market St & 30th"]);
        assert_eq!(out[0].category, "train_station");

        let undeduped = rank(CENTER, &candidates, &transportation, false);
        assert_eq!(undeduped.len(), 3);
    }

    #[test]
    fn dedupe_ignores_names_dropped_by_quota() {
        let candidates = vec![
            candidate("A", &["hospital"], 1),
            candidate("B", &["hospital"], 2),
            candidate("B", &["police"], 3),
        ];
        let out = rank(CENTER, &candidates, &emergency().with_quota(1), true);
        assert_eq!(names(&out), ["A", "B"]);
        assert_eq!(out[1].category, "police");
    }

    #[test]
    fn only_leading_candidates_are_considered() {
        let candidates: Vec<Candidate> = (0..30)
            .map(|n| {
                let tag = format!("type_{n}");
                candidate(&format!("p{n}"), &[tag.as_str()], n)
            })
            .collect();
        let out = rank(CENTER, &candidates, &emergency(), false);
        assert_eq!(out.len(), 20);
        assert_eq!(out.last().unwrap().name, "p19");

        let out = rank(CENTER, &candidates, &emergency().with_max_candidates(5), false);
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(rank(CENTER, &[], &emergency(), true).is_empty());
    }

    #[test]
    fn unmatched_and_empty_tags_use_fallback() {
        let candidates = vec![
            candidate("Bakery", &["bakery", "store"], 1),
            candidate("Nameless", &[], 2),
        ];
        let out = rank(CENTER, &candidates, &emergency(), false);
        assert_eq!(out[0].category, "bakery, store");
        assert_eq!(out[1].category, "");
    }

    #[test]
    fn skips_non_finite_locations() {
        let candidates = vec![
            Candidate::new("Broken", ["hospital"], Coordinate::new(f64::NAN, 0.0)),
            candidate("Fine", &["hospital"], 1),
        ];
        let out = rank(CENTER, &candidates, &emergency(), false);
        assert_eq!(names(&out), ["Fine"]);
    }

    #[test]
    fn idempotent_with_large_quota() {
        let candidates = vec![
            candidate("A", &["hospital"], 1),
            candidate("B", &["police"], 2),
            candidate("C", &["hospital", "police"], 3),
            candidate("D", &["bakery"], 4),
        ];
        let domain = DomainConfig::new(
            "emergency",
            "hospital|police",
            vec![
                PriorityEntry::new("hospital", "hospital"),
                PriorityEntry::new("police", "police"),
            ],
        )
        .with_quota(100);

        let first = rank(CENTER, &candidates, &domain, false);
        let replayed: Vec<Candidate> = first
            .iter()
            .zip(&candidates)
            .map(|(record, original)| {
                Candidate::new(record.name.clone(), [record.category.clone()], original.location)
            })
            .collect();
        let second = rank(CENTER, &replayed, &domain, false);

        assert_eq!(first, second);
    }
}
