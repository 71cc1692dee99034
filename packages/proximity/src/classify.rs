//! Canonical category lookup.
//!
//! Providers tag a place with several overlapping types (a hospital is
//! usually also `"health"` and `"establishment"`). Each domain lists its
//! keywords in priority order and the first keyword present decides the
//! category.

use crate::domain::PriorityEntry;

/// Separator used for the fallback label.
pub const FALLBACK_SEPARATOR: &str = ", ";

/// Maps `raw_tags` to the canonical category of the first `priority` entry
/// whose keyword is among them.
///
/// When nothing matches, returns every raw tag joined with `", "` so the
/// unknown type still reaches the reader. The result depends only on which
/// tags are present, never on their order, except for the fallback label
/// which lists them as given.
#[must_use]
pub fn classify<S: AsRef<str>>(raw_tags: &[S], priority: &[PriorityEntry]) -> String {
    priority
        .iter()
        .find(|entry| raw_tags.iter().any(|t| t.as_ref() == entry.keyword.as_str()))
        .map_or_else(|| fallback_label(raw_tags), |entry| entry.category.clone())
}

fn fallback_label<S: AsRef<str>>(raw_tags: &[S]) -> String {
    let tags: Vec<&str> = raw_tags.iter().map(AsRef::as_ref).collect();
    tags.join(FALLBACK_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emergency() -> Vec<PriorityEntry> {
        vec![
            PriorityEntry::new("hospital", "hospital"),
            PriorityEntry::new("fire_station", "fire_station"),
            PriorityEntry::new("police", "police"),
        ]
    }

    #[test]
    fn first_priority_wins() {
        assert_eq!(classify(&["hospital", "clinic"], &emergency()), "hospital");
        assert_eq!(classify(&["clinic", "hospital"], &emergency()), "hospital");
        assert_eq!(
            classify(&["police", "fire_station"], &emergency()),
            "fire_station"
        );
        assert_eq!(
            classify(&["police", "fire_station", "hospital"], &emergency()),
            "hospital"
        );
    }

    #[test]
    fn keyword_maps_to_its_category() {
        let priority = vec![
            PriorityEntry::new("subway_station", "Subway"),
            PriorityEntry::new("bus_station", "Bus"),
        ];
        assert_eq!(
            classify(&["transit_station", "bus_station"], &priority),
            "Bus"
        );
    }

    #[test]
    fn unmatched_tags_fall_back_to_joined_list() {
        assert_eq!(
            classify(&["point_of_interest", "establishment"], &emergency()),
            "point_of_interest, establishment"
        );
    }

    #[test]
    fn empty_tags_fall_back_to_empty_label() {
        let tags: [&str; 0] = [];
        assert_eq!(classify(&tags, &emergency()), "");
    }

    #[test]
    fn matches_whole_tags_only() {
        assert_eq!(
            classify(&["police_museum"], &emergency()),
            "police_museum"
        );
    }

    #[test]
    fn accepts_owned_strings() {
        let tags = vec!["hospital".to_string()];
        assert_eq!(classify(&tags, &emergency()), "hospital");
    }
}
