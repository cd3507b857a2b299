//! Cost center aggregation.
//!
//! Every content item collects the cost centers of its tags into a single
//! `", "` separated string. Values are normalized as a set so the output
//! never carries duplicate, empty or placeholder entries.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{ContentId, CostCenterProfile, CostCenterRow};

/// Placeholder that upstream exports use for a missing value.
const MISSING: &str = "nan";

/// Normalize a group of cost center values into one string.
///
/// Values may themselves be comma separated. Pieces are trimmed, inner
/// whitespace runs collapse to one space, and `None`, empty and `"nan"`
/// pieces are dropped. The rest are deduplicated, sorted and joined with
/// `", "`. Returns `None` when nothing is left.
pub fn normalize_cost_centers<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let centers: BTreeSet<String> = values
        .into_iter()
        .flatten()
        .flat_map(|value| value.split(','))
        .map(|piece| piece.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|piece| !piece.is_empty() && piece != MISSING)
        .collect();

    if centers.is_empty() {
        None
    } else {
        Some(centers.into_iter().collect::<Vec<_>>().join(", "))
    }
}

/// Group joined rows by content id and build one profile per content item
/// that has at least one cost center. Output is ordered by content id.
#[must_use]
pub fn aggregate_profiles(rows: &[CostCenterRow]) -> Vec<CostCenterProfile> {
    let mut grouped: BTreeMap<ContentId, Vec<Option<&str>>> = BTreeMap::new();
    for row in rows {
        grouped
            .entry(row.content_id)
            .or_default()
            .push(row.cost_center.as_deref());
    }

    grouped
        .into_iter()
        .filter_map(|(content_id, centers)| {
            normalize_cost_centers(centers).map(|cost_center| CostCenterProfile { content_id, cost_center })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(content_id: ContentId, cost_center: Option<&str>) -> CostCenterRow {
        CostCenterRow {
            content_id,
            cost_center: cost_center.map(ToString::to_string),
        }
    }

    #[test]
    fn test_dedup_and_drop_placeholder() {
        let normalized = normalize_cost_centers([Some("A"), Some("A"), Some("nan"), Some("B")]);
        assert_eq!(normalized.as_deref(), Some("A, B"));
    }

    #[test]
    fn test_all_missing() {
        assert_eq!(normalize_cost_centers([None, Some("nan"), Some("  ")]), None);
        assert_eq!(normalize_cost_centers(std::iter::empty()), None);
    }

    #[test]
    fn test_messy_values() {
        let normalized = normalize_cost_centers([Some(" Climate   Finance ,, "), Some("Energy,"), None]);
        assert_eq!(normalized.as_deref(), Some("Climate Finance, Energy"));
    }

    #[test]
    fn test_nan_inside_a_code_is_kept() {
        let normalized = normalize_cost_centers([Some("Finance")]);
        assert_eq!(normalized.as_deref(), Some("Finance"));
    }

    #[test]
    fn test_aggregate_skips_empty_profiles() {
        let rows = vec![
            row(2, Some("CC2")),
            row(1, Some("CC1")),
            row(2, Some("CC1")),
            row(3, None),
            row(2, None),
        ];
        let profiles = aggregate_profiles(&rows);
        assert_eq!(
            profiles,
            vec![
                CostCenterProfile {
                    content_id: 1,
                    cost_center: "CC1".to_string(),
                },
                CostCenterProfile {
                    content_id: 2,
                    cost_center: "CC1, CC2".to_string(),
                },
            ]
        );
    }
}
