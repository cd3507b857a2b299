//! Tag identifier lookup, dedup and the cost center join.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::models::{ContentId, CostCenterRow, EnrichedTagRecord, LongTagRecord, TagLookup, TagProfileLink};

/// Left-join long rows against the lookup. Unknown tags keep `tag_guid: None`.
#[must_use]
pub fn attach_tag_ids(records: Vec<LongTagRecord>, lookup: &TagLookup) -> Vec<EnrichedTagRecord> {
    records
        .into_iter()
        .map(|record| {
            let tag_guid = lookup.guid(&record.tag).map(ToString::to_string);
            EnrichedTagRecord {
                content_id: record.content_id,
                tag_cat: record.tag_cat,
                tag: record.tag,
                tag_guid,
            }
        })
        .collect()
}

/// Output of [`enrich`]
#[derive(Debug, Default)]
pub struct Enriched {
    /// Deduplicated rows, ready to persist
    pub records: Vec<EnrichedTagRecord>,
    /// Tags without an identifier, counted before dedup
    pub unmatched: usize,
    /// Unmatched tags dropped by dedup because their content already kept one
    pub collapsed_unmatched: usize,
}

/// Keep the first row for every `(content_id, tag_guid)` pair.
///
/// Category is not part of the key, so a tag filed under two categories of
/// the same content keeps the category it was first seen with. `None`
/// identifiers compare equal, leaving at most one unmatched tag per content;
/// the others are logged by name. Returns the kept rows and the number of
/// unmatched rows dropped.
#[must_use]
pub fn dedup_by_tag_id(records: Vec<EnrichedTagRecord>) -> (Vec<EnrichedTagRecord>, usize) {
    let mut seen: HashSet<(ContentId, Option<String>)> = HashSet::with_capacity(records.len());
    let before = records.len();
    let mut collapsed = 0;

    let kept: Vec<EnrichedTagRecord> = records
        .into_iter()
        .filter(|record| {
            let first = seen.insert((record.content_id, record.tag_guid.clone()));
            if !first && record.tag_guid.is_none() {
                warn!(
                    content_id = record.content_id,
                    category = %record.tag_cat,
                    tag = %record.tag,
                    "Unmatched tag collapsed into an earlier unmatched tag"
                );
                collapsed += 1;
            }
            first
        })
        .collect();

    debug!(before, after = kept.len(), collapsed, "Deduplicated enriched tags");
    (kept, collapsed)
}

/// Lookup join followed by dedup. Unmatched tags are counted before dedup
/// so none disappear from the totals.
#[must_use]
pub fn enrich(records: Vec<LongTagRecord>, lookup: &TagLookup) -> Enriched {
    let attached = attach_tag_ids(records, lookup);
    let unmatched = count_unmatched(&attached);
    let (records, collapsed_unmatched) = dedup_by_tag_id(attached);
    Enriched {
        records,
        unmatched,
        collapsed_unmatched,
    }
}

/// Number of enriched rows without a tag identifier.
#[must_use]
pub fn count_unmatched(records: &[EnrichedTagRecord]) -> usize {
    records.iter().filter(|record| record.tag_guid.is_none()).count()
}

/// Output of [`join_profiles`]
#[derive(Debug, Default)]
pub struct ProfileJoin {
    /// One row per (enriched tag, cost center) match, or a `None` cost
    /// center when the tag has no link
    pub rows: Vec<CostCenterRow>,
    /// Links whose tag identifier matched no enriched row; these are the
    /// content-less rows of the outer join and are dropped
    pub orphaned_links: usize,
}

/// Full outer join of enriched rows against profile links on tag identifier.
///
/// A `None` identifier on either side never matches.
#[must_use]
pub fn join_profiles(records: &[EnrichedTagRecord], links: &[TagProfileLink]) -> ProfileJoin {
    let mut by_guid: HashMap<&str, Vec<Option<&str>>> = HashMap::new();
    for link in links {
        if let Some(guid) = link.tag_guid.as_deref() {
            by_guid.entry(guid).or_default().push(link.cost_center.as_deref());
        }
    }

    let mut matched: HashSet<&str> = HashSet::new();
    let mut rows = Vec::with_capacity(records.len());

    for record in records {
        let centers = record
            .tag_guid
            .as_deref()
            .and_then(|guid| by_guid.get(guid).map(|centers| (guid, centers)));

        match centers {
            Some((guid, centers)) => {
                matched.insert(guid);
                rows.extend(centers.iter().map(|center| CostCenterRow {
                    content_id: record.content_id,
                    cost_center: center.map(ToString::to_string),
                }));
            }
            None => rows.push(CostCenterRow {
                content_id: record.content_id,
                cost_center: None,
            }),
        }
    }

    let orphaned_links = links
        .iter()
        .filter(|link| link.tag_guid.as_deref().map_or(true, |guid| !matched.contains(guid)))
        .count();

    if orphaned_links > 0 {
        info!(orphaned_links, "Dropped profile links with no content");
    }

    ProfileJoin { rows, orphaned_links }
}
