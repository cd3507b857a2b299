//! Delta filtering and the wide-to-long reshape.
//!
//! A wide record holds one cell per tag category, each cell a comma
//! separated list of tag names. Reshaping happens in two unpivot steps:
//! first over category columns, then over comma positions.

use tracing::{debug, warn};

use crate::models::{ContentId, ConvertedIdSet, LongTagRecord, TagCell, WideTagRecord};

/// A non-empty category cell after the first unpivot step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeltedCell {
    /// Content identifier
    pub content_id: ContentId,
    /// Category (column) name
    pub tag_cat: String,
    /// Raw comma separated value
    pub raw: String,
}

/// Result of the first unpivot step
#[derive(Debug, Default)]
pub struct Melted {
    /// Text cells that were neither NULL nor empty
    pub cells: Vec<MeltedCell>,
    /// Cells skipped because they held a non-text value
    pub malformed: usize,
}

/// Drop records whose content id has already been converted.
#[must_use]
pub fn filter_unconverted(records: Vec<WideTagRecord>, converted: &ConvertedIdSet) -> Vec<WideTagRecord> {
    records
        .into_iter()
        .filter(|record| !converted.contains(&record.id))
        .collect()
}

/// Unpivot over category columns, discarding NULL, empty and malformed cells.
#[must_use]
pub fn melt_categories(records: &[WideTagRecord]) -> Melted {
    let mut melted = Melted::default();

    for record in records {
        for cell in &record.cells {
            match &cell.value {
                TagCell::Text(raw) if !raw.is_empty() => melted.cells.push(MeltedCell {
                    content_id: record.id,
                    tag_cat: cell.category.clone(),
                    raw: raw.clone(),
                }),
                TagCell::Text(_) | TagCell::Empty => {}
                TagCell::Malformed(kind) => {
                    warn!(
                        content_id = record.id,
                        category = %cell.category,
                        kind = *kind,
                        "Skipping non-text tag cell"
                    );
                    melted.malformed += 1;
                }
            }
        }
    }

    melted
}

/// Unpivot over comma positions. Position is not kept and empty
/// segments (from `",,"` or a trailing comma) are dropped. Segments are not
/// trimmed.
#[must_use]
pub fn split_tags(cells: &[MeltedCell]) -> Vec<LongTagRecord> {
    cells
        .iter()
        .flat_map(|cell| {
            cell.raw
                .split(',')
                .filter(|tag| !tag.is_empty())
                .map(move |tag| LongTagRecord {
                    content_id: cell.content_id,
                    tag_cat: cell.tag_cat.clone(),
                    tag: tag.to_string(),
                })
        })
        .collect()
}

/// Both unpivot steps. Returns the long rows and the malformed cell count.
#[must_use]
pub fn to_long_format(records: &[WideTagRecord]) -> (Vec<LongTagRecord>, usize) {
    let melted = melt_categories(records);
    let long = split_tags(&melted.cells);
    debug!(cells = melted.cells.len(), tags = long.len(), "Reshaped wide records");
    (long, melted.malformed)
}
