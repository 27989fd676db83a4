//! Positional merge of price records with support ranges.
//!
//! The i-th range slot annotates the i-th record. The two sequences come from
//! unrelated processes and nothing here checks that they describe the same
//! samples: a skipped or extra line in either output shifts every later
//! annotation. An empty slot leaves its record unannotated without shifting
//! the ones after it.

use crate::{EnrichedDataPoint, PriceRecord, SupportRange};

/// Zips records with range slots by index. The output always has one point per
/// record; records past the last slot stay unannotated and surplus slots are
/// ignored.
pub fn merge_positional(
    records: Vec<PriceRecord>,
    ranges: &[Option<SupportRange>],
) -> Vec<EnrichedDataPoint> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            EnrichedDataPoint::new(record, ranges.get(index).copied().flatten())
        })
        .collect()
}
