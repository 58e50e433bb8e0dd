//! Garbage-collected view of a record list.

use crate::content::ItemContent;
use crate::delete_set::DeleteSet;
use crate::record::Record;

/// Replaces the content of every deleted item slot with
/// [`ItemContent::Deleted`], splitting items at delete boundaries.
///
/// Gc and Skip records, and items whose content is already deleted, pass
/// through unchanged. Clock coverage and causal links are preserved.
pub fn collect_deleted(records: &[Record], ds: &DeleteSet) -> Vec<Record> {
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        let Record::Item(item) = record else {
            out.push(record.clone());
            continue;
        };
        if matches!(item.content, ItemContent::Deleted(_)) {
            out.push(record.clone());
            continue;
        }
        let start = item.id.clock;
        let end = record.end();
        let ranges = ds.ranges(item.id.client);
        let first = ranges.partition_point(|r| r.end() <= start);
        let mut cursor = start;
        for range in ranges[first..].iter().take_while(|r| r.clock < end) {
            let cut_start = range.clock.max(start);
            let cut_end = range.end().min(end);
            if cut_start > cursor {
                out.push(record.slice(cursor - start, cut_start - start));
            }
            out.push(tombstone(record.slice(cut_start - start, cut_end - start)));
            cursor = cut_end;
        }
        if cursor < end {
            out.push(if cursor == start {
                record.clone()
            } else {
                record.slice(cursor - start, end - start)
            });
        }
    }
    out
}

fn tombstone(record: Record) -> Record {
    match record {
        Record::Item(mut item) => {
            item.content = ItemContent::Deleted(item.len());
            Record::Item(item)
        }
        other => other,
    }
}
