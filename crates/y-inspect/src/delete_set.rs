//! Per-replica sets of deleted clock ranges.
//!
//! Ranges for a replica are kept sorted, disjoint and non-adjacent at all
//! times: every insertion coalesces with the ranges it overlaps or touches.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::id::{ClientId, Clock, Id};

/// A contiguous run of clocks `clock..clock + len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeleteRange {
    pub clock: Clock,
    pub len: u64,
}

impl DeleteRange {
    pub const fn new(clock: Clock, len: u64) -> Self {
        Self { clock, len }
    }

    pub const fn end(&self) -> Clock {
        self.clock + self.len
    }
}

/// Flat view of one range, used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteEntry {
    pub client: ClientId,
    pub clock: Clock,
    pub len: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteSet {
    clients: BTreeMap<ClientId, Vec<DeleteRange>>,
}

impl DeleteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Marks `len` clocks starting at `id` as deleted.
    pub fn insert(&mut self, id: Id, len: u64) {
        if len == 0 {
            return;
        }
        let ranges = self.clients.entry(id.client).or_default();
        let mut start = id.clock;
        let mut end = id.clock + len;
        let lo = ranges.partition_point(|r| r.end() < start);
        let mut hi = lo;
        while hi < ranges.len() && ranges[hi].clock <= end {
            start = start.min(ranges[hi].clock);
            end = end.max(ranges[hi].end());
            hi += 1;
        }
        ranges.splice(lo..hi, [DeleteRange::new(start, end - start)]);
    }

    /// Returns `true` iff `id.clock` falls inside one of the ranges of
    /// `id.client`.
    pub fn is_deleted(&self, id: Id) -> bool {
        let Some(ranges) = self.clients.get(&id.client) else {
            return false;
        };
        let i = ranges.partition_point(|r| r.end() <= id.clock);
        ranges.get(i).is_some_and(|r| r.clock <= id.clock)
    }

    /// Ranges of one replica in increasing clock order.
    pub fn ranges(&self, client: ClientId) -> &[DeleteRange] {
        self.clients.get(&client).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates replicas in increasing order with their ranges.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (ClientId, &[DeleteRange])> + '_ {
        self.clients.iter().map(|(client, ranges)| (*client, ranges.as_slice()))
    }

    /// Union of `self` and `other`.
    pub fn merge(&self, other: &DeleteSet) -> DeleteSet {
        let mut out = self.clone();
        out.merge_in(other);
        out
    }

    /// Adds every range of `other` to `self`.
    pub fn merge_in(&mut self, other: &DeleteSet) {
        for (client, ranges) in other.iter() {
            for range in ranges {
                self.insert(Id::new(client, range.clock), range.len);
            }
        }
    }

    /// Ranges of `self` not covered by `other`.
    pub fn subtract(&self, other: &DeleteSet) -> DeleteSet {
        let mut out = DeleteSet::new();
        for (client, ranges) in self.iter() {
            let holes = other.ranges(client);
            for range in ranges {
                let mut cursor = range.clock;
                let end = range.end();
                let first = holes.partition_point(|h| h.end() <= cursor);
                for hole in holes[first..].iter().take_while(|h| h.clock < end) {
                    if hole.clock > cursor {
                        out.insert(Id::new(client, cursor), hole.clock - cursor);
                    }
                    cursor = cursor.max(hole.end());
                }
                if cursor < end {
                    out.insert(Id::new(client, cursor), end - cursor);
                }
            }
        }
        out
    }

    /// Flat list sorted by replica, then clock.
    pub fn to_range_list(&self) -> Vec<DeleteEntry> {
        self.iter()
            .flat_map(|(client, ranges)| {
                ranges.iter().map(move |r| DeleteEntry {
                    client,
                    clock: r.clock,
                    len: r.len,
                })
            })
            .collect()
    }

    /// Total number of deleted clocks across all replicas.
    pub fn deleted_count(&self) -> u64 {
        self.clients.values().flatten().map(|r| r.len).sum()
    }
}

/// Shorthand for [`DeleteSet::is_deleted`].
pub fn is_deleted(ds: &DeleteSet, id: Id) -> bool {
    ds.is_deleted(id)
}

/// Shorthand for [`DeleteSet::merge`].
pub fn merge(a: &DeleteSet, b: &DeleteSet) -> DeleteSet {
    a.merge(b)
}

impl FromIterator<(Id, u64)> for DeleteSet {
    fn from_iter<T: IntoIterator<Item = (Id, u64)>>(iter: T) -> Self {
        let mut ds = DeleteSet::new();
        for (id, len) in iter {
            ds.insert(id, len);
        }
        ds
    }
}
