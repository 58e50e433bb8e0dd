//! Update and state-vector encoder (v1 wire format).

use std::collections::BTreeMap;

use y_inspect_buffers::Writer;

use crate::delete_set::DeleteSet;
use crate::id::{ClientId, Clock, Id};
use crate::record::{Item, Parent, Record};
use crate::state_vector::StateVector;

use super::{BIT_ORIGIN, BIT_PARENT_SUB, BIT_RIGHT_ORIGIN, REF_GC, REF_SKIP};

/// Update encoder.
#[derive(Default)]
pub struct Encoder {
    w: Writer,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes records and a delete set as one update.
    ///
    /// Records are normalized first (see [`normalize`]); replicas are
    /// written in descending order, as the external writer does.
    pub fn encode_update(&mut self, records: &[Record], delete_set: &DeleteSet) -> Vec<u8> {
        let groups = normalize(records);
        self.w.var_uint(groups.len() as u64);
        for (client, structs) in groups.iter().rev() {
            self.w.var_uint(structs.len() as u64);
            self.w.var_uint(*client);
            self.w.var_uint(structs[0].id().clock);
            for record in structs {
                self.write_record(record);
            }
        }
        self.write_delete_set(delete_set);
        self.w.flush()
    }

    pub fn encode_state_vector(&mut self, sv: &StateVector) -> Vec<u8> {
        self.w.var_uint(sv.len() as u64);
        for (client, clock) in sv.iter().rev() {
            self.w.var_uint(client);
            self.w.var_uint(clock);
        }
        self.w.flush()
    }

    fn write_record(&mut self, record: &Record) {
        match record {
            Record::Gc { len, .. } => {
                self.w.u8(REF_GC);
                self.w.var_uint(*len);
            }
            Record::Skip { len, .. } => {
                self.w.u8(REF_SKIP);
                self.w.var_uint(*len);
            }
            Record::Item(item) => self.write_item(item),
        }
    }

    fn write_item(&mut self, item: &Item) {
        let writes_parent = item.origin.is_none() && item.right_origin.is_none();
        let mut info = item.content.ref_number();
        if item.origin.is_some() {
            info |= BIT_ORIGIN;
        }
        if item.right_origin.is_some() {
            info |= BIT_RIGHT_ORIGIN;
        }
        // The key is only written next to the parent; with origins the flag
        // travels alone.
        let keyed = if writes_parent {
            item.parent_sub.is_some()
        } else {
            item.has_parent_sub || item.parent_sub.is_some()
        };
        if keyed {
            info |= BIT_PARENT_SUB;
        }
        self.w.u8(info);
        if let Some(origin) = item.origin {
            self.write_id(origin);
        }
        if let Some(right_origin) = item.right_origin {
            self.write_id(right_origin);
        }
        if writes_parent {
            match &item.parent {
                Some(Parent::Root(name)) => {
                    self.w.var_uint(1);
                    self.w.var_string(name);
                }
                Some(Parent::Item(id)) => {
                    self.w.var_uint(0);
                    self.write_id(*id);
                }
                // An origin-less item must name its parent; an empty root
                // name is the closest representable value.
                None => {
                    self.w.var_uint(1);
                    self.w.var_string("");
                }
            }
            if let Some(key) = &item.parent_sub {
                self.w.var_string(key);
            }
        }
        item.content.write(&mut self.w);
    }

    fn write_id(&mut self, id: Id) {
        self.w.var_uint(id.client);
        self.w.var_uint(id.clock);
    }

    fn write_delete_set(&mut self, ds: &DeleteSet) {
        let clients: Vec<_> = ds.iter().rev().collect();
        self.w.var_uint(clients.len() as u64);
        for (client, ranges) in clients {
            self.w.var_uint(client);
            self.w.var_uint(ranges.len() as u64);
            for range in ranges {
                self.w.var_uint(range.clock);
                self.w.var_uint(range.len);
            }
        }
    }
}

/// Groups records per replica into contiguous, non-overlapping runs.
///
/// Within a replica, content records are sorted by clock (longer first on
/// ties); a record overlapping the run so far is sliced to its uncovered
/// tail and a fully covered one is dropped. Skip records only mark clock
/// ranges as known-missing: every slot between the first and last clock
/// any record of the replica covers that no content record fills becomes
/// part of a Skip record, so adjacent Skips coalesce.
pub fn normalize(records: &[Record]) -> BTreeMap<ClientId, Vec<Record>> {
    let mut per_client: BTreeMap<ClientId, (Clock, Clock, Vec<&Record>)> = BTreeMap::new();
    for record in records.iter().filter(|r| !r.is_empty()) {
        let (start, end) = (record.id().clock, record.end());
        let span = per_client
            .entry(record.id().client)
            .or_insert((start, end, Vec::new()));
        span.0 = span.0.min(start);
        span.1 = span.1.max(end);
        if !record.is_skip() {
            span.2.push(record);
        }
    }

    let mut groups = BTreeMap::new();
    for (client, (first, last, mut list)) in per_client {
        list.sort_by(|a, b| {
            a.id()
                .clock
                .cmp(&b.id().clock)
                .then_with(|| b.len().cmp(&a.len()))
        });
        let skip = |from: Clock, to: Clock| Record::Skip {
            id: Id::new(client, from),
            len: to - from,
        };
        let mut out: Vec<Record> = Vec::with_capacity(list.len());
        let mut next = first;
        for record in list {
            let start = record.id().clock;
            let end = record.end();
            if end <= next {
                continue;
            }
            if start > next {
                out.push(skip(next, start));
                out.push(record.clone());
            } else if start < next {
                out.push(record.slice(next - start, record.len()));
            } else {
                out.push(record.clone());
            }
            next = end;
        }
        if next < last {
            out.push(skip(next, last));
        }
        groups.insert(client, out);
    }
    groups
}
