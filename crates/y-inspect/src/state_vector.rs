//! Per-replica "next expected clock" bookkeeping.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::id::{ClientId, Clock, Id};
use crate::record::Record;

/// Maps each replica to the highest contiguous clock known, plus one.
///
/// A replica missing from the map is equivalent to clock 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateVector {
    clocks: BTreeMap<ClientId, Clock>,
}

/// Flat view of one replica entry, used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateVectorEntry {
    pub client: ClientId,
    pub clock: Clock,
}

impl StateVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.clocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clocks.is_empty()
    }

    /// Next expected clock for `client`; 0 when unknown.
    pub fn get(&self, client: ClientId) -> Clock {
        self.clocks.get(&client).copied().unwrap_or(0)
    }

    pub fn contains_client(&self, client: ClientId) -> bool {
        self.clocks.contains_key(&client)
    }

    /// Sets the entry for `client`, overwriting any previous value.
    pub fn set(&mut self, client: ClientId, clock: Clock) {
        self.clocks.insert(client, clock);
    }

    /// Raises the entry for `client` to `clock`; never lowers it.
    pub fn set_max(&mut self, client: ClientId, clock: Clock) {
        let entry = self.clocks.entry(client).or_insert(clock);
        if *entry < clock {
            *entry = clock;
        }
    }

    /// Whether `id` is already reflected in this vector.
    pub fn covers(&self, id: Id) -> bool {
        self.clocks.get(&id.client).is_some_and(|&next| id.clock < next)
    }

    /// Per-replica maximum of `self` and `other`.
    pub fn merge(&self, other: &StateVector) -> StateVector {
        let mut out = self.clone();
        out.merge_in(other);
        out
    }

    pub fn merge_in(&mut self, other: &StateVector) {
        for (client, clock) in other.iter() {
            self.set_max(client, clock);
        }
    }

    /// Iterates replicas in increasing order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (ClientId, Clock)> + '_ {
        self.clocks.iter().map(|(client, clock)| (*client, *clock))
    }

    pub fn entries(&self) -> Vec<StateVectorEntry> {
        self.iter()
            .map(|(client, clock)| StateVectorEntry { client, clock })
            .collect()
    }

    /// Derives the vector from a set of records: for each replica, the end
    /// of the contiguous run of non-Skip records starting at clock 0.
    ///
    /// Replicas whose run is empty are omitted.
    pub fn from_records(records: &[Record]) -> StateVector {
        let mut per_client: BTreeMap<ClientId, Vec<(Clock, Clock)>> = BTreeMap::new();
        for record in records.iter().filter(|r| !r.is_skip()) {
            let id = record.id();
            per_client.entry(id.client).or_default().push((id.clock, record.end()));
        }
        let mut sv = StateVector::new();
        for (client, mut spans) in per_client {
            spans.sort_unstable();
            let mut next = 0;
            for (start, end) in spans {
                if start > next {
                    break;
                }
                next = next.max(end);
            }
            if next > 0 {
                sv.set(client, next);
            }
        }
        sv
    }
}

impl FromIterator<(ClientId, Clock)> for StateVector {
    fn from_iter<T: IntoIterator<Item = (ClientId, Clock)>>(iter: T) -> Self {
        let mut sv = StateVector::new();
        for (client, clock) in iter {
            sv.set_max(client, clock);
        }
        sv
    }
}

/// Shorthand for [`StateVector::merge`].
pub fn merge(a: &StateVector, b: &StateVector) -> StateVector {
    a.merge(b)
}

/// Ids of every record not yet covered by `sv`: its replica is absent or
/// its clock is at or past the replica's next expected clock.
///
/// This is a consistency check for display; nothing is corrected.
pub fn diff_against(records: &[Record], sv: &StateVector) -> Vec<Id> {
    records
        .iter()
        .map(Record::id)
        .filter(|id| !sv.covers(*id))
        .collect()
}
