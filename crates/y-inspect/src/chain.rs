//! Groups records into causal chains along their origin links.
//!
//! Every item with an origin or right origin hangs below the record that
//! owns the referenced slot. Records without any origin start a chain, and
//! each chain lists its records in depth-first order, children in the order
//! their links were discovered.
//!
//! A record reachable through both of its origins shows up under both
//! parents; its descendants are listed only under the first. Links to slots that are not in the input are reported as
//! [`UnresolvedOrigin`] and dropped; records that end up unreachable from
//! any root are appended as chains of their own.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::id::{ClientId, Clock, Id};
use crate::record::Record;

/// Which causal link of an item could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Origin,
    RightOrigin,
}

/// An origin link pointing at a slot absent from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnresolvedOrigin {
    pub record: Id,
    pub origin: Id,
    pub side: Side,
}

/// Owner lookup: for each replica, record starts sorted by clock.
struct SlotIndex {
    clients: BTreeMap<ClientId, Vec<(Clock, Clock, usize)>>,
}

impl SlotIndex {
    fn build(records: &[Record]) -> Self {
        let mut clients: BTreeMap<ClientId, Vec<(Clock, Clock, usize)>> = BTreeMap::new();
        for (i, record) in records.iter().enumerate() {
            let id = record.id();
            clients
                .entry(id.client)
                .or_default()
                .push((id.clock, record.end(), i));
        }
        for spans in clients.values_mut() {
            spans.sort_unstable();
        }
        Self { clients }
    }

    /// Index of the record whose range covers `id`.
    fn owner(&self, id: Id) -> Option<usize> {
        let spans = self.clients.get(&id.client)?;
        let after = spans.partition_point(|&(start, _, _)| start <= id.clock);
        // Overlapping duplicates are possible: take the latest start that
        // still covers the slot.
        spans[..after]
            .iter()
            .rev()
            .find(|&&(_, end, _)| id.clock < end)
            .map(|&(_, _, i)| i)
    }
}

enum Step {
    Enter(usize),
    Exit(usize),
}

/// Origin graph over a borrowed record list.
pub struct ChainGraph<'a> {
    records: &'a [Record],
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    unresolved: Vec<UnresolvedOrigin>,
}

impl<'a> ChainGraph<'a> {
    pub fn build(records: &'a [Record]) -> Self {
        let index = SlotIndex::build(records);
        let mut children = vec![Vec::new(); records.len()];
        let mut roots = Vec::new();
        let mut unresolved = Vec::new();
        for (i, record) in records.iter().enumerate() {
            let Some(item) = record.as_item() else {
                roots.push(i);
                continue;
            };
            if item.origin.is_none() && item.right_origin.is_none() {
                roots.push(i);
                continue;
            }
            let links = [(item.origin, Side::Origin), (item.right_origin, Side::RightOrigin)];
            for (link, side) in links {
                let Some(origin) = link else { continue };
                match index.owner(origin) {
                    Some(parent) => children[parent].push(i),
                    None => {
                        debug!(record = %item.id, origin = %origin, ?side, "unresolved origin");
                        unresolved.push(UnresolvedOrigin {
                            record: item.id,
                            origin,
                            side,
                        });
                    }
                }
            }
        }
        Self {
            records,
            children,
            roots,
            unresolved,
        }
    }

    /// Chains rooted at origin-less records in input order, followed by one
    /// chain per record left unreachable.
    pub fn chains(&self) -> Vec<Vec<&'a Record>> {
        let mut emitted = vec![false; self.records.len()];
        let mut on_path = vec![false; self.records.len()];
        let mut out = Vec::with_capacity(self.roots.len());
        for &root in &self.roots {
            out.push(self.walk(root, &mut on_path, &mut emitted));
        }
        for i in 0..self.records.len() {
            if !emitted[i] {
                out.push(self.walk(i, &mut on_path, &mut emitted));
            }
        }
        out
    }

    /// Depth-first walk from `start`. A record already on the current path
    /// is not entered again, which cuts origin cycles. A record emitted
    /// earlier is listed again under its new parent, but its subtree is not,
    /// so the output stays linear in records plus links.
    fn walk(&self, start: usize, on_path: &mut [bool], emitted: &mut [bool]) -> Vec<&'a Record> {
        let mut chain = Vec::new();
        let mut stack = vec![Step::Enter(start)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(i) => {
                    if on_path[i] {
                        continue;
                    }
                    chain.push(&self.records[i]);
                    if emitted[i] {
                        continue;
                    }
                    on_path[i] = true;
                    emitted[i] = true;
                    stack.push(Step::Exit(i));
                    stack.extend(self.children[i].iter().rev().map(|&c| Step::Enter(c)));
                }
                Step::Exit(i) => on_path[i] = false,
            }
        }
        chain
    }

    pub fn unresolved(&self) -> &[UnresolvedOrigin] {
        &self.unresolved
    }

    /// Records not reachable from any origin-less root.
    pub fn orphans(&self) -> Vec<&'a Record> {
        let mut reached = vec![false; self.records.len()];
        let mut on_path = vec![false; self.records.len()];
        for &root in &self.roots {
            self.walk(root, &mut on_path, &mut reached);
        }
        self.records
            .iter()
            .zip(reached)
            .filter(|(_, reached)| !reached)
            .map(|(record, _)| record)
            .collect()
    }
}

/// Groups `records` into causal chains. See the module docs.
pub fn group_into_chains(records: &[Record]) -> Vec<Vec<Record>> {
    ChainGraph::build(records)
        .chains()
        .into_iter()
        .map(|chain| chain.into_iter().cloned().collect())
        .collect()
}
