//! Serializable snapshots of an inspector session.

use serde::Serialize;
use serde_json::Value;

use crate::chain::{ChainGraph, UnresolvedOrigin};
use crate::content::ItemContent;
use crate::delete_set::{DeleteEntry, DeleteSet};
use crate::hex::to_hex;
use crate::id::Id;
use crate::inspector::{Inspector, UpdateEntry};
use crate::record::{Parent, Record};
use crate::state_vector::{diff_against, StateVectorEntry};
use crate::undo::{Origin, StackItem};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordReport {
    pub kind: &'static str,
    pub id: Id,
    pub len: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_origin: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Value>,
    pub deleted: bool,
}

impl RecordReport {
    /// `deleted` is true when the record's first slot is in `ds`.
    pub fn new(record: &Record, ds: &DeleteSet) -> Self {
        let item = record.as_item();
        Self {
            kind: record.kind(),
            id: record.id(),
            len: record.len(),
            origin: item.and_then(|i| i.origin),
            right_origin: item.and_then(|i| i.right_origin),
            parent: item.and_then(|i| i.parent.as_ref()).map(|p| match p {
                Parent::Root(name) => name.clone(),
                Parent::Item(id) => id.to_string(),
            }),
            parent_sub: item.and_then(|i| i.parent_sub.clone()),
            content_type: item.map(|i| content_type(&i.content)),
            content: item.map(|i| i.content.values()).unwrap_or_default(),
            deleted: ds.is_deleted(record.id()),
        }
    }
}

fn content_type(content: &ItemContent) -> &'static str {
    match content {
        ItemContent::Deleted(_) => "deleted",
        ItemContent::Json(_) => "json",
        ItemContent::Binary(_) => "binary",
        ItemContent::String(_) => "string",
        ItemContent::Embed(_) => "embed",
        ItemContent::Format { .. } => "format",
        ItemContent::Type(_) => "type",
        ItemContent::Any(_) => "any",
        ItemContent::Doc { .. } => "doc",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateReport {
    pub index: usize,
    pub origin: Origin,
    pub hex: String,
    pub records: Vec<RecordReport>,
    pub delete_set: Vec<DeleteEntry>,
}

impl UpdateReport {
    fn new(index: usize, entry: &UpdateEntry) -> Self {
        let update = &entry.update;
        Self {
            index,
            origin: entry.origin,
            hex: to_hex(&update.encoded),
            records: update
                .records
                .iter()
                .map(|r| RecordReport::new(r, &update.delete_set))
                .collect(),
            delete_set: update.delete_set.to_range_list(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionReport {
    pub insertions: Vec<DeleteEntry>,
    pub deletions: Vec<DeleteEntry>,
}

impl From<&StackItem> for ActionReport {
    fn from(item: &StackItem) -> Self {
        Self {
            insertions: item.insertions.to_range_list(),
            deletions: item.deletions.to_range_list(),
        }
    }
}

/// Everything the inspector knows, ready for `serde_json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chains: Option<Vec<Vec<RecordReport>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structs: Option<Vec<RecordReport>>,
    pub delete_set: Vec<DeleteEntry>,
    pub state_vector: Vec<StateVectorEntry>,
    pub missing: Vec<Id>,
    pub unresolved: Vec<UnresolvedOrigin>,
    pub undo_stack: Vec<ActionReport>,
    pub redo_stack: Vec<ActionReport>,
    pub updates: Vec<UpdateReport>,
}

impl Report {
    /// Chains or a flat struct list, depending on `group_structs`. Both are
    /// built from the expanded structs.
    pub fn build(inspector: &Inspector) -> Self {
        let ds = inspector.current_delete_set();
        let structs = inspector.expanded_structs();
        let graph = ChainGraph::build(&structs);
        let describe = |records: &[&Record]| -> Vec<RecordReport> {
            records.iter().map(|r| RecordReport::new(r, ds)).collect()
        };
        let (chains, flat) = if inspector.config().group_structs {
            let chains = graph.chains().iter().map(|c| describe(c.as_slice())).collect();
            (Some(chains), None)
        } else {
            let all: Vec<&Record> = structs.iter().collect();
            (None, Some(describe(&all)))
        };
        Self {
            chains,
            structs: flat,
            delete_set: ds.to_range_list(),
            state_vector: inspector.current_state_vector().entries(),
            missing: diff_against(&structs, inspector.current_state_vector()),
            unresolved: graph.unresolved().to_vec(),
            undo_stack: inspector.undo_stack().iter().map(ActionReport::from).collect(),
            redo_stack: inspector.redo_stack().iter().map(ActionReport::from).collect(),
            updates: inspector
                .updates()
                .iter()
                .enumerate()
                .map(|(i, entry)| UpdateReport::new(i, entry))
                .collect(),
        }
    }
}
