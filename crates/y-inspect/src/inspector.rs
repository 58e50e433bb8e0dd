//! Inspector session: the owned aggregate view of a replicated document.
//!
//! Every accepted update is merged into the encoded state, which is then
//! decoded again in full. The struct list, delete set and state vector are
//! always derived from that one merged update, so a rejected update can
//! never leave them half-applied.

use thiserror::Error;
use tracing::{debug, warn};

use crate::chain::group_into_chains;
use crate::codec::{self, DecodeError, DecodedUpdate};
use crate::config::InspectorConfig;
use crate::content::ItemContent;
use crate::delete_set::DeleteSet;
use crate::gc::collect_deleted;
use crate::hex::{from_hex, HexError};
use crate::id::Id;
use crate::record::{expand_all, Record};
use crate::state_vector::{diff_against, StateVector};
use crate::undo::{ActionLog, ActionLogError, Origin, StackItem, UndoTarget};

#[derive(Debug, Error)]
pub enum InspectorError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Hex(#[from] HexError),
    #[error(transparent)]
    ActionLog(#[from] ActionLogError),
}

/// One accepted update, as received.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateEntry {
    pub update: DecodedUpdate,
    pub origin: Origin,
}

/// Undo/redo effects layered over the replicated delete set.
#[derive(Debug, Clone, Default)]
struct Overlay {
    deleted: DeleteSet,
    restored: DeleteSet,
}

impl UndoTarget for Overlay {
    fn delete(&mut self, ds: &DeleteSet) {
        self.deleted.merge_in(ds);
        self.restored = self.restored.subtract(ds);
    }

    fn restore(&mut self, ds: &DeleteSet) {
        self.restored.merge_in(ds);
        self.deleted = self.deleted.subtract(ds);
    }
}

#[derive(Debug, Clone)]
pub struct Inspector {
    config: InspectorConfig,
    updates: Vec<UpdateEntry>,
    encoded_state: Vec<u8>,
    /// Records of the merged state, as decoded.
    structs: Vec<Record>,
    /// `structs` after the gc setting is applied.
    view: Vec<Record>,
    replicated: DeleteSet,
    overlay: Overlay,
    delete_set: DeleteSet,
    state_vector: StateVector,
    log: ActionLog,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new(InspectorConfig::default())
    }
}

impl Inspector {
    pub fn new(config: InspectorConfig) -> Self {
        let log = ActionLog::new(config.ignore_remote_changes);
        Self {
            config,
            updates: Vec::new(),
            encoded_state: codec::encode_update(&[], &DeleteSet::new()),
            structs: Vec::new(),
            view: Vec::new(),
            replicated: DeleteSet::new(),
            overlay: Overlay::default(),
            delete_set: DeleteSet::new(),
            state_vector: StateVector::new(),
            log,
        }
    }

    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }

    // ──────────────────────────────────────────────────────────────────────
    // Update intake
    // ──────────────────────────────────────────────────────────────────────

    /// Accepts one update. On error nothing changes.
    pub fn on_update(&mut self, bytes: &[u8], origin: Origin) -> Result<(), InspectorError> {
        let update = DecodedUpdate::decode(bytes).inspect_err(|e| {
            warn!(error = %e, len = bytes.len(), ?origin, "rejected update");
        })?;
        let merged = codec::merge_updates(&[self.encoded_state.as_slice(), bytes])?;
        let (structs, merged_ds) = codec::decode_update(&merged)?;

        let mut replicated = merged_ds;
        for record in &structs {
            match record {
                Record::Gc { id, len } => replicated.insert(*id, *len),
                Record::Item(item) if matches!(item.content, ItemContent::Deleted(_)) => {
                    replicated.insert(item.id, item.len())
                }
                _ => {}
            }
        }
        let mut state_vector = StateVector::from_records(&structs);
        state_vector.merge_in(&self.state_vector);

        debug!(
            index = self.updates.len(),
            ?origin,
            records = update.records.len(),
            total_records = structs.len(),
            deleted = replicated.deleted_count(),
            "accepted update"
        );

        let tracked = self.log.observe(&update, origin);
        if tracked {
            debug!(undo = self.log.undo_stack().len(), "update captured for undo");
        }
        self.updates.push(UpdateEntry { update, origin });
        self.encoded_state = merged;
        self.structs = structs;
        self.replicated = replicated;
        self.state_vector = state_vector;
        self.refresh();
        Ok(())
    }

    /// Accepts one update given as a hex transcript.
    pub fn on_update_hex(&mut self, hex: &str, origin: Origin) -> Result<(), InspectorError> {
        let bytes = from_hex(hex)?;
        self.on_update(&bytes, origin)
    }

    /// Recomputes the delete set and struct view after any change.
    fn refresh(&mut self) {
        self.delete_set = self
            .replicated
            .merge(&self.overlay.deleted)
            .subtract(&self.overlay.restored);
        self.view = if self.config.gc {
            collect_deleted(&self.structs, &self.delete_set)
        } else {
            self.structs.clone()
        };
    }

    // ──────────────────────────────────────────────────────────────────────
    // Action log
    // ──────────────────────────────────────────────────────────────────────

    /// Groups the following updates into one undoable action.
    pub fn begin_capture(&mut self) -> Result<(), InspectorError> {
        Ok(self.log.begin_capture()?)
    }

    /// Closes the action opened by [`Inspector::begin_capture`].
    pub fn end_capture(&mut self) -> Result<bool, InspectorError> {
        Ok(self.log.flush()?)
    }

    pub fn undo(&mut self) -> Option<StackItem> {
        let entry = self.log.undo(&mut self.overlay)?;
        self.refresh();
        Some(entry)
    }

    pub fn redo(&mut self) -> Option<StackItem> {
        let entry = self.log.redo(&mut self.overlay)?;
        self.refresh();
        Some(entry)
    }

    pub fn undo_stack(&self) -> &[StackItem] {
        self.log.undo_stack()
    }

    pub fn redo_stack(&self) -> &[StackItem] {
        self.log.redo_stack()
    }

    pub fn can_undo(&self) -> bool {
        self.log.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.log.can_redo()
    }

    // ──────────────────────────────────────────────────────────────────────
    // Queries
    // ──────────────────────────────────────────────────────────────────────

    pub fn current_structs(&self) -> &[Record] {
        &self.view
    }

    /// Current structs as unit-length records.
    pub fn expanded_structs(&self) -> Vec<Record> {
        expand_all(&self.view)
    }

    pub fn current_delete_set(&self) -> &DeleteSet {
        &self.delete_set
    }

    pub fn current_state_vector(&self) -> &StateVector {
        &self.state_vector
    }

    /// The merged update holding everything accepted so far.
    pub fn encoded_state(&self) -> &[u8] {
        &self.encoded_state
    }

    pub fn updates(&self) -> &[UpdateEntry] {
        &self.updates
    }

    pub fn is_deleted(&self, id: Id) -> bool {
        self.delete_set.is_deleted(id)
    }

    /// Expanded structs grouped into causal chains, one unit per slot.
    pub fn group_into_chains(&self) -> Vec<Vec<Record>> {
        group_into_chains(&self.expanded_structs())
    }

    /// Ids of expanded structs the state vector does not cover yet.
    pub fn missing_from_state_vector(&self) -> Vec<Id> {
        diff_against(&self.expanded_structs(), &self.state_vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_update;
    use crate::id::id;
    use crate::record::{Item, Parent};

    fn text(client: u64, clock: u64, origin: Option<Id>, s: &str) -> Record {
        Record::Item(Item {
            id: id(client, clock),
            origin,
            right_origin: None,
            parent: origin.is_none().then(|| Parent::Root("t".into())),
            parent_sub: None,
            has_parent_sub: false,
            content: ItemContent::String(s.into()),
        })
    }

    fn update(records: &[Record], deletes: &[(u64, u64, u64)]) -> Vec<u8> {
        let ds: DeleteSet = deletes.iter().map(|&(c, clock, len)| (id(c, clock), len)).collect();
        encode_update(records, &ds)
    }

    #[test]
    fn aggregates_follow_accepted_updates() {
        let mut inspector = Inspector::default();
        inspector.on_update(&update(&[text(1, 0, None, "abc")], &[]), Origin::Local).unwrap();
        inspector
            .on_update(&update(&[text(1, 3, Some(id(1, 2)), "d")], &[(1, 1, 1)]), Origin::Local)
            .unwrap();
        assert_eq!(inspector.current_structs().len(), 2);
        assert_eq!(inspector.current_state_vector().get(1), 4);
        assert!(inspector.is_deleted(id(1, 1)));
        assert!(!inspector.is_deleted(id(1, 3)));
        assert_eq!(inspector.updates().len(), 2);
        assert_eq!(inspector.group_into_chains().len(), 1);
        assert!(inspector.missing_from_state_vector().is_empty());
    }

    #[test]
    fn chains_show_the_unit_an_insert_hangs_from() {
        let mut inspector = Inspector::default();
        inspector.on_update(&update(&[text(1, 0, None, "abc")], &[]), Origin::Local).unwrap();
        inspector
            .on_update(&update(&[text(2, 0, Some(id(1, 1)), "x")], &[]), Origin::Remote)
            .unwrap();
        let chains = inspector.group_into_chains();
        assert_eq!(chains.len(), 1);
        let ids: Vec<Id> = chains[0].iter().map(Record::id).collect();
        assert_eq!(ids, vec![id(1, 0), id(1, 1), id(2, 0), id(1, 2)]);
        assert!(chains[0].iter().all(|unit| unit.len() == 1));
    }

    #[test]
    fn malformed_update_changes_nothing() {
        let mut inspector = Inspector::default();
        inspector.on_update(&update(&[text(1, 0, None, "ab")], &[]), Origin::Local).unwrap();
        let state = inspector.encoded_state().to_vec();
        let err = inspector.on_update(&[1, 1, 1], Origin::Local).unwrap_err();
        assert!(matches!(err, InspectorError::Decode(DecodeError::UnexpectedEof)));
        assert_eq!(inspector.encoded_state(), state.as_slice());
        assert_eq!(inspector.updates().len(), 1);
        assert_eq!(inspector.undo_stack().len(), 1);
    }

    #[test]
    fn gap_is_flagged_missing_until_filled() {
        let mut inspector = Inspector::default();
        inspector
            .on_update(&update(&[text(2, 3, Some(id(2, 2)), "z")], &[]), Origin::Remote)
            .unwrap();
        assert_eq!(inspector.missing_from_state_vector(), vec![id(2, 3)]);
        assert!(!inspector.current_state_vector().contains_client(2));
        inspector.on_update(&update(&[text(2, 0, None, "xyz")], &[]), Origin::Remote).unwrap();
        assert_eq!(inspector.current_state_vector().get(2), 4);
        assert!(inspector.missing_from_state_vector().is_empty());
    }

    #[test]
    fn undo_then_redo_round_trips_the_delete_set() {
        let mut inspector = Inspector::default();
        inspector.on_update(&update(&[text(1, 0, None, "abc")], &[]), Origin::Local).unwrap();
        inspector.on_update(&update(&[], &[(1, 0, 2)]), Origin::Local).unwrap();
        let before_undo = inspector.current_delete_set().clone();

        inspector.undo().unwrap();
        assert!(inspector.current_delete_set().is_empty());
        inspector.undo().unwrap();
        assert_eq!(inspector.current_delete_set().ranges(1).len(), 1);
        assert_eq!(inspector.current_delete_set().ranges(1)[0].len, 3);
        assert!(inspector.undo().is_none());

        inspector.redo().unwrap();
        inspector.redo().unwrap();
        assert_eq!(inspector.current_delete_set(), &before_undo);
        assert!(inspector.redo().is_none());
    }

    #[test]
    fn remote_updates_stay_out_of_history_by_default() {
        let mut inspector = Inspector::default();
        inspector.on_update(&update(&[text(9, 0, None, "r")], &[]), Origin::Remote).unwrap();
        assert!(!inspector.can_undo());

        let config = InspectorConfig {
            ignore_remote_changes: false,
            ..InspectorConfig::default()
        };
        let mut tracking = Inspector::new(config);
        tracking.on_update(&update(&[text(9, 0, None, "r")], &[]), Origin::Remote).unwrap();
        assert!(tracking.can_undo());
    }

    #[test]
    fn capture_groups_updates_into_one_action() {
        let mut inspector = Inspector::default();
        inspector.begin_capture().unwrap();
        inspector.on_update(&update(&[text(1, 0, None, "a")], &[]), Origin::Local).unwrap();
        inspector
            .on_update(&update(&[text(1, 1, Some(id(1, 0)), "b")], &[]), Origin::Local)
            .unwrap();
        assert!(matches!(
            inspector.begin_capture(),
            Err(InspectorError::ActionLog(ActionLogError::AlreadyRecording))
        ));
        assert!(inspector.end_capture().unwrap());
        assert_eq!(inspector.undo_stack().len(), 1);
    }

    #[test]
    fn gc_view_tombstones_deleted_content() {
        let config = InspectorConfig {
            gc: true,
            ..InspectorConfig::default()
        };
        let mut inspector = Inspector::new(config);
        inspector
            .on_update(&update(&[text(1, 0, None, "abc")], &[(1, 1, 1)]), Origin::Local)
            .unwrap();
        let contents: Vec<ItemContent> = inspector
            .current_structs()
            .iter()
            .filter_map(|r| r.as_item().map(|i| i.content.clone()))
            .collect();
        assert_eq!(
            contents,
            vec![
                ItemContent::String("a".into()),
                ItemContent::Deleted(1),
                ItemContent::String("c".into()),
            ]
        );
        assert_eq!(inspector.expanded_structs().len(), 3);
    }

    #[test]
    fn hex_input_is_validated_first() {
        let mut inspector = Inspector::default();
        let err = inspector.on_update_hex("0", Origin::Local).unwrap_err();
        assert!(matches!(err, InspectorError::Hex(HexError::OddLength(1))));
        inspector.on_update_hex("0000", Origin::Local).unwrap();
        assert!(inspector.current_structs().is_empty());
    }
}
