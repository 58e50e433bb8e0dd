//! Undo/redo action log.
//!
//! An [`ActionLog`] groups observed updates into actions. Each action is a
//! [`StackItem`]: the clock ranges it inserted and the ranges it deleted.
//! Undoing an action marks its insertions deleted and restores its
//! deletions; the inverse action then lands on the redo stack.
//!
//! The log never touches document state itself. Replays go through an
//! [`UndoTarget`], which decides what "delete" and "restore" mean.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::codec::DecodedUpdate;
use crate::delete_set::DeleteSet;
use crate::record::Record;

/// Where an update came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    #[default]
    Local,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActionLogError {
    #[error("an action is already being recorded")]
    AlreadyRecording,
    #[error("no action is being recorded")]
    NotRecording,
}

/// Net effect of one action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackItem {
    pub insertions: DeleteSet,
    pub deletions: DeleteSet,
}

impl StackItem {
    pub fn is_empty(&self) -> bool {
        self.insertions.is_empty() && self.deletions.is_empty()
    }

    /// The action that cancels this one.
    pub fn inverse(&self) -> StackItem {
        StackItem {
            insertions: self.deletions.clone(),
            deletions: self.insertions.clone(),
        }
    }

    fn absorb(&mut self, records: &[Record], deletions: &DeleteSet) {
        for item in records.iter().filter_map(Record::as_item) {
            self.insertions.insert(item.id, item.len());
        }
        self.deletions.merge_in(deletions);
    }
}

/// Applies replayed actions to a document.
pub trait UndoTarget {
    /// Marks every range of `ds` deleted.
    fn delete(&mut self, ds: &DeleteSet);
    /// Brings every range of `ds` back.
    fn restore(&mut self, ds: &DeleteSet);
}

/// How an entry reached a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
    /// A new action: goes to undo and discards redo.
    Fresh,
    /// The inverse of an undone action: goes to redo.
    Undo,
    /// The inverse of a redone action: goes back to undo, redo is kept.
    Redo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Recording,
}

#[derive(Debug, Clone)]
pub struct ActionLog {
    state: State,
    pending: StackItem,
    undo: Vec<StackItem>,
    redo: Vec<StackItem>,
    ignore_remote_changes: bool,
}

impl ActionLog {
    pub fn new(ignore_remote_changes: bool) -> Self {
        Self {
            state: State::Idle,
            pending: StackItem::default(),
            undo: Vec::new(),
            redo: Vec::new(),
            ignore_remote_changes,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.state == State::Recording
    }

    /// Whether updates from `origin` are captured.
    pub fn tracks(&self, origin: Origin) -> bool {
        origin == Origin::Local || !self.ignore_remote_changes
    }

    /// Starts grouping observed updates into one action.
    pub fn begin_capture(&mut self) -> Result<(), ActionLogError> {
        if self.is_recording() {
            return Err(ActionLogError::AlreadyRecording);
        }
        trace!("action log: idle -> recording");
        self.state = State::Recording;
        Ok(())
    }

    /// Feeds one accepted update to the log. Returns whether it was tracked.
    ///
    /// While recording, a tracked update extends the pending action. While
    /// idle, it forms an action on its own.
    pub fn observe(&mut self, update: &DecodedUpdate, origin: Origin) -> bool {
        if !self.tracks(origin) {
            trace!(?origin, "action log: update ignored");
            return false;
        }
        self.pending.absorb(&update.records, &update.delete_set);
        if self.state == State::Idle {
            self.close_pending();
        }
        true
    }

    /// Ends the current capture. Returns whether an action was pushed;
    /// captures that saw no tracked change are discarded.
    pub fn flush(&mut self) -> Result<bool, ActionLogError> {
        if !self.is_recording() {
            return Err(ActionLogError::NotRecording);
        }
        trace!("action log: recording -> idle");
        self.state = State::Idle;
        Ok(self.close_pending())
    }

    fn close_pending(&mut self) -> bool {
        let entry = std::mem::take(&mut self.pending);
        if entry.is_empty() {
            return false;
        }
        self.push(entry, Replay::Fresh);
        true
    }

    /// Pushes an entry according to how it was produced.
    pub fn push(&mut self, entry: StackItem, replay: Replay) {
        match replay {
            Replay::Fresh => {
                self.undo.push(entry);
                self.redo.clear();
            }
            Replay::Undo => self.redo.push(entry),
            Replay::Redo => self.undo.push(entry),
        }
        trace!(?replay, undo = self.undo.len(), redo = self.redo.len(), "action log: pushed");
    }

    /// Reverts the latest action. Any capture in progress is flushed first.
    ///
    /// Returns the reverted entry, or `None` when there is nothing to undo.
    pub fn undo(&mut self, target: &mut impl UndoTarget) -> Option<StackItem> {
        self.settle();
        let entry = self.undo.pop()?;
        apply(&entry, target);
        self.push(entry.inverse(), Replay::Undo);
        Some(entry)
    }

    /// Re-applies the latest undone action. See [`ActionLog::undo`].
    pub fn redo(&mut self, target: &mut impl UndoTarget) -> Option<StackItem> {
        self.settle();
        let entry = self.redo.pop()?;
        apply(&entry, target);
        self.push(entry.inverse(), Replay::Redo);
        Some(entry)
    }

    fn settle(&mut self) {
        if self.is_recording() {
            self.state = State::Idle;
            self.close_pending();
        }
    }

    pub fn undo_stack(&self) -> &[StackItem] {
        &self.undo
    }

    pub fn redo_stack(&self) -> &[StackItem] {
        &self.redo
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new(true)
    }
}

fn apply(entry: &StackItem, target: &mut impl UndoTarget) {
    target.delete(&entry.insertions);
    target.restore(&entry.deletions);
}
