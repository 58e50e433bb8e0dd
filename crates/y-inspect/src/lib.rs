//! Decoder and causal-structure inspector for Yjs v1 updates.
//!
//! Binary updates are decoded into structural records and a delete set,
//! records are grouped into causal chains along their origin links, and an
//! [`Inspector`] keeps the aggregate delete set, state vector and undo/redo
//! history of a session.
//!
//! ```
//! use y_inspect::{Inspector, Origin};
//!
//! // Replica 1 inserts "ab" into the root text "t".
//! let mut inspector = Inspector::default();
//! inspector.on_update_hex("010101000401017402616200", Origin::Local).unwrap();
//! assert_eq!(inspector.current_state_vector().get(1), 2);
//! ```

pub mod any;
pub mod chain;
pub mod cli;
pub mod codec;
pub mod config;
pub mod content;
pub mod delete_set;
pub mod gc;
pub mod hex;
pub mod id;
pub mod inspector;
pub mod record;
pub mod report;
pub mod state_vector;
pub mod undo;

pub use any::Any;
pub use chain::{group_into_chains, ChainGraph, Side, UnresolvedOrigin};
pub use codec::{
    decode_state_vector, decode_update, encode_state_vector, encode_update, merge_updates,
    DecodeError, DecodedUpdate,
};
pub use config::InspectorConfig;
pub use content::{ItemContent, TypeRef};
pub use delete_set::{DeleteEntry, DeleteRange, DeleteSet};
pub use self::hex::{from_hex, to_hex, HexError};
pub use id::{id, ClientId, Clock, Id};
pub use inspector::{Inspector, InspectorError, UpdateEntry};
pub use record::{expand_all, Item, Parent, Record};
pub use report::Report;
pub use state_vector::{diff_against, StateVector, StateVectorEntry};
pub use undo::{ActionLog, ActionLogError, Origin, Replay, StackItem, UndoTarget};
