//! Binary codec for the v1 update format.
//!
//! An update is a structs section (records grouped per replica, replicas in
//! descending order) followed by a delete-set section. State vectors use
//! their own small encoding.

mod decoder;
mod encoder;

pub use decoder::{DecodeError, Decoder};
pub use encoder::{normalize, Encoder};

use crate::delete_set::DeleteSet;
use crate::record::Record;
use crate::state_vector::StateVector;

pub(crate) const REF_MASK: u8 = 0b0001_1111;
pub(crate) const REF_GC: u8 = 0;
pub(crate) const REF_SKIP: u8 = 10;
pub(crate) const BIT_ORIGIN: u8 = 0b1000_0000;
pub(crate) const BIT_RIGHT_ORIGIN: u8 = 0b0100_0000;
pub(crate) const BIT_PARENT_SUB: u8 = 0b0010_0000;

/// One successfully decoded update, with the bytes it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedUpdate {
    pub records: Vec<Record>,
    pub delete_set: DeleteSet,
    pub encoded: Vec<u8>,
}

impl DecodedUpdate {
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let (records, delete_set) = decode_update(data)?;
        Ok(Self {
            records,
            delete_set,
            encoded: data.to_vec(),
        })
    }
}

pub fn decode_update(data: &[u8]) -> Result<(Vec<Record>, DeleteSet), DecodeError> {
    Decoder::new().decode_update(data)
}

pub fn encode_update(records: &[Record], delete_set: &DeleteSet) -> Vec<u8> {
    Encoder::new().encode_update(records, delete_set)
}

pub fn decode_state_vector(data: &[u8]) -> Result<StateVector, DecodeError> {
    Decoder::new().decode_state_vector(data)
}

pub fn encode_state_vector(sv: &StateVector) -> Vec<u8> {
    Encoder::new().encode_state_vector(sv)
}

/// Combines several updates into one.
///
/// Records are unioned and normalized, delete-sets are merged. Fails on the
/// first malformed input.
pub fn merge_updates<T: AsRef<[u8]>>(updates: &[T]) -> Result<Vec<u8>, DecodeError> {
    let mut records = Vec::new();
    let mut delete_set = DeleteSet::new();
    for update in updates {
        let (mut decoded, ds) = decode_update(update.as_ref())?;
        records.append(&mut decoded);
        delete_set.merge_in(&ds);
    }
    Ok(encode_update(&records, &delete_set))
}
