//! Update and state-vector decoder (v1 wire format).

use thiserror::Error;
use tracing::trace;
use y_inspect_buffers::{BufferError, Reader};

use crate::content::ItemContent;
use crate::delete_set::DeleteSet;
use crate::id::Id;
use crate::record::{Item, Parent, Record};
use crate::state_vector::StateVector;

use super::{BIT_ORIGIN, BIT_PARENT_SUB, BIT_RIGHT_ORIGIN, REF_GC, REF_MASK, REF_SKIP};

/// Reasons an update or state vector is rejected as malformed.
///
/// Decoding is all-or-nothing: any of these aborts the whole decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed update: unexpected end of input")]
    UnexpectedEof,
    #[error("malformed update: integer out of range")]
    IntegerOutOfRange,
    #[error("malformed update: invalid UTF-8 string")]
    InvalidUtf8,
    #[error("malformed update: unknown struct ref {0}")]
    UnknownStructRef(u8),
    #[error("malformed update: unknown content ref {0}")]
    UnknownContentRef(u8),
    #[error("malformed update: unknown type ref {0}")]
    UnknownTypeRef(u64),
    #[error("malformed update: unknown any tag {0}")]
    UnknownAnyTag(u8),
    #[error("malformed update: zero-length struct at {0}")]
    EmptyStruct(Id),
    #[error("malformed update: value nesting too deep")]
    TooDeep,
    #[error("malformed update: {0} trailing bytes")]
    TrailingBytes(usize),
}

impl From<BufferError> for DecodeError {
    fn from(e: BufferError) -> Self {
        match e {
            BufferError::UnexpectedEof => DecodeError::UnexpectedEof,
            BufferError::IntegerOutOfRange => DecodeError::IntegerOutOfRange,
            BufferError::InvalidUtf8 => DecodeError::InvalidUtf8,
        }
    }
}

/// Update decoder.
pub struct Decoder;

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self
    }

    /// Decodes the records and delete set of one update.
    pub fn decode_update(&self, data: &[u8]) -> Result<(Vec<Record>, DeleteSet), DecodeError> {
        let mut r = Reader::new(data);
        let records = self.read_records(&mut r)?;
        let delete_set = read_delete_set(&mut r)?;
        expect_end(&r)?;
        trace!(records = records.len(), bytes = data.len(), "decoded update");
        Ok((records, delete_set))
    }

    /// Decodes an encoded state vector.
    pub fn decode_state_vector(&self, data: &[u8]) -> Result<StateVector, DecodeError> {
        let mut r = Reader::new(data);
        let count = r.var_uint()?;
        let mut sv = StateVector::new();
        for _ in 0..count {
            let client = r.var_uint()?;
            let clock = r.var_uint()?;
            sv.set(client, clock);
        }
        expect_end(&r)?;
        Ok(sv)
    }

    fn read_records(&self, r: &mut Reader<'_>) -> Result<Vec<Record>, DecodeError> {
        let client_count = r.var_uint()?;
        let mut records = Vec::new();
        for _ in 0..client_count {
            let struct_count = r.var_uint()?;
            let client = r.var_uint()?;
            let mut clock = r.var_uint()?;
            for _ in 0..struct_count {
                let id = Id::new(client, clock);
                let record = self.read_record(r, id)?;
                if record.is_empty() {
                    return Err(DecodeError::EmptyStruct(id));
                }
                clock = clock
                    .checked_add(record.len())
                    .ok_or(DecodeError::IntegerOutOfRange)?;
                records.push(record);
            }
        }
        Ok(records)
    }

    fn read_record(&self, r: &mut Reader<'_>, id: Id) -> Result<Record, DecodeError> {
        let info = r.u8()?;
        let record = match info & REF_MASK {
            REF_GC => Record::Gc { id, len: r.var_uint()? },
            REF_SKIP => Record::Skip { id, len: r.var_uint()? },
            content_ref @ 1..=9 => {
                let origin = if info & BIT_ORIGIN != 0 { Some(read_id(r)?) } else { None };
                let right_origin = if info & BIT_RIGHT_ORIGIN != 0 {
                    Some(read_id(r)?)
                } else {
                    None
                };
                let cant_copy_parent_info = origin.is_none() && right_origin.is_none();
                let parent = if cant_copy_parent_info {
                    Some(if r.var_uint()? == 1 {
                        Parent::Root(r.var_string()?.to_owned())
                    } else {
                        Parent::Item(read_id(r)?)
                    })
                } else {
                    None
                };
                let has_parent_sub = info & BIT_PARENT_SUB != 0;
                let parent_sub = if cant_copy_parent_info && has_parent_sub {
                    Some(r.var_string()?.to_owned())
                } else {
                    None
                };
                let content = ItemContent::read(r, content_ref)?;
                Record::Item(Item {
                    id,
                    origin,
                    right_origin,
                    parent,
                    parent_sub,
                    has_parent_sub,
                    content,
                })
            }
            other => return Err(DecodeError::UnknownStructRef(other)),
        };
        Ok(record)
    }
}

fn read_id(r: &mut Reader<'_>) -> Result<Id, DecodeError> {
    let client = r.var_uint()?;
    let clock = r.var_uint()?;
    Ok(Id::new(client, clock))
}

fn read_delete_set(r: &mut Reader<'_>) -> Result<DeleteSet, DecodeError> {
    let client_count = r.var_uint()?;
    let mut ds = DeleteSet::new();
    for _ in 0..client_count {
        let client = r.var_uint()?;
        let range_count = r.var_uint()?;
        for _ in 0..range_count {
            let clock = r.var_uint()?;
            let len = r.var_uint()?;
            clock.checked_add(len).ok_or(DecodeError::IntegerOutOfRange)?;
            ds.insert(Id::new(client, clock), len);
        }
    }
    Ok(ds)
}

fn expect_end(r: &Reader<'_>) -> Result<(), DecodeError> {
    match r.size() {
        0 => Ok(()),
        n => Err(DecodeError::TrailingBytes(n)),
    }
}
