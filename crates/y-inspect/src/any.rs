//! lib0 `any` values: the self-describing payload format used by
//! `ContentAny` items and subdocument options.

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};
use y_inspect_buffers::{Reader, Writer};

use crate::codec::DecodeError;

/// Deepest array/object nesting accepted while decoding.
pub const MAX_DEPTH: usize = 256;

mod tag {
    pub const UNDEFINED: u8 = 127;
    pub const NULL: u8 = 126;
    pub const INTEGER: u8 = 125;
    pub const FLOAT32: u8 = 124;
    pub const FLOAT64: u8 = 123;
    pub const BIGINT: u8 = 122;
    pub const FALSE: u8 = 121;
    pub const TRUE: u8 = 120;
    pub const STRING: u8 = 119;
    pub const OBJECT: u8 = 118;
    pub const ARRAY: u8 = 117;
    pub const BUFFER: u8 = 116;
}

/// A decoded lib0 value.
///
/// The numeric variants keep the wire tag they were read with, so writing a
/// decoded value reproduces the original bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Any {
    Undefined,
    Null,
    Bool(bool),
    Integer(i64),
    Float32(f32),
    Float64(f64),
    BigInt(i64),
    String(String),
    Buffer(Vec<u8>),
    Array(Vec<Any>),
    Map(IndexMap<String, Any>),
}

impl Any {
    pub(crate) fn read(r: &mut Reader<'_>) -> Result<Any, DecodeError> {
        Self::read_nested(r, 0)
    }

    fn read_nested(r: &mut Reader<'_>, depth: usize) -> Result<Any, DecodeError> {
        if depth > MAX_DEPTH {
            return Err(DecodeError::TooDeep);
        }
        let t = r.u8()?;
        let value = match t {
            tag::UNDEFINED => Any::Undefined,
            tag::NULL => Any::Null,
            tag::INTEGER => Any::Integer(r.var_int()?),
            tag::FLOAT32 => Any::Float32(r.f32()?),
            tag::FLOAT64 => Any::Float64(r.f64()?),
            tag::BIGINT => Any::BigInt(r.i64()?),
            tag::FALSE => Any::Bool(false),
            tag::TRUE => Any::Bool(true),
            tag::STRING => Any::String(r.var_string()?.to_owned()),
            tag::OBJECT => {
                let len = r.var_len()?;
                let mut map = IndexMap::new();
                // A repeated key overwrites in place, like a JS object.
                for _ in 0..len {
                    let key = r.var_string()?.to_owned();
                    let value = Self::read_nested(r, depth + 1)?;
                    map.insert(key, value);
                }
                Any::Map(map)
            }
            tag::ARRAY => {
                let len = r.var_len()?;
                let mut items = Vec::new();
                for _ in 0..len {
                    items.push(Self::read_nested(r, depth + 1)?);
                }
                Any::Array(items)
            }
            tag::BUFFER => Any::Buffer(r.var_buf()?.to_vec()),
            other => return Err(DecodeError::UnknownAnyTag(other)),
        };
        Ok(value)
    }

    pub(crate) fn write(&self, w: &mut Writer) {
        match self {
            Any::Undefined => w.u8(tag::UNDEFINED),
            Any::Null => w.u8(tag::NULL),
            Any::Bool(false) => w.u8(tag::FALSE),
            Any::Bool(true) => w.u8(tag::TRUE),
            Any::Integer(n) => {
                w.u8(tag::INTEGER);
                w.var_int(*n);
            }
            Any::Float32(n) => {
                w.u8(tag::FLOAT32);
                w.f32(*n);
            }
            Any::Float64(n) => {
                w.u8(tag::FLOAT64);
                w.f64(*n);
            }
            Any::BigInt(n) => {
                w.u8(tag::BIGINT);
                w.i64(*n);
            }
            Any::String(s) => {
                w.u8(tag::STRING);
                w.var_string(s);
            }
            Any::Map(map) => {
                w.u8(tag::OBJECT);
                w.var_uint(map.len() as u64);
                for (key, value) in map {
                    w.var_string(key);
                    value.write(w);
                }
            }
            Any::Array(items) => {
                w.u8(tag::ARRAY);
                w.var_uint(items.len() as u64);
                for item in items {
                    item.write(w);
                }
            }
            Any::Buffer(buf) => {
                w.u8(tag::BUFFER);
                w.var_buf(buf);
            }
        }
    }

    /// Converts to JSON for display. `undefined` becomes `null` and byte
    /// buffers become arrays of numbers.
    pub fn to_json(&self) -> Value {
        Value::from(self)
    }
}

impl From<&Any> for Value {
    fn from(any: &Any) -> Self {
        match any {
            Any::Undefined | Any::Null => Value::Null,
            Any::Bool(b) => Value::Bool(*b),
            Any::Integer(n) | Any::BigInt(n) => Value::Number((*n).into()),
            Any::Float32(n) => float(*n as f64),
            Any::Float64(n) => float(*n),
            Any::String(s) => Value::String(s.clone()),
            Any::Buffer(buf) => Value::Array(buf.iter().map(|b| Value::from(*b)).collect()),
            Any::Array(items) => Value::Array(items.iter().map(Value::from).collect()),
            Any::Map(map) => {
                let mut out = Map::new();
                for (key, value) in map {
                    out.insert(key.clone(), Value::from(value));
                }
                Value::Object(out)
            }
        }
    }
}

fn float(n: f64) -> Value {
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

impl From<&str> for Any {
    fn from(s: &str) -> Self {
        Any::String(s.to_owned())
    }
}

impl From<String> for Any {
    fn from(s: String) -> Self {
        Any::String(s)
    }
}

impl From<bool> for Any {
    fn from(b: bool) -> Self {
        Any::Bool(b)
    }
}

impl From<i64> for Any {
    fn from(n: i64) -> Self {
        Any::Integer(n)
    }
}

impl From<f64> for Any {
    fn from(n: f64) -> Self {
        Any::Float64(n)
    }
}
