//! Item payloads.
//!
//! Each [`ItemContent`] variant corresponds to one content ref number in the
//! struct info byte. Content length determines how many clock slots the
//! owning item occupies; string lengths count UTF-16 code units.

use serde_json::{json, Value};
use y_inspect_buffers::{Reader, Writer};

use crate::any::Any;
use crate::codec::DecodeError;

pub const CONTENT_DELETED: u8 = 1;
pub const CONTENT_JSON: u8 = 2;
pub const CONTENT_BINARY: u8 = 3;
pub const CONTENT_STRING: u8 = 4;
pub const CONTENT_EMBED: u8 = 5;
pub const CONTENT_FORMAT: u8 = 6;
pub const CONTENT_TYPE: u8 = 7;
pub const CONTENT_ANY: u8 = 8;
pub const CONTENT_DOC: u8 = 9;

/// Shared type carried by a `ContentType` item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Array,
    Map,
    Text,
    XmlElement(String),
    XmlFragment,
    XmlHook(String),
    XmlText,
}

impl TypeRef {
    fn number(&self) -> u64 {
        match self {
            TypeRef::Array => 0,
            TypeRef::Map => 1,
            TypeRef::Text => 2,
            TypeRef::XmlElement(_) => 3,
            TypeRef::XmlFragment => 4,
            TypeRef::XmlHook(_) => 5,
            TypeRef::XmlText => 6,
        }
    }

    fn read(r: &mut Reader<'_>) -> Result<TypeRef, DecodeError> {
        let type_ref = match r.var_uint()? {
            0 => TypeRef::Array,
            1 => TypeRef::Map,
            2 => TypeRef::Text,
            3 => TypeRef::XmlElement(r.var_string()?.to_owned()),
            4 => TypeRef::XmlFragment,
            5 => TypeRef::XmlHook(r.var_string()?.to_owned()),
            6 => TypeRef::XmlText,
            other => return Err(DecodeError::UnknownTypeRef(other)),
        };
        Ok(type_ref)
    }

    fn write(&self, w: &mut Writer) {
        w.var_uint(self.number());
        if let TypeRef::XmlElement(name) | TypeRef::XmlHook(name) = self {
            w.var_string(name);
        }
    }

    /// Display name of the shared type (`YMap`, `YXmlElement(p)`, ...).
    pub fn name(&self) -> String {
        match self {
            TypeRef::Array => "YArray".to_string(),
            TypeRef::Map => "YMap".to_string(),
            TypeRef::Text => "YText".to_string(),
            TypeRef::XmlElement(name) => format!("YXmlElement({name})"),
            TypeRef::XmlFragment => "YXmlFragment".to_string(),
            TypeRef::XmlHook(name) => format!("YXmlHook({name})"),
            TypeRef::XmlText => "YXmlText".to_string(),
        }
    }
}

/// Payload of an item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemContent {
    /// Content of a deleted item whose payload was discarded.
    Deleted(u64),
    /// JSON-encoded values, kept as their source strings (`"undefined"` is
    /// a legal entry).
    Json(Vec<String>),
    Binary(Vec<u8>),
    String(String),
    /// JSON-encoded embed.
    Embed(String),
    /// Formatting attribute; the value is JSON-encoded.
    Format { key: String, value: String },
    Type(TypeRef),
    Any(Vec<Any>),
    Doc { guid: String, opts: Any },
}

impl ItemContent {
    pub fn ref_number(&self) -> u8 {
        match self {
            ItemContent::Deleted(_) => CONTENT_DELETED,
            ItemContent::Json(_) => CONTENT_JSON,
            ItemContent::Binary(_) => CONTENT_BINARY,
            ItemContent::String(_) => CONTENT_STRING,
            ItemContent::Embed(_) => CONTENT_EMBED,
            ItemContent::Format { .. } => CONTENT_FORMAT,
            ItemContent::Type(_) => CONTENT_TYPE,
            ItemContent::Any(_) => CONTENT_ANY,
            ItemContent::Doc { .. } => CONTENT_DOC,
        }
    }

    /// Number of clock slots this content occupies.
    pub fn len(&self) -> u64 {
        match self {
            ItemContent::Deleted(len) => *len,
            ItemContent::Json(values) => values.len() as u64,
            ItemContent::Any(values) => values.len() as u64,
            ItemContent::String(s) => s.encode_utf16().count() as u64,
            ItemContent::Binary(_)
            | ItemContent::Embed(_)
            | ItemContent::Format { .. }
            | ItemContent::Type(_)
            | ItemContent::Doc { .. } => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the content contributes to the visible length of its parent.
    pub fn is_countable(&self) -> bool {
        !matches!(self, ItemContent::Deleted(_) | ItemContent::Format { .. })
    }

    /// Returns the slots `start..end` as new content.
    ///
    /// Single-slot variants are returned unchanged. Splitting a string
    /// inside a surrogate pair replaces each broken half with U+FFFD.
    pub fn slice(&self, start: u64, end: u64) -> ItemContent {
        let (start, end) = (start as usize, end as usize);
        match self {
            ItemContent::Deleted(_) => ItemContent::Deleted((end - start) as u64),
            ItemContent::Json(values) => ItemContent::Json(values[start..end].to_vec()),
            ItemContent::Any(values) => ItemContent::Any(values[start..end].to_vec()),
            ItemContent::String(s) => {
                let units: Vec<u16> = s.encode_utf16().collect();
                ItemContent::String(String::from_utf16_lossy(&units[start..end]))
            }
            other => other.clone(),
        }
    }

    /// One display value per slot, mirroring `getContent()` of the external
    /// implementation. Deleted and format content have no values.
    pub fn values(&self) -> Vec<Value> {
        match self {
            ItemContent::Deleted(_) | ItemContent::Format { .. } => Vec::new(),
            ItemContent::Json(values) => values.iter().map(|s| parse_json(s)).collect(),
            ItemContent::Any(values) => values.iter().map(Any::to_json).collect(),
            ItemContent::String(s) => {
                let units: Vec<u16> = s.encode_utf16().collect();
                units
                    .chunks(1)
                    .map(|unit| Value::String(String::from_utf16_lossy(unit)))
                    .collect()
            }
            ItemContent::Binary(buf) => vec![Any::Buffer(buf.clone()).to_json()],
            ItemContent::Embed(embed) => vec![parse_json(embed)],
            ItemContent::Type(type_ref) => vec![Value::String(type_ref.name())],
            ItemContent::Doc { guid, .. } => vec![json!({ "guid": guid })],
        }
    }

    pub(crate) fn read(r: &mut Reader<'_>, content_ref: u8) -> Result<ItemContent, DecodeError> {
        let content = match content_ref {
            CONTENT_DELETED => ItemContent::Deleted(r.var_uint()?),
            CONTENT_JSON => {
                let len = r.var_len()?;
                let mut values = Vec::new();
                for _ in 0..len {
                    values.push(r.var_string()?.to_owned());
                }
                ItemContent::Json(values)
            }
            CONTENT_BINARY => ItemContent::Binary(r.var_buf()?.to_vec()),
            CONTENT_STRING => ItemContent::String(r.var_string()?.to_owned()),
            CONTENT_EMBED => ItemContent::Embed(r.var_string()?.to_owned()),
            CONTENT_FORMAT => ItemContent::Format {
                key: r.var_string()?.to_owned(),
                value: r.var_string()?.to_owned(),
            },
            CONTENT_TYPE => ItemContent::Type(TypeRef::read(r)?),
            CONTENT_ANY => {
                let len = r.var_len()?;
                let mut values = Vec::new();
                for _ in 0..len {
                    values.push(Any::read(r)?);
                }
                ItemContent::Any(values)
            }
            CONTENT_DOC => ItemContent::Doc {
                guid: r.var_string()?.to_owned(),
                opts: Any::read(r)?,
            },
            other => return Err(DecodeError::UnknownContentRef(other)),
        };
        Ok(content)
    }

    pub(crate) fn write(&self, w: &mut Writer) {
        match self {
            ItemContent::Deleted(len) => w.var_uint(*len),
            ItemContent::Json(values) => {
                w.var_uint(values.len() as u64);
                for value in values {
                    w.var_string(value);
                }
            }
            ItemContent::Binary(buf) => w.var_buf(buf),
            ItemContent::String(s) | ItemContent::Embed(s) => w.var_string(s),
            ItemContent::Format { key, value } => {
                w.var_string(key);
                w.var_string(value);
            }
            ItemContent::Type(type_ref) => type_ref.write(w),
            ItemContent::Any(values) => {
                w.var_uint(values.len() as u64);
                for value in values {
                    value.write(w);
                }
            }
            ItemContent::Doc { guid, opts } => {
                w.var_string(guid);
                opts.write(w);
            }
        }
    }
}

fn parse_json(s: &str) -> Value {
    if s == "undefined" {
        return Value::Null;
    }
    serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_owned()))
}
