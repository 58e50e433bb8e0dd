//! Structural records decoded from an update.
//!
//! A [`Record`] is one of three variants that all occupy a contiguous run of
//! clocks on one replica:
//!
//! - [`Record::Item`]: an insertion carrying content and causal links.
//! - [`Record::Gc`]: a garbage-collected insertion whose content is gone.
//! - [`Record::Skip`]: a clock range whose content was never received.
//!
//! Records are immutable values. Splitting and expansion produce new
//! records and never touch the source.

use crate::content::ItemContent;
use crate::id::{Clock, Id};

/// Where an item lives when it carries no origins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parent {
    /// A root-level shared type, by name.
    Root(String),
    /// A type nested inside the item with this id.
    Item(Id),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: Id,
    /// Slot immediately to the left at insertion time.
    pub origin: Option<Id>,
    /// Slot immediately to the right at insertion time.
    pub right_origin: Option<Id>,
    /// Only present on the wire when both origins are absent.
    pub parent: Option<Parent>,
    /// Map key. Only present on the wire when `parent` is.
    pub parent_sub: Option<String>,
    /// Whether the item sits in a map slot. The wire carries this flag even
    /// when the key itself is inherited from the origin.
    pub has_parent_sub: bool,
    pub content: ItemContent,
}

impl Item {
    pub fn len(&self) -> u64 {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The tail of this item starting `offset` slots in, ending at `end`.
    ///
    /// A slice that does not start at the first slot takes its predecessor
    /// as origin and carries no parent information, exactly like a split
    /// in the external implementation.
    fn slice(&self, start: u64, end: u64) -> Item {
        if start == 0 {
            return Item {
                content: self.content.slice(0, end),
                ..self.clone()
            };
        }
        Item {
            id: self.id.offset(start),
            origin: Some(self.id.offset(start - 1)),
            right_origin: self.right_origin,
            parent: None,
            parent_sub: None,
            has_parent_sub: self.has_parent_sub,
            content: self.content.slice(start, end),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Item(Item),
    Gc { id: Id, len: u64 },
    Skip { id: Id, len: u64 },
}

impl Record {
    pub fn id(&self) -> Id {
        match self {
            Record::Item(item) => item.id,
            Record::Gc { id, .. } | Record::Skip { id, .. } => *id,
        }
    }

    pub fn len(&self) -> u64 {
        match self {
            Record::Item(item) => item.len(),
            Record::Gc { len, .. } | Record::Skip { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First clock past the end of this record.
    pub fn end(&self) -> Clock {
        self.id().clock + self.len()
    }

    /// Whether `id` falls inside this record's clock range.
    pub fn contains(&self, id: Id) -> bool {
        let own = self.id();
        own.client == id.client && own.clock <= id.clock && id.clock < self.end()
    }

    pub fn as_item(&self) -> Option<&Item> {
        match self {
            Record::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Record::Skip { .. })
    }

    /// Short variant label used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Record::Item(_) => "item",
            Record::Gc { .. } => "gc",
            Record::Skip { .. } => "skip",
        }
    }

    /// The slots `start..end` (relative offsets) as a new record.
    ///
    /// # Panics
    ///
    /// Panics if `start >= end` or `end > self.len()`.
    pub fn slice(&self, start: u64, end: u64) -> Record {
        assert!(start < end && end <= self.len(), "slice {start}..{end} out of range");
        match self {
            Record::Item(item) => Record::Item(item.slice(start, end)),
            Record::Gc { id, .. } => Record::Gc {
                id: id.offset(start),
                len: end - start,
            },
            Record::Skip { id, .. } => Record::Skip {
                id: id.offset(start),
                len: end - start,
            },
        }
    }

    /// Expands this record into unit-length records with contiguous clocks.
    ///
    /// The first unit keeps the origin, parent and key; every later unit
    /// takes its predecessor as origin. No unit of a longer run carries a
    /// right origin, so a run typed at the start of a sequence roots its own
    /// chain. Single-slot items are returned as-is.
    ///
    /// GC and Skip records, and items with deleted content, have no
    /// per-slot content and are returned as-is too.
    pub fn expand(&self) -> Vec<Record> {
        let item = match self {
            Record::Item(item)
                if item.len() > 1 && !matches!(item.content, ItemContent::Deleted(_)) =>
            {
                item
            }
            _ => return vec![self.clone()],
        };
        (0..item.len())
            .map(|i| {
                let mut unit = item.slice(i, i + 1);
                unit.right_origin = None;
                Record::Item(unit)
            })
            .collect()
    }
}

impl From<Item> for Record {
    fn from(item: Item) -> Self {
        Record::Item(item)
    }
}

/// Expands every record; see [`Record::expand`].
pub fn expand_all(records: &[Record]) -> Vec<Record> {
    records.iter().flat_map(Record::expand).collect()
}
