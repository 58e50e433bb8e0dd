//! Replica identifiers and logical clocks.

use std::fmt;

use serde::Serialize;

/// Stable integer identifying a replica (a Yjs `clientID`).
pub type ClientId = u64;

/// Per-replica sequence number.
pub type Clock = u64;

/// Names a single operation slot: `(client, clock)`.
///
/// Ordered by client first, then clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Id {
    pub client: ClientId,
    pub clock: Clock,
}

impl Id {
    pub const fn new(client: ClientId, clock: Clock) -> Self {
        Self { client, clock }
    }

    /// Returns the id `offset` slots further along the same replica.
    #[inline]
    pub const fn offset(self, offset: u64) -> Self {
        Self::new(self.client, self.clock + offset)
    }
}

/// Shorthand for [`Id::new`].
#[inline]
pub const fn id(client: ClientId, clock: Clock) -> Id {
    Id::new(client, clock)
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.client, self.clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_client_then_clock() {
        let mut ids = vec![id(2, 0), id(1, 5), id(1, 2)];
        ids.sort();
        assert_eq!(ids, vec![id(1, 2), id(1, 5), id(2, 0)]);
    }

    #[test]
    fn display_matches_key_format() {
        assert_eq!(id(7, 3).to_string(), "7,3");
        assert_eq!(id(7, 3).offset(2), id(7, 5));
    }
}
