//! Connection scoping for the sensitive-data walk.

use std::collections::HashSet;

use datascope_core::payload::parse_u64s;

/// Membership test over requested connection IDs.
///
/// An unscoped request (no tokens at all) admits every module, including
/// modules on the primary connection (ID 0). A scoped request admits only
/// modules whose connection is in the accepted set; tokens that failed to
/// parse still make the request scoped.
#[derive(Debug, Clone, Default)]
pub struct ConnectionScope {
    accepted: HashSet<u64>,
    scoped: bool,
}

impl ConnectionScope {
    pub fn build<S: AsRef<str>>(requested: &[S]) -> Self {
        Self {
            accepted: parse_u64s(requested).into_iter().collect(),
            scoped: !requested.is_empty(),
        }
    }

    pub fn is_scoped(&self) -> bool {
        self.scoped
    }

    pub fn allows(&self, connection_id: u64) -> bool {
        !self.scoped || self.accepted.contains(&connection_id)
    }
}
