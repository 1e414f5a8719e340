use serde::{Deserialize, Serialize};

/// A catalog listing together with a completeness marker.
///
/// A paginated fetch that fails mid-run keeps the rows collected so far and
/// returns them as a partial listing; callers may still write markers from
/// partial rows but must not treat them as authoritative for cleanup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing<T> {
    pub rows: Vec<T>,
    pub complete: bool,
}

impl<T> Listing<T> {
    pub fn complete(rows: Vec<T>) -> Self {
        Self { rows, complete: true }
    }

    pub fn partial(rows: Vec<T>) -> Self {
        Self { rows, complete: false }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
