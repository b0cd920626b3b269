use serde::Serialize;

/// One page of a larger result set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Rows of this page
    pub items: Vec<T>,
    /// Number of rows matching the query, ignoring pagination
    pub total: u64,
    /// Offset this page starts at
    pub offset: u64,
    /// Requested page size
    pub limit: u64,
}

impl<T> Page<T> {
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            offset: self.offset,
            limit: self.limit,
        }
    }

    /// Whether rows remain after this page
    pub fn has_more(&self) -> bool {
        self.offset + (self.items.len() as u64) < self.total
    }
}
