mod ast;
mod sort;

pub use ast::{LogicalOperator, Query, UnaryOperator};
pub use sort::{ID_FIELD, SortDirection, SortKey, Sorting};

/// Optional skip/take applied after ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Page {
    pub skip: usize,
    /// `None` means unbounded
    pub take: Option<usize>,
}

impl Page {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(skip: usize, take: usize) -> Self {
        Self {
            skip,
            take: Some(take),
        }
    }

    pub fn first() -> Self {
        Self::new(0, 1)
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn take(mut self, take: usize) -> Self {
        self.take = Some(take);
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.skip == 0 && self.take.is_none()
    }
}
