use crate::core::{MapperError, Result};
use std::fmt;

/// Reserved field name addressing the row identity column
pub const ID_FIELD: &str = "_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Result<Self> {
        let field = field.into();
        if field.trim().is_empty() {
            return Err(MapperError::InvalidArgument(
                "Sort field cannot be empty or whitespace".to_string(),
            ));
        }
        Ok(Self { field, direction })
    }

    pub fn is_id(&self) -> bool {
        self.field == ID_FIELD
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction.sql())
    }
}

/// Ordered list of sort keys, built fluently:
///
/// ```
/// # use docmapper::query::Sorting;
/// # fn main() -> docmapper::Result<()> {
/// let sorting = Sorting::by("Title")?.then_by_descending("Updated")?.then_by_id();
/// assert_eq!(sorting.keys().len(), 3);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Sorting {
    keys: Vec<SortKey>,
}

impl Sorting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by(field: impl Into<String>) -> Result<Self> {
        Self::new().then_by(field)
    }

    pub fn by_descending(field: impl Into<String>) -> Result<Self> {
        Self::new().then_by_descending(field)
    }

    pub fn by_id() -> Self {
        Self::new().then_by_id()
    }

    pub fn by_id_descending() -> Self {
        Self::new().then_by_id_descending()
    }

    pub fn then_by(mut self, field: impl Into<String>) -> Result<Self> {
        self.keys.push(SortKey::new(field, SortDirection::Ascending)?);
        Ok(self)
    }

    pub fn then_by_descending(mut self, field: impl Into<String>) -> Result<Self> {
        self.keys.push(SortKey::new(field, SortDirection::Descending)?);
        Ok(self)
    }

    pub fn then_by_id(mut self) -> Self {
        self.keys.push(SortKey {
            field: ID_FIELD.to_string(),
            direction: SortDirection::Ascending,
        });
        self
    }

    pub fn then_by_id_descending(mut self) -> Self {
        self.keys.push(SortKey {
            field: ID_FIELD.to_string(),
            direction: SortDirection::Descending,
        });
        self
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl From<Vec<SortKey>> for Sorting {
    fn from(keys: Vec<SortKey>) -> Self {
        Self { keys }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorting_chain_keeps_order() {
        let sorting = Sorting::by_descending("Updated")
            .unwrap()
            .then_by("Title")
            .unwrap()
            .then_by_id();

        let rendered: Vec<String> = sorting.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(rendered, vec!["Updated DESC", "Title ASC", "_id ASC"]);
        assert!(sorting.keys()[2].is_id());
    }

    #[test]
    fn test_blank_sort_field_rejected() {
        assert!(matches!(Sorting::by(" "), Err(MapperError::InvalidArgument(_))));
    }
}
