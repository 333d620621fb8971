//! Common imports for application code.
//!
//! ```
//! use docmapper::prelude::*;
//! ```

pub use crate::builder::QueryBuilder;
pub use crate::collection::{Collection, Document, Stored};
pub use crate::core::{MapperError, Result, Value};
pub use crate::query::{Page, Query, Sorting};
pub use crate::schema::{FieldType, ObjectType, Schema};
pub use crate::storage::{DocumentStore, SqliteStore, StoreConfig};
