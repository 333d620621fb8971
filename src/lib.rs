// ============================================================================
// docmapper Library
// ============================================================================

//! Compiles predicates over JSON documents into parameterized SQL.
//!
//! Documents are stored whole in a `(_id, _document)` table. Queries address
//! fields by dotted paths (`Comments.Author.Username`); every object array on
//! the way is expanded with a join, so a predicate matches a document when any
//! element satisfies it.
//!
//! ```
//! use docmapper::{FieldType, ObjectType, Query, QueryCompiler, Schema, Sorting, TableRef, Page};
//! use docmapper::sql::SqliteDialect;
//!
//! # fn main() -> docmapper::Result<()> {
//! let schema = Schema::builder("Post")
//!     .object(
//!         ObjectType::new("Post")
//!             .field("Title", FieldType::string())
//!             .field("Comments", FieldType::array(FieldType::object("Comment"))),
//!     )
//!     .object(ObjectType::new("Comment").field("Content", FieldType::string()))
//!     .build()?;
//!
//! let query = Query::eq("Comments.Content", "hello")?;
//! let compiled = QueryCompiler::new(&schema, &SqliteDialect).select(
//!     &TableRef::new("Posts")?,
//!     Some(&query),
//!     Sorting::by("Title")?.keys(),
//!     Page::all(),
//! )?;
//! assert!(compiled.sql.contains("json_each(_doc._document, '$.Comments')"));
//! assert_eq!(compiled.parameters.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod collection;
pub mod core;
pub mod planner;
pub mod prelude;
pub mod query;
pub mod schema;
pub mod sql;
pub mod storage;

pub use builder::QueryBuilder;
pub use collection::{Collection, Document, Stored};
pub use core::{MapperError, Result, Value};
pub use query::{LogicalOperator, Page, Query, SortDirection, SortKey, Sorting, UnaryOperator};
pub use schema::{FieldType, ObjectType, ScalarType, Schema, infer_schema, resolve};
pub use sql::{CompiledQuery, Dialect, DialectKind, Parameter, QueryCompiler, QueryShape, TableRef};
pub use storage::{DocumentStore, SqliteStore, StoreConfig};
