//! SQL text emission for document queries.

pub mod dialect;
mod emitter;

pub use dialect::{Dialect, DialectKind, PostgresDialect, SqlServerDialect, SqliteDialect};

use crate::core::{Result, Value};
use crate::query::{Page, Query, SortKey};
use crate::schema::{Schema, validate_table_name};
use serde::Serialize;

/// Alias of the document table in every generated statement
pub const TABLE_ALIAS: &str = "_doc";
pub const ID_COLUMN: &str = "_id";
pub const DOCUMENT_COLUMN: &str = "_document";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    name: String,
    schema: Option<String>,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_table_name(&name)?;
        Ok(Self { name, schema: None })
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Result<Self> {
        let schema = schema.into();
        validate_table_name(&schema)?;
        self.schema = Some(schema);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn render(&self, dialect: &dyn Dialect) -> String {
        dialect.table_name(&self.name, self.schema.as_deref())
    }
}

/// Positional parameter, 1-based in order of appearance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub index: usize,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryShape {
    /// Rows of `(_id, _document)`
    Documents,
    /// A single `COUNT(DISTINCT _id)` value
    Count,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub parameters: Vec<Parameter>,
    pub shape: QueryShape,
}

/// Compiles predicate trees and sort keys for one schema and dialect
pub struct QueryCompiler<'a> {
    schema: &'a Schema,
    dialect: &'a dyn Dialect,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(schema: &'a Schema, dialect: &'a dyn Dialect) -> Self {
        Self { schema, dialect }
    }

    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    pub fn select(
        &self,
        table: &TableRef,
        query: Option<&Query>,
        sorts: &[SortKey],
        page: Page,
    ) -> Result<CompiledQuery> {
        emitter::Emitter::new(self.schema, self.dialect).compile(table, query, sorts, page, QueryShape::Documents)
    }

    /// Distinct matching documents; sorts and paging do not apply
    pub fn count(&self, table: &TableRef, query: Option<&Query>) -> Result<CompiledQuery> {
        emitter::Emitter::new(self.schema, self.dialect).compile(table, query, &[], Page::all(), QueryShape::Count)
    }
}
