mod postgres;
mod sqlite;
mod sqlserver;

pub use postgres::PostgresDialect;
pub use sqlite::{SQLITE_DATETIME_FORMAT, SqliteDialect};
pub use sqlserver::SqlServerDialect;

use crate::query::Page;
use crate::schema::{ScalarType, UnderlyingType};
use std::fmt;

/// Engine-specific pieces of the generated SQL.
///
/// `source` arguments are either the document column or the element
/// expression of an enclosing join; `path` segments are already validated
/// identifiers.
pub trait Dialect: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn quote_identifier(&self, name: &str) -> String;

    /// Schema used when a table reference carries none
    fn default_schema(&self) -> Option<&'static str> {
        None
    }

    fn table_name(&self, name: &str, schema: Option<&str>) -> String {
        match schema.or(self.default_schema()) {
            Some(schema) => format!(
                "{}.{}",
                self.quote_identifier(schema),
                self.quote_identifier(name)
            ),
            None => self.quote_identifier(name),
        }
    }

    /// 1-based positional placeholder
    fn placeholder(&self, index: usize) -> String;

    /// Join clause exposing every element of the array at `source`.`path` as `alias`
    fn cross_apply(&self, source: &str, path: &[String], alias: &str) -> String;

    /// Expression for the current element of a join
    fn element(&self, alias: &str) -> String;

    /// Scalar JSON value at `source`.`path`, as text
    fn extract(&self, source: &str, path: &[String]) -> String;

    /// Sub-select yielding the members of a value array, cast like a scalar of
    /// the element type. `None` when the element type has no cast.
    fn value_set(
        &self,
        source: &str,
        path: &[String],
        element: &UnderlyingType,
    ) -> Option<String>;

    /// Convert extracted text to a comparable type. `None` when no mapping exists.
    fn cast(&self, expr: &str, ty: &UnderlyingType) -> Option<String> {
        match ty {
            UnderlyingType::Scalar(s) if s.is_textual() => Some(expr.to_string()),
            UnderlyingType::Scalar(s) => self.cast_scalar(expr, *s),
            UnderlyingType::Object(_) => None,
        }
    }

    fn cast_scalar(&self, expr: &str, ty: ScalarType) -> Option<String>;

    /// Paging lines following ORDER BY
    fn paging(&self, page: Page, has_order_by: bool) -> Vec<String>;
}

/// `$.a.b` JSON path used by SQL Server and SQLite
pub(crate) fn json_path(path: &[String]) -> String {
    let mut out = String::from("$");
    for segment in path {
        out.push('.');
        out.push_str(segment);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[value(name = "sqlserver", alias = "mssql")]
    SqlServer,
    #[value(name = "postgres", alias = "postgresql")]
    Postgres,
    Sqlite,
}

impl DialectKind {
    pub fn dialect(&self) -> Box<dyn Dialect> {
        match self {
            Self::SqlServer => Box::new(SqlServerDialect),
            Self::Postgres => Box::new(PostgresDialect),
            Self::Sqlite => Box::new(SqliteDialect),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}
