use super::{Dialect, json_path};
use crate::query::Page;
use crate::schema::{ScalarType, UnderlyingType};

/// SQLite JSON1 functions (`json_each` / `json_extract`)
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

/// Canonical text form datetimes are compared in
pub const SQLITE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("@{}", index)
    }

    fn cross_apply(&self, source: &str, path: &[String], alias: &str) -> String {
        format!(
            "CROSS JOIN json_each({}, '{}') AS {}",
            source,
            json_path(path),
            self.quote_identifier(alias)
        )
    }

    fn element(&self, alias: &str) -> String {
        format!("{}.value", self.quote_identifier(alias))
    }

    fn extract(&self, source: &str, path: &[String]) -> String {
        format!("json_extract({}, '{}')", source, json_path(path))
    }

    fn value_set(
        &self,
        source: &str,
        path: &[String],
        element: &UnderlyingType,
    ) -> Option<String> {
        let member = self.cast("value", element)?;
        Some(format!(
            "SELECT {} FROM json_each({}, '{}')",
            member,
            source,
            json_path(path)
        ))
    }

    fn cast_scalar(&self, expr: &str, ty: ScalarType) -> Option<String> {
        match ty {
            // json_extract already yields 1/0 for booleans
            ScalarType::Int | ScalarType::Bool => Some(format!("CAST({} AS INTEGER)", expr)),
            ScalarType::Float => Some(format!("CAST({} AS REAL)", expr)),
            ScalarType::DateTime => Some(format!("strftime('%Y-%m-%d %H:%M:%f', {})", expr)),
            ScalarType::String | ScalarType::Guid => Some(expr.to_string()),
        }
    }

    fn paging(&self, page: Page, _has_order_by: bool) -> Vec<String> {
        if page.is_unbounded() {
            return Vec::new();
        }

        let limit = page
            .take
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-1".to_string());
        if page.skip > 0 {
            vec![format!("LIMIT {} OFFSET {}", limit, page.skip)]
        } else {
            vec![format!("LIMIT {}", limit)]
        }
    }
}
