use super::{Dialect, json_path};
use crate::query::Page;
use crate::schema::{ScalarType, UnderlyingType};

/// Microsoft SQL Server (`OPENJSON` / `JSON_VALUE`)
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

impl Dialect for SqlServerDialect {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("[{}]", name.replace(']', "]]"))
    }

    fn default_schema(&self) -> Option<&'static str> {
        Some("dbo")
    }

    fn placeholder(&self, index: usize) -> String {
        format!("@{}", index)
    }

    fn cross_apply(&self, source: &str, path: &[String], alias: &str) -> String {
        format!(
            "CROSS APPLY OPENJSON({}, '{}') WITH ({} nvarchar(MAX) '$' AS JSON)",
            source,
            json_path(path),
            self.quote_identifier(alias)
        )
    }

    fn element(&self, alias: &str) -> String {
        self.quote_identifier(alias)
    }

    fn extract(&self, source: &str, path: &[String]) -> String {
        format!("JSON_VALUE({}, '{}')", source, json_path(path))
    }

    fn value_set(
        &self,
        source: &str,
        path: &[String],
        element: &UnderlyingType,
    ) -> Option<String> {
        let member = self.cast("value", element)?;
        Some(format!(
            "SELECT {} FROM OPENJSON({}, '{}')",
            member,
            source,
            json_path(path)
        ))
    }

    fn cast_scalar(&self, expr: &str, ty: ScalarType) -> Option<String> {
        match ty {
            ScalarType::Int => Some(format!("CONVERT(int, {})", expr)),
            ScalarType::Float => Some(format!("CONVERT(float, {})", expr)),
            ScalarType::Bool => Some(format!("CONVERT(bit, {})", expr)),
            // style 127: ISO 8601 with time zone
            ScalarType::DateTime => Some(format!("CONVERT(datetime2, {}, 127)", expr)),
            ScalarType::String | ScalarType::Guid => Some(expr.to_string()),
        }
    }

    fn paging(&self, page: Page, has_order_by: bool) -> Vec<String> {
        if page.is_unbounded() {
            return Vec::new();
        }

        let mut lines = Vec::new();
        if !has_order_by {
            lines.push("ORDER BY (SELECT NULL)".to_string());
        }
        lines.push(format!("OFFSET {} ROWS", page.skip));
        if let Some(take) = page.take {
            lines.push(format!("FETCH NEXT {} ROWS ONLY", take));
        }
        lines
    }
}
