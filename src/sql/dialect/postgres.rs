use super::Dialect;
use crate::query::Page;
use crate::schema::{ScalarType, UnderlyingType};

/// PostgreSQL over a `jsonb` document column
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    fn text_array(path: &[String]) -> String {
        format!("'{{{}}}'", path.join(","))
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn cross_apply(&self, source: &str, path: &[String], alias: &str) -> String {
        format!(
            "CROSS JOIN LATERAL jsonb_array_elements({} #> {}) AS {}(value)",
            source,
            Self::text_array(path),
            self.quote_identifier(alias)
        )
    }

    fn element(&self, alias: &str) -> String {
        format!("{}.value", self.quote_identifier(alias))
    }

    fn extract(&self, source: &str, path: &[String]) -> String {
        format!("{} #>> {}", source, Self::text_array(path))
    }

    fn value_set(
        &self,
        source: &str,
        path: &[String],
        element: &UnderlyingType,
    ) -> Option<String> {
        // the set-returning function's column is named `value`
        let member = self.cast("value", element)?;
        Some(format!(
            "SELECT {} FROM jsonb_array_elements_text({} #> {})",
            member,
            source,
            Self::text_array(path)
        ))
    }

    fn cast_scalar(&self, expr: &str, ty: ScalarType) -> Option<String> {
        let target = match ty {
            ScalarType::Int => "integer",
            ScalarType::Float => "double precision",
            ScalarType::Bool => "boolean",
            ScalarType::DateTime => "timestamptz",
            ScalarType::String | ScalarType::Guid => return Some(expr.to_string()),
        };
        Some(format!("({})::{}", expr, target))
    }

    fn paging(&self, page: Page, _has_order_by: bool) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(take) = page.take {
            lines.push(format!("LIMIT {}", take));
        }
        if page.skip > 0 {
            lines.push(format!("OFFSET {}", page.skip));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_and_cast() {
        let dialect = PostgresDialect;
        let path = vec!["Author".to_string(), "Age".to_string()];
        let extracted = dialect.extract("_doc._document", &path);
        assert_eq!(extracted, "_doc._document #>> '{Author,Age}'");
        assert_eq!(
            dialect.cast_scalar(&extracted, ScalarType::Int).unwrap(),
            "(_doc._document #>> '{Author,Age}')::integer"
        );
    }

    #[test]
    fn test_paging() {
        let dialect = PostgresDialect;
        assert!(dialect.paging(Page::all(), false).is_empty());
        assert_eq!(dialect.paging(Page::new(20, 10), false), vec!["LIMIT 10", "OFFSET 20"]);
        assert_eq!(dialect.paging(Page::all().skip(5), true), vec!["OFFSET 5"]);
    }
}
