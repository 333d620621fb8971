use super::{ExpressionConverter, ExpressionPlugin};
use crate::core::Result;
use crate::query::Query;
use sqlparser::ast as sql_ast;

/// `x IS NULL` / `x IS NOT NULL`
pub struct IsNullPlugin;

impl ExpressionPlugin for IsNullPlugin {
    fn name(&self) -> &'static str {
        "IS_NULL"
    }

    fn can_handle(&self, expr: &sql_ast::Expr) -> bool {
        matches!(expr, sql_ast::Expr::IsNull(_) | sql_ast::Expr::IsNotNull(_))
    }

    fn convert(&self, expr: sql_ast::Expr, converter: &ExpressionConverter<'_>) -> Result<Query> {
        match expr {
            sql_ast::Expr::IsNull(inner) => Query::is_null(converter.field_path(&inner)?),
            sql_ast::Expr::IsNotNull(inner) => Query::is_not_null(converter.field_path(&inner)?),
            _ => unreachable!("IsNullPlugin called with non-IS NULL expression"),
        }
    }
}
