use super::{ExpressionConverter, ExpressionPlugin};
use crate::core::Result;
use crate::query::Query;
use sqlparser::ast as sql_ast;

pub struct LogicalPlugin;

impl ExpressionPlugin for LogicalPlugin {
    fn name(&self) -> &'static str {
        "LOGICAL"
    }

    fn can_handle(&self, expr: &sql_ast::Expr) -> bool {
        matches!(
            expr,
            sql_ast::Expr::BinaryOp {
                op: sql_ast::BinaryOperator::And | sql_ast::BinaryOperator::Or,
                ..
            }
        )
    }

    fn convert(&self, expr: sql_ast::Expr, converter: &ExpressionConverter<'_>) -> Result<Query> {
        match expr {
            sql_ast::Expr::BinaryOp { left, op, right } => {
                let left = converter.convert(*left)?;
                let right = converter.convert(*right)?;
                Ok(match op {
                    sql_ast::BinaryOperator::And => Query::and(left, right),
                    _ => Query::or(left, right),
                })
            }
            _ => unreachable!("LogicalPlugin called with non-logical expression"),
        }
    }
}
