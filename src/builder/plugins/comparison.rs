use super::{ExpressionConverter, ExpressionPlugin};
use crate::core::{MapperError, Result};
use crate::query::{Query, UnaryOperator};
use sqlparser::ast as sql_ast;

/// `field <op> constant`, with the operands in either order
pub struct ComparisonPlugin;

impl ComparisonPlugin {
    fn operator(op: &sql_ast::BinaryOperator) -> Option<UnaryOperator> {
        use sql_ast::BinaryOperator as SqlOp;

        match op {
            SqlOp::Eq => Some(UnaryOperator::EqualTo),
            SqlOp::NotEq => Some(UnaryOperator::NotEqualTo),
            SqlOp::Lt => Some(UnaryOperator::LessThan),
            SqlOp::LtEq => Some(UnaryOperator::LessOrEqualTo),
            SqlOp::Gt => Some(UnaryOperator::GreaterThan),
            SqlOp::GtEq => Some(UnaryOperator::GreaterOrEqualTo),
            _ => None,
        }
    }

    /// Operator seen from the other side: `0 < x` is `x > 0`
    fn mirrored(op: UnaryOperator) -> UnaryOperator {
        match op {
            UnaryOperator::LessThan => UnaryOperator::GreaterThan,
            UnaryOperator::LessOrEqualTo => UnaryOperator::GreaterOrEqualTo,
            UnaryOperator::GreaterThan => UnaryOperator::LessThan,
            UnaryOperator::GreaterOrEqualTo => UnaryOperator::LessOrEqualTo,
            other => other,
        }
    }
}

impl ExpressionPlugin for ComparisonPlugin {
    fn name(&self) -> &'static str {
        "COMPARISON"
    }

    fn can_handle(&self, expr: &sql_ast::Expr) -> bool {
        match expr {
            sql_ast::Expr::BinaryOp { op, .. } => Self::operator(op).is_some(),
            _ => false,
        }
    }

    fn convert(&self, expr: sql_ast::Expr, converter: &ExpressionConverter<'_>) -> Result<Query> {
        let sql_ast::Expr::BinaryOp { left, op, right } = expr else {
            unreachable!("ComparisonPlugin called with non-comparison expression")
        };
        let Some(op) = Self::operator(&op) else {
            unreachable!("ComparisonPlugin called with unsupported operator")
        };

        let (field, constant, op) = if converter.is_field(&left) {
            (&*left, &*right, op)
        } else if converter.is_field(&right) {
            (&*right, &*left, Self::mirrored(op))
        } else {
            return Err(MapperError::UnsupportedExpressionShape(format!(
                "comparison needs a field on one side: {} {} {}",
                left, op, right
            )));
        };

        let path = converter.field_path(field)?;
        let value = converter.constant(constant)?;

        if value.is_null() {
            return match op {
                UnaryOperator::EqualTo => Query::is_null(path),
                UnaryOperator::NotEqualTo => Query::is_not_null(path),
                other => Err(MapperError::UnsupportedExpressionShape(format!(
                    "{} cannot compare '{}' against null",
                    other, path
                ))),
            };
        }

        Query::unary(path, op, value)
    }
}
