mod comparison;
mod is_null;
mod logical;
mod nested;

use super::path;
use crate::core::{MapperError, Result, Value};
use crate::query::Query;
use sqlparser::ast as sql_ast;
use std::collections::HashMap;
use tracing::trace;

/// Translates one expression shape into a [`Query`]
pub trait ExpressionPlugin: Send + Sync {
    /// Plugin name for tracing
    fn name(&self) -> &'static str;

    fn can_handle(&self, expr: &sql_ast::Expr) -> bool;

    fn convert(&self, expr: sql_ast::Expr, converter: &ExpressionConverter<'_>) -> Result<Query>;
}

pub struct ExpressionPluginRegistry {
    plugins: Vec<Box<dyn ExpressionPlugin>>,
}

impl ExpressionPluginRegistry {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    pub fn register(&mut self, plugin: Box<dyn ExpressionPlugin>) {
        trace!(plugin = plugin.name(), "registered expression plugin");
        self.plugins.push(plugin);
    }

    pub fn with_default_plugins() -> Self {
        let mut registry = Self::new();

        // Nested first so parentheses are unwrapped before anything else looks
        registry.register(Box::new(nested::NestedPlugin));
        registry.register(Box::new(logical::LogicalPlugin));
        registry.register(Box::new(is_null::IsNullPlugin));
        registry.register(Box::new(comparison::ComparisonPlugin));

        registry
    }

    pub fn find_plugin(&self, expr: &sql_ast::Expr) -> Option<&dyn ExpressionPlugin> {
        self.plugins
            .iter()
            .find(|plugin| plugin.can_handle(expr))
            .map(|boxed| &**boxed)
    }
}

impl Default for ExpressionPluginRegistry {
    fn default() -> Self {
        Self::with_default_plugins()
    }
}

/// Walks a parsed predicate, dispatching each node to a plugin
pub struct ExpressionConverter<'a> {
    registry: &'a ExpressionPluginRegistry,
    parameter: Option<&'a str>,
    bindings: &'a HashMap<String, Value>,
}

impl<'a> ExpressionConverter<'a> {
    pub fn new(
        registry: &'a ExpressionPluginRegistry,
        parameter: Option<&'a str>,
        bindings: &'a HashMap<String, Value>,
    ) -> Self {
        Self {
            registry,
            parameter,
            bindings,
        }
    }

    pub fn convert(&self, expr: sql_ast::Expr) -> Result<Query> {
        match self.registry.find_plugin(&expr) {
            Some(plugin) => {
                trace!(plugin = plugin.name(), "converting expression");
                plugin.convert(expr, self)
            }
            None => Err(MapperError::UnsupportedExpressionShape(expr.to_string())),
        }
    }

    /// Dotted field path for a member-access operand
    pub fn field_path(&self, expr: &sql_ast::Expr) -> Result<String> {
        path::field_path(expr, self.parameter)
    }

    pub fn is_field(&self, expr: &sql_ast::Expr) -> bool {
        matches!(
            expr,
            sql_ast::Expr::Identifier(_)
                | sql_ast::Expr::CompoundIdentifier(_)
                | sql_ast::Expr::CompoundFieldAccess { .. }
        )
    }

    /// Evaluate a constant operand: a literal, a bound `:name`, or a negated number
    pub fn constant(&self, expr: &sql_ast::Expr) -> Result<Value> {
        match expr {
            sql_ast::Expr::Value(v) => self.convert_value(&v.value),
            sql_ast::Expr::Nested(inner) => self.constant(inner),
            sql_ast::Expr::UnaryOp {
                op: sql_ast::UnaryOperator::Minus,
                expr: inner,
            } => match self.constant(inner)? {
                Value::Integer(i) => Ok(Value::Integer(-i)),
                Value::Float(f) => Ok(Value::Float(-f)),
                other => Err(MapperError::UnsupportedExpressionShape(format!(
                    "cannot negate {}",
                    other
                ))),
            },
            other => Err(MapperError::UnsupportedExpressionShape(format!(
                "expected a constant, got: {}",
                other
            ))),
        }
    }

    pub fn convert_value(&self, val: &sql_ast::Value) -> Result<Value> {
        match val {
            sql_ast::Value::Number(n, _) => {
                if let Ok(i) = n.parse::<i64>() {
                    Ok(Value::Integer(i))
                } else if let Ok(f) = n.parse::<f64>() {
                    Ok(Value::Float(f))
                } else {
                    Err(MapperError::ParseError(format!("Invalid number: {}", n)))
                }
            }
            sql_ast::Value::SingleQuotedString(s) | sql_ast::Value::DoubleQuotedString(s) => {
                Ok(Value::Text(s.clone()))
            }
            sql_ast::Value::Boolean(b) => Ok(Value::Boolean(*b)),
            sql_ast::Value::Null => Ok(Value::Null),
            sql_ast::Value::Placeholder(name) => {
                let key = name.trim_start_matches([':', '@', '$']);
                self.bindings.get(key).cloned().ok_or_else(|| {
                    MapperError::InvalidArgument(format!("No value bound for parameter '{}'", name))
                })
            }
            other => Err(MapperError::UnsupportedExpressionShape(format!(
                "unsupported literal: {}",
                other
            ))),
        }
    }
}
