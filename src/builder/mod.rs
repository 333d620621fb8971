//! Predicate text to [`Query`] translation.
//!
//! Input is a boolean expression over document fields, in either SQL style
//! (`Author.Username = 'admin' AND FavoriteCount > 0`) or lambda style
//! (`post => post.Author.Username == "admin" && post.FavoriteCount > 0`).
//! The translation is structural: nothing is evaluated, the expression tree is
//! only reshaped. Captured values are supplied as `:name` placeholders and
//! bound with [`QueryBuilder::bind`].

mod path;
mod plugins;

pub use plugins::{ExpressionConverter, ExpressionPlugin, ExpressionPluginRegistry};

use crate::core::{MapperError, Result, Value};
use crate::query::Query;
use sqlparser::ast as sql_ast;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::Token;
use std::collections::HashMap;
use tracing::debug;

pub struct QueryBuilder {
    registry: ExpressionPluginRegistry,
    parameter: Option<String>,
    bindings: HashMap<String, Value>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::with_registry(ExpressionPluginRegistry::with_default_plugins())
    }

    pub fn with_registry(registry: ExpressionPluginRegistry) -> Self {
        Self {
            registry,
            parameter: None,
            bindings: HashMap::new(),
        }
    }

    /// Name of the document variable to strip from accessors (`post.Title` -> `Title`)
    pub fn with_parameter(mut self, name: impl Into<String>) -> Self {
        self.parameter = Some(name.into());
        self
    }

    /// Bind the value referenced as `:name` in predicate text
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bindings.insert(name.into(), value.into());
        self
    }

    pub fn build(&self, text: &str) -> Result<Query> {
        let (parameter, expr) = self.parse(text)?;
        let converter = ExpressionConverter::new(&self.registry, parameter, &self.bindings);
        let query = converter.convert(expr)?;
        debug!(predicate = text, query = %query, "built query");
        Ok(query)
    }

    /// Dotted path for a field accessor such as `p => p.Comments[0].Author`
    pub fn build_path(&self, text: &str) -> Result<String> {
        let (parameter, expr) = self.parse(text)?;
        path::field_path(&expr, parameter)
    }

    fn parse<'s>(&'s self, text: &'s str) -> Result<(Option<&'s str>, sql_ast::Expr)> {
        let (lambda_param, body) = path::split_lambda(text);
        if body.trim().is_empty() {
            return Err(MapperError::InvalidArgument(
                "Predicate text cannot be empty".to_string(),
            ));
        }

        let normalized = path::normalize(body);
        let dialect = PostgreSqlDialect {};
        let mut parser = Parser::new(&dialect).try_with_sql(&normalized)?;
        let expr = parser.parse_expr()?;

        let rest = parser.peek_token();
        if rest.token != Token::EOF {
            return Err(MapperError::UnsupportedExpressionShape(format!(
                "unexpected '{}' after {}",
                rest.token, expr
            )));
        }

        Ok((lambda_param.or(self.parameter.as_deref()), expr))
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
