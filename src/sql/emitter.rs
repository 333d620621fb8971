use super::{
    CompiledQuery, DOCUMENT_COLUMN, Dialect, ID_COLUMN, Parameter, QueryShape, TABLE_ALIAS,
    TableRef,
};
use crate::core::{MapperError, Result, Value};
use crate::planner::{CrossApplyPlan, FieldBinding};
use crate::query::{ID_FIELD, Page, Query, SortKey, UnaryOperator};
use crate::schema::{ElementKind, ScalarType, Schema, UnderlyingType, resolve};
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

/// State for compiling one statement.
///
/// The predicate and sort keys are rendered first, which also fills the join
/// plan; the statement is assembled from the finished plan afterwards.
pub(super) struct Emitter<'a> {
    schema: &'a Schema,
    dialect: &'a dyn Dialect,
    plan: CrossApplyPlan,
    parameters: Vec<Parameter>,
    id_column: String,
    document_column: String,
}

impl<'a> Emitter<'a> {
    pub(super) fn new(schema: &'a Schema, dialect: &'a dyn Dialect) -> Self {
        Self {
            schema,
            dialect,
            plan: CrossApplyPlan::new(),
            parameters: Vec::new(),
            id_column: format!("{}.{}", TABLE_ALIAS, ID_COLUMN),
            document_column: format!("{}.{}", TABLE_ALIAS, DOCUMENT_COLUMN),
        }
    }

    pub(super) fn compile(
        mut self,
        table: &TableRef,
        query: Option<&Query>,
        sorts: &[SortKey],
        page: Page,
        shape: QueryShape,
    ) -> Result<CompiledQuery> {
        let predicate = query.map(|q| self.predicate(q)).transpose()?;

        let order_by = match shape {
            QueryShape::Documents => sorts
                .iter()
                .map(|key| self.sort(key))
                .collect::<Result<Vec<_>>>()?,
            QueryShape::Count => Vec::new(),
        };

        let mut lines = Vec::new();
        lines.push(match shape {
            QueryShape::Documents => format!("SELECT {}, {}", self.id_column, self.document_column),
            QueryShape::Count => format!("SELECT COUNT(DISTINCT {})", self.id_column),
        });
        lines.push(format!("FROM {} {}", table.render(self.dialect), TABLE_ALIAS));

        let joins = self.plan.ordered();
        for node in &joins {
            let source = self.source(node.parent);
            lines.push(self.dialect.cross_apply(&source, &node.json_pointer, &node.alias));
        }

        if let Some(predicate) = predicate {
            lines.push(format!("WHERE ({})", predicate));
        }

        if shape == QueryShape::Documents {
            if !joins.is_empty() {
                let mut group = vec![self.id_column.clone(), self.document_column.clone()];
                group.extend(
                    joins
                        .iter()
                        .filter(|n| n.requires_group_by)
                        .map(|n| self.dialect.element(&n.alias)),
                );
                lines.push(format!("GROUP BY {}", group.join(", ")));
            }
            if !order_by.is_empty() {
                lines.push(format!("ORDER BY {}", order_by.join(", ")));
            }
            lines.extend(self.dialect.paging(page, !order_by.is_empty()));
        }

        let sql = lines.join("\n");
        debug!(
            dialect = self.dialect.name(),
            joins = joins.len(),
            parameters = self.parameters.len(),
            "compiled query"
        );

        Ok(CompiledQuery {
            sql,
            parameters: self.parameters,
            shape,
        })
    }

    fn predicate(&mut self, query: &Query) -> Result<String> {
        match query {
            Query::Binary { left, right, op } => {
                let left = self.predicate(left)?;
                let right = self.predicate(right)?;
                Ok(format!("({}) {} ({})", left, op.sql(), right))
            }
            Query::IsNull { field } => self.null_check(field, "IS NULL"),
            Query::IsNotNull { field } => self.null_check(field, "IS NOT NULL"),
            Query::Unary { field, op, value } => self.comparison(field, *op, value),
        }
    }

    fn null_check(&mut self, field: &str, test: &str) -> Result<String> {
        let field = checked_field(field)?;
        if field == ID_FIELD {
            return Ok(format!("{} {}", self.id_column, test));
        }

        let binding = self.bind(field, false)?;
        Ok(format!("{} {}", self.extract(&binding), test))
    }

    fn comparison(&mut self, field: &str, op: UnaryOperator, value: &Value) -> Result<String> {
        let field = checked_field(field)?;
        if value.is_null() {
            return Err(MapperError::InvalidAstShape(format!(
                "{} on '{}' has a null value",
                op, field
            )));
        }

        if field == ID_FIELD {
            let Some(sql_op) = op.comparison_sql() else {
                return Err(unsupported_operator(op, field));
            };
            let placeholder = self.parameter(coerce_id(value));
            return Ok(format!("{} {} {}", self.id_column, sql_op, placeholder));
        }

        let binding = self.bind(field, false)?;
        let is_value_array = binding.terminal.element_kind == ElementKind::ValueArray;

        match op.comparison_sql() {
            None => {
                if !is_value_array {
                    return Err(unsupported_operator(op, field));
                }
                let ty = &binding.terminal.underlying_type;
                let members = self
                    .dialect
                    .value_set(&self.source(binding.join), &binding.suffix, ty)
                    .ok_or_else(|| MapperError::UnsupportedFieldType {
                        path: field.to_string(),
                        type_name: ty.to_string(),
                        dialect: self.dialect.name().to_string(),
                    })?;
                let placeholder = self.parameter(coerce(value, ty));
                let membership = if op == UnaryOperator::Contains {
                    "IN"
                } else {
                    "NOT IN"
                };
                Ok(format!("{} {} ({})", placeholder, membership, members))
            }
            Some(sql_op) => {
                if is_value_array {
                    return Err(unsupported_operator(op, field));
                }
                let expr = self.typed(&binding, field)?;
                let placeholder =
                    self.parameter(coerce(value, &binding.terminal.underlying_type));
                Ok(format!("{} {} {}", expr, sql_op, placeholder))
            }
        }
    }

    fn sort(&mut self, key: &SortKey) -> Result<String> {
        let field = checked_field(&key.field)?;
        if field == ID_FIELD {
            return Ok(format!("{} {}", self.id_column, key.direction.sql()));
        }

        let binding = self.bind(field, true)?;
        if binding.terminal.element_kind == ElementKind::ValueArray {
            return Err(MapperError::UnsupportedOperator {
                operator: "ORDER BY".to_string(),
                path: field.to_string(),
            });
        }
        Ok(format!("{} {}", self.typed(&binding, field)?, key.direction.sql()))
    }

    fn bind(&mut self, field: &str, from_sort: bool) -> Result<FieldBinding> {
        let path = resolve(self.schema, field)?;
        Ok(self.plan.add(&path, from_sort))
    }

    /// Document column, or the element of the given join
    fn source(&self, join: Option<usize>) -> String {
        match join {
            Some(id) => self.dialect.element(&self.plan.node(id).alias),
            None => self.document_column.clone(),
        }
    }

    fn extract(&self, binding: &FieldBinding) -> String {
        self.dialect.extract(&self.source(binding.join), &binding.suffix)
    }

    fn typed(&self, binding: &FieldBinding, field: &str) -> Result<String> {
        let ty = &binding.terminal.underlying_type;
        self.dialect
            .cast(&self.extract(binding), ty)
            .ok_or_else(|| MapperError::UnsupportedFieldType {
                path: field.to_string(),
                type_name: ty.to_string(),
                dialect: self.dialect.name().to_string(),
            })
    }

    fn parameter(&mut self, value: Value) -> String {
        let index = self.parameters.len() + 1;
        self.parameters.push(Parameter { index, value });
        self.dialect.placeholder(index)
    }
}

fn checked_field(field: &str) -> Result<&str> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Err(MapperError::InvalidAstShape(
            "query references an empty field name".to_string(),
        ));
    }
    Ok(trimmed)
}

fn unsupported_operator(op: UnaryOperator, field: &str) -> MapperError {
    MapperError::UnsupportedOperator {
        operator: op.to_string(),
        path: field.to_string(),
    }
}

/// Give textual literals the field's type so engines compare like with like
fn coerce(value: &Value, ty: &UnderlyingType) -> Value {
    match (ty, value) {
        (UnderlyingType::Scalar(ScalarType::DateTime), Value::Text(s)) => {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| Value::DateTime(dt.with_timezone(&Utc)))
                .unwrap_or_else(|_| value.clone())
        }
        (UnderlyingType::Scalar(ScalarType::Guid), Value::Text(_)) => coerce_id(value),
        (UnderlyingType::Scalar(ScalarType::Float), Value::Integer(i)) => Value::Float(*i as f64),
        _ => value.clone(),
    }
}

fn coerce_id(value: &Value) -> Value {
    match value {
        Value::Text(s) => Uuid::parse_str(s)
            .map(Value::Uuid)
            .unwrap_or_else(|_| value.clone()),
        other => other.clone(),
    }
}
