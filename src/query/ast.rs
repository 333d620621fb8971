use crate::core::{MapperError, Result, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    EqualTo,
    NotEqualTo,
    GreaterThan,
    GreaterOrEqualTo,
    LessThan,
    LessOrEqualTo,
    Contains,
    NotContains,
}

impl UnaryOperator {
    /// SQL comparison operator; `None` for the membership operators
    pub fn comparison_sql(&self) -> Option<&'static str> {
        match self {
            Self::EqualTo => Some("="),
            Self::NotEqualTo => Some("<>"),
            Self::GreaterThan => Some(">"),
            Self::GreaterOrEqualTo => Some(">="),
            Self::LessThan => Some("<"),
            Self::LessOrEqualTo => Some("<="),
            Self::Contains | Self::NotContains => None,
        }
    }

    pub fn is_membership(&self) -> bool {
        matches!(self, Self::Contains | Self::NotContains)
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EqualTo => "EqualTo",
            Self::NotEqualTo => "NotEqualTo",
            Self::GreaterThan => "GreaterThan",
            Self::GreaterOrEqualTo => "GreaterOrEqualTo",
            Self::LessThan => "LessThan",
            Self::LessOrEqualTo => "LessOrEqualTo",
            Self::Contains => "Contains",
            Self::NotContains => "NotContains",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn sql(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "And"),
            Self::Or => write!(f, "Or"),
        }
    }
}

/// Document predicate tree.
///
/// Build it through the constructors, which reject blank field names and null
/// values; absence is expressed with [`Query::is_null`] / [`Query::is_not_null`].
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Unary {
        field: String,
        op: UnaryOperator,
        value: Value,
    },
    IsNull {
        field: String,
    },
    IsNotNull {
        field: String,
    },
    Binary {
        left: Box<Query>,
        right: Box<Query>,
        op: LogicalOperator,
    },
}

impl Query {
    pub fn unary(field: impl Into<String>, op: UnaryOperator, value: impl Into<Value>) -> Result<Self> {
        let field = checked_field(field.into())?;
        let value = value.into();
        if value.is_null() {
            return Err(MapperError::InvalidArgument(format!(
                "Value compared against '{}' cannot be null, use is_null/is_not_null",
                field
            )));
        }
        Ok(Self::Unary { field, op, value })
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        Self::unary(field, UnaryOperator::EqualTo, value)
    }

    pub fn neq(field: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        Self::unary(field, UnaryOperator::NotEqualTo, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        Self::unary(field, UnaryOperator::GreaterThan, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        Self::unary(field, UnaryOperator::GreaterOrEqualTo, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        Self::unary(field, UnaryOperator::LessThan, value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        Self::unary(field, UnaryOperator::LessOrEqualTo, value)
    }

    /// Value-array membership
    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        Self::unary(field, UnaryOperator::Contains, value)
    }

    pub fn not_contains(field: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        Self::unary(field, UnaryOperator::NotContains, value)
    }

    pub fn is_null(field: impl Into<String>) -> Result<Self> {
        Ok(Self::IsNull {
            field: checked_field(field.into())?,
        })
    }

    pub fn is_not_null(field: impl Into<String>) -> Result<Self> {
        Ok(Self::IsNotNull {
            field: checked_field(field.into())?,
        })
    }

    pub fn and(left: Query, right: Query) -> Self {
        Self::Binary {
            left: Box::new(left),
            right: Box::new(right),
            op: LogicalOperator::And,
        }
    }

    pub fn or(left: Query, right: Query) -> Self {
        Self::Binary {
            left: Box::new(left),
            right: Box::new(right),
            op: LogicalOperator::Or,
        }
    }

    /// Field paths referenced by the tree, left to right
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Unary { field, .. } | Self::IsNull { field } | Self::IsNotNull { field } => {
                out.push(field)
            }
            Self::Binary { left, right, .. } => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
        }
    }
}

fn checked_field(field: String) -> Result<String> {
    if field.trim().is_empty() {
        return Err(MapperError::InvalidArgument(
            "Field name cannot be empty or whitespace".to_string(),
        ));
    }
    Ok(field)
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unary { field, op, value } => write!(f, "( {} {} {} )", field, op, value),
            Self::IsNull { field } => write!(f, "( {} IS NULL )", field),
            Self::IsNotNull { field } => write!(f, "( {} IS NOT NULL )", field),
            Self::Binary { left, right, op } => write!(f, "( {} {} {} )", left, op, right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_reject_blank_fields() {
        assert!(matches!(Query::eq("", 1), Err(MapperError::InvalidArgument(_))));
        assert!(matches!(Query::is_null("   "), Err(MapperError::InvalidArgument(_))));
        assert!(matches!(Query::contains("\t", "x"), Err(MapperError::InvalidArgument(_))));
    }

    #[test]
    fn test_constructors_reject_null_values() {
        assert!(matches!(
            Query::eq("Title", Value::Null),
            Err(MapperError::InvalidArgument(_))
        ));
        let missing: Option<i64> = None;
        assert!(Query::gt("FavoriteCount", missing).is_err());
    }

    #[test]
    fn test_display() {
        let query = Query::and(
            Query::eq("Author.Username", "admin").unwrap(),
            Query::gt("FavoriteCount", 0).unwrap(),
        );
        assert_eq!(
            query.to_string(),
            "( ( Author.Username EqualTo admin ) And ( FavoriteCount GreaterThan 0 ) )"
        );
        assert_eq!(
            Query::is_not_null("Comments.Author.Username").unwrap().to_string(),
            "( Comments.Author.Username IS NOT NULL )"
        );
    }

    #[test]
    fn test_fields_left_to_right() {
        let query = Query::or(
            Query::and(Query::eq("A", 1).unwrap(), Query::is_null("B").unwrap()),
            Query::contains("C", "x").unwrap(),
        );
        assert_eq!(query.fields(), vec!["A", "B", "C"]);
    }
}
