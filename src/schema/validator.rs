//! Name validation for document fields and table names.
//!
//! Field names end up inside JSON path literals and table names inside
//! quoted identifiers, so both are restricted to plain identifiers.

use crate::core::{MapperError, Result};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

const MAX_NAME_LENGTH: usize = 128;

/// Validate a field name declared in a schema
pub fn validate_field_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MapperError::InvalidSchema("Field name cannot be empty".to_string()));
    }

    if !IDENTIFIER.is_match(name) {
        return Err(MapperError::InvalidSchema(format!(
            "Field name '{}' must start with a letter or underscore and contain only letters, numbers, and underscores",
            name
        )));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(MapperError::InvalidSchema(format!(
            "Field name '{}' too long (max {} characters)",
            name, MAX_NAME_LENGTH
        )));
    }

    Ok(())
}

/// Validate a table (collection) name
pub fn validate_table_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MapperError::InvalidArgument(
            "Table name cannot be empty".to_string(),
        ));
    }

    if !IDENTIFIER.is_match(name) {
        return Err(MapperError::InvalidArgument(format!(
            "Table name '{}' can only contain letters, numbers, and underscores and must not start with a digit",
            name
        )));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(MapperError::InvalidArgument(format!(
            "Table name '{}' too long (max {} characters)",
            name, MAX_NAME_LENGTH
        )));
    }

    Ok(())
}
