//! Schema inference from sample documents.
//!
//! Every document is reduced to a shape and the shapes are merged, so a field
//! seen in any sample ends up in the schema. Nested objects and arrays of
//! objects become named object types (`Post` + `Comments` -> `PostComments`),
//! with a numeric suffix when that name is already taken.

use super::{FieldType, ObjectType, ScalarType, Schema, validate_field_name};
use crate::core::{MapperError, Result};
use chrono::DateTime;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
enum Shape {
    /// Only nulls (or empty arrays) were seen
    Unknown,
    Scalar(ScalarType),
    Object(BTreeMap<String, Shape>),
    Array(Box<Shape>),
}

/// Infer a schema rooted at `root` from sample JSON documents
pub fn infer_schema(root: &str, documents: &[JsonValue]) -> Result<Schema> {
    if documents.is_empty() {
        return Err(MapperError::InvalidArgument(
            "Schema inference needs at least one document".to_string(),
        ));
    }

    let mut merged = Shape::Unknown;
    for doc in documents {
        if !doc.is_object() {
            return Err(MapperError::InvalidArgument(format!(
                "Expected a JSON object document, got: {}",
                doc
            )));
        }
        merged = merge(merged, shape_of(doc));
    }

    let fields = match merged {
        Shape::Object(fields) => fields,
        _ => BTreeMap::new(),
    };

    let mut types = TypeNames::default();
    let root_name = types.reserve(root);
    materialize(&root_name, &fields, &mut types)?;

    types
        .objects
        .into_iter()
        .fold(Schema::builder(root), |builder, object| builder.object(object))
        .build()
}

fn shape_of(value: &JsonValue) -> Shape {
    match value {
        JsonValue::Null => Shape::Unknown,
        JsonValue::Bool(_) => Shape::Scalar(ScalarType::Bool),
        JsonValue::Number(n) => {
            if n.is_i64() || n.is_u64() {
                Shape::Scalar(ScalarType::Int)
            } else {
                Shape::Scalar(ScalarType::Float)
            }
        }
        JsonValue::String(s) => Shape::Scalar(infer_string_type(s)),
        JsonValue::Array(items) => Shape::Array(Box::new(
            items
                .iter()
                .map(shape_of)
                .fold(Shape::Unknown, merge),
        )),
        JsonValue::Object(map) => Shape::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), shape_of(value)))
                .collect(),
        ),
    }
}

fn infer_string_type(s: &str) -> ScalarType {
    if DateTime::parse_from_rfc3339(s).is_ok() {
        ScalarType::DateTime
    } else if Uuid::parse_str(s).is_ok() {
        ScalarType::Guid
    } else {
        ScalarType::String
    }
}

/// Combine two observations of the same field.
/// Integer widens to float; any other conflict falls back to string.
fn merge(left: Shape, right: Shape) -> Shape {
    match (left, right) {
        (Shape::Unknown, other) | (other, Shape::Unknown) => other,
        (Shape::Scalar(a), Shape::Scalar(b)) => Shape::Scalar(widen(a, b)),
        (Shape::Object(mut a), Shape::Object(b)) => {
            for (key, shape) in b {
                let existing = a.remove(&key).unwrap_or(Shape::Unknown);
                a.insert(key, merge(existing, shape));
            }
            Shape::Object(a)
        }
        (Shape::Array(a), Shape::Array(b)) => Shape::Array(Box::new(merge(*a, *b))),
        _ => Shape::Scalar(ScalarType::String),
    }
}

fn widen(a: ScalarType, b: ScalarType) -> ScalarType {
    match (a, b) {
        (a, b) if a == b => a,
        (ScalarType::Int, ScalarType::Float) | (ScalarType::Float, ScalarType::Int) => {
            ScalarType::Float
        }
        _ => ScalarType::String,
    }
}

/// Object types built so far and the names they took
#[derive(Default)]
struct TypeNames {
    objects: Vec<ObjectType>,
    taken: BTreeSet<String>,
}

impl TypeNames {
    /// `base`, or `base2`, `base3`, ... once `base` is taken (case-insensitive)
    fn reserve(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        let mut suffix = 2;
        while self.taken.contains(&name.to_ascii_lowercase()) {
            name = format!("{}{}", base, suffix);
            suffix += 1;
        }
        self.taken.insert(name.to_ascii_lowercase());
        name
    }
}

fn materialize(
    type_name: &str,
    fields: &BTreeMap<String, Shape>,
    out: &mut TypeNames,
) -> Result<()> {
    let mut object = ObjectType::new(type_name);
    for (field, shape) in fields {
        validate_field_name(field)?;
        let nested_name = format!("{}{}", type_name, field);
        object = object.field(field.clone(), field_type(&nested_name, shape, out)?);
    }
    out.objects.push(object);
    Ok(())
}

fn field_type(type_name: &str, shape: &Shape, out: &mut TypeNames) -> Result<FieldType> {
    match shape {
        Shape::Unknown => Ok(FieldType::string()),
        Shape::Scalar(s) => Ok(FieldType::Scalar(*s)),
        Shape::Object(fields) => {
            let name = out.reserve(type_name);
            materialize(&name, fields, out)?;
            Ok(FieldType::object(name))
        }
        Shape::Array(element) => match element.as_ref() {
            Shape::Array(_) => Err(MapperError::InvalidSchema(format!(
                "Field '{}' holds arrays of arrays, which cannot be addressed by a path",
                type_name
            ))),
            other => Ok(FieldType::array(field_type(type_name, other, out)?)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ElementKind, UnderlyingType, resolve};
    use serde_json::json;

    #[test]
    fn test_infer_nested_documents() {
        let docs = vec![
            json!({
                "Title": "p1",
                "FavoriteCount": 3,
                "Tags": ["a", "b"],
                "Author": {"Username": "admin"},
                "Comments": [{"Content": "hi", "Updated": "2024-01-02T10:00:00Z"}]
            }),
            json!({
                "Title": "p2",
                "FavoriteCount": 1.5,
                "Comments": [{"Content": "yo", "Replies": [{"Content": "r"}]}]
            }),
        ];

        let schema = infer_schema("Post", &docs).unwrap();

        let count = schema.root().find_field("FavoriteCount").unwrap();
        assert_eq!(count.field_type, FieldType::float());

        let path = resolve(&schema, "Comments.Replies.Content").unwrap();
        assert_eq!(path.nodes()[0].element_kind, ElementKind::ObjectArray);
        assert_eq!(path.nodes()[1].element_kind, ElementKind::ObjectArray);

        let updated = resolve(&schema, "Comments.Updated").unwrap();
        assert_eq!(
            updated.terminal().underlying_type,
            UnderlyingType::Scalar(ScalarType::DateTime)
        );

        let tags = resolve(&schema, "Tags").unwrap();
        assert_eq!(tags.terminal().element_kind, ElementKind::ValueArray);
    }

    #[test]
    fn test_conflicting_types_fall_back_to_string() {
        let docs = vec![json!({"Code": 1}), json!({"Code": "A1"}), json!({"Code": null})];
        let schema = infer_schema("Item", &docs).unwrap();
        assert_eq!(
            schema.root().find_field("Code").unwrap().field_type,
            FieldType::string()
        );
    }

    #[test]
    fn test_colliding_nested_names_get_suffixes() {
        let docs = vec![json!({
            "A": {"B": {"Y": 2}},
            "AB": {"X": "x"}
        })];

        let schema = infer_schema("Post", &docs).unwrap();

        assert_eq!(
            schema.root().find_field("A").unwrap().field_type,
            FieldType::object("PostA")
        );
        assert_eq!(
            schema.root().find_field("AB").unwrap().field_type,
            FieldType::object("PostAB2")
        );
        assert_eq!(
            resolve(&schema, "A.B.Y").unwrap().terminal().underlying_type,
            UnderlyingType::Scalar(ScalarType::Int)
        );
        assert_eq!(
            resolve(&schema, "AB.X").unwrap().terminal().underlying_type,
            UnderlyingType::Scalar(ScalarType::String)
        );
    }

    #[test]
    fn test_rejects_empty_and_non_objects() {
        assert!(infer_schema("Item", &[]).is_err());
        assert!(infer_schema("Item", &[json!([1, 2])]).is_err());
    }
}
