//! Type-path reflector: resolves dotted field paths against a [`Schema`].

use super::{FieldType, ObjectType, ScalarType, Schema};
use crate::core::{MapperError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    // `Name` or `Name[3]`; the index is accepted and ignored
    static ref SEGMENT: Regex =
        Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*(?:\[\s*\d+\s*\])?\s*$").unwrap();
}

/// How a resolved segment holds its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Scalar,
    Object,
    ValueArray,
    ObjectArray,
}

impl ElementKind {
    pub fn is_array(&self) -> bool {
        matches!(self, Self::ValueArray | Self::ObjectArray)
    }
}

/// Semantic type of a segment. For arrays this is the element type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnderlyingType {
    Scalar(ScalarType),
    Object(String),
}

impl fmt::Display for UnderlyingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{}", s),
            Self::Object(_) => write!(f, "object"),
        }
    }
}

/// One resolved step of a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNode {
    pub name: String,
    pub element_kind: ElementKind,
    pub underlying_type: UnderlyingType,
    /// Index of the owning node within the same [`ResolvedPath`]
    pub parent: Option<usize>,
}

impl TypeNode {
    pub fn crosses_array(&self) -> bool {
        self.element_kind.is_array()
    }
}

/// Ordered chain of [`TypeNode`]s for one dotted path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    nodes: Vec<TypeNode>,
}

impl ResolvedPath {
    pub fn nodes(&self) -> &[TypeNode] {
        &self.nodes
    }

    pub fn terminal(&self) -> &TypeNode {
        // resolve() never produces an empty chain
        &self.nodes[self.nodes.len() - 1]
    }

    /// Dotted path using the declared field names
    pub fn canonical(&self) -> String {
        self.prefix_key(self.nodes.len() - 1)
    }

    /// Dotted declared names of nodes `0..=index`
    pub fn prefix_key(&self, index: usize) -> String {
        self.nodes[..=index]
            .iter()
            .map(|n| n.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Object-array nodes that need a join: every one except a terminal node
    pub fn array_crossings(&self) -> impl Iterator<Item = (usize, &TypeNode)> {
        let last = self.nodes.len() - 1;
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(idx, node)| *idx != last && node.element_kind == ElementKind::ObjectArray)
    }
}

/// Strip an optional `[n]` indexer from a path segment
pub fn parse_segment(segment: &str) -> Option<&str> {
    SEGMENT
        .captures(segment)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Resolve `path` against the schema's root type.
///
/// Array segments always mean "every element"; explicit indexes are ignored.
pub fn resolve(schema: &Schema, path: &str) -> Result<ResolvedPath> {
    let trimmed = path.trim();
    let not_found = |type_name: &str| MapperError::PathNotFound {
        path: path.to_string(),
        type_name: type_name.to_string(),
    };

    if trimmed.is_empty() {
        return Err(not_found(schema.root_name()));
    }

    let mut owner: Option<&ObjectType> = Some(schema.root());
    let mut owner_name = schema.root_name().to_string();
    let mut nodes: Vec<TypeNode> = Vec::new();

    for raw in trimmed.split('.') {
        let object = owner.ok_or_else(|| not_found(&owner_name))?;
        let name = parse_segment(raw).ok_or_else(|| not_found(object.name()))?;
        let field = object
            .find_field(name)
            .ok_or_else(|| not_found(object.name()))?;

        let (element_kind, underlying_type) = classify(&field.field_type)
            .ok_or_else(|| MapperError::InvalidSchema(format!(
                "Field '{}' has type {} which cannot be traversed",
                field.name, field.field_type
            )))?;

        owner = match &underlying_type {
            UnderlyingType::Object(type_name) => Some(
                schema
                    .object_type(type_name)
                    .ok_or_else(|| not_found(type_name))?,
            ),
            UnderlyingType::Scalar(_) => None,
        };
        owner_name = underlying_type.to_string();

        let parent = nodes.len().checked_sub(1);
        nodes.push(TypeNode {
            name: field.name.clone(),
            element_kind,
            underlying_type,
            parent,
        });
    }

    let resolved = ResolvedPath { nodes };
    if resolved.terminal().element_kind == ElementKind::ObjectArray {
        return Err(MapperError::ArrayTerminalPath(path.to_string()));
    }

    Ok(resolved)
}

fn classify(field_type: &FieldType) -> Option<(ElementKind, UnderlyingType)> {
    match field_type {
        FieldType::Scalar(s) => Some((ElementKind::Scalar, UnderlyingType::Scalar(*s))),
        FieldType::Object(name) => Some((ElementKind::Object, UnderlyingType::Object(name.clone()))),
        FieldType::Array(element) => match element.as_ref() {
            FieldType::Scalar(s) => Some((ElementKind::ValueArray, UnderlyingType::Scalar(*s))),
            FieldType::Object(name) => {
                Some((ElementKind::ObjectArray, UnderlyingType::Object(name.clone())))
            }
            FieldType::Array(_) => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ObjectType;

    fn post_schema() -> Schema {
        Schema::builder("Post")
            .object(
                ObjectType::new("Post")
                    .field("Title", FieldType::string())
                    .field("Author", FieldType::object("User"))
                    .field("Tags", FieldType::array(FieldType::string()))
                    .field("Comments", FieldType::array(FieldType::object("Comment")))
                    .field("FavoriteCount", FieldType::int()),
            )
            .object(
                ObjectType::new("Comment")
                    .field("Content", FieldType::string())
                    .field("Author", FieldType::object("User"))
                    .field("Replies", FieldType::array(FieldType::object("Reply"))),
            )
            .object(
                ObjectType::new("Reply")
                    .field("Content", FieldType::string())
                    .field("Author", FieldType::object("User")),
            )
            .object(ObjectType::new("User").field("Username", FieldType::string()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_scalar_and_object_path() {
        let schema = post_schema();
        let path = resolve(&schema, "Author.Username").unwrap();
        let nodes = path.nodes();

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].element_kind, ElementKind::Object);
        assert_eq!(nodes[0].underlying_type, UnderlyingType::Object("User".into()));
        assert_eq!(nodes[1].underlying_type, UnderlyingType::Scalar(ScalarType::String));
        assert_eq!(nodes[1].parent, Some(0));
        assert_eq!(path.array_crossings().count(), 0);
    }

    #[test]
    fn test_value_array_records_element_type() {
        let schema = post_schema();
        let path = resolve(&schema, "Tags").unwrap();
        let tags = path.terminal();

        assert_eq!(tags.element_kind, ElementKind::ValueArray);
        assert_eq!(tags.underlying_type, UnderlyingType::Scalar(ScalarType::String));
        assert!(tags.crosses_array());
    }

    #[test]
    fn test_nested_object_arrays() {
        let schema = post_schema();
        let path = resolve(&schema, "Comments.Replies.Author.Username").unwrap();

        let crossings: Vec<String> = path
            .array_crossings()
            .map(|(idx, _)| path.prefix_key(idx))
            .collect();
        assert_eq!(crossings, vec!["Comments", "Comments.Replies"]);
        assert_eq!(path.nodes()[1].underlying_type, UnderlyingType::Object("Reply".into()));
    }

    #[test]
    fn test_case_insensitive_and_indexer_ignored() {
        let schema = post_schema();
        let path = resolve(&schema, "comments[0].author.USERNAME").unwrap();
        assert_eq!(path.canonical(), "Comments.Author.Username");
    }

    #[test]
    fn test_path_not_found() {
        let schema = post_schema();
        match resolve(&schema, "Comments.Missing") {
            Err(MapperError::PathNotFound { path, type_name }) => {
                assert_eq!(path, "Comments.Missing");
                assert_eq!(type_name, "Comment");
            }
            other => panic!("expected PathNotFound, got {:?}", other),
        }

        assert!(matches!(
            resolve(&schema, "Title.Length"),
            Err(MapperError::PathNotFound { .. })
        ));
        assert!(matches!(resolve(&schema, "  "), Err(MapperError::PathNotFound { .. })));
        assert!(matches!(resolve(&schema, "Title[x]"), Err(MapperError::PathNotFound { .. })));
    }

    #[test]
    fn test_object_array_terminal_rejected() {
        let schema = post_schema();
        assert!(matches!(
            resolve(&schema, "Comments"),
            Err(MapperError::ArrayTerminalPath(_))
        ));
        assert!(matches!(
            resolve(&schema, "Comments.Replies"),
            Err(MapperError::ArrayTerminalPath(_))
        ));
    }

    #[test]
    fn test_parse_segment() {
        assert_eq!(parse_segment("Comments[12]"), Some("Comments"));
        assert_eq!(parse_segment(" Title "), Some("Title"));
        assert_eq!(parse_segment("Comments[]"), None);
        assert_eq!(parse_segment(""), None);
    }
}
