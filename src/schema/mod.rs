//! Ahead-of-time description of a document type's shape.
//!
//! A [`Schema`] names a root object type and holds every object type reachable
//! from it. Object types refer to each other by name, which lets recursive shapes
//! (a comment holding replies of the same type) be described without cycles.
//!
//! Schemas are built once per document type and handed to the reflector and
//! compiler; nothing is discovered at query time.

mod inference;
mod reflector;
mod validator;

pub use inference::infer_schema;
pub use reflector::{ElementKind, ResolvedPath, TypeNode, UnderlyingType, parse_segment, resolve};
pub use validator::{validate_field_name, validate_table_name};

use crate::core::{MapperError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Scalar kinds a document field may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Int,
    Float,
    Bool,
    DateTime,
    Guid,
}

impl ScalarType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "string" | "text" => Some(Self::String),
            "int" | "integer" => Some(Self::Int),
            "float" | "double" | "number" => Some(Self::Float),
            "bool" | "boolean" => Some(Self::Bool),
            "datetime" | "timestamp" => Some(Self::DateTime),
            "guid" | "uuid" => Some(Self::Guid),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::DateTime => "datetime",
            Self::Guid => "guid",
        }
    }

    /// Textual scalars are compared as extracted, without a cast
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::String | Self::Guid)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Declared type of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Scalar(ScalarType),
    /// Reference to an object type by name
    Object(String),
    Array(Box<FieldType>),
}

impl FieldType {
    pub fn string() -> Self {
        Self::Scalar(ScalarType::String)
    }

    pub fn int() -> Self {
        Self::Scalar(ScalarType::Int)
    }

    pub fn float() -> Self {
        Self::Scalar(ScalarType::Float)
    }

    pub fn bool() -> Self {
        Self::Scalar(ScalarType::Bool)
    }

    pub fn datetime() -> Self {
        Self::Scalar(ScalarType::DateTime)
    }

    pub fn guid() -> Self {
        Self::Scalar(ScalarType::Guid)
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self::Object(name.into())
    }

    pub fn array(element: FieldType) -> Self {
        Self::Array(Box::new(element))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{}", s),
            Self::Object(name) => write!(f, "{}", name),
            Self::Array(element) => write!(f, "{}[]", element),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
}

/// An object type: ordered fields plus a case-insensitive lookup
#[derive(Debug, Clone)]
pub struct ObjectType {
    name: String,
    fields: Vec<FieldDescriptor>,
    lookup: HashMap<String, usize>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            field_type,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Case-insensitive field lookup
    pub fn find_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.lookup
            .get(&name.to_ascii_lowercase())
            .map(|&idx| &self.fields[idx])
    }

    fn index_fields(&mut self) -> Result<()> {
        self.lookup.clear();
        for (idx, field) in self.fields.iter().enumerate() {
            validate_field_name(&field.name)?;
            if self.lookup.insert(field.name.to_ascii_lowercase(), idx).is_some() {
                return Err(MapperError::InvalidSchema(format!(
                    "Type '{}' declares field '{}' more than once (names are case-insensitive)",
                    self.name, field.name
                )));
            }
        }
        Ok(())
    }
}

/// Validated description of a document type and every object type it reaches
#[derive(Debug, Clone)]
pub struct Schema {
    root: String,
    types: BTreeMap<String, ObjectType>,
}

impl Schema {
    pub fn builder(root: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            root: root.into(),
            types: Vec::new(),
        }
    }

    pub fn root(&self) -> &ObjectType {
        // The builder guarantees the root type exists
        &self.types[&self.root]
    }

    pub fn root_name(&self) -> &str {
        &self.root
    }

    pub fn object_type(&self, name: &str) -> Option<&ObjectType> {
        self.types.get(name)
    }

    pub fn object_types(&self) -> impl Iterator<Item = &ObjectType> {
        self.types.values()
    }

    /// Parse the JSON schema description format:
    ///
    /// ```json
    /// {"root": "Post", "types": {"Post": {"Title": "string", "Comments": ["Comment"]}}}
    /// ```
    pub fn from_json(text: &str) -> Result<Self> {
        let file: SchemaFile =
            serde_json::from_str(text).map_err(|e| MapperError::ParseError(e.to_string()))?;

        let mut builder = Schema::builder(file.root);
        for (type_name, fields) in file.types {
            let mut object = ObjectType::new(type_name);
            for (field_name, spec) in fields {
                object = object.field(field_name, spec.into_field_type()?);
            }
            builder = builder.object(object);
        }
        builder.build()
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        let types = self
            .types
            .values()
            .map(|object| {
                let fields = object
                    .fields
                    .iter()
                    .map(|f| (f.name.clone(), TypeSpec::from(&f.field_type)))
                    .collect::<BTreeMap<_, _>>();
                (object.name.clone(), fields)
            })
            .collect();

        let file = SchemaFile {
            root: self.root.clone(),
            types,
        };
        Ok(serde_json::to_value(file)?)
    }
}

pub struct SchemaBuilder {
    root: String,
    types: Vec<ObjectType>,
}

impl SchemaBuilder {
    pub fn object(mut self, object: ObjectType) -> Self {
        self.types.push(object);
        self
    }

    pub fn build(self) -> Result<Schema> {
        let mut types = BTreeMap::new();
        for mut object in self.types {
            object.index_fields()?;
            let name = object.name.clone();
            if types.insert(name.clone(), object).is_some() {
                return Err(MapperError::InvalidSchema(format!(
                    "Type '{}' is declared more than once",
                    name
                )));
            }
        }

        if !types.contains_key(&self.root) {
            return Err(MapperError::InvalidSchema(format!(
                "Root type '{}' is not declared",
                self.root
            )));
        }

        for object in types.values() {
            for field in &object.fields {
                check_reference(&types, object, field, &field.field_type, false)?;
            }
        }

        Ok(Schema {
            root: self.root,
            types,
        })
    }
}

fn check_reference(
    types: &BTreeMap<String, ObjectType>,
    owner: &ObjectType,
    field: &FieldDescriptor,
    field_type: &FieldType,
    inside_array: bool,
) -> Result<()> {
    match field_type {
        FieldType::Scalar(_) => Ok(()),
        FieldType::Object(name) if types.contains_key(name) => Ok(()),
        FieldType::Object(name) => Err(MapperError::InvalidSchema(format!(
            "Field '{}.{}' references unknown type '{}'",
            owner.name, field.name, name
        ))),
        FieldType::Array(_) if inside_array => Err(MapperError::InvalidSchema(format!(
            "Field '{}.{}' is an array of arrays, which cannot be addressed by a path",
            owner.name, field.name
        ))),
        FieldType::Array(element) => check_reference(types, owner, field, element, true),
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SchemaFile {
    root: String,
    types: BTreeMap<String, BTreeMap<String, TypeSpec>>,
}

/// `"string"` / `"Comment"` name a scalar or an object type, `["Comment"]` an array
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum TypeSpec {
    Name(String),
    List(Vec<TypeSpec>),
}

impl TypeSpec {
    fn into_field_type(self) -> Result<FieldType> {
        match self {
            TypeSpec::Name(name) => Ok(ScalarType::from_name(&name)
                .map(FieldType::Scalar)
                .unwrap_or(FieldType::Object(name))),
            TypeSpec::List(mut items) => {
                if items.len() != 1 {
                    return Err(MapperError::InvalidSchema(format!(
                        "Array type must list exactly one element type, got {}",
                        items.len()
                    )));
                }
                let element = items.remove(0).into_field_type()?;
                Ok(FieldType::array(element))
            }
        }
    }
}

impl From<&FieldType> for TypeSpec {
    fn from(field_type: &FieldType) -> Self {
        match field_type {
            FieldType::Scalar(s) => TypeSpec::Name(s.name().to_string()),
            FieldType::Object(name) => TypeSpec::Name(name.clone()),
            FieldType::Array(element) => TypeSpec::List(vec![TypeSpec::from(element.as_ref())]),
        }
    }
}
