//! OpenAPI document types.
//!
//! These types mirror the parts of the OpenAPI 3.0 / 3.1 object model that
//! contract verification needs. Unknown fields are ignored so real-world
//! documents with extensions, examples and tags load unchanged.
//!
//! Parameters, request bodies and responses may be `$ref` objects; the
//! reference is kept on the object itself and resolved when the
//! [`Specification`](crate::Specification) model is built.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// OpenAPI document root object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApi {
    /// OpenAPI version (e.g. "3.0.3" or "3.1.0").
    pub openapi: String,
    /// API metadata.
    pub info: Info,
    /// Available servers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    /// API paths and operations.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub paths: IndexMap<String, PathItem>,
    /// Reusable components.
    #[serde(default)]
    pub components: Components,
}

/// API metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Info {
    /// API title.
    #[serde(default)]
    pub title: String,
    /// API version.
    #[serde(default)]
    pub version: String,
    /// API description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Server information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    /// Server URL, possibly relative and possibly templated.
    pub url: String,
    /// Server description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Server variables for URL templating.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, ServerVariable>,
}

/// Server variable for URL templating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerVariable {
    /// Default value.
    pub default: String,
    /// Possible values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[serde(rename = "enum")]
    pub enum_values: Vec<String>,
}

/// A path item containing operations for a single path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    /// GET operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// PUT operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// POST operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// DELETE operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    /// OPTIONS operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    /// HEAD operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    /// PATCH operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    /// TRACE operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
    /// Parameters common to all operations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
}

impl PathItem {
    /// Iterate over the declared operations with their HTTP method.
    pub fn operations(&self) -> impl Iterator<Item = (http::Method, &Operation)> {
        [
            (http::Method::GET, &self.get),
            (http::Method::HEAD, &self.head),
            (http::Method::PUT, &self.put),
            (http::Method::POST, &self.post),
            (http::Method::DELETE, &self.delete),
            (http::Method::PATCH, &self.patch),
            (http::Method::OPTIONS, &self.options),
            (http::Method::TRACE, &self.trace),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
    }
}

/// An API operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    /// Unique operation identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "operationId")]
    pub operation_id: Option<String>,
    /// Short summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Whether deprecated.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "requestBody")]
    pub request_body: Option<RequestBody>,
    /// Responses by status key (`"200"`, `"4XX"`, `"default"`).
    #[serde(default)]
    pub responses: IndexMap<String, Response>,
}

/// Parameter location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterIn {
    /// Query string parameter.
    Query,
    /// URL path parameter.
    Path,
    /// HTTP header.
    Header,
    /// Cookie.
    Cookie,
}

impl ParameterIn {
    /// Location prefix used in validation messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Path => "path",
            Self::Header => "header",
            Self::Cookie => "cookie",
        }
    }
}

/// An operation parameter, or a reference to one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parameter {
    /// Reference to a component parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    /// Parameter name.
    #[serde(default)]
    pub name: String,
    /// Parameter location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "in")]
    pub location: Option<ParameterIn>,
    /// Whether required.
    #[serde(default)]
    pub required: bool,
    /// Whether an empty value is allowed (query only).
    #[serde(default, rename = "allowEmptyValue")]
    pub allow_empty_value: bool,
    /// Whether array values are sent as repeated parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,
    /// Parameter schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// Request body, or a reference to one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestBody {
    /// Reference to a component request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    /// Whether required.
    #[serde(default)]
    pub required: bool,
    /// Content by media type.
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

/// Media type content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema for this media type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// Response definition, or a reference to one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    /// Reference to a component response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Response headers.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, Header>,
    /// Response content by media type.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
}

/// Response header.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Header {
    /// Whether the header must be present.
    #[serde(default)]
    pub required: bool,
    /// Header schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// Reusable components.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Components {
    /// Reusable schemas.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, Schema>,
    /// Reusable responses.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, Response>,
    /// Reusable parameters.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, Parameter>,
    /// Reusable request bodies.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    #[serde(rename = "requestBodies")]
    pub request_bodies: IndexMap<String, RequestBody>,
}

/// JSON Schema type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// String type.
    String,
    /// Number type.
    Number,
    /// Integer type.
    Integer,
    /// Boolean type.
    Boolean,
    /// Array type.
    Array,
    /// Object type.
    Object,
    /// Null type.
    Null,
}

impl SchemaType {
    /// Lowercase JSON Schema name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Null => "null",
        }
    }
}

/// The `type` keyword: a single type (3.0) or a list of types (3.1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaTypes {
    /// A single type.
    Single(SchemaType),
    /// A list of allowed types.
    Multiple(Vec<SchemaType>),
}

impl SchemaTypes {
    /// All allowed types.
    pub fn as_slice(&self) -> &[SchemaType] {
        match self {
            Self::Single(t) => std::slice::from_ref(t),
            Self::Multiple(ts) => ts,
        }
    }
}

/// The `additionalProperties` keyword.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    /// `true` allows any extra property, `false` forbids them.
    Allowed(bool),
    /// Extra properties must match this schema.
    Schema(Box<Schema>),
}

/// `exclusiveMinimum` / `exclusiveMaximum`: a flag in 3.0, a bound in 3.1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExclusiveBound {
    /// 3.0 style: makes `minimum`/`maximum` exclusive.
    Flag(bool),
    /// 3.1 style: the exclusive bound itself.
    Bound(f64),
}

/// JSON Schema definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Reference to another schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    /// Schema type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub schema_type: Option<SchemaTypes>,
    /// Schema format (e.g., "date-time", "uuid").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Whether `null` is allowed (3.0).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
    /// Enum values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<serde_json::Value>>,
    /// Constant value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "const")]
    pub const_value: Option<serde_json::Value>,
    /// Object properties.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,
    /// Required properties.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Extra property policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    /// Minimum number of properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,
    /// Maximum number of properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,
    /// Array item schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Minimum array length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    /// Maximum array length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    /// Whether array items must be distinct.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique_items: bool,
    /// oneOf schemas.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,
    /// anyOf schemas.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<Schema>,
    /// allOf schemas.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,
    /// Schema the value must not match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Schema>>,
    /// Minimum value (for numbers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Maximum value (for numbers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    /// Exclusive lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<ExclusiveBound>,
    /// Exclusive upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<ExclusiveBound>,
    /// Value must be a multiple of this number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,
    /// Minimum length (for strings).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    /// Maximum length (for strings).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    /// Regular expression (for strings).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl Schema {
    /// Create a schema of a single type.
    pub fn of_type(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(SchemaTypes::Single(schema_type)),
            ..Self::default()
        }
    }

    /// Create a `$ref` schema.
    pub fn reference(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Self::default()
        }
    }

    /// The first declared type, used for parameter coercion.
    pub fn primary_type(&self) -> Option<SchemaType> {
        self.schema_type
            .as_ref()
            .and_then(|types| {
                types
                    .as_slice()
                    .iter()
                    .copied()
                    .find(|t| *t != SchemaType::Null)
            })
    }

    /// Visit this schema and every nested subschema.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Schema)) {
        visit(self);
        for schema in self.properties.values() {
            schema.walk(visit);
        }
        if let Some(AdditionalProperties::Schema(schema)) = &self.additional_properties {
            schema.walk(visit);
        }
        if let Some(items) = &self.items {
            items.walk(visit);
        }
        for schema in self.one_of.iter().chain(&self.any_of).chain(&self.all_of) {
            schema.walk(visit);
        }
        if let Some(not) = &self.not {
            not.walk(visit);
        }
    }
}
