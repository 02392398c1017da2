//! # Type Model
//!
//! The closed union of schema types plus property and constraint metadata.
//! Every consumer pattern-matches [`ModelType`] exhaustively, so adding a
//! kind forces every projection and lowering site to handle it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Index of a composite type in the [`crate::model::CodeModel`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeId(pub usize);

/// Index of an enum type in the [`crate::model::CodeModel`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnumId(pub usize);

/// The closed set of known primitive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimaryKind {
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    Long,
    /// Double-precision floating point.
    Double,
    /// Single-precision floating point.
    Float,
    /// Boolean.
    Boolean,
    /// Raw byte buffer.
    ByteArray,
    /// Unicode string.
    String,
    /// Calendar date without time.
    Date,
    /// ISO-8601 date-time.
    DateTime,
    /// RFC 1123 formatted date-time (wire-only representation).
    DateTimeRfc1123,
    /// ISO-8601 duration.
    Duration,
    /// Seconds since the Unix epoch (wire-only representation).
    UnixTime,
    /// UUID string.
    Uuid,
    /// Streaming request/response body.
    Stream,
    /// Untyped object.
    Object,
    /// Service client credentials.
    Credentials,
    /// URL-safe base64 encoded bytes (wire-only representation).
    Base64Url,
    /// Absent type (void returns).
    None,
}

fn default_true() -> bool {
    true
}

/// A primitive type instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryType {
    /// The primitive kind.
    pub kind: PrimaryKind,
    /// Whether the value-kind boxing (`NSNumber*`) is wanted. Reference
    /// kinds are nullable regardless.
    #[serde(default = "default_true")]
    pub want_nullable: bool,
    /// Optional wire format modifier (e.g. `int64`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl PrimaryType {
    /// A nullable primitive of the given kind.
    pub fn new(kind: PrimaryKind) -> Self {
        Self {
            kind,
            want_nullable: true,
            format: None,
        }
    }

    /// Whether the projected Objective-C type is a pointer / nullable type.
    ///
    /// Value kinds become plain C scalars only when non-nullable was
    /// explicitly requested; everything else stays a pointer type.
    pub fn is_nullable(&self) -> bool {
        if self.want_nullable {
            return true;
        }
        !matches!(
            self.kind,
            PrimaryKind::None
                | PrimaryKind::Boolean
                | PrimaryKind::Integer
                | PrimaryKind::Long
                | PrimaryKind::Double
                | PrimaryKind::UnixTime
        )
    }
}

/// An array type wrapping an element type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayType {
    /// The element type.
    pub element: ModelType,
    /// Collection serialization format for non-body locations (`csv`,
    /// `ssv`, `tsv`, `pipes`, `multi`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_format: Option<String>,
}

/// A dictionary type with string keys wrapping a value type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryType {
    /// The value type.
    pub value: ModelType,
}

/// The closed union of schema types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModelType {
    /// A primitive type.
    Primary(PrimaryType),
    /// An ordered collection.
    Array(Box<ArrayType>),
    /// A string-keyed map.
    Dictionary(Box<DictionaryType>),
    /// A composite (record) type, by arena id.
    Composite(CompositeId),
    /// An enumerated type, by arena id.
    Enum(EnumId),
}

impl ModelType {
    /// A nullable primitive of the given kind.
    pub fn primary(kind: PrimaryKind) -> Self {
        ModelType::Primary(PrimaryType::new(kind))
    }

    /// An array of the given element type.
    pub fn array(element: ModelType) -> Self {
        ModelType::Array(Box::new(ArrayType {
            element,
            collection_format: None,
        }))
    }

    /// A dictionary with the given value type.
    pub fn dictionary(value: ModelType) -> Self {
        ModelType::Dictionary(Box::new(DictionaryType { value }))
    }

    /// True when this is a primitive of the given kind.
    pub fn is_primary(&self, kind: PrimaryKind) -> bool {
        matches!(self, ModelType::Primary(p) if p.kind == kind)
    }
}

/// The closed set of supported value constraints.
///
/// Any constraint kind outside this set cannot be represented by the
/// generator and must fail the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constraint {
    /// Value must be strictly below the bound.
    ExclusiveMaximum,
    /// Value must be strictly above the bound.
    ExclusiveMinimum,
    /// Value must be at or below the bound.
    InclusiveMaximum,
    /// Value must be at or above the bound.
    InclusiveMinimum,
    /// Collection must have at most this many items.
    MaxItems,
    /// Collection must have at least this many items.
    MinItems,
    /// String must be at most this long.
    MaxLength,
    /// String must be at least this long.
    MinLength,
    /// Value must be an integral multiple of the bound.
    MultipleOf,
    /// String (or every dictionary value) must match the bound as a regex.
    Pattern,
    /// Collection items must be pairwise distinct (bound literal `true`).
    UniqueItems,
}

/// A property of a composite type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    /// The client-facing property name.
    pub name: String,
    /// The field name on the wire.
    pub serialized_name: String,
    /// The property type.
    pub model_type: ModelType,
    /// Whether the property must be present.
    #[serde(default)]
    pub is_required: bool,
    /// Whether the property is server-assigned.
    #[serde(default)]
    pub is_read_only: bool,
    /// Whether the property carries a fixed value.
    #[serde(default)]
    pub is_constant: bool,
    /// Whether this is an injected polymorphic discriminator property.
    #[serde(default)]
    pub is_discriminator: bool,
    /// Doc comment text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Declared constraints, in declaration order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub constraints: IndexMap<Constraint, String>,
}

impl Property {
    /// A minimal property with the given names and type.
    pub fn new(name: &str, serialized_name: &str, model_type: ModelType) -> Self {
        Self {
            name: name.to_string(),
            serialized_name: serialized_name.to_string(),
            model_type,
            is_required: false,
            is_read_only: false,
            is_constant: false,
            is_discriminator: false,
            documentation: None,
            constraints: IndexMap::new(),
        }
    }
}

/// A single (member name, serialized value) pair of an enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    /// The member identifier.
    pub name: String,
    /// The value transmitted on the wire.
    pub serialized_value: String,
}

/// The placeholder name carried by enums the schema left anonymous.
pub const UNNAMED_ENUM_PLACEHOLDER: &str = "enum";

/// An enumerated type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumType {
    /// The type name; `"enum"` or empty while still anonymous.
    #[serde(default)]
    pub name: String,
    /// Doc comment text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Ordered members.
    #[serde(default)]
    pub values: Vec<EnumValue>,
    /// Whether member names may stand alone as top-level identifiers.
    #[serde(default = "default_true")]
    pub has_unique_names: bool,
    /// The named sibling an anonymous enum delegates its declarations to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_type: Option<EnumId>,
}

impl EnumType {
    /// An empty enum with the given name.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            documentation: None,
            values: Vec::new(),
            has_unique_names: true,
            related_type: None,
        }
    }

    /// False exactly when the enum has no usable name and no values, in
    /// which case it is treated as a plain string type.
    pub fn is_named(&self) -> bool {
        !self.values.is_empty()
            && !self.name.is_empty()
            && self.name != UNNAMED_ENUM_PLACEHOLDER
    }
}

/// A composite (record) type, possibly polymorphic, possibly inheriting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeType {
    /// The type name.
    pub name: String,
    /// The name used on the wire (discriminator value for leaves).
    #[serde(default)]
    pub serialized_name: String,
    /// Doc comment text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Own properties in declaration order.
    #[serde(default)]
    pub properties: Vec<Property>,
    /// Single-inheritance base type, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<CompositeId>,
    /// Whether this type declares a discriminator hierarchy.
    #[serde(default)]
    pub is_polymorphic: bool,
    /// Whether any ancestor declares a discriminator hierarchy.
    #[serde(default)]
    pub base_is_polymorphic: bool,
    /// Serialized name of the discriminator field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polymorphic_discriminator: Option<String>,
    /// Enum of discriminator values across the hierarchy's leaves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator_enum: Option<EnumId>,
    /// Set during transform: the type is returned by at least one method.
    #[serde(default)]
    pub is_response_type: bool,
    /// Field holding the continuation URL for paged responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
    /// Whether the type is declared external (hand-written, not emitted).
    #[serde(default)]
    pub is_external: bool,
}

impl CompositeType {
    /// An empty composite with the given name, serialized name defaulted to
    /// the same string.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            serialized_name: name.to_string(),
            documentation: None,
            properties: Vec::new(),
            base: None,
            is_polymorphic: false,
            base_is_polymorphic: false,
            polymorphic_discriminator: None,
            discriminator_enum: None,
            is_response_type: false,
            next_link: None,
            is_external: false,
        }
    }
}
