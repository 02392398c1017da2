//! # Code Model
//!
//! Definition of the language-neutral code-model graph the host hands to the
//! generator, plus the `CodeModel` container that owns the type arenas.
//!
//! Composite and enum types live in arenas on [`CodeModel`] and are addressed
//! by [`CompositeId`] / [`EnumId`]. A dangling id is a model-consistency
//! error, surfaced through the accessor methods rather than a panic.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

pub mod operations;
pub mod types;

pub use operations::{
    HttpMethod, InputTransformation, Method, MethodGroup, Parameter, ParameterLocation,
    ParameterMapping,
};
pub use types::{
    ArrayType, CompositeId, CompositeType, Constraint, DictionaryType, EnumId, EnumType, EnumValue,
    ModelType, PrimaryKind, PrimaryType, Property,
};

/// The root of the code-model graph for one generation run.
///
/// Created once by the host (typically deserialized from JSON or YAML) and
/// mutated in place by the transformation pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeModel {
    /// The service client name.
    pub name: String,
    /// The target namespace / package prefix.
    pub namespace: String,
    /// The service base URL.
    pub base_url: String,
    /// The client-level API version, if any.
    pub api_version: Option<String>,
    /// Arena of all composite types, inline and top-level alike.
    pub composites: Vec<CompositeType>,
    /// Arena of all enum types, inline and top-level alike.
    pub enums: Vec<EnumType>,
    /// Ids of enums registered as top-level types (one artifact each).
    pub enum_types: Vec<EnumId>,
    /// Operation groups in declaration order.
    pub method_groups: Vec<MethodGroup>,
    /// Names reserved by hand-written client surface; enum members colliding
    /// with these are never promoted to top-level identifiers.
    pub user_defined_names: Vec<String>,
    /// Whether the host declared a parameterized ("custom") base URL.
    pub is_custom_base_url: bool,
}

impl CodeModel {
    /// Deserializes a code model from a JSON document.
    pub fn from_json(json: &str) -> AppResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| AppError::General(format!("Failed to parse code model JSON: {}", e)))
    }

    /// Deserializes a code model from a YAML document.
    pub fn from_yaml(yaml: &str) -> AppResult<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| AppError::General(format!("Failed to parse code model YAML: {}", e)))
    }

    /// The base URL with an `https://` scheme defaulted in when absent.
    pub fn resolved_base_url(&self) -> String {
        if self.base_url.contains("://") {
            self.base_url.clone()
        } else {
            format!("https://{}", self.base_url)
        }
    }

    /// Looks up a composite type, failing on a dangling id.
    pub fn composite(&self, id: CompositeId) -> AppResult<&CompositeType> {
        self.composites.get(id.0).ok_or_else(|| {
            AppError::ModelConsistency(format!("dangling composite id {}", id.0))
        })
    }

    /// Mutable composite lookup, failing on a dangling id.
    pub fn composite_mut(&mut self, id: CompositeId) -> AppResult<&mut CompositeType> {
        self.composites.get_mut(id.0).ok_or_else(|| {
            AppError::ModelConsistency(format!("dangling composite id {}", id.0))
        })
    }

    /// Looks up an enum type, failing on a dangling id.
    pub fn enum_type(&self, id: EnumId) -> AppResult<&EnumType> {
        self.enums
            .get(id.0)
            .ok_or_else(|| AppError::ModelConsistency(format!("dangling enum id {}", id.0)))
    }

    /// Mutable enum lookup, failing on a dangling id.
    pub fn enum_type_mut(&mut self, id: EnumId) -> AppResult<&mut EnumType> {
        self.enums
            .get_mut(id.0)
            .ok_or_else(|| AppError::ModelConsistency(format!("dangling enum id {}", id.0)))
    }

    /// Adds a composite type to the arena and returns its id.
    pub fn add_composite(&mut self, composite: CompositeType) -> CompositeId {
        self.composites.push(composite);
        CompositeId(self.composites.len() - 1)
    }

    /// Adds an enum type to the arena and returns its id.
    pub fn add_enum(&mut self, enum_type: EnumType) -> EnumId {
        self.enums.push(enum_type);
        EnumId(self.enums.len() - 1)
    }

    /// Registers an enum as a top-level type if not already registered.
    pub fn register_enum(&mut self, id: EnumId) {
        if !self.enum_types.contains(&id) {
            self.enum_types.push(id);
        }
    }

    /// Iterates over every method of every group in declaration order.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.method_groups.iter().flat_map(|g| g.methods.iter())
    }

    /// Ids of composites registered in the arena, in declaration order.
    pub fn composite_ids(&self) -> impl Iterator<Item = CompositeId> {
        (0..self.composites.len()).map(CompositeId)
    }
}
