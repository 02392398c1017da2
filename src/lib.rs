#![deny(missing_docs)]

//! # CDD Objective-C
//!
//! Code-model transformation core for an Objective-C client generator.
//! The host hands over a populated type/operation graph; this crate mutates
//! it in a fixed order (enums, model types, methods, global name-collision
//! resolution) and supplies the per-type projection, validation, and wire
//! conversion helpers the host's template stage calls while rendering.

/// Shared error types.
pub mod error;

/// The language-neutral code-model graph.
pub mod model;

/// Objective-C naming rules.
pub mod naming;

/// Type projection onto Objective-C declarations.
pub mod projection;

/// Composite hierarchy and polymorphism queries.
pub mod composite;

/// Constraint-to-validation lowering.
pub mod validation;

/// Operation and parameter shape building.
pub mod operations;

/// The fixed-order transformation pipeline.
pub mod transform;

/// Artifact path conventions and declaration fragments.
pub mod writer;

pub use composite::{
    add_polymorphic_property_if_necessary, all_properties, derived_types, discriminator_enum_value,
    sibling_types,
};
pub use error::{AppError, AppResult};
pub use model::{
    CodeModel, CompositeId, CompositeType, Constraint, EnumId, EnumType, EnumValue, HttpMethod,
    Method, MethodGroup, ModelType, Parameter, ParameterLocation, PrimaryKind, PrimaryType,
    Property,
};
pub use operations::{convert_to_wire_type, needs_conversion, wire_type};
pub use projection::{
    decode_type_declaration, encode_type_declaration, parameter_variant, response_variant,
    variable_type_declaration,
};
pub use transform::transform_code_model;
pub use validation::{validate_property, validate_type, VariableScope};
pub use writer::{ArtifactSink, GeneratedArtifact, MemorySink};
