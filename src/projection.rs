//! # Type Projection
//!
//! Maps language-neutral model types onto Objective-C type names and the
//! three contextual variants (wire, parameter, response). Names are always
//! recomputed from current field values; nothing here caches a result, so
//! projections stay correct across the in-place mutations the transform
//! pipeline performs.

use crate::error::{AppError, AppResult};
use crate::model::{
    CodeModel, CompositeId, EnumId, EnumType, ModelType, PrimaryKind, PrimaryType,
};
use std::collections::HashSet;

/// The Objective-C implementation name of a primitive type.
///
/// Total over the closed kind set; the exhaustive match is the compile-time
/// replacement for the original's unimplemented-kind runtime failure.
pub fn implementation_name(primary: &PrimaryType) -> String {
    let nullable = primary.want_nullable;
    match primary.kind {
        PrimaryKind::None => if nullable { "Void" } else { "void" }.to_string(),
        PrimaryKind::Base64Url => "NSURL*".to_string(),
        PrimaryKind::Boolean => if nullable { "NSNumber*" } else { "BOOL" }.to_string(),
        PrimaryKind::ByteArray => "NSData*".to_string(),
        PrimaryKind::Date => "NSDate*".to_string(),
        PrimaryKind::DateTime => "NSDate*".to_string(),
        PrimaryKind::DateTimeRfc1123 => "NSDate*".to_string(),
        PrimaryKind::Double => if nullable { "NSNumber*" } else { "double" }.to_string(),
        PrimaryKind::Float => if nullable { "NSNumber*" } else { "float" }.to_string(),
        PrimaryKind::Integer => if nullable { "NSNumber*" } else { "int" }.to_string(),
        PrimaryKind::Long => if nullable { "NSNumber*" } else { "long" }.to_string(),
        PrimaryKind::Stream => "NSInputStream*".to_string(),
        PrimaryKind::String => "NSString*".to_string(),
        PrimaryKind::Duration => "NSTimeInterval".to_string(),
        PrimaryKind::UnixTime => if nullable { "NSNumber*" } else { "long" }.to_string(),
        PrimaryKind::Uuid => "NSUUID*".to_string(),
        PrimaryKind::Object => "NSObject*".to_string(),
        PrimaryKind::Credentials => "AZServiceClientCredentials*".to_string(),
    }
}

/// The resolved display name of any model type.
pub fn type_name(cm: &CodeModel, ty: &ModelType) -> AppResult<String> {
    match ty {
        ModelType::Primary(p) => Ok(implementation_name(p)),
        ModelType::Array(_) => Ok("NSArray*".to_string()),
        ModelType::Dictionary(_) => Ok("NSDictionary*".to_string()),
        ModelType::Composite(id) => Ok(cm.composite(*id)?.name.clone()),
        ModelType::Enum(id) => Ok(enum_declaration(cm, *id)?),
    }
}

/// The declaration used for an enum-typed variable: the named sibling wins
/// for anonymous enums, unnamed value-less enums degrade to `NSString*`.
fn enum_declaration(cm: &CodeModel, id: EnumId) -> AppResult<String> {
    let e = resolve_enum(cm, id)?;
    if e.is_named() {
        Ok(format!("{}Enum", e.name))
    } else {
        Ok("NSString*".to_string())
    }
}

// Follows related_type delegation to the named sibling. The chain comes
// from the host, so a cycle is a consistency error, not a panic.
fn resolve_enum(cm: &CodeModel, id: EnumId) -> AppResult<&EnumType> {
    let mut seen = HashSet::new();
    let mut current = id;
    loop {
        if !seen.insert(current) {
            return Err(AppError::ModelConsistency(format!(
                "cyclic related-type chain through enum '{}'",
                cm.enum_type(id)?.name
            )));
        }
        let e = cm.enum_type(current)?;
        match e.related_type {
            Some(related) => current = related,
            None => return Ok(e),
        }
    }
}

/// The type declaration used at client-facing variable/property sites.
///
/// Structurally recursive: container declarations embed the boxed element
/// declaration. Composites surface as protocol-qualified object pointers.
pub fn variable_type_declaration(
    cm: &CodeModel,
    ty: &ModelType,
    is_required: bool,
) -> AppResult<String> {
    match ty {
        ModelType::Primary(p) => {
            let projected = if is_required {
                non_nullable_primary(p)
            } else {
                p.clone()
            };
            Ok(implementation_name(&projected))
        }
        // Container elements are always boxed object types.
        ModelType::Array(a) => Ok(format!(
            "NSArray<{}>*",
            boxed_declaration(cm, &a.element)?
        )),
        ModelType::Dictionary(d) => Ok(format!(
            "NSDictionary<NSString*, {}>*",
            boxed_declaration(cm, &d.value)?
        )),
        ModelType::Composite(id) => Ok(format!("id<{}Protocol>", cm.composite(*id)?.name)),
        ModelType::Enum(id) => enum_declaration(cm, *id),
    }
}

/// The declaration of a type as it appears inside a generic container.
fn boxed_declaration(cm: &CodeModel, ty: &ModelType) -> AppResult<String> {
    match ty {
        // Scalars must box to NSNumber inside collections.
        ModelType::Primary(p) => Ok(implementation_name(&PrimaryType::new(p.kind))),
        _ => variable_type_declaration(cm, ty, false),
    }
}

/// The concrete type used when decoding a payload into memory.
pub fn decode_type_declaration(cm: &CodeModel, ty: &ModelType) -> AppResult<String> {
    match ty {
        ModelType::Composite(id) => Ok(format!("{}Data*", cm.composite(*id)?.name)),
        ModelType::Array(a) => Ok(format!(
            "NSArray<{}>*",
            decode_boxed_declaration(cm, &a.element)?
        )),
        ModelType::Dictionary(d) => Ok(format!(
            "NSDictionary<NSString*, {}>*",
            decode_boxed_declaration(cm, &d.value)?
        )),
        _ => variable_type_declaration(cm, ty, false),
    }
}

fn decode_boxed_declaration(cm: &CodeModel, ty: &ModelType) -> AppResult<String> {
    match ty {
        ModelType::Primary(p) => Ok(implementation_name(&PrimaryType::new(p.kind))),
        _ => decode_type_declaration(cm, ty),
    }
}

/// The concrete type used when encoding a value for the wire.
pub fn encode_type_declaration(cm: &CodeModel, ty: &ModelType) -> AppResult<String> {
    decode_type_declaration(cm, ty)
}

/// The protocol conformance chain of a composite: its own protocol followed
/// by every ancestor protocol. A cyclic base chain is a consistency error.
pub fn protocol_chain(cm: &CodeModel, id: CompositeId) -> AppResult<String> {
    let mut names = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor = Some(id);
    while let Some(current) = cursor {
        if !seen.insert(current) {
            return Err(AppError::ModelConsistency(format!(
                "cyclic base-type chain through '{}'",
                cm.composite(id)?.name
            )));
        }
        let composite = cm.composite(current)?;
        names.push(format!("{}Protocol", composite.name));
        cursor = composite.base;
    }
    Ok(names.join(", "))
}

/// The protocol a composite's own protocol extends: the base type's
/// protocol, or `NSObject` at the root of a hierarchy.
pub fn base_protocol(cm: &CodeModel, id: CompositeId) -> AppResult<String> {
    match cm.composite(id)?.base {
        Some(base) => Ok(format!("{}Protocol", cm.composite(base)?.name)),
        None => Ok("NSObject".to_string()),
    }
}

fn non_nullable_primary(p: &PrimaryType) -> PrimaryType {
    PrimaryType {
        kind: p.kind,
        want_nullable: false,
        format: p.format.clone(),
    }
}

/// The non-nullable variant of a type. Only primitives change.
pub fn non_nullable_variant(ty: &ModelType) -> ModelType {
    match ty {
        ModelType::Primary(p) => ModelType::Primary(non_nullable_primary(p)),
        other => other.clone(),
    }
}

/// The client-facing variant used in method signatures and parameters.
///
/// Wire-only representations normalize away: RFC 1123 and unix-time dates
/// become plain date-times, base64url and streams become byte arrays.
pub fn parameter_variant(ty: &ModelType) -> ModelType {
    match ty {
        ModelType::Primary(p) => match p.kind {
            PrimaryKind::DateTimeRfc1123 | PrimaryKind::UnixTime => {
                ModelType::primary(PrimaryKind::DateTime)
            }
            PrimaryKind::Base64Url | PrimaryKind::Stream => {
                ModelType::primary(PrimaryKind::ByteArray)
            }
            _ => ty.clone(),
        },
        ModelType::Array(a) => substitute_element(ty, &a.element, parameter_variant(&a.element)),
        ModelType::Dictionary(d) => substitute_value(ty, &d.value, parameter_variant(&d.value)),
        _ => ty.clone(),
    }
}

/// The client-facing variant used for method return values.
pub fn response_variant(ty: &ModelType) -> ModelType {
    match ty {
        ModelType::Primary(p) => match p.kind {
            PrimaryKind::DateTimeRfc1123 | PrimaryKind::UnixTime => {
                ModelType::primary(PrimaryKind::DateTime)
            }
            PrimaryKind::Base64Url => ModelType::primary(PrimaryKind::ByteArray),
            PrimaryKind::None => non_nullable_variant(ty),
            _ => ty.clone(),
        },
        ModelType::Array(a) => substitute_element(ty, &a.element, response_variant(&a.element)),
        ModelType::Dictionary(d) => substitute_value(ty, &d.value, response_variant(&d.value)),
        _ => ty.clone(),
    }
}

// Identity is preserved unless the element variant actually differs; no
// wrapper churn for unchanged containers.
fn substitute_element(original: &ModelType, element: &ModelType, variant: ModelType) -> ModelType {
    if &variant == element {
        original.clone()
    } else {
        ModelType::array(variant)
    }
}

fn substitute_value(original: &ModelType, value: &ModelType, variant: ModelType) -> ModelType {
    if &variant == value {
        original.clone()
    } else {
        ModelType::dictionary(variant)
    }
}

/// The runtime/model headers a type's declaration depends on.
pub fn imports(cm: &CodeModel, ty: &ModelType) -> AppResult<Vec<String>> {
    match ty {
        ModelType::Primary(p) => Ok(match p.kind {
            PrimaryKind::Credentials => vec!["AZServiceClientCredentials.h".to_string()],
            PrimaryKind::Base64Url => vec!["AZBase64UrlCoding.h".to_string()],
            PrimaryKind::DateTimeRfc1123 => vec!["AZDateTimeRfc1123Coding.h".to_string()],
            _ => Vec::new(),
        }),
        ModelType::Array(a) => imports(cm, &a.element),
        ModelType::Dictionary(d) => imports(cm, &d.value),
        ModelType::Composite(id) => {
            let composite = cm.composite(*id)?;
            if composite.is_external {
                Ok(Vec::new())
            } else {
                Ok(vec![format!("Models/{}.h", composite.name)])
            }
        }
        ModelType::Enum(id) => {
            let e = resolve_enum(cm, *id)?;
            if e.is_named() {
                Ok(vec![format!("Models/{}Enum.h", e.name)])
            } else {
                Ok(Vec::new())
            }
        }
    }
}

/// The declared default for an optional wire value.
pub fn nil_default() -> &'static str {
    "nil"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{CompositeType, EnumType, EnumValue};

    #[test]
    fn test_primary_projection_nullability() {
        let mut p = PrimaryType::new(PrimaryKind::Integer);
        assert_eq!(implementation_name(&p), "NSNumber*");
        p.want_nullable = false;
        assert_eq!(implementation_name(&p), "int");
        assert_eq!(
            implementation_name(&PrimaryType::new(PrimaryKind::String)),
            "NSString*"
        );
    }

    #[test]
    fn test_container_declaration_is_recursive() {
        let cm = CodeModel::default();
        let ty = ModelType::array(ModelType::dictionary(ModelType::primary(
            PrimaryKind::Integer,
        )));
        assert_eq!(
            variable_type_declaration(&cm, &ty, false).expect("projects"),
            "NSArray<NSDictionary<NSString*, NSNumber*>*>*"
        );
    }

    #[test]
    fn test_composite_declarations() {
        let mut cm = CodeModel::default();
        let id = cm.add_composite(CompositeType::named("Pet"));
        let ty = ModelType::Composite(id);
        assert_eq!(
            variable_type_declaration(&cm, &ty, false).expect("projects"),
            "id<PetProtocol>"
        );
        assert_eq!(
            decode_type_declaration(&cm, &ty).expect("projects"),
            "PetData*"
        );
    }

    #[test]
    fn test_anonymous_enum_delegates_to_related_type() {
        let mut cm = CodeModel::default();
        let related = cm.add_enum({
            let mut e = EnumType::named("PetStatus");
            e.values.push(EnumValue {
                name: "AVAILABLE".into(),
                serialized_value: "available".into(),
            });
            e
        });
        let anon = cm.add_enum({
            let mut e = EnumType::named("enum");
            e.values.push(EnumValue {
                name: "AVAILABLE".into(),
                serialized_value: "available".into(),
            });
            e.related_type = Some(related);
            e
        });
        assert_eq!(
            variable_type_declaration(&cm, &ModelType::Enum(anon), false).expect("projects"),
            "PetStatusEnum"
        );
    }

    #[test]
    fn test_parameter_variant_normalizes_wire_kinds() {
        for kind in [PrimaryKind::DateTimeRfc1123, PrimaryKind::UnixTime] {
            assert!(parameter_variant(&ModelType::primary(kind)).is_primary(PrimaryKind::DateTime));
        }
        for kind in [PrimaryKind::Base64Url, PrimaryKind::Stream] {
            assert!(
                parameter_variant(&ModelType::primary(kind)).is_primary(PrimaryKind::ByteArray)
            );
        }
        let identity = ModelType::primary(PrimaryKind::String);
        assert_eq!(parameter_variant(&identity), identity);
    }

    #[test]
    fn test_variant_substitution_preserves_identity() {
        // Unchanged element: the container projects to itself.
        let strings = ModelType::array(ModelType::primary(PrimaryKind::String));
        assert_eq!(parameter_variant(&strings), strings);

        // Changed element: a fresh container wraps the element variant.
        let stamps = ModelType::array(ModelType::primary(PrimaryKind::UnixTime));
        assert_eq!(
            parameter_variant(&stamps),
            ModelType::array(ModelType::primary(PrimaryKind::DateTime))
        );
    }

    #[test]
    fn test_cyclic_base_chain_is_a_consistency_error() {
        let mut cm = CodeModel::default();
        let a = cm.add_composite(CompositeType::named("A"));
        let mut b = CompositeType::named("B");
        b.base = Some(a);
        let b = cm.add_composite(b);
        cm.composites[a.0].base = Some(b);
        let err = protocol_chain(&cm, a).expect_err("cycle must fail");
        assert!(matches!(err, crate::error::AppError::ModelConsistency(_)));
    }

    #[test]
    fn test_cyclic_related_type_is_a_consistency_error() {
        let mut cm = CodeModel::default();
        let id = cm.add_enum({
            let mut e = EnumType::named("Looped");
            e.values.push(EnumValue {
                name: "ONE".into(),
                serialized_value: "one".into(),
            });
            e
        });
        cm.enums[id.0].related_type = Some(id);
        let ty = ModelType::Enum(id);
        assert!(variable_type_declaration(&cm, &ty, false).is_err());
        assert!(imports(&cm, &ty).is_err());
    }

    #[test]
    fn test_imports_for_composite_arrays() {
        let mut cm = CodeModel::default();
        let pet = cm.add_composite(CompositeType::named("Pet"));
        let ty = ModelType::array(ModelType::Composite(pet));
        assert_eq!(
            imports(&cm, &ty).expect("resolves"),
            vec!["Models/Pet.h".to_string()]
        );

        cm.composites[pet.0].is_external = true;
        assert!(imports(&cm, &ty).expect("resolves").is_empty());

        let rfc = ModelType::primary(PrimaryKind::DateTimeRfc1123);
        assert_eq!(
            imports(&cm, &rfc).expect("resolves"),
            vec!["AZDateTimeRfc1123Coding.h".to_string()]
        );
    }

    #[test]
    fn test_protocol_chain_walks_bases() {
        let mut cm = CodeModel::default();
        let animal = cm.add_composite(CompositeType::named("Animal"));
        let mut dog = CompositeType::named("Dog");
        dog.base = Some(animal);
        let dog = cm.add_composite(dog);
        assert_eq!(
            protocol_chain(&cm, dog).expect("resolves"),
            "DogProtocol, AnimalProtocol"
        );
        assert_eq!(base_protocol(&cm, animal).expect("resolves"), "NSObject");
    }
}
