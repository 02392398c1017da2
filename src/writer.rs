//! # Artifact Conventions
//!
//! Output-path naming and the reusable Objective-C declaration fragments
//! the host's template stage stitches into files. The core never touches
//! the filesystem; rendered text goes through an [`ArtifactSink`] the host
//! injects.

use crate::composite;
use crate::error::AppResult;
use crate::model::{CodeModel, CompositeId, ModelType};
use crate::projection;

/// One rendered output file: a relative path plus its full text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    /// Path relative to the output root.
    pub path: String,
    /// Rendered file contents.
    pub contents: String,
}

/// Receiver of rendered artifacts. The host owns the actual file I/O.
pub trait ArtifactSink {
    /// Accepts one rendered artifact.
    fn write(&mut self, path: &str, contents: &str) -> AppResult<()>;
}

/// Sink that collects artifacts in memory, for tests and batching hosts.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Artifacts in write order.
    pub artifacts: Vec<GeneratedArtifact>,
}

impl ArtifactSink for MemorySink {
    fn write(&mut self, path: &str, contents: &str) -> AppResult<()> {
        self.artifacts.push(GeneratedArtifact {
            path: path.to_string(),
            contents: contents.to_string(),
        });
        Ok(())
    }
}

/// `Models/{Name}.h`
pub fn model_header_path(type_name: &str) -> String {
    format!("Models/{}.h", type_name)
}

/// `Models/{Name}Enum.h`
pub fn enum_header_path(enum_name: &str) -> String {
    format!("Models/{}Enum.h", enum_name)
}

/// `Protocols/{Name}Protocol.h`
pub fn protocol_header_path(type_name: &str) -> String {
    format!("Protocols/{}Protocol.h", type_name)
}

/// `Operations/{Group}.h`
pub fn operation_group_header_path(group_name: &str) -> String {
    format!("Operations/{}.h", group_name)
}

/// The service-client header/implementation pair at the output root.
pub fn service_client_paths(cm: &CodeModel) -> (String, String) {
    let name = crate::naming::service_name(&cm.name);
    (format!("{}.h", name), format!("{}.m", name))
}

/// Every artifact path one generation run is expected to produce: one
/// model header per non-external composite, one per named registered enum,
/// one per operation group, plus the service-client pair.
pub fn artifact_paths(cm: &CodeModel) -> AppResult<Vec<String>> {
    let mut paths = Vec::new();
    for id in cm.composite_ids() {
        let c = cm.composite(id)?;
        if c.is_external {
            continue;
        }
        paths.push(model_header_path(&c.name));
        paths.push(protocol_header_path(&c.name));
    }
    for id in &cm.enum_types {
        let e = cm.enum_type(*id)?;
        if e.is_named() {
            paths.push(enum_header_path(&e.name));
        }
    }
    for group in &cm.method_groups {
        paths.push(operation_group_header_path(&group.name));
    }
    let (header, implementation) = service_client_paths(cm);
    paths.push(header);
    paths.push(implementation);
    Ok(paths)
}

fn property_attribute(ty: &ModelType) -> &'static str {
    match ty {
        ModelType::Primary(p) if !p.is_nullable() => "assign",
        _ => "strong",
    }
}

fn property_line(decl: &str, name: &str, ty: &ModelType) -> String {
    format!(
        "@property (nonatomic, {}) {} {};\n",
        property_attribute(ty),
        decl,
        name
    )
}

/// Property declarations for a composite's protocol: own properties only,
/// the injected discriminator skipped.
pub fn protocol_property_declarations(cm: &CodeModel, id: CompositeId) -> AppResult<String> {
    let mut out = String::new();
    for property in &cm.composite(id)?.properties {
        if property.is_discriminator {
            continue;
        }
        let decl =
            projection::variable_type_declaration(cm, &property.model_type, property.is_required)?;
        out.push_str(&property_line(&decl, &property.name, &property.model_type));
    }
    Ok(out)
}

/// Property declarations for a composite's decodable implementation class:
/// inherited fields first, then own, the discriminator skipped.
pub fn implementation_property_declarations(cm: &CodeModel, id: CompositeId) -> AppResult<String> {
    let mut out = String::new();
    for cursor in base_first_chain(cm, id)? {
        for property in &cm.composite(cursor)?.properties {
            if property.is_discriminator {
                continue;
            }
            let decl = projection::decode_type_declaration(cm, &property.model_type)?;
            out.push_str(&property_line(&decl, &property.name, &property.model_type));
        }
    }
    Ok(out)
}

/// The property-to-wire-key map used by the serialization category.
pub fn coding_keys(cm: &CodeModel, id: CompositeId) -> AppResult<String> {
    let mut out = String::new();
    out.push_str("+ (NSDictionary<NSString*, NSString*> *)propertyKeyMap {\n");
    out.push_str("    return @{\n");
    for property in composite::all_properties(cm, id)? {
        out.push_str(&format!(
            "        @\"{}\": @\"{}\",\n",
            property.name, property.serialized_name
        ));
    }
    out.push_str("    };\n");
    out.push_str("}\n");
    Ok(out)
}

// all_properties walks own-first; field emission wants root-first.
fn base_first_chain(cm: &CodeModel, id: CompositeId) -> AppResult<Vec<CompositeId>> {
    let mut chain = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut cursor = Some(id);
    while let Some(current) = cursor {
        if !seen.insert(current) {
            return Err(crate::error::AppError::ModelConsistency(format!(
                "cyclic base-type chain through '{}'",
                cm.composite(id)?.name
            )));
        }
        chain.push(current);
        cursor = cm.composite(current)?.base;
    }
    chain.reverse();
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{CompositeType, Property};
    use crate::model::PrimaryKind;
    use pretty_assertions::assert_eq;

    fn pets_model() -> (CodeModel, CompositeId, CompositeId) {
        let mut cm = CodeModel::default();
        let mut animal = CompositeType::named("Animal");
        animal.properties.push(Property::new(
            "name",
            "name",
            ModelType::primary(PrimaryKind::String),
        ));
        let mut kind = Property::new("kind", "kind", ModelType::primary(PrimaryKind::String));
        kind.is_discriminator = true;
        animal.properties.push(kind);
        let animal = cm.add_composite(animal);

        let mut dog = CompositeType::named("Dog");
        dog.base = Some(animal);
        let mut age = Property::new(
            "age",
            "age",
            ModelType::Primary(crate::model::PrimaryType {
                kind: PrimaryKind::Integer,
                want_nullable: false,
                format: None,
            }),
        );
        age.is_required = true;
        dog.properties.push(age);
        let dog = cm.add_composite(dog);
        (cm, animal, dog)
    }

    #[test]
    fn test_artifact_paths_cover_every_export() {
        let (mut cm, _, _) = pets_model();
        cm.name = "Petstore".into();
        let paths = artifact_paths(&cm).expect("resolves");
        assert!(paths.contains(&"Models/Animal.h".to_string()));
        assert!(paths.contains(&"Protocols/DogProtocol.h".to_string()));
        assert!(paths.contains(&"PetstoreService.h".to_string()));
        assert!(paths.contains(&"PetstoreService.m".to_string()));
    }

    #[test]
    fn test_protocol_declarations_are_own_only_and_skip_discriminator() {
        let (cm, _, dog) = pets_model();
        let block = protocol_property_declarations(&cm, dog).expect("renders");
        assert_eq!(block, "@property (nonatomic, assign) int age;\n");
    }

    #[test]
    fn test_implementation_declarations_are_base_first() {
        let (cm, _, dog) = pets_model();
        let block = implementation_property_declarations(&cm, dog).expect("renders");
        assert_eq!(
            block,
            "@property (nonatomic, strong) NSString* name;\n\
             @property (nonatomic, assign) int age;\n"
        );
    }

    #[test]
    fn test_coding_keys_use_serialized_names() {
        let (mut cm, _, dog) = pets_model();
        cm.composites[dog.0].properties[0].serialized_name = "dogAge".into();
        let keys = coding_keys(&cm, dog).expect("renders");
        assert!(keys.contains("@\"age\": @\"dogAge\","));
        assert!(keys.contains("@\"name\": @\"name\","));
    }

    #[test]
    fn test_memory_sink_collects_in_order() {
        let (cm, _, _) = pets_model();
        let mut sink = MemorySink::default();
        for path in artifact_paths(&cm).expect("resolves") {
            sink.write(&path, "").expect("accepts");
        }
        assert_eq!(sink.artifacts[0].path, "Models/Animal.h");
    }
}
