//! # Composite & Polymorphism Resolution
//!
//! Queries over composite hierarchies: derived/sibling enumeration,
//! aggregated property views, discriminator wiring, and required-field
//! checks. Base-chain walks carry a visited set so a malformed cyclic model
//! fails with a consistency error instead of recursing forever.

use crate::error::{AppError, AppResult};
use crate::model::{
    CodeModel, CompositeId, ModelType, PrimaryKind, Property,
};
use crate::naming;
use std::collections::HashSet;

/// Ids of every composite whose declared base is `id`.
pub fn derived_types(cm: &CodeModel, id: CompositeId) -> Vec<CompositeId> {
    cm.composite_ids()
        .filter(|candidate| {
            cm.composites[candidate.0].base == Some(id) && *candidate != id
        })
        .collect()
}

/// Ids of every sibling in the polymorphic hierarchy: the base's derived
/// types, unioned up the chain while it remains polymorphic.
pub fn sibling_types(cm: &CodeModel, id: CompositeId) -> AppResult<Vec<CompositeId>> {
    let mut siblings = Vec::new();
    let mut seen = HashSet::new();
    let mut current = id;
    loop {
        if !seen.insert(current) {
            return Err(cycle_error(cm, id));
        }
        let composite = cm.composite(current)?;
        let Some(base) = composite.base else {
            break;
        };
        for derived in derived_types(cm, base) {
            if !siblings.contains(&derived) {
                siblings.push(derived);
            }
        }
        if !cm.composite(base)?.is_polymorphic && !cm.composite(base)?.base_is_polymorphic {
            break;
        }
        current = base;
    }
    Ok(siblings)
}

/// Every property of the type: own properties first, then the inherited
/// set walking up the base chain.
pub fn all_properties(cm: &CodeModel, id: CompositeId) -> AppResult<Vec<&Property>> {
    let mut properties = Vec::new();
    let mut seen = HashSet::new();
    let mut current = Some(id);
    while let Some(cursor) = current {
        if !seen.insert(cursor) {
            return Err(cycle_error(cm, id));
        }
        let composite = cm.composite(cursor)?;
        properties.extend(composite.properties.iter());
        current = composite.base;
    }
    Ok(properties)
}

/// Injects the synthetic discriminator property when the type declares a
/// discriminator and no declared property carries its serialized name.
///
/// Idempotent: calling it again is a no-op once the property exists.
pub fn add_polymorphic_property_if_necessary(
    cm: &mut CodeModel,
    id: CompositeId,
) -> AppResult<()> {
    let composite = cm.composite(id)?;
    let Some(discriminator) = composite.polymorphic_discriminator.clone() else {
        return Ok(());
    };
    if composite
        .properties
        .iter()
        .any(|p| p.serialized_name == discriminator)
    {
        return Ok(());
    }
    let model_type = match composite.discriminator_enum {
        Some(enum_id) => ModelType::Enum(enum_id),
        None => ModelType::primary(PrimaryKind::String),
    };
    let mut property = Property::new(
        &naming::property_name(&discriminator),
        &discriminator,
        model_type,
    );
    property.is_required = true;
    property.is_discriminator = true;
    cm.composite_mut(id)?.properties.push(property);
    Ok(())
}

/// The discriminator property name for the hierarchy, walking up the base
/// chain to the declaring type.
pub fn polymorphic_property(cm: &CodeModel, id: CompositeId) -> AppResult<Option<String>> {
    let mut seen = HashSet::new();
    let mut current = Some(id);
    while let Some(cursor) = current {
        if !seen.insert(cursor) {
            return Err(cycle_error(cm, id));
        }
        let composite = cm.composite(cursor)?;
        if let Some(discriminator) = &composite.polymorphic_discriminator {
            return Ok(Some(naming::property_name(discriminator)));
        }
        current = composite.base;
    }
    Ok(None)
}

/// The discriminator-enum member identifying this concrete type.
///
/// Every concrete leaf of a polymorphic hierarchy must have a member whose
/// serialized value equals the leaf's serialized name; absence is a model
/// inconsistency.
pub fn discriminator_enum_value(cm: &CodeModel, id: CompositeId) -> AppResult<String> {
    let composite = cm.composite(id)?;
    let enum_id = {
        let mut found = composite.discriminator_enum;
        let mut seen = HashSet::new();
        let mut current = composite.base;
        while found.is_none() {
            let Some(cursor) = current else { break };
            if !seen.insert(cursor) {
                return Err(cycle_error(cm, id));
            }
            let ancestor = cm.composite(cursor)?;
            found = ancestor.discriminator_enum;
            current = ancestor.base;
        }
        found.ok_or_else(|| {
            AppError::ModelConsistency(format!(
                "type '{}' participates in a polymorphic hierarchy without a discriminator enum",
                composite.name
            ))
        })?
    };
    let discriminator_enum = cm.enum_type(enum_id)?;
    let member = discriminator_enum
        .values
        .iter()
        .find(|v| v.serialized_value == composite.serialized_name)
        .ok_or_else(|| {
            AppError::ModelConsistency(format!(
                "discriminator enum '{}' has no member for type '{}' (serialized name '{}')",
                discriminator_enum.name, composite.name, composite.serialized_name
            ))
        })?;
    if discriminator_enum.has_unique_names {
        Ok(member.name.clone())
    } else {
        Ok(format!("{}{}", discriminator_enum.name, member.name))
    }
}

/// True when the type or any ancestor declares at least one required
/// property; drives whether a required-fields initializer is generated.
pub fn has_required_fields(cm: &CodeModel, id: CompositeId) -> AppResult<bool> {
    Ok(all_properties(cm, id)?.iter().any(|p| p.is_required))
}

/// True when any field (own or inherited) holds a polymorphic composite or
/// an array of polymorphic composites, forcing discriminator-aware decode.
pub fn has_polymorphic_fields(cm: &CodeModel, id: CompositeId) -> AppResult<bool> {
    for property in all_properties(cm, id)? {
        let element = match &property.model_type {
            ModelType::Composite(c) => Some(*c),
            ModelType::Array(a) => match &a.element {
                ModelType::Composite(c) => Some(*c),
                _ => None,
            },
            _ => None,
        };
        if let Some(c) = element {
            if cm.composite(c)?.is_polymorphic {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// True when the root of this type's polymorphic chain is returned by a
/// method, forcing subtype-dispatching response decode.
pub fn is_polymorphic_response(cm: &CodeModel, id: CompositeId) -> AppResult<bool> {
    let mut seen = HashSet::new();
    let mut cursor = id;
    loop {
        if !seen.insert(cursor) {
            return Err(cycle_error(cm, id));
        }
        let composite = cm.composite(cursor)?;
        match composite.base {
            Some(base) if composite.base_is_polymorphic => cursor = base,
            _ => return Ok(composite.is_polymorphic && composite.is_response_type),
        }
    }
}

/// The parameter list of the generated required-fields initializer, empty
/// when no required non-constant properties exist.
pub fn required_properties_declaration(cm: &CodeModel, id: CompositeId) -> AppResult<String> {
    let declarations: Vec<String> = all_properties(cm, id)?
        .iter()
        .filter(|p| p.is_required && !p.is_constant)
        .map(|p| {
            crate::projection::variable_type_declaration(cm, &p.model_type, p.is_required)
                .map(|decl| format!("{} {}", decl, p.name))
        })
        .collect::<AppResult<_>>()?;
    Ok(declarations.join(", "))
}

fn cycle_error(cm: &CodeModel, id: CompositeId) -> AppError {
    let name = cm
        .composite(id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|_| format!("#{}", id.0));
    AppError::ModelConsistency(format!("cyclic base-type chain through '{}'", name))
}
