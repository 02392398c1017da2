//! # Transformation Pipeline
//!
//! The fixed-order, whole-model transformation pass: enums first, then
//! composite types, then methods, then the global name-collision pass.
//! Every step mutates the model in place; later steps assume the earlier
//! ones ran, so [`transform_code_model`] is the only entry point.

use crate::composite;
use crate::error::AppResult;
use crate::model::types::UNNAMED_ENUM_PLACEHOLDER;
use crate::model::{CodeModel, CompositeId, EnumId, EnumType, ModelType};
use crate::naming;
use crate::operations;
use crate::validation::VariableScope;
use std::collections::HashSet;

/// Runs the full pipeline over a freshly deserialized code model.
pub fn transform_code_model(cm: &mut CodeModel) -> AppResult<()> {
    let claimed = initial_claimed_names(cm);
    normalize_enum_types(cm, claimed)?;
    transform_model_types(cm)?;
    transform_methods(cm)?;
    append_type_specifiers(cm);
    Ok(())
}

/// Names reserved before any enum member may claim one: the user-defined
/// list plus the prospective (post-rename) composite type names.
fn initial_claimed_names(cm: &CodeModel) -> HashSet<String> {
    let mut claimed: HashSet<String> = cm.user_defined_names.iter().cloned().collect();
    for c in &cm.composites {
        claimed.insert(composite_type_name(&c.name, &cm.namespace));
    }
    claimed
}

fn composite_type_name(name: &str, namespace: &str) -> String {
    naming::type_name(&naming::trim_package_name(name, namespace))
}

/// Enum normalization, steps executed as one ordered batch.
///
/// The claimed-name set is threaded through explicitly and handed back so
/// the promotion outcome of a given model is reproducible in isolation.
fn normalize_enum_types(
    cm: &mut CodeModel,
    mut claimed: HashSet<String>,
) -> AppResult<HashSet<String>> {
    // Step 1: anonymous enums at property and parameter sites get a named
    // sibling; the anonymous enum delegates its declarations to it.
    let mut synthetic: Vec<(EnumId, String)> = Vec::new();
    for c in &cm.composites {
        for property in &c.properties {
            if let ModelType::Enum(id) = &property.model_type {
                if is_anonymous(cm.enum_type(*id)?) {
                    synthetic.push((*id, property.name.clone()));
                }
            }
        }
    }
    for group in &cm.method_groups {
        for method in &group.methods {
            for parameter in &method.parameters {
                if let ModelType::Enum(id) = &parameter.model_type {
                    if is_anonymous(cm.enum_type(*id)?) {
                        synthetic.push((
                            *id,
                            format!("{}{}", method.name, naming::type_name(&parameter.name)),
                        ));
                    }
                }
            }
        }
    }
    for (id, name) in synthetic {
        if cm.enum_type(id)?.related_type.is_some() {
            continue;
        }
        let mut sibling = EnumType::named(&name);
        let source = cm.enum_type(id)?;
        sibling.values = source.values.clone();
        sibling.documentation = source.documentation.clone();
        let sibling_id = cm.add_enum(sibling);
        cm.enum_type_mut(id)?.related_type = Some(sibling_id);
        cm.register_enum(sibling_id);
    }

    // Step 2: named enums reachable from properties or parameters that are
    // not tracked yet.
    let mut referenced: Vec<EnumId> = Vec::new();
    for c in &cm.composites {
        for property in &c.properties {
            collect_enum_ids(&property.model_type, &mut referenced);
        }
        if let Some(id) = c.discriminator_enum {
            referenced.push(id);
        }
    }
    for method in cm.methods() {
        for parameter in &method.parameters {
            collect_enum_ids(&parameter.model_type, &mut referenced);
        }
        if let Some(ty) = method.return_value() {
            collect_enum_ids(ty, &mut referenced);
        }
    }
    for id in referenced {
        if cm.enum_type(id)?.is_named() {
            cm.register_enum(id);
        }
    }

    // Step 3: normalize tracked type names and member names.
    for id in cm.enum_types.clone() {
        let e = cm.enum_type_mut(id)?;
        e.name = naming::type_name(&e.name);
        for value in &mut e.values {
            value.name = naming::enum_member_name(&value.name);
        }
    }

    // Step 4: all-or-nothing member promotion, name-sorted order.
    let mut ordered = cm.enum_types.clone();
    ordered.sort_by_key(|id| cm.enums[id.0].name.clone());
    for id in ordered {
        let member_names: Vec<String> = cm
            .enum_type(id)?
            .values
            .iter()
            .map(|v| v.name.clone())
            .collect();
        let distinct: HashSet<&String> = member_names.iter().collect();
        let promotable = distinct.len() == member_names.len()
            && member_names.iter().all(|n| !claimed.contains(n));
        if promotable {
            claimed.extend(member_names);
        }
        cm.enum_type_mut(id)?.has_unique_names = promotable;
    }

    // Step 5: placeholder cleanup and auto documentation.
    for index in 0..cm.enums.len() {
        if let Some(related) = cm.enums[index].related_type {
            let name = cm.enum_type(related)?.name.clone();
            cm.enums[index].name = name;
        }
    }
    for id in cm.enum_types.clone() {
        let e = cm.enum_type_mut(id)?;
        if e.documentation.as_deref().unwrap_or("").is_empty() {
            e.documentation = Some(format!(
                "{} enumerates the values for {}.",
                e.name,
                naming::to_phrase(&e.name)
            ));
        }
    }
    Ok(claimed)
}

fn is_anonymous(e: &EnumType) -> bool {
    !e.values.is_empty() && (e.name.is_empty() || e.name == UNNAMED_ENUM_PLACEHOLDER)
}

fn collect_enum_ids(ty: &ModelType, out: &mut Vec<EnumId>) {
    match ty {
        ModelType::Enum(id) => out.push(*id),
        ModelType::Array(a) => collect_enum_ids(&a.element, out),
        ModelType::Dictionary(d) => collect_enum_ids(&d.value, out),
        _ => {}
    }
}

/// Composite renaming, discriminator wiring, and response/pageable marking.
fn transform_model_types(cm: &mut CodeModel) -> AppResult<()> {
    let namespace = cm.namespace.clone();
    let mut used: HashSet<String> = HashSet::new();
    for c in &mut cm.composites {
        let mut name = composite_type_name(&c.name, &namespace);
        if !used.insert(name.clone()) {
            name.push_str("Type");
            used.insert(name.clone());
        }
        c.name = name;
        for property in &mut c.properties {
            property.name = naming::property_name(&property.name);
        }
    }

    // Derived types inherit the hierarchy's discriminator enum and the
    // polymorphic flag of their base.
    for id in cm.composite_ids().collect::<Vec<_>>() {
        let mut base_polymorphic = false;
        let mut inherited_enum = None;
        let mut seen = HashSet::new();
        let mut cursor = cm.composite(id)?.base;
        while let Some(base) = cursor {
            if !seen.insert(base) {
                break;
            }
            let ancestor = cm.composite(base)?;
            base_polymorphic = base_polymorphic || ancestor.is_polymorphic;
            if inherited_enum.is_none() {
                inherited_enum = ancestor.discriminator_enum;
            }
            cursor = ancestor.base;
        }
        let c = cm.composite_mut(id)?;
        if c.base.is_some() {
            c.base_is_polymorphic = base_polymorphic;
        }
        if c.discriminator_enum.is_none() {
            c.discriminator_enum = inherited_enum;
        }
        composite::add_polymorphic_property_if_necessary(cm, id)?;
    }

    // Types returned by a method render decodable response support; paged
    // responses learn their continuation field.
    let mut responses: Vec<(CompositeId, bool, Option<String>)> = Vec::new();
    for method in cm.methods() {
        let returned = match method.return_value() {
            Some(ModelType::Composite(id)) => Some(*id),
            Some(ModelType::Array(a)) => match &a.element {
                ModelType::Composite(id) => Some(*id),
                _ => None,
            },
            _ => None,
        };
        if let Some(id) = returned {
            responses.push((id, method.is_pageable, method.next_link.clone()));
        }
    }
    for (id, pageable, next_link) in responses {
        let c = cm.composite_mut(id)?;
        c.is_response_type = true;
        if pageable {
            if let Some(next_link) = next_link {
                c.next_link = Some(naming::property_name(&next_link));
            }
        }
    }
    Ok(())
}

/// Per-method normalization: names, fatal shape checks, descriptions, and
/// scope-unique parameter names.
fn transform_methods(cm: &mut CodeModel) -> AppResult<()> {
    for group in &mut cm.method_groups {
        group.name = naming::method_group_name(&group.name);
        for method in &mut group.methods {
            method.group = group.name.clone();
            operations::classify_parameters(method);
            operations::check_stream_parameters(method)?;
            let long_running = operations::is_long_running_operation(method)?;
            method.name = naming::method_name(&method.name);
            if let Some(next) = &method.next_method_name {
                method.next_method_name = Some(naming::method_name(next));
            }
            if method.description.is_empty() {
                let mut description =
                    format!("sends the {} request.", naming::to_phrase(&method.name));
                if long_running {
                    description.push_str(" This request is a long-running operation.");
                }
                method.description = description;
            }
            let mut scope = VariableScope::new();
            for parameter in &mut method.parameters {
                parameter.name = scope.variable_name(&parameter.name);
            }
        }
    }
    Ok(())
}

/// Global collision pass over exported artifact names.
///
/// Composite names are claimed first; a registered enum whose name is
/// already taken exports with an `Enum` suffix, and a composite colliding
/// with a reserved user-defined name exports with a `Type` suffix.
fn append_type_specifiers(cm: &mut CodeModel) {
    let package = cm.name.clone();
    let mut used: HashSet<String> = cm
        .composites
        .iter()
        .map(|c| c.name.to_lowercase())
        .collect();
    for id in cm.enum_types.clone() {
        let e = &mut cm.enums[id.0];
        let in_use = used.contains(&e.name.to_lowercase());
        e.name = naming::attach_type_name(&e.name, &package, in_use, "Enum");
        used.insert(e.name.to_lowercase());
    }
    let reserved: HashSet<String> = cm
        .user_defined_names
        .iter()
        .map(|n| n.to_lowercase())
        .collect();
    for c in &mut cm.composites {
        let in_use = reserved.contains(&c.name.to_lowercase());
        c.name = naming::attach_type_name(&c.name, &package, in_use, "Type");
    }
}
