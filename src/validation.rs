//! # Constraint Validation Lowering
//!
//! Turns declared value constraints into Objective-C guard fragments that
//! raise `NSException` on violation, recursing through container types. The
//! supported constraint set is closed; the exhaustive match below is what
//! keeps the operator table total.

use crate::error::{AppError, AppResult};
use crate::model::{CodeModel, CompositeId, Constraint, EnumId, ModelType, PrimaryKind, Property};
use crate::projection;
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashSet;

/// Allocates code-block-unique variable names.
#[derive(Debug, Default)]
pub struct VariableScope {
    used: HashSet<String>,
}

impl VariableScope {
    /// Creates an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `base`, or `base1`, `base2`, … until unused in this scope.
    pub fn unique_name(&mut self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut counter = 0usize;
        while self.used.contains(&candidate) {
            counter += 1;
            candidate = format!("{}{}", base, counter);
        }
        self.used.insert(candidate.clone());
        candidate
    }

    /// Converts a schema name to a variable name unique in this scope.
    pub fn variable_name(&mut self, name: &str) -> String {
        let base = crate::naming::variable_name(name);
        self.unique_name(&base)
    }
}

/// True when the projected type is a plain C scalar, which cannot be nil
/// and therefore never gets a nil guard.
fn is_value_type(ty: &ModelType) -> bool {
    matches!(ty, ModelType::Primary(p) if !p.is_nullable())
}

/// Recursive reachability query: does validating this type's graph do any
/// work at all?
///
/// True if any composite reachable through property, element, or value
/// edges has a required non-constant property or a declared constraint.
/// Each distinct type is visited at most once per call.
pub fn should_validate_chain(cm: &CodeModel, ty: &ModelType) -> AppResult<bool> {
    let mut composites_seen: HashSet<CompositeId> = HashSet::new();
    let mut enums_seen: HashSet<EnumId> = HashSet::new();
    let mut worklist: Vec<ModelType> = vec![ty.clone()];
    while let Some(current) = worklist.pop() {
        match current {
            ModelType::Primary(_) => {}
            ModelType::Enum(id) => {
                if enums_seen.insert(id) {
                    cm.enum_type(id)?;
                }
            }
            ModelType::Array(a) => worklist.push(a.element.clone()),
            ModelType::Dictionary(d) => worklist.push(d.value.clone()),
            ModelType::Composite(id) => {
                if !composites_seen.insert(id) {
                    continue;
                }
                let composite = cm.composite(id)?;
                if composite
                    .properties
                    .iter()
                    .any(|p| (p.is_required && !p.is_constant) || !p.constraints.is_empty())
                {
                    return Ok(true);
                }
                for property in &composite.properties {
                    worklist.push(property.model_type.clone());
                }
                if let Some(base) = composite.base {
                    worklist.push(ModelType::Composite(base));
                }
            }
        }
    }
    Ok(false)
}

/// Generates the validation fragment for a value of the given type.
///
/// Emits, in order: the nested validation call for composites, one
/// conditional-raise per declared constraint, and the recursive checks for
/// container element/value types. Returns `Ok(None)` when there is nothing
/// to validate; the whole fragment is wrapped in a nil guard unless the
/// type is a non-nullable scalar.
pub fn validate_type(
    cm: &CodeModel,
    scope: &mut VariableScope,
    ty: &ModelType,
    value_reference: &str,
    constraints: Option<&IndexMap<Constraint, String>>,
) -> AppResult<Option<String>> {
    let mut fragment = String::new();

    if let ModelType::Composite(_) = ty {
        if should_validate_chain(cm, ty)? {
            fragment.push_str(&format!("[{} validate];\n", value_reference));
        }
    }

    if let Some(constraints) = constraints {
        if !constraints.is_empty() {
            fragment.push_str(&constraint_validations(ty, value_reference, constraints)?);
        }
    }

    match ty {
        ModelType::Array(a) if should_validate_chain(cm, ty)? => {
            let element_var = scope.unique_name("element");
            if let Some(inner) = validate_type(cm, scope, &a.element, &element_var, None)? {
                let decl = projection::variable_type_declaration(cm, &a.element, false)?;
                fragment.push_str(&format!(
                    "for ({} {} in {}) {{\n{}}}\n",
                    decl,
                    element_var,
                    value_reference,
                    indent(&inner)
                ));
            }
        }
        ModelType::Dictionary(d) if should_validate_chain(cm, ty)? => {
            let value_var = scope.unique_name("valueElement");
            if let Some(inner) = validate_type(cm, scope, &d.value, &value_var, None)? {
                let decl = projection::variable_type_declaration(cm, &d.value, false)?;
                fragment.push_str(&format!(
                    "for ({} {} in [{} allValues]) {{\n{}}}\n",
                    decl,
                    value_var,
                    value_reference,
                    indent(&inner)
                ));
            }
        }
        _ => {}
    }

    if fragment.trim().is_empty() {
        return Ok(None);
    }
    if is_value_type(ty) {
        Ok(Some(fragment))
    } else {
        Ok(Some(check_nil(value_reference, &fragment)))
    }
}

/// Generates the validation fragment for a composite property, projecting
/// required properties through their non-nullable variant first.
pub fn validate_property(
    cm: &CodeModel,
    scope: &mut VariableScope,
    property: &Property,
    value_reference: &str,
) -> AppResult<Option<String>> {
    let ty = if property.is_required {
        projection::non_nullable_variant(&property.model_type)
    } else {
        property.model_type.clone()
    };
    validate_type(cm, scope, &ty, value_reference, Some(&property.constraints))
}

/// Wraps a block in a nil guard.
pub fn check_nil(value_reference: &str, block: &str) -> String {
    format!("if ({} != nil) {{\n{}}}\n", value_reference, indent(block))
}

fn indent(block: &str) -> String {
    block
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("    {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}

/// The comparison operand: nullable numerics unwrap out of `NSNumber`.
fn comparison_operand(ty: &ModelType, value_reference: &str) -> String {
    let ModelType::Primary(p) = ty else {
        return value_reference.to_string();
    };
    if !p.is_nullable() {
        return value_reference.to_string();
    }
    let accessor = match p.kind {
        PrimaryKind::Integer => "intValue",
        PrimaryKind::Long | PrimaryKind::UnixTime => "longValue",
        PrimaryKind::Double => "doubleValue",
        PrimaryKind::Float => "floatValue",
        PrimaryKind::Boolean => "boolValue",
        _ => return value_reference.to_string(),
    };
    format!("[{} {}]", value_reference, accessor)
}

fn constraint_validations(
    ty: &ModelType,
    value_reference: &str,
    constraints: &IndexMap<Constraint, String>,
) -> AppResult<String> {
    let mut out = String::new();
    for (constraint, bound) in constraints {
        let operand = comparison_operand(ty, value_reference);
        // Every member of the closed constraint set must produce a check or
        // an explicit no-op; the match has no wildcard arm on purpose.
        let check = match constraint {
            Constraint::ExclusiveMaximum => Some(format!("{} >= {}", operand, bound)),
            Constraint::ExclusiveMinimum => Some(format!("{} <= {}", operand, bound)),
            Constraint::InclusiveMaximum => Some(format!("{} > {}", operand, bound)),
            Constraint::InclusiveMinimum => Some(format!("{} < {}", operand, bound)),
            Constraint::MaxItems => Some(format!("{}.count > {}", value_reference, bound)),
            Constraint::MinItems => Some(format!("{}.count < {}", value_reference, bound)),
            Constraint::MaxLength => Some(format!("{}.length > {}", value_reference, bound)),
            Constraint::MinLength => Some(format!("{}.length < {}", value_reference, bound)),
            Constraint::MultipleOf => Some(format!("{} % {} != 0", operand, bound)),
            Constraint::Pattern => {
                Regex::new(bound).map_err(|e| {
                    AppError::Unsupported(format!(
                        "Pattern constraint '{}' is not a valid regular expression: {}",
                        bound, e
                    ))
                })?;
                if matches!(ty, ModelType::Dictionary(_)) {
                    Some(format!(
                        "[[{}.allValues filteredArrayUsingPredicate:[NSPredicate predicateWithFormat:@\"!(SELF MATCHES %@)\", @\"{}\"]] count] != 0",
                        value_reference, bound
                    ))
                } else {
                    Some(format!(
                        "![[NSPredicate predicateWithFormat:@\"SELF MATCHES %@\", @\"{}\"] evaluateWithObject:{}]",
                        bound, value_reference
                    ))
                }
            }
            Constraint::UniqueItems => {
                if bound.eq_ignore_ascii_case("true") {
                    Some(format!(
                        "{0}.count != [NSSet setWithArray:{0}].count",
                        value_reference
                    ))
                } else {
                    None
                }
            }
        };
        let Some(check) = check else { continue };
        out.push_str(&raise_on(&check, value_reference, constraint, bound));
    }
    Ok(out)
}

fn raise_on(check: &str, value_reference: &str, constraint: &Constraint, bound: &str) -> String {
    format!(
        "if ({check}) {{\n    NSException *e = [NSException\n        exceptionWithName: @\"IllegalArgumentException\"\n        reason: @\"Parameter '{value}' failed rule validation, rule name: '{rule:?}', constraint value: {bound}\"\n        userInfo: nil];\n    @throw e;\n}}\n",
        check = check,
        value = value_reference,
        rule = constraint,
        bound = bound
    )
}
