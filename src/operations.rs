//! # Operation Shape Building
//!
//! Partitions operation parameters by transmission location, computes the
//! client/wire type divergence, and emits the Objective-C conversion
//! fragments for non-identity wire transforms (base64, RFC 1123 dates,
//! unix time, streams, and recursive container conversion).

use crate::error::{AppError, AppResult};
use crate::model::{
    CodeModel, Method, ModelType, Parameter, ParameterLocation, PrimaryKind,
};
use crate::naming;
use crate::projection;
use heck::ToLowerCamelCase;

/// The parameter's model type with its nullability override applied.
pub fn effective_model_type(parameter: &Parameter) -> ModelType {
    if parameter.wants_nullable() {
        parameter.model_type.clone()
    } else {
        projection::non_nullable_variant(&parameter.model_type)
    }
}

/// The client-facing type of a parameter (wire-only kinds normalized away).
pub fn client_type(parameter: &Parameter) -> ModelType {
    projection::parameter_variant(&effective_model_type(parameter))
}

/// Byte arrays and arrays need string serialization at path/query/header
/// locations.
fn needs_special_serialization(ty: &ModelType) -> bool {
    ty.is_primary(PrimaryKind::ByteArray) || matches!(ty, ModelType::Array(_))
}

fn is_body_like(location: ParameterLocation) -> bool {
    matches!(location, ParameterLocation::Body | ParameterLocation::FormData)
}

/// The type actually transmitted for the parameter.
///
/// Streams keep their kind (the conversion wraps them in a request body);
/// byte arrays and containers outside the body serialize to a string.
pub fn wire_type(parameter: &Parameter) -> ModelType {
    let model_type = effective_model_type(parameter);
    if model_type.is_primary(PrimaryKind::Stream) {
        return model_type;
    }
    if !model_type.is_primary(PrimaryKind::Base64Url)
        && !is_body_like(parameter.location)
        && parameter.location != ParameterLocation::None
        && needs_special_serialization(&client_type(parameter))
    {
        return ModelType::primary(PrimaryKind::String);
    }
    model_type
}

/// True exactly when the client and wire types diverge, i.e. a conversion
/// statement must be emitted.
pub fn needs_conversion(parameter: &Parameter) -> bool {
    client_type(parameter) != wire_type(parameter)
}

/// The variable holding the wire value: the parameter itself when no
/// conversion happens, a `…Converted` temporary otherwise.
pub fn wire_name(parameter: &Parameter) -> String {
    if needs_conversion(parameter) {
        format!("{}Converted", parameter.name.to_lower_camel_case())
    } else {
        parameter.name.clone()
    }
}

/// Reclassifies parameters whose name appears as a `{placeholder}` in the
/// URL template to the path location, whatever they declared.
pub fn classify_parameters(method: &mut Method) {
    let url = method.url.clone();
    for parameter in &mut method.parameters {
        if url.contains(&format!("{{{}}}", parameter.name))
            || url.contains(&format!("{{{}}}", parameter.serialized_name))
        {
            parameter.location = ParameterLocation::Path;
        }
    }
}

/// Path parameters of the method, in declaration order.
pub fn url_parameters(method: &Method) -> Vec<&Parameter> {
    parameters_at(method, ParameterLocation::Path)
}

/// Query parameters of the method, in declaration order.
pub fn query_parameters(method: &Method) -> Vec<&Parameter> {
    parameters_at(method, ParameterLocation::Query)
}

/// Header parameters of the method, in declaration order.
pub fn header_parameters(method: &Method) -> Vec<&Parameter> {
    parameters_at(method, ParameterLocation::Header)
}

/// Form parameters of the method, in declaration order.
pub fn form_parameters(method: &Method) -> Vec<&Parameter> {
    parameters_at(method, ParameterLocation::FormData)
}

/// The body parameter, if the method has one.
pub fn body_parameter(method: &Method) -> Option<&Parameter> {
    method
        .parameters
        .iter()
        .find(|p| p.location == ParameterLocation::Body)
}

fn parameters_at(method: &Method, location: ParameterLocation) -> Vec<&Parameter> {
    method
        .parameters
        .iter()
        .filter(|p| p.location == location)
        .collect()
}

/// Every transmitted parameter, path parameters first, declared order
/// otherwise preserved.
pub fn ordered_wire_parameters(method: &Method) -> Vec<&Parameter> {
    let mut ordered = url_parameters(method);
    ordered.extend(
        method
            .parameters
            .iter()
            .filter(|p| p.location != ParameterLocation::Path && p.location != ParameterLocation::None),
    );
    ordered
}

/// Method parameters that surface in the client signature: required first,
/// client properties and nameless synthetics excluded.
pub fn local_parameters(method: &Method) -> Vec<&Parameter> {
    let mut locals: Vec<&Parameter> = method
        .parameters
        .iter()
        .filter(|p| !p.is_client_property && !p.name.trim().is_empty())
        .collect();
    locals.sort_by_key(|p| !p.is_required);
    locals
}

/// Fails when a streaming parameter is declared anywhere but the request
/// body.
pub fn check_stream_parameters(method: &Method) -> AppResult<()> {
    for parameter in &method.parameters {
        if parameter.model_type.is_primary(PrimaryKind::Stream)
            && !is_body_like(parameter.location)
        {
            return Err(AppError::Unsupported(format!(
                "streaming parameter '{}' of operation '{}' must be transmitted in the request body",
                parameter.name, method.name
            )));
        }
    }
    Ok(())
}

/// Reads the long-running-operation marker, failing on non-boolean values.
pub fn is_long_running_operation(method: &Method) -> AppResult<bool> {
    match &method.long_running_extension {
        None => Ok(false),
        Some(serde_json::Value::Bool(b)) => Ok(*b),
        Some(other) => Err(AppError::ModelConsistency(format!(
            "long-running-operation marker of '{}.{}' must be a boolean, found: {}",
            method.group, method.name, other
        ))),
    }
}

/// The client-facing return type declaration, `Void` for bodiless methods.
pub fn method_return_type(cm: &CodeModel, method: &Method) -> AppResult<String> {
    match method.return_value() {
        Some(body) => {
            projection::variable_type_declaration(cm, &projection::response_variant(body), false)
        }
        None => Ok("Void".to_string()),
    }
}

/// The decodable return type declaration, `Void` for bodiless methods.
pub fn method_return_type_decodable(cm: &CodeModel, method: &Method) -> AppResult<String> {
    match method.return_value() {
        Some(body) => projection::decode_type_declaration(cm, &projection::response_variant(body)),
        None => Ok("Void".to_string()),
    }
}

/// True when the request body parameter is enum-typed.
pub fn is_body_parameter_enum(method: &Method) -> bool {
    matches!(
        body_parameter(method).map(|p| &p.model_type),
        Some(ModelType::Enum(_))
    )
}

/// True when the request body parameter is a stream.
pub fn is_body_parameter_stream(method: &Method) -> bool {
    body_parameter(method)
        .map(|p| p.model_type.is_primary(PrimaryKind::Stream))
        .unwrap_or(false)
}

/// True when the response body is enum-typed.
pub fn is_return_type_enum(method: &Method) -> bool {
    matches!(method.return_value(), Some(ModelType::Enum(_)))
}

/// True when the response body is a stream.
pub fn is_return_type_stream(method: &Method) -> bool {
    method
        .return_value()
        .map(|t| t.is_primary(PrimaryKind::Stream))
        .unwrap_or(false)
}

/// Emits the wire conversion statement(s) for one parameter.
///
/// Outside the body, byte arrays serialize via base64 and arrays via the
/// client's collection-format-aware serializer; everything else goes
/// through the recursive client-to-wire conversion.
pub fn convert_to_wire_type(
    cm: &CodeModel,
    method: &Method,
    parameter: &Parameter,
    source: &str,
    client_reference: &str,
) -> AppResult<String> {
    let model_type = effective_model_type(parameter);
    // Same location predicate as wire_type, so a parameter reporting no
    // conversion never gets a serialization fragment.
    if !is_body_like(parameter.location)
        && parameter.location != ParameterLocation::None
        && needs_special_serialization(&model_type)
    {
        let target = wire_name(parameter);
        match client_type(parameter) {
            ModelType::Primary(p) if p.kind == PrimaryKind::ByteArray => {
                if wire_type(parameter).is_primary(PrimaryKind::String) {
                    return Ok(format!(
                        "NSString *{} = [{} base64EncodedStringWithOptions:0];\n",
                        target, source
                    ));
                }
                return Ok(format!(
                    "NSURL *{} = [AZBase64UrlCoding encode:{}];\n",
                    target, source
                ));
            }
            ModelType::Array(a) => {
                let format = a
                    .collection_format
                    .clone()
                    .unwrap_or_else(|| "csv".to_string());
                return Ok(format!(
                    "NSString *{} = [{}.serializerAdapter serializeList:{} format:@\"{}\"];\n",
                    target, client_reference, source, format
                ));
            }
            _ => {}
        }
    }
    convert_client_type_to_wire_type(
        cm,
        method,
        &wire_type(parameter),
        source,
        &wire_name(parameter),
        parameter.is_required,
        0,
    )
}

/// Recursive case analysis on the wire-type kind.
///
/// `level` only feeds temporary-variable naming (`item`, `item1`, …); the
/// recursion itself is bounded by the type structure.
#[allow(clippy::too_many_arguments)]
fn convert_client_type_to_wire_type(
    cm: &CodeModel,
    method: &Method,
    wire_ty: &ModelType,
    source: &str,
    target: &str,
    is_required: bool,
    level: usize,
) -> AppResult<String> {
    let suffix = if level == 0 {
        String::new()
    } else {
        level.to_string()
    };
    // Nested container elements are converted inline inside their loop.
    let guarded = !is_required && level == 0;
    match wire_ty {
        ModelType::Primary(p) => match p.kind {
            PrimaryKind::DateTimeRfc1123 => Ok(assignment(
                "AZDateTimeRfc1123 *",
                target,
                &format!("[[AZDateTimeRfc1123 alloc] initWithDate:{}]", source),
                source,
                guarded,
            )),
            PrimaryKind::UnixTime => Ok(assignment(
                "NSNumber *",
                target,
                &format!("@((long)[{} timeIntervalSince1970])", source),
                source,
                guarded,
            )),
            PrimaryKind::Base64Url => Ok(assignment(
                "NSURL *",
                target,
                &format!("[AZBase64UrlCoding encode:{}]", source),
                source,
                guarded,
            )),
            PrimaryKind::Stream => Ok(assignment(
                "AZRequestBody *",
                target,
                &format!(
                    "[AZRequestBody bodyWithContentType:@\"{}\" stream:{}]",
                    method.request_content_type, source
                ),
                source,
                guarded,
            )),
            _ => Ok(String::new()),
        },
        ModelType::Array(a) => {
            let item = format!("item{}", suffix);
            let value = format!("value{}", level + 1);
            let element_variant = projection::parameter_variant(&a.element);
            let element_decl = projection::variable_type_declaration(cm, &element_variant, false)?;
            let inner = convert_client_type_to_wire_type(
                cm,
                method,
                &a.element,
                &item,
                &value,
                true,
                level + 1,
            )?;
            let mut body = String::new();
            body.push_str(&format!("NSMutableArray *{} = [NSMutableArray new];\n", target));
            body.push_str(&format!("for ({} {} in {}) {{\n", element_decl, item, source));
            if inner.is_empty() {
                body.push_str(&format!("    [{} addObject:{}];\n", target, item));
            } else {
                body.push_str(&indent(&inner));
                body.push_str(&format!("    [{} addObject:{}];\n", target, value));
            }
            body.push_str("}\n");
            Ok(wrap_optional(body, target, "NSMutableArray *", source, guarded))
        }
        ModelType::Dictionary(d) => {
            let key = format!("key{}", suffix);
            let value = format!("value{}", level + 1);
            let inner = convert_client_type_to_wire_type(
                cm,
                method,
                &d.value,
                &format!("{}[{}]", source, key),
                &value,
                true,
                level + 1,
            )?;
            let mut body = String::new();
            body.push_str(&format!(
                "NSMutableDictionary *{} = [NSMutableDictionary new];\n",
                target
            ));
            body.push_str(&format!("for (NSString *{} in {}) {{\n", key, source));
            if inner.is_empty() {
                body.push_str(&format!("    {}[{}] = {}[{}];\n", target, key, source, key));
            } else {
                body.push_str(&indent(&inner));
                body.push_str(&format!("    {}[{}] = {};\n", target, key, value));
            }
            body.push_str("}\n");
            Ok(wrap_optional(body, target, "NSMutableDictionary *", source, guarded))
        }
        _ => Ok(String::new()),
    }
}

/// A single conversion assignment: declared inline when required, defaulted
/// and nil-guarded when optional.
fn assignment(decl: &str, target: &str, expression: &str, source: &str, guarded: bool) -> String {
    if guarded {
        format!(
            "{decl}{target} = {nil};\nif ({source} != nil) {{\n    {target} = {expr};\n}}\n",
            decl = decl,
            target = target,
            nil = projection::nil_default(),
            source = source,
            expr = expression
        )
    } else {
        format!("{}{} = {};\n", decl, target, expression)
    }
}

fn wrap_optional(body: String, target: &str, decl: &str, source: &str, guarded: bool) -> String {
    if !guarded {
        return body;
    }
    // Hoist the declaration out of the guard so the wire name stays visible.
    let inner = body.replacen(
        &format!("{}{} = ", decl, target),
        &format!("{} = ", target),
        1,
    );
    format!(
        "{decl}{target} = {nil};\nif ({source} != nil) {{\n{inner}}}\n",
        decl = decl,
        target = target,
        nil = projection::nil_default(),
        source = source,
        inner = indent(&inner)
    )
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

/// Emits the grouped-parameter construction block for the method.
///
/// Each transformation allocates its synthesized composite (fresh when
/// required, nil otherwise) and assigns the mapped fields, guarded by a
/// disjunction over the optional inputs being present.
pub fn build_input_mappings(cm: &CodeModel, method: &Method) -> AppResult<String> {
    let mut out = String::new();
    for transformation in &method.input_transformations {
        let output = &transformation.output_parameter;
        let class_name = match &output.model_type {
            ModelType::Composite(id) => Some(format!("{}Data", cm.composite(*id)?.name)),
            _ => None,
        };
        match (&class_name, output.is_required) {
            (Some(class), true) => {
                out.push_str(&format!("{} *{} = [{} new];\n", class, output.name, class))
            }
            (Some(class), false) => {
                out.push_str(&format!("{} *{} = nil;\n", class, output.name))
            }
            (None, _) => out.push_str(&format!("id {} = nil;\n", output.name)),
        }
        let null_check: Vec<String> = transformation
            .parameter_mappings
            .iter()
            .filter(|m| !m.input_is_required)
            .map(|m| format!("{} != nil", m.input_parameter))
            .collect();
        let null_check = null_check.join(" || ");

        let mut body = String::new();
        if let (Some(class), false) = (&class_name, output.is_required) {
            if transformation
                .parameter_mappings
                .iter()
                .any(|m| m.output_parameter_property.is_some())
            {
                body.push_str(&format!("{} = [{} new];\n", output.name, class));
            }
        }
        for mapping in &transformation.parameter_mappings {
            let mut input_path = mapping.input_parameter.clone();
            if let Some(property) = &mapping.input_parameter_property {
                input_path = format!("{}.{}", input_path, naming::property_name(property));
            }
            match &mapping.output_parameter_property {
                Some(property) => body.push_str(&format!(
                    "{}.{} = {};\n",
                    output.name,
                    naming::property_name(property),
                    input_path
                )),
                None => body.push_str(&format!("{} = {};\n", output.name, input_path)),
            }
        }
        if null_check.is_empty() {
            out.push_str(&body);
        } else {
            out.push_str(&format!("if ({}) {{\n{}}}\n", null_check, indent(&body)));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HttpMethod, InputTransformation, ParameterMapping};
    use crate::model::types::CompositeType;
    use pretty_assertions::assert_eq;

    fn query_param(name: &str, ty: ModelType) -> Parameter {
        Parameter::new(name, ty, ParameterLocation::Query)
    }

    #[test]
    fn test_path_reclassification_from_url_template() {
        let mut method = Method::new("getPet", HttpMethod::Get, "/pets/{petId}");
        method.parameters.push(query_param(
            "petId",
            ModelType::primary(PrimaryKind::String),
        ));
        classify_parameters(&mut method);
        assert_eq!(method.parameters[0].location, ParameterLocation::Path);
    }

    #[test]
    fn test_byte_array_query_parameter_conversion() {
        let cm = CodeModel::default();
        let method = Method::new("search", HttpMethod::Get, "/search");
        let mut parameter = query_param("digest", ModelType::primary(PrimaryKind::ByteArray));
        parameter.is_required = true;

        assert!(wire_type(&parameter).is_primary(PrimaryKind::String));
        assert!(needs_conversion(&parameter));
        let fragment = convert_to_wire_type(&cm, &method, &parameter, "digest", "self")
            .expect("converts");
        assert_eq!(
            fragment,
            "NSString *digestConverted = [digest base64EncodedStringWithOptions:0];\n"
        );
    }

    #[test]
    fn test_body_byte_array_needs_no_conversion() {
        let mut parameter = Parameter::new(
            "payload",
            ModelType::primary(PrimaryKind::ByteArray),
            ParameterLocation::Body,
        );
        parameter.is_required = true;
        assert!(!needs_conversion(&parameter));
        assert_eq!(wire_name(&parameter), "payload");
    }

    #[test]
    fn test_rfc1123_header_conversion_shapes() {
        let cm = CodeModel::default();
        let method = Method::new("touch", HttpMethod::Put, "/touch");
        let mut parameter = Parameter::new(
            "ifModifiedSince",
            ModelType::primary(PrimaryKind::DateTimeRfc1123),
            ParameterLocation::Header,
        );

        // Optional: defaulted declaration plus nil guard.
        let fragment =
            convert_to_wire_type(&cm, &method, &parameter, "ifModifiedSince", "self")
                .expect("converts");
        assert!(fragment.starts_with("AZDateTimeRfc1123 *ifModifiedSinceConverted = nil;"));
        assert!(fragment.contains("if (ifModifiedSince != nil) {"));

        // Required: inline typed declaration, no guard.
        parameter.is_required = true;
        let fragment =
            convert_to_wire_type(&cm, &method, &parameter, "ifModifiedSince", "self")
                .expect("converts");
        assert_eq!(
            fragment,
            "AZDateTimeRfc1123 *ifModifiedSinceConverted = [[AZDateTimeRfc1123 alloc] initWithDate:ifModifiedSince];\n"
        );
    }

    #[test]
    fn test_unix_time_list_conversion_uses_levelled_temporaries() {
        let cm = CodeModel::default();
        let method = Method::new("record", HttpMethod::Post, "/record");
        let mut parameter = Parameter::new(
            "stamps",
            ModelType::array(ModelType::primary(PrimaryKind::UnixTime)),
            ParameterLocation::Body,
        );
        parameter.is_required = true;
        assert!(needs_conversion(&parameter));
        let fragment =
            convert_to_wire_type(&cm, &method, &parameter, "stamps", "self").expect("converts");
        assert!(fragment.contains("NSMutableArray *stampsConverted = [NSMutableArray new];"));
        assert!(fragment.contains("for (NSDate* item in stamps) {"));
        assert!(fragment.contains("NSNumber *value1 = @((long)[item timeIntervalSince1970]);"));
        assert!(fragment.contains("[stampsConverted addObject:value1];"));
    }

    #[test]
    fn test_stream_outside_body_is_fatal() {
        let mut method = Method::new("upload", HttpMethod::Post, "/upload");
        method.parameters.push(query_param(
            "data",
            ModelType::primary(PrimaryKind::Stream),
        ));
        let err = check_stream_parameters(&method).expect_err("must fail");
        assert!(matches!(err, AppError::Unsupported(_)));
        assert!(err.to_string().contains("upload"));
    }

    #[test]
    fn test_long_running_marker_must_be_boolean() {
        let mut method = Method::new("provision", HttpMethod::Put, "/vm");
        method.group = "VirtualMachines".into();
        assert!(!is_long_running_operation(&method).expect("absent is false"));

        method.long_running_extension = Some(serde_json::json!(true));
        assert!(is_long_running_operation(&method).expect("boolean is fine"));

        method.long_running_extension = Some(serde_json::json!("yes"));
        let err = is_long_running_operation(&method).expect_err("must fail");
        assert!(err.to_string().contains("VirtualMachines.provision"));
    }

    #[test]
    fn test_ordered_wire_parameters_path_first() {
        let mut method = Method::new("list", HttpMethod::Get, "/pets/{petId}/visits");
        method.parameters.push(query_param(
            "limit",
            ModelType::primary(PrimaryKind::Integer),
        ));
        method.parameters.push(Parameter::new(
            "petId",
            ModelType::primary(PrimaryKind::String),
            ParameterLocation::Path,
        ));
        let ordered = ordered_wire_parameters(&method);
        assert_eq!(ordered[0].name, "petId");
        assert_eq!(ordered[1].name, "limit");
    }

    #[test]
    fn test_untransmitted_byte_array_converts_to_nothing() {
        let cm = CodeModel::default();
        let method = Method::new("group", HttpMethod::Get, "/group");
        let parameter = Parameter::new(
            "digest",
            ModelType::primary(PrimaryKind::ByteArray),
            ParameterLocation::None,
        );
        assert!(!needs_conversion(&parameter));
        let fragment = convert_to_wire_type(&cm, &method, &parameter, "digest", "self")
            .expect("converts");
        assert_eq!(fragment, "");
    }

    #[test]
    fn test_method_return_type_projections() {
        let mut cm = CodeModel::default();
        let pet = cm.add_composite(CompositeType::named("Pet"));
        let mut method = Method::new("getPet", HttpMethod::Get, "/pets/{petId}");
        assert_eq!(method_return_type(&cm, &method).expect("projects"), "Void");

        method.return_type = Some(ModelType::Composite(pet));
        assert_eq!(
            method_return_type(&cm, &method).expect("projects"),
            "id<PetProtocol>"
        );
        assert_eq!(
            method_return_type_decodable(&cm, &method).expect("projects"),
            "PetData*"
        );

        // Wire-only response kinds normalize to the client-facing variant.
        method.return_type = Some(ModelType::primary(PrimaryKind::DateTimeRfc1123));
        assert_eq!(
            method_return_type(&cm, &method).expect("projects"),
            "NSDate*"
        );
    }

    #[test]
    fn test_input_mappings_required_group_allocates_inline() {
        let mut cm = CodeModel::default();
        let options = cm.add_composite(CompositeType::named("ListOptions"));
        let mut method = Method::new("list", HttpMethod::Get, "/pets");
        let mut output = Parameter::new(
            "listOptions",
            ModelType::Composite(options),
            ParameterLocation::None,
        );
        output.is_required = true;
        method.input_transformations.push(InputTransformation {
            output_parameter: output,
            parameter_mappings: vec![ParameterMapping {
                input_parameter: "top".into(),
                input_is_required: true,
                input_parameter_property: None,
                output_parameter_property: Some("top".into()),
            }],
        });
        let fragment = build_input_mappings(&cm, &method).expect("builds");
        assert_eq!(
            fragment,
            "ListOptionsData *listOptions = [ListOptionsData new];\nlistOptions.top = top;\n"
        );
    }

    #[test]
    fn test_input_mappings_optional_group() {
        let mut cm = CodeModel::default();
        let options = cm.add_composite(CompositeType::named("ListOptions"));
        let mut method = Method::new("list", HttpMethod::Get, "/pets");
        let output = Parameter::new(
            "listOptions",
            ModelType::Composite(options),
            ParameterLocation::None,
        );
        method.input_transformations.push(InputTransformation {
            output_parameter: output,
            parameter_mappings: vec![
                ParameterMapping {
                    input_parameter: "top".into(),
                    input_is_required: false,
                    input_parameter_property: None,
                    output_parameter_property: Some("top".into()),
                },
                ParameterMapping {
                    input_parameter: "skip".into(),
                    input_is_required: false,
                    input_parameter_property: None,
                    output_parameter_property: Some("skip".into()),
                },
            ],
        });
        let fragment = build_input_mappings(&cm, &method).expect("builds");
        assert!(fragment.starts_with("ListOptionsData *listOptions = nil;\n"));
        assert!(fragment.contains("if (top != nil || skip != nil) {"));
        assert!(fragment.contains("listOptions = [ListOptionsData new];"));
        assert!(fragment.contains("listOptions.top = top;"));
    }
}
