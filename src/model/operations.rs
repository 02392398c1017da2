//! # Operation Model
//!
//! Methods, method groups, parameters, and the flattened-parameter
//! transformations attached to each operation.

use super::types::ModelType;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The HTTP verb of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET request.
    Get,
    /// PUT request.
    Put,
    /// POST request.
    Post,
    /// DELETE request.
    Delete,
    /// PATCH request.
    Patch,
    /// HEAD request.
    Head,
    /// OPTIONS request.
    Options,
}

/// Where a parameter is transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    /// Substituted into the URL path template.
    Path,
    /// Appended to the query string.
    Query,
    /// Sent as an HTTP header.
    Header,
    /// Sent as the request body.
    Body,
    /// Sent as a multipart/urlencoded form field.
    FormData,
    /// Not transmitted (grouping/synthetic parameters).
    None,
}

/// A logical operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// The client-facing parameter name.
    pub name: String,
    /// The name used on the wire.
    pub serialized_name: String,
    /// The parameter type.
    pub model_type: ModelType,
    /// Transmission location.
    pub location: ParameterLocation,
    /// Whether the parameter must be supplied.
    #[serde(default)]
    pub is_required: bool,
    /// Whether the parameter carries a fixed value.
    #[serde(default)]
    pub is_constant: bool,
    /// Whether the value comes from a client property (`self.…`).
    #[serde(default)]
    pub is_client_property: bool,
    /// Explicit nullability override from the schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub want_nullable: Option<bool>,
    /// Declared default value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Whether the value is pre-encoded and must skip URL encoding.
    #[serde(default)]
    pub skip_url_encoding: bool,
    /// Whether the parameter is an OData filter expression.
    #[serde(default)]
    pub is_odata_filter: bool,
}

impl Parameter {
    /// A minimal parameter with the given name, type and location.
    pub fn new(name: &str, model_type: ModelType, location: ParameterLocation) -> Self {
        Self {
            name: name.to_string(),
            serialized_name: name.to_string(),
            model_type,
            location,
            is_required: false,
            is_constant: false,
            is_client_property: false,
            want_nullable: None,
            default_value: None,
            skip_url_encoding: false,
            is_odata_filter: false,
        }
    }

    /// Nullability at the call site: an explicit override wins, otherwise
    /// optional parameters are nullable.
    pub fn wants_nullable(&self) -> bool {
        self.want_nullable.unwrap_or(!self.is_required)
    }

    /// True when the parameter can carry a generated validation call.
    pub fn can_be_validated(&self) -> bool {
        !self.is_odata_filter
    }

    /// The reference used to read the value in generated code.
    pub fn value_reference(&self) -> String {
        if self.is_client_property {
            format!("self.{}", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// One input-to-output mapping of a flattened parameter group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterMapping {
    /// Name of the method parameter supplying the value.
    pub input_parameter: String,
    /// Whether that input parameter is required.
    #[serde(default)]
    pub input_is_required: bool,
    /// Property path read off the input, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_parameter_property: Option<String>,
    /// Property path written on the output, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_parameter_property: Option<String>,
}

/// A group of flattened parameters feeding one synthesized parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputTransformation {
    /// The synthesized composite-typed output parameter.
    pub output_parameter: Parameter,
    /// The individual field mappings.
    pub parameter_mappings: Vec<ParameterMapping>,
}

/// A single service operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Method {
    /// The operation name.
    pub name: String,
    /// The owning group name (empty for client-level operations).
    #[serde(default)]
    pub group: String,
    /// The HTTP verb.
    pub http_method: HttpMethod,
    /// The URL path template, with `{name}` placeholders.
    pub url: String,
    /// Doc comment text.
    #[serde(default)]
    pub description: String,
    /// Ordered logical parameters.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// The success response body type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<ModelType>,
    /// The default (error) response body type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_response: Option<ModelType>,
    /// Whether responses are paged.
    #[serde(default)]
    pub is_pageable: bool,
    /// Serialized name of the next-link field for paged responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
    /// Raw long-running-operation extension value; must be boolean.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_running_extension: Option<JsonValue>,
    /// Name of the continuation operation for paged results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_method_name: Option<String>,
    /// Request content type (drives stream body wrapping).
    #[serde(default = "default_content_type")]
    pub request_content_type: String,
    /// Flattened-parameter groupings.
    #[serde(default)]
    pub input_transformations: Vec<InputTransformation>,
}

fn default_content_type() -> String {
    "application/json; charset=utf-8".to_string()
}

impl Method {
    /// A minimal method with the given name, verb, and URL template.
    pub fn new(name: &str, http_method: HttpMethod, url: &str) -> Self {
        Self {
            name: name.to_string(),
            group: String::new(),
            http_method,
            url: url.to_string(),
            description: String::new(),
            parameters: Vec::new(),
            return_type: None,
            default_response: None,
            is_pageable: false,
            next_link: None,
            long_running_extension: None,
            next_method_name: None,
            request_content_type: default_content_type(),
            input_transformations: Vec::new(),
        }
    }

    /// The response body the client sees: the declared return type, falling
    /// back to the default response.
    pub fn return_value(&self) -> Option<&ModelType> {
        self.return_type.as_ref().or(self.default_response.as_ref())
    }

    /// Whether the method produces a response body at all.
    pub fn has_return_value(&self) -> bool {
        self.return_value().is_some()
    }
}

/// A named group of operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodGroup {
    /// The group name (empty for the client-level group).
    #[serde(default)]
    pub name: String,
    /// Methods in declaration order.
    #[serde(default)]
    pub methods: Vec<Method>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{ModelType, PrimaryKind};

    #[test]
    fn test_parameter_nullability_defaults() {
        let mut p = Parameter::new(
            "id",
            ModelType::primary(PrimaryKind::Integer),
            ParameterLocation::Path,
        );
        assert!(p.wants_nullable());
        p.is_required = true;
        assert!(!p.wants_nullable());
        p.want_nullable = Some(true);
        assert!(p.wants_nullable());
    }

    #[test]
    fn test_client_property_reference() {
        let mut p = Parameter::new(
            "apiVersion",
            ModelType::primary(PrimaryKind::String),
            ParameterLocation::Query,
        );
        assert_eq!(p.value_reference(), "apiVersion");
        p.is_client_property = true;
        assert_eq!(p.value_reference(), "self.apiVersion");
    }

    #[test]
    fn test_return_value_falls_back_to_default_response() {
        let mut m = Method::new("get", HttpMethod::Get, "/pets");
        assert!(!m.has_return_value());
        m.default_response = Some(ModelType::primary(PrimaryKind::Object));
        assert!(m.has_return_value());
        m.return_type = Some(ModelType::primary(PrimaryKind::String));
        assert!(m
            .return_value()
            .expect("present")
            .is_primary(PrimaryKind::String));
    }
}
