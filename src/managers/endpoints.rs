//! Static table of the platform's business endpoints.
//!
//! Each tool maps to exactly one [`EndpointDescriptor`]; the generic
//! handler in `managers::business` turns tool arguments into an
//! [`OperationDescriptor`] using the parameter list declared here.

use crate::errors::ToolError;
use crate::services::operation::OperationDescriptor;
use reqwest::Method;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Delete,
}

impl Verb {
    pub fn as_method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Delete => Method::DELETE,
        }
    }
}

/// Where arguments travel on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Query,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub arg: &'static str,
    pub wire: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<i64>,
}

const fn required(arg: &'static str, wire: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        arg,
        wire,
        kind,
        required: true,
        default: None,
    }
}

const fn optional(arg: &'static str, wire: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        arg,
        wire,
        kind,
        required: false,
        default: None,
    }
}

const fn defaulted(arg: &'static str, wire: &'static str, default: i64) -> ParamSpec {
    ParamSpec {
        arg,
        wire,
        kind: ParamKind::Integer,
        required: false,
        default: Some(default),
    }
}

#[derive(Debug)]
pub struct EndpointDescriptor {
    pub tool: &'static str,
    pub verb: Verb,
    pub path: &'static str,
    pub placement: Placement,
    pub requires_auth: bool,
    pub params: &'static [ParamSpec],
}

pub static ENDPOINTS: &[EndpointDescriptor] = &[
    EndpointDescriptor {
        tool: "query_cases_list",
        verb: Verb::Post,
        path: "/api/case/queryCasesList",
        placement: Placement::Body,
        requires_auth: true,
        params: &[
            optional("case_name", "caseName", ParamKind::String),
            defaulted("page_index", "pageIndex", 1),
            defaulted("page_size", "pageSize", 10),
        ],
    },
    EndpointDescriptor {
        tool: "get_user_list",
        verb: Verb::Get,
        path: "/api/user/getUserList",
        placement: Placement::Query,
        requires_auth: true,
        params: &[optional("login_name", "loginName", ParamKind::String)],
    },
    EndpointDescriptor {
        tool: "query_value_stream_templates",
        verb: Verb::Post,
        path: "/api/valueStreamTemplate/queryByList",
        placement: Placement::Body,
        requires_auth: true,
        params: &[
            optional("template_name", "templateName", ParamKind::String),
            optional("case_id", "caseId", ParamKind::Integer),
        ],
    },
    EndpointDescriptor {
        tool: "get_case_details",
        verb: Verb::Get,
        path: "/api/case/queryCaseDetails",
        placement: Placement::Query,
        requires_auth: true,
        params: &[required("case_id", "caseId", ParamKind::Integer)],
    },
    EndpointDescriptor {
        tool: "delete_case",
        verb: Verb::Delete,
        path: "/api/case/deleteCase",
        placement: Placement::Query,
        requires_auth: true,
        params: &[required("case_id", "caseId", ParamKind::Integer)],
    },
    EndpointDescriptor {
        tool: "save_case_model_point",
        verb: Verb::Post,
        path: "/api/caseModelPointLocal/saveOrUpdate",
        placement: Placement::Body,
        requires_auth: true,
        params: &[
            required("case_id", "caseId", ParamKind::String),
            required("index_code", "indexCode", ParamKind::String),
            required("point_name", "pointName", ParamKind::String),
            required("bind_point_name", "bindPointName", ParamKind::String),
            required("point_type", "pointType", ParamKind::Integer),
            optional("id", "id", ParamKind::Integer),
            optional("model_code", "modelCode", ParamKind::String),
            optional(
                "production_material_code",
                "productionMaterialCode",
                ParamKind::String,
            ),
            optional("point_desc", "pointDesc", ParamKind::String),
            optional("default_value", "defaultValue", ParamKind::String),
            optional("point_length", "pointLength", ParamKind::String),
            optional("sort", "sort", ParamKind::Integer),
        ],
    },
    EndpointDescriptor {
        tool: "query_case_model_points",
        verb: Verb::Post,
        path: "/api/caseModelPointLocal/queryByList",
        placement: Placement::Body,
        requires_auth: true,
        params: &[
            required("case_id", "caseId", ParamKind::String),
            optional("index_code", "indexCode", ParamKind::String),
            optional("model_code", "modelCode", ParamKind::String),
        ],
    },
];

pub fn endpoint_by_tool(tool: &str) -> Option<&'static EndpointDescriptor> {
    ENDPOINTS.iter().find(|endpoint| endpoint.tool == tool)
}

fn is_absent(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        _ => false,
    }
}

fn coerce(param: &ParamSpec, value: &Value) -> Result<Value, ToolError> {
    let coerced = match (param.kind, value) {
        (ParamKind::String, Value::String(text)) => Some(Value::String(text.trim().to_string())),
        (ParamKind::String, Value::Number(num)) => Some(Value::String(num.to_string())),
        (ParamKind::Integer, Value::Number(num)) => num.as_i64().map(Value::from),
        (ParamKind::Integer, Value::String(text)) => {
            text.trim().parse::<i64>().ok().map(Value::from)
        }
        _ => None,
    };
    coerced.ok_or_else(|| {
        let expected = match param.kind {
            ParamKind::String => "a string",
            ParamKind::Integer => "an integer",
        };
        ToolError::invalid_params(format!("{}: expected {}", param.arg, expected))
            .with_details(serde_json::json!({ "field": param.arg, "received": value }))
    })
}

fn query_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl EndpointDescriptor {
    /// Resolves tool arguments into wire parameters: required fields must be
    /// present, defaults fill gaps, and null or blank optionals are dropped.
    pub fn build_operation(&self, args: &Value) -> Result<OperationDescriptor, ToolError> {
        let mut params: Vec<(&'static str, Value)> = Vec::new();
        for param in self.params {
            let raw = args.get(param.arg);
            if is_absent(raw) {
                if param.required {
                    return Err(ToolError::invalid_params(format!(
                        "{}: missing required field '{}'",
                        self.tool, param.arg
                    )));
                }
                if let Some(default) = param.default {
                    params.push((param.wire, Value::from(default)));
                }
                continue;
            }
            if let Some(value) = raw {
                params.push((param.wire, coerce(param, value)?));
            }
        }

        let operation = OperationDescriptor::new(self.verb.as_method(), self.path);
        let operation = match self.placement {
            Placement::Query => params
                .iter()
                .fold(operation, |op, (wire, value)| op.with_query(*wire, query_text(value))),
            Placement::Body => {
                let body: Map<String, Value> = params
                    .into_iter()
                    .map(|(wire, value)| (wire.to_string(), value))
                    .collect();
                operation.with_body(Value::Object(body))
            }
        };
        Ok(operation)
    }
}
