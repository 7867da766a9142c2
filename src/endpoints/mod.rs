//! Endpoint descriptors.
//!
//! Every remote capability is described once, as data: its path and method,
//! the table translating snake_case parameter names into the remote field
//! names, and the rule deciding whether the service will queue the request.
//! `OutscraperClient::call` drives any descriptor through the same code path.

pub mod catalog;

use crate::error::{OutscraperError, Result};
use crate::utils::{format_direction_query, parse_fields, parse_timestamp, split_route};
use serde_json::{Map, Value};

pub use catalog::{ALL, find};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// How queries are assembled before they are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFormat {
    Plain,
    /// Each query is a route; see [`crate::utils::format_direction_query`].
    Directions,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Null,
    Str(&'static str),
    Int(i64),
    Bool(bool),
}

impl FieldDefault {
    fn to_value(self) -> Value {
        match self {
            FieldDefault::Null => Value::Null,
            FieldDefault::Str(s) => Value::from(s),
            FieldDefault::Int(i) => Value::from(i),
            FieldDefault::Bool(b) => Value::from(b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    /// A scalar is wrapped into a one-element list.
    List,
    /// A list is joined with commas.
    CommaList,
    /// Unix seconds; date strings are converted.
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub remote: &'static str,
    pub default: FieldDefault,
    pub kind: FieldKind,
}

impl Field {
    pub const fn new(name: &'static str, remote: &'static str, default: FieldDefault) -> Self {
        Field {
            name,
            remote,
            default,
            kind: FieldKind::Scalar,
        }
    }

    pub const fn list(mut self) -> Self {
        self.kind = FieldKind::List;
        self
    }

    pub const fn comma_list(mut self) -> Self {
        self.kind = FieldKind::CommaList;
        self
    }

    pub const fn timestamp(mut self) -> Self {
        self.kind = FieldKind::Timestamp;
        self
    }

    fn normalize(&self, value: Value) -> Result<Value> {
        Ok(match (self.kind, value) {
            (_, Value::Null) => Value::Null,
            (FieldKind::Scalar, v) => v,
            (FieldKind::List, Value::Array(items)) => Value::Array(items),
            (FieldKind::List, v) => Value::Array(vec![v]),
            (FieldKind::CommaList, Value::Array(items)) => Value::from(parse_fields(
                items
                    .into_iter()
                    .map(|v| match v {
                        Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>(),
            )),
            (FieldKind::CommaList, v) => v,
            (FieldKind::Timestamp, Value::Number(n)) => Value::Number(n),
            (FieldKind::Timestamp, Value::String(s)) => match parse_timestamp(&s) {
                Some(ts) => Value::from(ts),
                None => {
                    return Err(OutscraperError::InvalidArgument(format!(
                        "{}: cannot read {s:?} as a timestamp",
                        self.name
                    )));
                }
            },
            (FieldKind::Timestamp, other) => {
                return Err(OutscraperError::InvalidArgument(format!(
                    "{}: expected a timestamp, got {other}",
                    self.name
                )));
            }
        })
    }
}

/// One condition that makes the service queue a request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    QueriesOver(usize),
    ParamOver { field: &'static str, limit: i64 },
    ParamEquals { field: &'static str, value: i64 },
    AllOf(&'static [Trigger]),
}

impl Trigger {
    fn fires(&self, queries: usize, params: &Map<String, Value>) -> bool {
        match *self {
            Trigger::QueriesOver(n) => queries > n,
            Trigger::ParamOver { field, limit } => int_param(params, field).is_some_and(|v| v > limit),
            Trigger::ParamEquals { field, value } => int_param(params, field) == Some(value),
            Trigger::AllOf(all) => all.iter().all(|t| t.fires(queries, params)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AsyncRule {
    /// The service always queues; results come from the archive.
    Always,
    /// The service always answers inline.
    Never,
    /// Queued when any trigger fires.
    When(&'static [Trigger]),
}

/// What the wire-level `async` field carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncParam {
    /// The computed queue decision.
    Computed,
    /// The caller's `async_request` flag.
    Requested,
    Omitted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Endpoint {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub method: HttpMethod,
    pub path: &'static str,
    pub query_format: QueryFormat,
    pub fields: &'static [Field],
    pub rule: AsyncRule,
    pub async_param: AsyncParam,
    pub async_by_default: bool,
}

impl Endpoint {
    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn accepts(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Defaults overlaid with caller values, keyed by snake_case name.
    pub fn resolve(&self, overrides: &Map<String, Value>) -> Result<Map<String, Value>> {
        if let Some(unknown) = overrides.keys().find(|k| !self.accepts(k)) {
            return Err(OutscraperError::InvalidArgument(format!(
                "{} does not take a `{unknown}` parameter",
                self.name
            )));
        }

        let mut params = Map::new();
        for field in self.fields {
            let value = match overrides.get(field.name) {
                Some(v) => field.normalize(v.clone())?,
                None => field.default.to_value(),
            };
            params.insert(field.name.to_string(), value);
        }
        Ok(params)
    }

    /// Bring queries into the shape the endpoint expects. A directions query
    /// is one route and must name at least an origin and a destination.
    pub fn format_queries(&self, queries: &[String]) -> Result<Vec<String>> {
        match self.query_format {
            QueryFormat::Plain => Ok(queries.to_vec()),
            QueryFormat::Directions => queries
                .iter()
                .map(|route| {
                    let waypoints = split_route(route);
                    if waypoints.len() < 2 {
                        return Err(OutscraperError::InvalidArgument(format!(
                            "{}: route {route:?} needs an origin and a destination",
                            self.name
                        )));
                    }
                    Ok(format_direction_query(&waypoints))
                })
                .collect(),
        }
    }

    /// Whether the service will queue this request on its own.
    pub fn queues(&self, queries: usize, params: &Map<String, Value>) -> bool {
        match self.rule {
            AsyncRule::Always => true,
            AsyncRule::Never => false,
            AsyncRule::When(triggers) => triggers.iter().any(|t| t.fires(queries, params)),
        }
    }

    /// Translate resolved parameters into the remote field names.
    pub fn to_remote(
        &self,
        queries: Vec<String>,
        params: &Map<String, Value>,
        async_value: Option<bool>,
    ) -> Map<String, Value> {
        let mut remote = Map::new();
        remote.insert("query".to_string(), Value::from(queries));

        for field in self.fields {
            let value = params.get(field.name).cloned().unwrap_or(Value::Null);
            remote.insert(field.remote.to_string(), value);
        }
        if let Some(flag) = async_value {
            remote.insert("async".to_string(), Value::from(flag));
        }
        remote
    }
}

fn int_param(params: &Map<String, Value>, name: &str) -> Option<i64> {
    match params.get(name)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
