use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Response};
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::ext::ReasonPhrase;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{BoxError, Error, Result};
use crate::request_file::Matching;

const JSON_CONTENT_TYPE: &str = "application/json";

pub type JsonObject = Map<String, Value>;

/// Decoded JSON body: a single object, or the objects of a top-level array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParsedBody {
    Object(JsonObject),
    Objects(Vec<JsonObject>),
}

impl ParsedBody {
    /// Narrows a decoded value. Non-object array elements are dropped.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(ParsedBody::Object(map)),
            Value::Array(items) => Ok(ParsedBody::Objects(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Object(map) => Some(map),
                        _ => None,
                    })
                    .collect(),
            )),
            Value::String(_) => Err(Error::UnsupportedJsonShape("string")),
            Value::Number(_) => Err(Error::UnsupportedJsonShape("number")),
            Value::Bool(_) => Err(Error::UnsupportedJsonShape("bool")),
            Value::Null => Err(Error::UnsupportedJsonShape("null")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseView {
    #[serde(rename = "status")]
    pub status_line: String,
    pub status_code: u16,
    pub headers: BTreeMap<String, Vec<String>>,
    #[serde(rename = "body", skip_serializing_if = "Option::is_none")]
    pub parsed_body: Option<ParsedBody>,
    pub raw_body: String,
}

/// Reads the whole body and builds a [`ResponseView`]. The response is
/// consumed, so the body stream is released on every path.
pub async fn normalize<B>(response: Response<B>, matching: Matching) -> Result<ResponseView>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let (parts, body) = response.into_parts();

    let bytes = body
        .collect()
        .await
        .map_err(|err| Error::BodyReadFailed(err.into()))?
        .to_bytes();

    let status_line = status_line(&parts);

    let parsed_body = if is_json(&parts.headers, matching) {
        let value: Value = serde_json::from_slice(&bytes)?;
        Some(ParsedBody::from_value(value)?)
    } else {
        None
    };

    Ok(ResponseView {
        status_line,
        status_code: parts.status.as_u16(),
        headers: collect_headers(&parts.headers),
        parsed_body,
        raw_body: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

/// Like [`normalize`], with the body read bounded by `timeout`. The bound is
/// separate from the one the transport applied to connect and send.
pub async fn normalize_within<B>(
    response: Response<B>,
    matching: Matching,
    timeout: Duration,
) -> Result<ResponseView>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    tokio::time::timeout(timeout, normalize(response, matching))
        .await
        .map_err(|elapsed| Error::BodyReadFailed(Box::new(elapsed)))?
}

/// `200 OK`, preferring the reason phrase the server sent.
fn status_line(parts: &http::response::Parts) -> String {
    let code = parts.status.as_u16();
    let sent = parts
        .extensions
        .get::<ReasonPhrase>()
        .map(|reason| String::from_utf8_lossy(reason.as_bytes()).into_owned());

    match sent.as_deref().or(parts.status.canonical_reason()) {
        Some(reason) => format!("{code} {reason}"),
        None => code.to_string(),
    }
}

fn is_json(headers: &HeaderMap, matching: Matching) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| matching.contains(value, JSON_CONTENT_TYPE))
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut result: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        result
            .entry(canonical_header_name(name.as_str()))
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    result
}

/// `x-request-id` -> `X-Request-Id`
fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
