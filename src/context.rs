//! Per-dispatch state.
//!
//! Everything a single dispatch reads or writes lives in a
//! [`DispatchContext`]; routes and routers stay immutable while requests run.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use crate::binder::ArgumentBag;
use crate::http::{Request, Response, REQUEST_ID_HEADER};
use crate::pattern::{CaptureKey, Captures};

/// Strongly typed request identifier backed by ULID.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(pub ulid::Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Parse the header value when it is a valid ULID; otherwise mint a new id.
    #[must_use]
    pub fn from_header_or_new(header_value: Option<&str>) -> Self {
        header_value
            .and_then(|s| s.trim().parse::<RequestId>().ok())
            .unwrap_or_default()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s).map(RequestId)
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<RequestId>()
            .map_err(|_| serde::de::Error::custom("invalid request id"))
    }
}

/// State threaded through hooks, middleware and the handler of one dispatch.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    pub request_id: RequestId,
    pub request: Request,
    /// Current response. Starts as an empty `200`; set from the handler's
    /// result before after-hooks run, so they may inspect or replace it.
    pub response: Response,
    /// Values captured by the matched route
    pub captures: Captures,
    /// Extra positional arguments supplied by the caller
    pub extra_args: Vec<Value>,
    /// Display name of the matched route, when it has one
    pub route_name: Option<String>,
}

impl DispatchContext {
    #[must_use]
    pub fn new(request: Request, extra_args: Vec<Value>) -> Self {
        let request_id = RequestId::from_header_or_new(request.header(REQUEST_ID_HEADER));
        Self {
            request_id,
            request,
            response: Response::default(),
            captures: Captures::new(),
            extra_args,
            route_name: None,
        }
    }

    /// Argument bag for binding: captures in template order, then the extra
    /// positional arguments. Named captures keep their name; anonymous ones
    /// are keyed by their decimal position (`"1"`).
    #[must_use]
    pub fn argument_bag(&self) -> ArgumentBag {
        let mut bag = ArgumentBag::new();
        for (key, value) in self.captures.iter() {
            let name = match key {
                CaptureKey::Name(name) => Some(Arc::clone(name)),
                CaptureKey::Position(index) => Some(Arc::from(index.to_string())),
            };
            bag.push(name, Value::String(value.to_string()));
        }
        for value in &self.extra_args {
            bag.push(None, value.clone());
        }
        bag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_is_taken_from_header() {
        let id = RequestId::new();
        let req = Request::get("/").with_header("x-request-id", id.to_string());
        assert_eq!(DispatchContext::new(req, vec![]).request_id, id);
    }

    #[test]
    fn test_invalid_request_id_header_is_replaced() {
        let req = Request::get("/").with_header(REQUEST_ID_HEADER, "not-a-ulid");
        let ctx = DispatchContext::new(req, vec![]);
        assert_ne!(ctx.request_id.to_string(), "not-a-ulid");
    }

    #[test]
    fn test_argument_bag_orders_captures_before_extras() {
        let mut ctx = DispatchContext::new(Request::get("/"), vec![Value::from(7)]);
        ctx.captures.push(CaptureKey::Name(Arc::from("id")), "42".into());
        ctx.captures.push(CaptureKey::Position(1), "x".into());
        let bag = ctx.argument_bag();
        let values: Vec<_> = bag.values().cloned().collect();
        assert_eq!(values, vec![Value::from("42"), Value::from("x"), Value::from(7)]);
        assert_eq!(bag.get("id"), Some(&Value::from("42")));
        assert_eq!(bag.get("1"), Some(&Value::from("x")));
    }
}
