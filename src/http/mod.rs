//! # HTTP capability types
//!
//! Minimal request/response values the routing core operates on. Transport
//! layers convert their own message types into [`Request`] and back from
//! [`Response`]; the core never touches sockets or bodies as byte streams.
//!
//! Header and query storage uses `SmallVec` so that common requests stay on
//! the stack.

mod request;
mod response;

pub use request::{
    HeaderVec, ParamVec, Request, MAX_INLINE_HEADERS, MAX_INLINE_PARAMS,
    METHOD_OVERRIDE_HEADER, REQUEST_ID_HEADER,
};
pub use response::Response;
