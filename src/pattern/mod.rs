//! # Pattern Module
//!
//! Turns route templates such as `/users/{id:INT}/posts/{slug?}` into
//! anchored regular expressions plus a token list used for reverse routing.
//!
//! ## Template syntax
//!
//! | Form | Meaning |
//! |------|---------|
//! | `{name}` | named capture using the default rule |
//! | `{name:TYPE}` | named capture using the rule registered for `TYPE` |
//! | `{name?}` / `{name:TYPE?}` | optional capture |
//! | `{}` / `{:TYPE}` | anonymous capture, addressed by position |
//!
//! An optional capture directly after a `/` or `.` absorbs that separator,
//! so `/files/{name:STR}.{ext?}` matches both `/files/a` and `/files/a.txt`.
//!
//! ## Match types
//!
//! Rules are looked up in a [`MatchTypes`] registry. Tags are
//! case-insensitive and unknown tags fall back to the default rule
//! `[^/?#]+`. The built-ins are `INT`, `HEX`, `STR`, `*` (lazy) and `**`
//! (greedy).
//!
//! ## Caching
//!
//! [`PatternCache`] memoises compilation per template, filter set and
//! registry generation; compiled patterns are shared as
//! `Arc<CompiledPattern>` and never mutated.

mod cache;
mod captures;
mod compiler;
mod match_types;

pub use cache::PatternCache;
pub use captures::{CaptureKey, Captures};
pub use compiler::{compile, Capture, CompiledPattern, Token};
pub use match_types::{MatchTypeSnapshot, MatchTypes, DEFAULT_TAG};
