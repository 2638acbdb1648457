use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::http::MAX_INLINE_PARAMS;

/// Key of a captured value: the capture's name, or its ordinal for
/// anonymous captures.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CaptureKey {
    Name(Arc<str>),
    Position(usize),
}

impl fmt::Display for CaptureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureKey::Name(name) => f.write_str(name),
            CaptureKey::Position(index) => write!(f, "#{index}"),
        }
    }
}

/// Values captured by one successful match, in template order.
///
/// Stack-allocated for templates with up to eight captures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    entries: SmallVec<[(CaptureKey, String); MAX_INLINE_PARAMS]>,
}

impl Captures {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: CaptureKey, value: String) {
        self.entries.push((key, value));
    }

    /// Value of the named capture.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| matches!(key, CaptureKey::Name(n) if n.as_ref() == name))
            .map(|(_, value)| value.as_str())
    }

    /// Value of the anonymous capture at template ordinal `index`.
    #[inline]
    #[must_use]
    pub fn get_position(&self, index: usize) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| *key == CaptureKey::Position(index))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CaptureKey, &str)> {
        self.entries.iter().map(|(key, value)| (key, value.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Named captures as a map; anonymous captures are skipped.
    /// Note: This allocates
    #[must_use]
    pub fn named_map(&self) -> HashMap<String, String> {
        self.entries
            .iter()
            .filter_map(|(key, value)| match key {
                CaptureKey::Name(name) => Some((name.to_string(), value.clone())),
                CaptureKey::Position(_) => None,
            })
            .collect()
    }
}

impl FromIterator<(CaptureKey, String)> for Captures {
    fn from_iter<I: IntoIterator<Item = (CaptureKey, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
