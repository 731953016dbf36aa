//! Strict header table.
//!
//! Ordered, case-preserving storage with case-insensitive lookup. Ordinary
//! names may carry multiple values; the framing-relevant names
//! (`Transfer-Encoding`, `Content-Length`, `Content-Type`,
//! `Access-Control-Allow-Origin`) are single-valued and adding a second
//! value is a hard error, never a silent concatenation.

use crate::base::error::EntityError;
use crate::http::streaming::HeaderMutation;
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use std::str::FromStr;
use tracing::debug;

pub const CONTENT_LENGTH: &str = "Content-Length";
pub const TRANSFER_ENCODING: &str = "Transfer-Encoding";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const ACCESS_CONTROL_ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";

/// Names that must never carry more than one value.
const UNIQUE_HEADERS: [&str; 4] = [
    TRANSFER_ENCODING,
    CONTENT_LENGTH,
    CONTENT_TYPE,
    ACCESS_CONTROL_ALLOW_ORIGIN,
];

fn is_unique_name(name: &str) -> bool {
    UNIQUE_HEADERS.iter().any(|u| u.eq_ignore_ascii_case(name))
}

fn validate(name: &str, value: &str) -> Result<(), EntityError> {
    HeaderName::from_str(name)
        .map_err(|_| EntityError::InvalidHeader(name.to_string()))?;
    HeaderValue::from_str(value)
        .map_err(|_| EntityError::InvalidHeader(name.to_string()))?;
    Ok(())
}

/// Header multi-map with the strict single-value policy.
#[derive(Debug, Clone, Default)]
pub struct HeaderTable {
    /// Headers as (original_name, value) pairs, insertion-ordered.
    entries: Vec<(String, String)>,
}

impl HeaderTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a header value.
    ///
    /// Fails with [`EntityError::HeaderConflict`] when the name is
    /// single-valued and already present.
    pub fn add(&mut self, name: &str, value: &str) -> Result<(), EntityError> {
        validate(name, value)?;
        if is_unique_name(name) && self.contains(name) {
            return Err(EntityError::HeaderConflict {
                name: name.to_string(),
            });
        }
        self.entries.push((name.to_string(), value.to_string()));
        Ok(())
    }

    /// Append several values at once. A single-valued name given more than
    /// one value fails immediately, before any mutation.
    pub fn add_all(&mut self, name: &str, values: &[&str]) -> Result<(), EntityError> {
        if values.len() > 1 && is_unique_name(name) {
            return Err(EntityError::HeaderConflict {
                name: name.to_string(),
            });
        }
        for value in values {
            validate(name, value)?;
        }
        // Validation complete; no partial state below this point.
        for value in values {
            self.add(name, value)?;
        }
        Ok(())
    }

    /// Replace all values of a header with one value.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), EntityError> {
        validate(name, value)?;
        self.remove(name);
        self.entries.push((name.to_string(), value.to_string()));
        Ok(())
    }

    /// Remove a header, returning the removed values.
    pub fn remove(&mut self, name: &str) -> Vec<String> {
        let mut removed = Vec::new();
        self.entries.retain(|(n, v)| {
            if n.eq_ignore_ascii_case(name) {
                removed.push(v.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// First value for a name, case-insensitive.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values for a name, in insertion order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// The value of a header required to be single-valued. Multiple values
    /// are a hard error regardless of the name.
    pub fn get_unique(&self, name: &str) -> Result<Option<&str>, EntityError> {
        let values = self.get_all(name);
        match values.len() {
            0 => Ok(None),
            1 => Ok(Some(values[0])),
            _ => Err(EntityError::HeaderConflict {
                name: name.to_string(),
            }),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All headers with original casing, insertion-ordered.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// The declared Content-Length, parsed. An unparsable value is invalid.
    pub fn content_length(&self) -> Result<Option<u64>, EntityError> {
        match self.get_unique(CONTENT_LENGTH)? {
            None => Ok(None),
            Some(v) => v
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| EntityError::InvalidHeader(CONTENT_LENGTH.to_string())),
        }
    }

    /// Apply policy-issued mutations. Removals are logged at debug level;
    /// they are deliberate overrides, not errors.
    pub fn apply(&mut self, mutations: &[HeaderMutation]) -> Result<(), EntityError> {
        for mutation in mutations {
            match mutation {
                HeaderMutation::RemoveContentLength => {
                    let removed = self.remove(CONTENT_LENGTH);
                    if !removed.is_empty() {
                        debug!(values = ?removed, "removed Content-Length per streaming policy");
                    }
                }
                HeaderMutation::RemoveTransferEncoding => {
                    let removed = self.remove(TRANSFER_ENCODING);
                    if !removed.is_empty() {
                        debug!(values = ?removed, "removed Transfer-Encoding per streaming policy");
                    }
                }
                HeaderMutation::SetTransferEncodingChunked => {
                    self.set(TRANSFER_ENCODING, "chunked")?;
                }
            }
        }
        Ok(())
    }

    /// Enforce the wire invariant: at most one of Content-Length /
    /// Transfer-Encoding in the final state.
    pub fn validate_framing(&self) -> Result<(), EntityError> {
        self.get_unique(CONTENT_LENGTH)?;
        self.get_unique(TRANSFER_ENCODING)?;
        if self.contains(CONTENT_LENGTH) && self.contains(TRANSFER_ENCODING) {
            return Err(EntityError::FramingConflict);
        }
        Ok(())
    }

    /// Export to a standard `http::HeaderMap` (preserves insertion order).
    pub fn to_header_map(&self) -> Result<HeaderMap, EntityError> {
        let mut map = HeaderMap::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            let n = HeaderName::from_str(name)
                .map_err(|_| EntityError::InvalidHeader(name.clone()))?;
            let v = HeaderValue::from_str(value)
                .map_err(|_| EntityError::InvalidHeader(name.clone()))?;
            map.append(n, v);
        }
        Ok(map)
    }
}
