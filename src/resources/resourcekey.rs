//! Namespaced identifiers (`namespace:path`) used for materials, regions and
//! sounds.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

/// Namespace assumed when an identifier is written without one.
pub const DEFAULT_NAMESPACE: &str = "core";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceKeyError {
    #[error("empty identifier")]
    Empty,
    #[error("identifier '{0}' has more than one ':' separator")]
    TooManySeparators(String),
    #[error("identifier '{key}' contains invalid character '{ch}'")]
    InvalidCharacter { key: String, ch: char },
}

/// An interned `namespace:path` identifier. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    namespace: Arc<str>,
    path: Arc<str>,
}

fn valid_char(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '-' | '.' | '/')
}

impl ResourceKey {
    /// Parse `namespace:path` or a bare `path` (which gets [`DEFAULT_NAMESPACE`]).
    pub fn parse(text: &str) -> Result<Self, ResourceKeyError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ResourceKeyError::Empty);
        }
        let (namespace, path) = match text.split_once(':') {
            Some((ns, path)) => {
                if path.contains(':') {
                    return Err(ResourceKeyError::TooManySeparators(text.to_string()));
                }
                (ns, path)
            }
            None => (DEFAULT_NAMESPACE, text),
        };
        if namespace.is_empty() || path.is_empty() {
            return Err(ResourceKeyError::Empty);
        }
        if let Some(ch) = namespace
            .chars()
            .chain(path.chars())
            .find(|c| !valid_char(*c))
        {
            return Err(ResourceKeyError::InvalidCharacter {
                key: text.to_string(),
                ch,
            });
        }
        Ok(Self {
            namespace: namespace.into(),
            path: path.into(),
        })
    }

    /// Build a key from parts already known to be valid.
    pub(crate) fn from_parts(namespace: &str, path: &str) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl FromStr for ResourceKey {
    type Err = ResourceKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_key() {
        let key = ResourceKey::parse("forest:birds_day").unwrap();
        assert_eq!(key.namespace(), "forest");
        assert_eq!(key.path(), "birds_day");
        assert_eq!(key.to_string(), "forest:birds_day");
    }

    #[test]
    fn test_parse_bare_path_uses_default_namespace() {
        let key = ResourceKey::parse("stone").unwrap();
        assert_eq!(key.namespace(), DEFAULT_NAMESPACE);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(ResourceKey::parse("  "), Err(ResourceKeyError::Empty));
        assert_eq!(ResourceKey::parse("core:"), Err(ResourceKeyError::Empty));
        assert!(matches!(
            ResourceKey::parse("a:b:c"),
            Err(ResourceKeyError::TooManySeparators(_))
        ));
        assert!(matches!(
            ResourceKey::parse("core:Stone"),
            Err(ResourceKeyError::InvalidCharacter { ch: 'S', .. })
        ));
    }
}
