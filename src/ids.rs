//! Identifier generation and the tag-flattening convention (§6, GLOSSARY).

use uuid::Uuid;

/// An opaque batch identifier, hex-encoded on the wire as a bare 32-char
/// UUID (no hyphens), matching `uuid4().get_hex()` from the original
/// (§4.3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BatchId(Uuid);

impl BatchId {
    /// Generates a fresh random batch id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_hex(&self) -> String {
        self.0.simple().to_string()
    }

    /// Parses a previously-generated hex-encoded batch id.
    #[must_use]
    pub fn parse(hex: &str) -> Option<Self> {
        Uuid::try_parse(hex).ok().map(Self)
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_hex())
    }
}

/// A `(scope, name)` pair identifying a transport endpoint/channel
/// (GLOSSARY). Flattened to `"scope:name"` as a `CurrentTag` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub scope: String,
    pub name: String,
}

impl Tag {
    #[must_use]
    pub fn new(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            name: name.into(),
        }
    }

    /// `"{scope}:{name}"` (§6).
    #[must_use]
    pub fn flatten(&self) -> String {
        format!("{}:{}", self.scope, self.name)
    }

    /// Inverse of [`Tag::flatten`]. Splits on the first `:` only, so scope
    /// names may not contain `:` but tag names may.
    #[must_use]
    pub fn unflatten(key: &str) -> Option<Self> {
        let (scope, name) = key.split_once(':')?;
        Some(Self::new(scope, name))
    }
}
