use std::fmt;

/// Namespaced name for a resource, written `namespace:path`.
///
/// Identifiers are pure lookup keys: equality and hashing are structural
/// over both fields, and holding one implies no ownership of the resource
/// it names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    namespace: String,
    path: String,
}

impl Identifier {
    pub const DEFAULT_NAMESPACE: &'static str = "cube";
    pub const SEPARATOR: char = ':';

    #[must_use]
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
        }
    }

    /// Identifier under the default namespace.
    #[must_use]
    pub fn of(path: impl Into<String>) -> Self {
        Self::new(Self::DEFAULT_NAMESPACE, path)
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.namespace, Self::SEPARATOR, self.path)
    }
}
