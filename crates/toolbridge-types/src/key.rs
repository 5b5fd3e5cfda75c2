//! Type and namespace identities.

use std::fmt;
use std::sync::Arc;

/// Name of the implicit root type every other type descends from.
pub const ANY_TYPE_NAME: &str = "any";

/// Reserved namespace for automatically generated downcast edges.
pub const DOWNCAST_NAMESPACE: &str = "<downcast>";

/// Runtime identity of a type in the resolution graph.
///
/// Rust types are keyed by [`std::any::type_name`]; kinds declared at runtime
/// (proxy file types, for instance) use an explicit name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(Arc<str>);

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(Arc::from(std::any::type_name::<T>()))
    }

    pub fn named(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The universal base type.
    pub fn any() -> Self {
        Self::named(ANY_TYPE_NAME)
    }

    pub fn is_any(&self) -> bool {
        &*self.0 == ANY_TYPE_NAME
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment, e.g. `String` for `alloc::string::String` or
    /// `Volume` for `app.volumes.Volume`.
    pub fn short_name(&self) -> &str {
        let full: &str = &self.0;
        let name = full.split('<').next().unwrap_or(full);
        let name = name.rsplit("::").next().unwrap_or(name);
        name.rsplit('.').next().unwrap_or(name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.0)
    }
}

/// Hierarchical, dot-separated scope label (`app.volumes.io`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(Arc<str>);

impl Namespace {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn downcast() -> Self {
        Self::new(DOWNCAST_NAMESPACE)
    }

    pub fn is_downcast(&self) -> bool {
        &*self.0 == DOWNCAST_NAMESPACE
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|s| !s.is_empty())
    }

    /// Nesting depth; the reserved downcast namespace has depth 0.
    pub fn depth(&self) -> usize {
        if self.is_downcast() {
            return 0;
        }
        self.segments().count()
    }

    /// True if `self` equals `other` or encloses it on a segment boundary.
    ///
    /// `app` is a prefix of `app.io` but not of `application`.
    pub fn is_prefix_of(&self, other: &Namespace) -> bool {
        if self.is_downcast() || other.is_downcast() {
            return false;
        }
        match other.0.strip_prefix(&*self.0) {
            Some("") => true,
            Some(rest) => rest.starts_with('.'),
            None => false,
        }
    }

    /// Enclosing namespaces, innermost first (`a.b.c` -> `a.b`, `a`).
    pub fn ancestors(&self) -> Vec<Namespace> {
        let mut out = Vec::new();
        let mut current: &str = &self.0;
        while let Some((parent, _)) = current.rsplit_once('.') {
            out.push(Namespace::new(parent));
            current = parent;
        }
        out
    }

    pub fn child(&self, name: &str) -> Namespace {
        Namespace::new(format!("{}.{}", self.0, name))
    }
}

impl From<&str> for Namespace {
    fn from(value: &str) -> Self {
        Namespace::new(value)
    }
}

impl From<String> for Namespace {
    fn from(value: String) -> Self {
        Namespace::new(value)
    }
}

impl From<&Namespace> for Namespace {
    fn from(value: &Namespace) -> Self {
        value.clone()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Namespace({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_names() {
        assert_eq!(TypeKey::of::<String>().short_name(), "String");
        assert_eq!(TypeKey::of::<f64>().short_name(), "f64");
        assert_eq!(TypeKey::named("app.volumes.Volume").short_name(), "Volume");
        assert!(TypeKey::any().is_any());
    }

    #[test]
    fn test_prefix_respects_segments() {
        let app = Namespace::new("app");
        assert!(app.is_prefix_of(&Namespace::new("app")));
        assert!(app.is_prefix_of(&Namespace::new("app.io")));
        assert!(!app.is_prefix_of(&Namespace::new("application")));
        assert!(!Namespace::new("app.io").is_prefix_of(&app));
        assert!(!Namespace::downcast().is_prefix_of(&app));
    }

    #[test]
    fn test_depth_and_ancestors() {
        let ns = Namespace::new("a.b.c");
        assert_eq!(ns.depth(), 3);
        assert_eq!(Namespace::downcast().depth(), 0);
        assert_eq!(ns.ancestors(), vec![Namespace::new("a.b"), Namespace::new("a")]);
        assert_eq!(Namespace::new("a").child("b"), Namespace::new("a.b"));
    }
}
