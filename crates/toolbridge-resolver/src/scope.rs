//! Caller scopes and per-call resolution state.
//!
//! Every resolution runs on behalf of a [`Scope`]: the caller's own
//! namespace plus the namespaces it imports. Resolvers registered anywhere
//! else are invisible to that caller.

use std::any::Any;
use std::collections::BTreeSet;
use std::sync::Arc;
use toolbridge_arc::FileReferenceCounter;
use toolbridge_types::{Namespace, TypeKey, Value};

use crate::error::ResolveError;
use crate::registry::Registry;

/// The calling code's position in the namespace tree.
#[derive(Debug, Clone)]
pub struct Scope {
    namespace: Namespace,
    imports: Vec<Namespace>,
    files: Arc<FileReferenceCounter>,
}

impl Scope {
    pub fn new(namespace: impl Into<Namespace>) -> Self {
        Self {
            namespace: namespace.into(),
            imports: Vec::new(),
            files: toolbridge_arc::manager(),
        }
    }

    /// Make resolvers registered in `namespace` visible.
    pub fn import(mut self, namespace: impl Into<Namespace>) -> Self {
        let namespace = namespace.into();
        if !self.imports.contains(&namespace) {
            self.imports.push(namespace);
        }
        self
    }

    /// Use `files` for managed files materialised during resolution.
    pub fn with_files(mut self, files: Arc<FileReferenceCounter>) -> Self {
        self.files = files;
        self
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn imports(&self) -> &[Namespace] {
        &self.imports
    }

    pub fn files(&self) -> &Arc<FileReferenceCounter> {
        &self.files
    }

    /// Own namespace, its enclosing namespaces, then imports.
    pub(crate) fn candidate_namespaces(&self) -> Vec<Namespace> {
        let mut out = vec![self.namespace.clone()];
        out.extend(self.namespace.ancestors());
        out.extend(self.imports.iter().cloned());
        out
    }
}

/// State shared by one top-level resolution and everything it triggers.
pub struct ResolutionContext<'r> {
    registry: &'r Registry,
    scope: &'r Scope,
    visible: BTreeSet<Namespace>,
    depth: usize,
}

impl<'r> ResolutionContext<'r> {
    pub(crate) fn new(registry: &'r Registry, scope: &'r Scope) -> Self {
        Self {
            registry,
            scope,
            visible: registry.visible_namespaces(scope),
            depth: 0,
        }
    }

    pub(crate) fn nested(&self) -> ResolutionContext<'r> {
        Self {
            registry: self.registry,
            scope: self.scope,
            visible: self.visible.clone(),
            depth: self.depth + 1,
        }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn scope(&self) -> &'r Scope {
        self.scope
    }

    pub fn files(&self) -> &'r Arc<FileReferenceCounter> {
        self.scope.files()
    }

    /// Namespaces whose resolvers this call may use, before the value's own
    /// declaring namespace is added.
    pub fn visible(&self) -> &BTreeSet<Namespace> {
        &self.visible
    }

    /// Nesting level; 0 for the top-level call.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn resolve(&self, value: Value, target: &TypeKey) -> Result<Value, ResolveError> {
        self.registry.resolve_in(self, value, target, None)
    }

    pub fn resolve_via(
        &self,
        value: Value,
        target: &TypeKey,
        intermediate: Option<&TypeKey>,
    ) -> Result<Value, ResolveError> {
        self.registry.resolve_in(self, value, target, intermediate)
    }

    /// Resolve and unwrap into a concrete Rust type.
    pub fn resolve_as<T: Any>(&self, value: Value) -> Result<T, ResolveError> {
        let target = TypeKey::of::<T>();
        let resolved = self.resolve(value, &target)?;
        resolved
            .downcast::<T>()
            .map_err(|value| ResolveError::ContractViolation {
                target,
                actual: value.type_key(),
                chain: Vec::new(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_namespaces() {
        let scope = Scope::new("app.volumes.io").import("lib.common").import("lib.common");
        assert_eq!(
            scope.candidate_namespaces(),
            vec![
                Namespace::new("app.volumes.io"),
                Namespace::new("app.volumes"),
                Namespace::new("app"),
                Namespace::new("lib.common"),
            ]
        );
        assert_eq!(scope.imports().len(), 1);
    }
}
