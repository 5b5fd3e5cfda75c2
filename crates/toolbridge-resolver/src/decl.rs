//! Explicit "is-a" declarations.

use std::collections::{HashSet, VecDeque};
use toolbridge_types::{Namespace, TypeKey};

/// Declares a type's namespace and its direct parents.
///
/// Types that are never declared still take part in resolution; their
/// ancestor chain is just themselves followed by `any`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub key: TypeKey,
    pub namespace: Option<Namespace>,
    pub parents: Vec<TypeKey>,
}

impl TypeDecl {
    pub fn new(key: TypeKey) -> Self {
        Self {
            key,
            namespace: None,
            parents: Vec::new(),
        }
    }

    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(TypeKey::of::<T>())
    }

    pub fn in_namespace(mut self, namespace: impl Into<Namespace>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn extends(mut self, parent: TypeKey) -> Self {
        if !self.parents.contains(&parent) {
            self.parents.push(parent);
        }
        self
    }
}

/// Ancestor chain of `key`, most specific first.
///
/// Parents are walked breadth-first in declaration order, each type listed
/// once. `any` always comes last.
pub(crate) fn linearize<'a, F>(key: &TypeKey, parents_of: F) -> Vec<TypeKey>
where
    F: Fn(&TypeKey) -> Option<&'a [TypeKey]>,
{
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([key.clone()]);

    while let Some(current) = queue.pop_front() {
        if current.is_any() || !seen.insert(current.clone()) {
            continue;
        }
        if let Some(parents) = parents_of(&current) {
            queue.extend(parents.iter().cloned());
        }
        chain.push(current);
    }

    chain.push(TypeKey::any());
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn chain(decls: &[TypeDecl], key: &str) -> Vec<String> {
        let table: HashMap<TypeKey, Vec<TypeKey>> = decls
            .iter()
            .map(|d| (d.key.clone(), d.parents.clone()))
            .collect();
        linearize(&TypeKey::named(key), |k| table.get(k).map(Vec::as_slice))
            .iter()
            .map(|k| k.to_string())
            .collect()
    }

    #[test]
    fn test_undeclared_type_descends_from_any() {
        assert_eq!(chain(&[], "A"), vec!["A", "any"]);
        assert_eq!(chain(&[], "any"), vec!["any"]);
    }

    #[test]
    fn test_breadth_first_without_duplicates() {
        let decls = [
            TypeDecl::new(TypeKey::named("D"))
                .extends(TypeKey::named("B"))
                .extends(TypeKey::named("C")),
            TypeDecl::new(TypeKey::named("B")).extends(TypeKey::named("A")),
            TypeDecl::new(TypeKey::named("C")).extends(TypeKey::named("A")),
        ];
        assert_eq!(chain(&decls, "D"), vec!["D", "B", "C", "A", "any"]);
    }

    #[test]
    fn test_cycles_terminate() {
        let decls = [
            TypeDecl::new(TypeKey::named("A")).extends(TypeKey::named("B")),
            TypeDecl::new(TypeKey::named("B")).extends(TypeKey::named("A")),
        ];
        assert_eq!(chain(&decls, "A"), vec!["A", "B", "any"]);
    }
}
