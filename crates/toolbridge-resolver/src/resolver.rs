//! Conversion functions stored on graph edges.

use anyhow::{anyhow, Result};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use toolbridge_types::{Resolvable, Value};

use crate::scope::ResolutionContext;

type ResolveFn = dyn Fn(Value, &ResolutionContext<'_>) -> Result<Value> + Send + Sync;

/// A named conversion from one runtime type to another.
///
/// Cloning is cheap and preserves identity: two clones of the same resolver
/// are the same resolver for duplicate detection.
#[derive(Clone)]
pub struct Resolver {
    name: Arc<str>,
    func: Arc<ResolveFn>,
}

impl Resolver {
    /// Resolver working on type-erased values.
    pub fn raw<F>(name: impl AsRef<str>, f: F) -> Self
    where
        F: Fn(Value, &ResolutionContext<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name.as_ref()),
            func: Arc::new(f),
        }
    }

    /// Resolver from a plain `A -> B` function.
    pub fn typed<A, B, F>(name: impl AsRef<str>, f: F) -> Self
    where
        A: Any,
        B: Resolvable,
        F: Fn(A) -> Result<B> + Send + Sync + 'static,
    {
        Self::contextual(name, move |value: A, _cx: &ResolutionContext<'_>| f(value))
    }

    /// Resolver that can resolve nested values through the context.
    pub fn contextual<A, B, F>(name: impl AsRef<str>, f: F) -> Self
    where
        A: Any,
        B: Resolvable,
        F: Fn(A, &ResolutionContext<'_>) -> Result<B> + Send + Sync + 'static,
    {
        Self::raw(name, move |value: Value, cx: &ResolutionContext<'_>| {
            let input = value.downcast::<A>().map_err(|value| {
                anyhow!(
                    "expected a `{}` value, got `{}`",
                    std::any::type_name::<A>(),
                    value.type_key()
                )
            })?;
            Ok(Value::new(f(input, cx)?))
        })
    }

    /// Pass the value through unchanged.
    pub(crate) fn identity(name: &str) -> Self {
        Self::raw(name, |value, _| Ok(value))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Address of the shared function, stable across clones. Two resolvers
    /// built from the same closure separately have different ids.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.func) as *const () as usize
    }

    pub fn same_as(&self, other: &Resolver) -> bool {
        self.id() == other.id()
    }

    pub fn call(&self, value: Value, cx: &ResolutionContext<'_>) -> Result<Value> {
        (self.func)(value, cx)
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resolver({})", self.name)
    }
}
