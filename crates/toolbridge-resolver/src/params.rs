//! Parameter descriptors and argument resolution.
//!
//! A [`Signature`] lists a function's parameters. Each [`Param`] may ask for
//! its argument to be resolved to a target type, optionally through a
//! required intermediate type. [`resolve_params`] wraps a closure so that
//! marked arguments arrive already resolved:
//!
//! ```text
//! CallArgs ──bind──► BoundArgs ──resolve marked params──► BoundArgs ──► closure
//! ```
//!
//! Binding keeps track of how each argument was supplied (positionally, by
//! keyword, or from a default) so the call shape can be reproduced.

use anyhow::{anyhow, Result};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use toolbridge_types::{Resolvable, TypeKey, Value};

use crate::error::ResolveError;
use crate::registry::{current_registry, Registry};
use crate::scope::Scope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Accepted positionally or by keyword.
    Positional,
    /// Accepted by keyword only.
    Keyword,
}

/// Target of a resolved parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveSpec {
    pub target: TypeKey,
    /// Required waypoint
    pub via: Option<TypeKey>,
}

type DefaultFactory = Arc<dyn Fn() -> Value + Send + Sync>;

#[derive(Clone)]
pub struct Param {
    name: String,
    kind: ParamKind,
    resolve: Option<ResolveSpec>,
    default: Option<DefaultFactory>,
    output: bool,
}

impl Param {
    pub fn positional(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParamKind::Positional)
    }

    pub fn keyword(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParamKind::Keyword)
    }

    fn with_kind(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            resolve: None,
            default: None,
            output: false,
        }
    }

    pub fn resolve(mut self, target: TypeKey) -> Self {
        self.resolve = Some(ResolveSpec { target, via: None });
        self
    }

    pub fn resolve_via(mut self, target: TypeKey, via: TypeKey) -> Self {
        self.resolve = Some(ResolveSpec {
            target,
            via: Some(via),
        });
        self
    }

    pub fn resolve_to<T: Any>(self) -> Self {
        self.resolve(TypeKey::of::<T>())
    }

    /// Default used when the caller omits the argument. Each call gets a
    /// fresh clone.
    pub fn default_value<T>(self, value: T) -> Self
    where
        T: Resolvable + Clone + Sync,
    {
        self.default_with(move || Value::new(value.clone()))
    }

    pub fn default_with<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(Arc::new(factory));
        self
    }

    /// Flag the parameter as producing one of the call's results.
    pub fn mark_output(mut self) -> Self {
        self.output = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    pub fn resolve_spec(&self) -> Option<&ResolveSpec> {
        self.resolve.as_ref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn is_output(&self) -> bool {
        self.output
    }

    fn make_default(&self) -> Option<Value> {
        self.default.as_ref().map(|factory| factory())
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Param")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("resolve", &self.resolve)
            .field("has_default", &self.default.is_some())
            .field("output", &self.output)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    TooManyPositional { expected: usize, given: usize },
    Unexpected(String),
    Duplicate(String),
    Missing(String),
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::TooManyPositional { expected, given } => write!(
                f,
                "takes {} positional arguments but {} were given",
                expected, given
            ),
            BindError::Unexpected(name) => write!(f, "got an unexpected keyword argument '{}'", name),
            BindError::Duplicate(name) => write!(f, "got multiple values for argument '{}'", name),
            BindError::Missing(name) => write!(f, "missing required argument '{}'", name),
        }
    }
}

impl std::error::Error for BindError {}

/// Arguments as supplied by a caller.
#[derive(Debug, Default)]
pub struct CallArgs {
    positional: Vec<Value>,
    keyword: Vec<(String, Value)>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Passed {
    Positional,
    Keyword,
    Default,
}

#[derive(Debug)]
pub struct BoundArg {
    pub name: String,
    pub passed: Passed,
    pub value: Value,
}

/// One argument per parameter, in declaration order.
#[derive(Debug, Default)]
pub struct BoundArgs {
    args: Vec<BoundArg>,
}

impl BoundArgs {
    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundArg> {
        self.args.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args
            .iter()
            .find(|arg| arg.name == name)
            .map(|arg| &arg.value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.args.iter().position(|arg| arg.name == name)?;
        Some(self.args.remove(index).value)
    }

    /// Remove an argument and unwrap it into a concrete type.
    pub fn take<T: Any>(&mut self, name: &str) -> Result<T> {
        let value = self
            .remove(name)
            .ok_or_else(|| anyhow!("no argument named '{}'", name))?;
        value.downcast::<T>().map_err(|value| {
            anyhow!(
                "argument '{}' is `{}`, not `{}`",
                name,
                value.type_key(),
                std::any::type_name::<T>()
            )
        })
    }

    /// Split back into call shape: arguments passed positionally stay
    /// positional, everything else (keywords and defaults) becomes a keyword.
    pub fn into_parts(self) -> (Vec<Value>, Vec<(String, Value)>) {
        let mut positional = Vec::new();
        let mut keyword = Vec::new();
        for arg in self.args {
            match arg.passed {
                Passed::Positional => positional.push(arg.value),
                Passed::Keyword | Passed::Default => keyword.push((arg.name, arg.value)),
            }
        }
        (positional, keyword)
    }
}

impl IntoIterator for BoundArgs {
    type Item = BoundArg;
    type IntoIter = std::vec::IntoIter<BoundArg>;

    fn into_iter(self) -> Self::IntoIter {
        self.args.into_iter()
    }
}

impl FromIterator<BoundArg> for BoundArgs {
    fn from_iter<I: IntoIterator<Item = BoundArg>>(iter: I) -> Self {
        Self {
            args: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    pub fn new(params: Vec<Param>) -> Self {
        Self { params }
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Match caller arguments to parameters, filling in defaults.
    pub fn bind(&self, args: CallArgs) -> Result<BoundArgs, BindError> {
        let mut slots: Vec<Option<(Passed, Value)>> = self.params.iter().map(|_| None).collect();

        let positional_slots: Vec<usize> = self
            .params
            .iter()
            .enumerate()
            .filter(|(_, param)| param.kind == ParamKind::Positional)
            .map(|(index, _)| index)
            .collect();
        if args.positional.len() > positional_slots.len() {
            return Err(BindError::TooManyPositional {
                expected: positional_slots.len(),
                given: args.positional.len(),
            });
        }
        for (slot, value) in positional_slots.into_iter().zip(args.positional) {
            slots[slot] = Some((Passed::Positional, value));
        }

        for (name, value) in args.keyword {
            let slot = self
                .params
                .iter()
                .position(|param| param.name == name)
                .ok_or_else(|| BindError::Unexpected(name.clone()))?;
            if slots[slot].is_some() {
                return Err(BindError::Duplicate(name));
            }
            slots[slot] = Some((Passed::Keyword, value));
        }

        self.params
            .iter()
            .zip(slots)
            .map(|(param, slot)| -> Result<BoundArg, BindError> {
                let (passed, value) = match slot {
                    Some(bound) => bound,
                    None => (
                        Passed::Default,
                        param
                            .make_default()
                            .ok_or_else(|| BindError::Missing(param.name.clone()))?,
                    ),
                };
                Ok(BoundArg {
                    name: param.name.clone(),
                    passed,
                    value,
                })
            })
            .collect()
    }
}

/// Resolve every argument whose parameter carries a [`ResolveSpec`].
pub fn resolve_bound(
    registry: &Registry,
    scope: &Scope,
    signature: &Signature,
    bound: BoundArgs,
) -> Result<BoundArgs, ResolveError> {
    signature
        .params()
        .iter()
        .zip(bound)
        .map(|(param, mut arg)| -> Result<BoundArg, ResolveError> {
            if let Some(spec) = param.resolve_spec() {
                arg.value =
                    registry.resolve_via(scope, arg.value, &spec.target, spec.via.as_ref())?;
            }
            Ok(arg)
        })
        .collect()
}

/// A closure whose marked arguments are resolved before every call.
pub struct ResolvedFn<'r, F> {
    registry: &'r Registry,
    signature: Signature,
    func: F,
}

/// Wrap `func` so that it receives resolved arguments.
pub fn resolve_params<F, R>(signature: Signature, func: F) -> ResolvedFn<'static, F>
where
    F: Fn(BoundArgs) -> Result<R>,
{
    ResolvedFn {
        registry: current_registry(),
        signature,
        func,
    }
}

impl<'r, F> ResolvedFn<'r, F> {
    pub fn with_registry(self, registry: &Registry) -> ResolvedFn<'_, F> {
        ResolvedFn {
            registry,
            signature: self.signature,
            func: self.func,
        }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn call<R>(&self, scope: &Scope, args: CallArgs) -> Result<R>
    where
        F: Fn(BoundArgs) -> Result<R>,
    {
        let bound = self.signature.bind(args)?;
        let resolved = resolve_bound(self.registry, scope, &self.signature, bound)?;
        (self.func)(resolved)
    }
}
