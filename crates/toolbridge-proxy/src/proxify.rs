//! Proxified tool calls.
//!
//! [`proxify`] wraps a closure that drives an external tool. Before the call
//! every argument is resolved to a [`CommandArg`]; parameters declared with
//! [`ProxyParam::output`] default to an [`Output`] marker, which resolves to
//! a fresh managed temporary file. After the call those parameters come back
//! as [`Proxy`] handles.
//!
//! ```text
//! CallArgs ─bind─► values ─resolve─► CommandArg ─strings─► tool closure
//!                                        │
//!                                        └─ output params ─► Proxy results
//! ```

use anyhow::{anyhow, bail, Result};
use toolbridge_resolver::common::COMMON_NAMESPACE;
use toolbridge_resolver::{CallArgs, Param, Passed, Registry, Scope, Signature};
use toolbridge_types::{TypeKey, Value};
use tracing::{debug, warn};

use crate::arg::CommandArg;
use crate::kind::ProxyKind;
use crate::output::Output;
use crate::proxy::Proxy;
use crate::resolvers::{registry, PROXY_NAMESPACE};

/// Proxy-specific parameter declarations.
pub trait ProxyParam {
    /// Default to a fresh `kind` file, returned as a proxy after the call.
    fn output(self, kind: &ProxyKind) -> Self;

    /// Force resolution through `kind`.
    fn through(self, kind: &ProxyKind) -> Self;
}

impl ProxyParam for Param {
    fn output(self, kind: &ProxyKind) -> Self {
        let kind = kind.clone();
        self.default_with(move || Value::new(Output::new(kind.clone())))
            .mark_output()
    }

    fn through(self, kind: &ProxyKind) -> Self {
        self.resolve_via(TypeKey::of::<CommandArg>(), kind.key().clone())
    }
}

/// Arguments as the tool sees them: plain strings, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ToolArgs {
    args: Vec<(String, String, Passed)>,
}

impl ToolArgs {
    /// Values the caller passed positionally.
    pub fn positional(&self) -> Vec<&str> {
        self.args
            .iter()
            .filter(|(_, _, passed)| *passed == Passed::Positional)
            .map(|(_, value, _)| value.as_str())
            .collect()
    }

    /// Values passed by keyword or filled from defaults.
    pub fn keyword(&self) -> Vec<(&str, &str)> {
        self.args
            .iter()
            .filter(|(_, _, passed)| *passed != Passed::Positional)
            .map(|(name, value, _)| (name.as_str(), value.as_str()))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(param, _, _)| param == name)
            .map(|(_, value, _)| value.as_str())
    }

    /// Look up a parameter that must be present.
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name)
            .ok_or_else(|| anyhow!("no argument named '{}'", name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.args
            .iter()
            .map(|(name, value, _)| (name.as_str(), value.as_str()))
    }
}

/// What a tool closure reports back.
#[derive(Debug)]
pub enum ToolReturn {
    None,
    /// Exit status
    Code(i64),
    Text(String),
    Proxies(Vec<Proxy>),
}

impl ToolReturn {
    /// Nothing worth keeping: no value, a zero status, or proxies.
    pub fn is_trivial(&self) -> bool {
        matches!(
            self,
            ToolReturn::None | ToolReturn::Code(0) | ToolReturn::Proxies(_)
        )
    }
}

/// Result of a proxified call.
#[derive(Debug)]
pub enum CallOutput {
    /// No output parameters; the tool's own return value.
    Returned(ToolReturn),
    Proxy(Proxy),
    Proxies(Vec<Proxy>),
}

impl CallOutput {
    pub fn into_proxy(self) -> Result<Proxy> {
        match self {
            CallOutput::Proxy(proxy) => Ok(proxy),
            CallOutput::Proxies(proxies) => {
                bail!("call produced {} proxies, expected one", proxies.len())
            }
            CallOutput::Returned(value) => bail!("call produced no proxy: {:?}", value),
        }
    }

    pub fn into_proxies(self) -> Vec<Proxy> {
        match self {
            CallOutput::Proxy(proxy) => vec![proxy],
            CallOutput::Proxies(proxies) => proxies,
            CallOutput::Returned(ToolReturn::Proxies(proxies)) => proxies,
            CallOutput::Returned(_) => Vec::new(),
        }
    }
}

/// A tool closure wrapped by [`proxify`].
pub struct Proxified<'r, F> {
    registry: &'r Registry,
    signature: Signature,
    func: F,
}

/// Wrap `func` so that it receives resolved string arguments and returns
/// proxies for its output parameters.
pub fn proxify<F>(signature: Signature, func: F) -> Proxified<'static, F>
where
    F: Fn(&ToolArgs) -> Result<ToolReturn>,
{
    Proxified {
        registry: registry(),
        signature,
        func,
    }
}

impl<'r, F> Proxified<'r, F>
where
    F: Fn(&ToolArgs) -> Result<ToolReturn>,
{
    /// Resolve against `registry` instead of the process-wide one. The
    /// proxy resolvers must already be installed there.
    pub fn with_registry(self, registry: &Registry) -> Proxified<'_, F> {
        Proxified {
            registry,
            signature: self.signature,
            func: self.func,
        }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn call(&self, scope: &Scope, args: CallArgs) -> Result<CallOutput> {
        let scope = scope
            .clone()
            .import(PROXY_NAMESPACE)
            .import(COMMON_NAMESPACE);
        let target = TypeKey::of::<CommandArg>();

        let bound = self.signature.bind(args)?;
        let mut resolved = Vec::with_capacity(bound.len());
        for (param, arg) in self.signature.params().iter().zip(bound) {
            let via = param.resolve_spec().and_then(|spec| spec.via.as_ref());
            let value = self
                .registry
                .resolve_via(&scope, arg.value, &target, via)?;
            let command_arg = value.downcast::<CommandArg>().map_err(|value| {
                anyhow!(
                    "argument '{}' resolved to `{}` instead of a command argument",
                    arg.name,
                    value.type_key()
                )
            })?;
            resolved.push((param.is_output(), arg.name, arg.passed, command_arg));
        }

        let tool_args = ToolArgs {
            args: resolved
                .iter()
                .map(|(_, name, passed, arg)| (name.clone(), arg.as_str().to_string(), *passed))
                .collect(),
        };
        debug!(args = ?tool_args.args, "calling proxified tool");
        let returned = (self.func)(&tool_args)?;

        let mut outputs: Vec<Proxy> = resolved
            .into_iter()
            .filter(|(is_output, ..)| *is_output)
            .map(|(_, _, _, arg)| arg.into_proxy())
            .collect();

        if outputs.is_empty() {
            return Ok(CallOutput::Returned(returned));
        }
        if !returned.is_trivial() {
            warn!(
                "Wrapped function returns non-zero value; the value '{:?}' will be discarded",
                returned
            );
        }
        Ok(match outputs.len() {
            1 => CallOutput::Proxy(outputs.remove(0)),
            _ => CallOutput::Proxies(outputs),
        })
    }
}
