//! Command-line argument values.

use std::any::Any;
use std::fmt;
use toolbridge_types::{Resolvable, TypeKey};

use crate::kind::ProxyKind;
use crate::proxy::Proxy;

/// The string handed to an external tool for one parameter.
///
/// An argument resolved from a proxy keeps that proxy alive until the
/// argument is dropped, so managed files outlive the call that uses them.
#[derive(Debug, Clone)]
pub struct CommandArg {
    value: String,
    kind: Option<ProxyKind>,
    proxy: Option<Proxy>,
}

impl CommandArg {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: None,
            proxy: None,
        }
    }

    pub fn from_proxy(proxy: Proxy) -> Self {
        Self {
            value: proxy.path().display().to_string(),
            kind: Some(proxy.kind().clone()),
            proxy: Some(proxy),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> Option<&ProxyKind> {
        self.kind.as_ref()
    }

    pub fn proxy(&self) -> Option<&Proxy> {
        self.proxy.as_ref()
    }

    /// The proxy behind this argument, or an unmanaged one for its path.
    pub fn into_proxy(self) -> Proxy {
        match self.proxy {
            Some(proxy) => proxy,
            None => Proxy::reference(
                self.value,
                self.kind.unwrap_or_else(ProxyKind::untyped),
            ),
        }
    }
}

impl fmt::Display for CommandArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl Resolvable for CommandArg {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<CommandArg>()
    }

    fn render(&self) -> String {
        self.value.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}
