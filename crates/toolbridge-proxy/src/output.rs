//! Output markers.

use anyhow::Result;
use std::any::Any;
use std::sync::Arc;
use toolbridge_arc::FileReferenceCounter;
use toolbridge_types::{Resolvable, TypeKey};

use crate::kind::ProxyKind;
use crate::proxy::Proxy;

/// Placeholder asking for a fresh managed proxy of `kind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    kind: ProxyKind,
}

impl Output {
    pub fn new(kind: ProxyKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> &ProxyKind {
        &self.kind
    }

    pub fn materialize(&self, files: &Arc<FileReferenceCounter>) -> Result<Proxy> {
        Proxy::new_temporary(&self.kind, files)
    }
}

impl Resolvable for Output {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<Output>()
    }

    fn render(&self) -> String {
        format!("<Output {}>", self.kind.name())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}
