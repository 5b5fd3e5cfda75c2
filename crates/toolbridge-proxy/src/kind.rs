//! Proxy kinds: file types declared at runtime.

use anyhow::{bail, Result};
use std::fmt;
use std::sync::Arc;
use toolbridge_resolver::{Registry, Resolver, TypeDecl};
use toolbridge_types::{Namespace, TypeKey};
use tracing::debug;

use crate::output::Output;
use crate::proxy::Proxy;

/// The declared type of a [`Proxy`]: a type key plus the file extension
/// that doubles as its discriminator.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ProxyKind {
    key: TypeKey,
    name: Arc<str>,
    file_ext: Option<Arc<str>>,
}

impl ProxyKind {
    /// The kind of proxies without a file type.
    pub fn untyped() -> Self {
        Self {
            key: TypeKey::of::<Proxy>(),
            name: Arc::from("Proxy"),
            file_ext: None,
        }
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extension including the leading dot, `None` when untyped.
    pub fn file_ext(&self) -> Option<&str> {
        self.file_ext.as_deref()
    }

    pub fn is_untyped(&self) -> bool {
        self.file_ext.is_none()
    }
}

impl fmt::Debug for ProxyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file_ext {
            Some(ext) => write!(f, "ProxyKind({}, {})", self.key, ext),
            None => write!(f, "ProxyKind({})", self.key),
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Declare a proxy kind `name` in `namespace`.
///
/// The kind's type extends the untyped proxy type, and an `Output -> kind`
/// resolver is registered in `namespace` so output markers for it can be
/// materialised directly. `file_ext` may be given with or without its
/// leading dot.
pub fn named_proxy(
    registry: &Registry,
    namespace: impl Into<Namespace>,
    name: &str,
    file_ext: Option<&str>,
) -> Result<ProxyKind> {
    if !is_identifier(name) {
        bail!("The proxy name must be a valid identifier, got '{}'", name);
    }
    let namespace = namespace.into();
    let file_ext = file_ext
        .map(|ext| ext.trim_start_matches('.'))
        .filter(|ext| !ext.is_empty())
        .map(|ext| Arc::from(format!(".{}", ext)));

    let kind = ProxyKind {
        key: TypeKey::named(format!("{}.{}", namespace, name)),
        name: Arc::from(name),
        file_ext,
    };
    debug!(kind = ?kind, "declaring proxy kind");

    registry.declare_type(
        TypeDecl::new(kind.key.clone())
            .in_namespace(namespace.clone())
            .extends(TypeKey::of::<Proxy>()),
    );

    let materialised = kind.clone();
    registry.add_resolver(
        TypeKey::of::<Output>(),
        kind.key.clone(),
        Resolver::contextual(
            format!("resolve_output_to_{}", name),
            move |output: Output, cx| {
                if output.kind() != &materialised {
                    bail!(
                        "output marker for `{}` cannot produce `{}`",
                        output.kind().name(),
                        materialised.name()
                    );
                }
                output.materialize(cx.files())
            },
        ),
        namespace,
    );

    Ok(kind)
}
