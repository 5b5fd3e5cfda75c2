//! In-memory buffers standing in for files.
//!
//! [`register_buffer_kind`] lets a `Vec<u8>` be passed wherever a proxy of
//! some kind is expected: the bytes are written to a fresh managed temporary
//! file. The reverse resolver reads a proxy's file back into memory.

use toolbridge_resolver::{Registration, Registry, Resolver};
use toolbridge_types::{Namespace, TypeKey};
use tracing::debug;

use crate::kind::ProxyKind;
use crate::proxy::Proxy;

/// Register `Vec<u8> -> kind` and `kind -> Vec<u8>` in `namespace`.
///
/// Buffers have no file kind of their own, so a proxified parameter taking
/// one should be declared with [`ProxyParam::through`](crate::ProxyParam::through)
/// to pick the kind the tool expects.
pub fn register_buffer_kind(
    registry: &Registry,
    namespace: impl Into<Namespace>,
    kind: &ProxyKind,
) -> Vec<Registration> {
    let namespace = namespace.into();
    debug!(kind = ?kind, %namespace, "registering buffer conversions");

    let writer = kind.clone();
    let to_kind = registry.add_resolver(
        TypeKey::of::<Vec<u8>>(),
        kind.key().clone(),
        Resolver::contextual(
            format!("resolve_buffer_to_{}", kind.name()),
            move |bytes: Vec<u8>, cx| Proxy::from_bytes(&writer, cx.files(), &bytes),
        ),
        namespace.clone(),
    );

    // Proxies of every kind share one Rust type; the key is what routing sees.
    let from_kind = registry.add_resolver(
        kind.key().clone(),
        TypeKey::of::<Vec<u8>>(),
        Resolver::typed(format!("resolve_{}_to_buffer", kind.name()), |proxy: Proxy| {
            proxy.read_bytes()
        }),
        namespace,
    );

    vec![to_kind, from_kind]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::named_proxy;
    use std::sync::Arc;
    use tempfile::TempDir;
    use toolbridge_arc::{FileReferenceCounter, SystemTempFiles};
    use toolbridge_resolver::Scope;
    use toolbridge_types::Value;

    #[test]
    fn test_buffer_round_trip_through_disk() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let files = Arc::new(FileReferenceCounter::new(Arc::new(SystemTempFiles::in_dir(
            temp_dir.path(),
        ))));
        let registry = Registry::new();
        let volume = named_proxy(&registry, "app.maps", "Volume", Some(".vol"))?;
        let outcomes = register_buffer_kind(&registry, "app.maps", &volume);
        assert_eq!(outcomes, vec![Registration::Added, Registration::Added]);

        let scope = Scope::new("app.maps").with_files(files.clone());
        let value = registry.resolve(&scope, Value::new(b"density".to_vec()), volume.key())?;
        let proxy = value
            .downcast::<Proxy>()
            .map_err(|value| anyhow::anyhow!("got {:?}", value))?;
        assert!(proxy.is_managed());
        assert!(proxy.path().starts_with(temp_dir.path()));
        assert!(proxy.path().to_string_lossy().ends_with(".vol"));
        assert_eq!(std::fs::read(proxy.path())?, b"density");

        // The proxy's declaring namespace makes the way back visible anywhere.
        let bytes: Vec<u8> = registry.resolve_as(&Scope::new("elsewhere"), Value::new(proxy))?;
        assert_eq!(bytes, b"density");
        assert!(files.tracked().is_empty());
        Ok(())
    }
}
