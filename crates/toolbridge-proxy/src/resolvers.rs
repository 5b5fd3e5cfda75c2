//! Built-in resolvers between paths, strings, proxies and command arguments.

use std::path::PathBuf;
use std::sync::{LazyLock, Once};
use toolbridge_resolver::{current_registry, Registration, Registry, Resolver};
use toolbridge_types::TypeKey;

use crate::arg::CommandArg;
use crate::kind::ProxyKind;
use crate::output::Output;
use crate::proxy::Proxy;

/// Namespace of the resolvers installed by [`install`].
pub const PROXY_NAMESPACE: &str = "toolbridge.proxy";

struct Builtin {
    origin: TypeKey,
    target: TypeKey,
    resolver: Resolver,
}

fn builtin<A, B, F>(name: &str, f: F) -> Builtin
where
    A: std::any::Any,
    B: toolbridge_types::Resolvable,
    F: Fn(A) -> anyhow::Result<B> + Send + Sync + 'static,
{
    Builtin {
        origin: TypeKey::of::<A>(),
        target: TypeKey::of::<B>(),
        resolver: Resolver::typed(name, f),
    }
}

static BUILTINS: LazyLock<Vec<Builtin>> = LazyLock::new(|| {
    vec![
        builtin("resolve_path_to_command_arg", |path: PathBuf| {
            Ok(CommandArg::new(path.display().to_string()))
        }),
        builtin("resolve_str_to_command_arg", |value: String| {
            Ok(CommandArg::new(value))
        }),
        builtin("resolve_proxy_to_command_arg", |proxy: Proxy| {
            Ok(CommandArg::from_proxy(proxy))
        }),
        builtin("resolve_path_to_untyped_proxy", |path: PathBuf| {
            Ok(Proxy::reference(path, ProxyKind::untyped()))
        }),
        Builtin {
            origin: TypeKey::of::<Output>(),
            target: TypeKey::of::<Proxy>(),
            resolver: Resolver::contextual("resolve_output_to_proxy", |output: Output, cx| {
                output.materialize(cx.files())
            }),
        },
    ]
});

/// Install the built-in resolvers into [`PROXY_NAMESPACE`].
///
/// The resolvers are shared between registries, so a second install into the
/// same registry reports [`Registration::Unchanged`] for every edge.
pub fn install(registry: &Registry) -> Vec<Registration> {
    BUILTINS
        .iter()
        .map(|entry| {
            registry.add_resolver(
                entry.origin.clone(),
                entry.target.clone(),
                entry.resolver.clone(),
                PROXY_NAMESPACE,
            )
        })
        .collect()
}

static INSTALL: Once = Once::new();

/// The process-wide registry with the proxy resolvers installed.
pub fn registry() -> &'static Registry {
    let registry = current_registry();
    INSTALL.call_once(|| {
        install(registry);
    });
    registry
}
