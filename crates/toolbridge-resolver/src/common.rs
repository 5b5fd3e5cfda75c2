//! Resolvers every registry starts with.

use std::sync::LazyLock;
use toolbridge_types::{Tuple, TypeKey, Value};

use crate::registry::{Registration, Registry};
use crate::resolver::Resolver;

/// Namespace of the resolvers installed by [`install`].
pub const COMMON_NAMESPACE: &str = "toolbridge.common";

static ANY_TO_STR: LazyLock<Resolver> = LazyLock::new(|| {
    Resolver::raw("resolve_any_to_str", |value, _| Ok(Value::new(value.render())))
});

static TUPLE_TO_STR: LazyLock<Resolver> = LazyLock::new(|| {
    Resolver::contextual("resolve_tuple_to_str", |tuple: Tuple, cx| {
        let parts = tuple
            .0
            .into_iter()
            .map(|value| cx.resolve_as::<String>(value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts.join(" "))
    })
});

/// Anything resolves to its string form; tuples resolve element-wise and are
/// joined with single spaces.
///
/// The resolvers are shared, so installing twice into one registry leaves it
/// unchanged.
pub fn install(registry: &Registry) -> Vec<Registration> {
    vec![
        registry.add_resolver(
            TypeKey::any(),
            TypeKey::of::<String>(),
            ANY_TO_STR.clone(),
            COMMON_NAMESPACE,
        ),
        registry.add_resolver(
            TypeKey::of::<Tuple>(),
            TypeKey::of::<String>(),
            TUPLE_TO_STR.clone(),
            COMMON_NAMESPACE,
        ),
    ]
}
