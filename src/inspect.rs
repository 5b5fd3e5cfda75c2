//! Graph inspection for the `toolbridge` binary.

use anyhow::{anyhow, bail, Result};
use serde::Serialize;
use toolbridge_proxy::{named_proxy, ProxyKind};
use toolbridge_resolver::{Registry, Route};
use toolbridge_types::{Namespace, TypeKey};

/// Find a type by full key or by unambiguous short name.
pub fn lookup_type(registry: &Registry, name: &str) -> Result<TypeKey> {
    let types = registry.types();
    if let Some(exact) = types.iter().find(|key| key.as_str() == name) {
        return Ok(exact.clone());
    }

    let matches: Vec<&TypeKey> = types
        .iter()
        .filter(|key| key.short_name() == name)
        .collect();
    match matches.as_slice() {
        [single] => Ok((*single).clone()),
        [] => bail!("Unknown type '{}'", name),
        many => bail!(
            "Type name '{}' is ambiguous: {}",
            name,
            many.iter()
                .map(|key| key.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// Declare a proxy kind from `namespace.Name[:ext]`.
pub fn parse_kind(registry: &Registry, spec: &str) -> Result<ProxyKind> {
    let (path, ext) = match spec.split_once(':') {
        Some((path, ext)) => (path, Some(ext)),
        None => (spec, None),
    };
    let (namespace, name) = path
        .rsplit_once('.')
        .ok_or_else(|| anyhow!("Kind '{}' needs a namespace, e.g. app.Volume:.vol", spec))?;
    if namespace.is_empty() {
        bail!("Kind '{}' has an empty namespace", spec);
    }
    named_proxy(registry, Namespace::new(namespace), name, ext)
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub from: String,
    pub to: String,
    pub resolver: String,
    pub namespace: String,
    pub weight: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteReport {
    pub origin: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intermediate: Option<String>,
    pub cost: u64,
    pub steps: Vec<StepReport>,
    pub ambiguities: Vec<String>,
}

impl From<&Route> for RouteReport {
    fn from(route: &Route) -> Self {
        Self {
            origin: route.origin.to_string(),
            target: route.target.to_string(),
            intermediate: route.intermediate.as_ref().map(ToString::to_string),
            cost: route.cost,
            steps: route
                .steps
                .iter()
                .map(|step| StepReport {
                    from: step.from.to_string(),
                    to: step.to.to_string(),
                    resolver: step.resolver.name().to_string(),
                    namespace: step.namespace.to_string(),
                    weight: step.weight,
                })
                .collect(),
            ambiguities: route.ambiguities.iter().map(ToString::to_string).collect(),
        }
    }
}

impl RouteReport {
    /// Human-readable rendering, one step per line.
    pub fn render(&self) -> String {
        let mut out = format!("{} -> {} (cost {})\n", self.origin, self.target, self.cost);
        if self.steps.is_empty() {
            out.push_str("  already the target type\n");
        }
        for (i, step) in self.steps.iter().enumerate() {
            out.push_str(&format!(
                "  {}. {} [{}, weight {}]: {} -> {}\n",
                i + 1,
                step.resolver,
                step.namespace,
                step.weight,
                step.from,
                step.to
            ));
        }
        for ambiguity in &self.ambiguities {
            out.push_str(&format!("  warning: {}\n", ambiguity));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use toolbridge_proxy::{install, CommandArg, Proxy};
    use toolbridge_resolver::{common, Scope};

    fn registry() -> Registry {
        let registry = Registry::new();
        common::install(&registry);
        install(&registry);
        registry
    }

    #[test]
    fn test_lookup_by_short_and_full_name() {
        let registry = registry();
        assert_eq!(
            lookup_type(&registry, "PathBuf").unwrap(),
            TypeKey::of::<PathBuf>()
        );
        let full = TypeKey::of::<CommandArg>();
        assert_eq!(lookup_type(&registry, full.as_str()).unwrap(), full);

        let err = lookup_type(&registry, "Nope").unwrap_err();
        assert!(err.to_string().contains("Unknown type 'Nope'"));
    }

    #[test]
    fn test_parse_kind() {
        let registry = registry();
        let kind = parse_kind(&registry, "app.maps.Volume:.vol").unwrap();
        assert_eq!(kind.key(), &TypeKey::named("app.maps.Volume"));
        assert_eq!(kind.file_ext(), Some(".vol"));
        assert!(registry.is_instance(kind.key(), &TypeKey::of::<Proxy>()));
        assert_eq!(lookup_type(&registry, "Volume").unwrap(), *kind.key());

        let bare = parse_kind(&registry, "app.Mask").unwrap();
        assert_eq!(bare.file_ext(), None);
        assert!(parse_kind(&registry, "Volume:.vol").is_err());
    }

    #[test]
    fn test_route_report() {
        let registry = registry();
        let scope = Scope::new("cli")
            .import(toolbridge_proxy::PROXY_NAMESPACE)
            .import(common::COMMON_NAMESPACE);
        let route = registry
            .route(
                &scope,
                &TypeKey::of::<PathBuf>(),
                &TypeKey::of::<CommandArg>(),
                None,
            )
            .unwrap();

        let report = RouteReport::from(&route);
        assert_eq!(report.cost, 0);
        assert_eq!(report.steps.len(), 1);
        assert_eq!(report.steps[0].resolver, "resolve_path_to_command_arg");
        assert!(report.ambiguities.is_empty());
        assert!(report.render().contains("1. resolve_path_to_command_arg"));

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("intermediate").is_none());
    }
}
