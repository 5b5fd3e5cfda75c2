//! Materialised resolver chains.

use std::fmt;
use toolbridge_types::{Namespace, TypeKey, Value};

use crate::error::ResolveError;
use crate::resolver::Resolver;
use crate::scope::ResolutionContext;

/// One hop of a [`Route`].
#[derive(Debug, Clone)]
pub struct RouteStep {
    pub from: TypeKey,
    pub to: TypeKey,
    pub resolver: Resolver,
    pub weight: u32,
    pub namespace: Namespace,
}

/// Equally ranked resolvers competing for the same hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
    /// Type the competing edges lead to
    pub at: TypeKey,
    pub chosen: String,
    pub rivals: Vec<String>,
}

impl fmt::Display for Ambiguity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ambiguous resolvers for `{}`: chose {} over {}",
            self.at,
            self.chosen,
            self.rivals.join(", ")
        )
    }
}

/// The resolver chain chosen for one origin/target pair.
#[derive(Debug, Clone)]
pub struct Route {
    pub origin: TypeKey,
    pub target: TypeKey,
    pub intermediate: Option<TypeKey>,
    pub steps: Vec<RouteStep>,
    /// Sum of edge weights
    pub cost: u64,
    pub ambiguities: Vec<Ambiguity>,
}

impl Route {
    /// Resolver names in application order.
    pub fn chain(&self) -> Vec<String> {
        self.steps
            .iter()
            .map(|step| step.resolver.name().to_string())
            .collect()
    }

    /// Types visited, starting at the node the search began from.
    pub fn types(&self) -> Vec<TypeKey> {
        match self.steps.first() {
            Some(first) => std::iter::once(first.from.clone())
                .chain(self.steps.iter().map(|step| step.to.clone()))
                .collect(),
            None => vec![self.origin.clone()],
        }
    }

    /// Run every resolver of the chain in order.
    pub fn apply(&self, value: Value, cx: &ResolutionContext<'_>) -> Result<Value, ResolveError> {
        self.steps.iter().try_fold(value, |value, step| {
            step.resolver
                .call(value, cx)
                .map_err(|source| ResolveError::ResolverFailed {
                    resolver: step.resolver.name().to_string(),
                    source,
                })
        })
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(first) = self.steps.first() else {
            return write!(f, "{} (identity)", self.origin);
        };
        write!(f, "{}", first.from)?;
        for step in &self.steps {
            write!(f, " -[{}]-> {}", step.resolver.name(), step.to)?;
        }
        Ok(())
    }
}
