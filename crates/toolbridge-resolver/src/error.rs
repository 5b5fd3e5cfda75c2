//! Resolution error types.

use toolbridge_types::TypeKey;

/// Failure of a single resolution request.
#[derive(Debug)]
pub enum ResolveError {
    /// No route exists in the caller-visible graph, or an endpoint type was
    /// never registered.
    NotFound {
        origin: TypeKey,
        target: TypeKey,
        /// Required waypoint, if one was requested
        intermediate: Option<TypeKey>,
    },

    /// A route was applied but produced a value of the wrong type. One of the
    /// resolvers in `chain` is faulty.
    ContractViolation {
        target: TypeKey,
        actual: TypeKey,
        /// Resolver names in application order
        chain: Vec<String>,
    },

    /// A resolver returned an error.
    ResolverFailed {
        resolver: String,
        source: anyhow::Error,
    },
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound { .. })
    }

    pub fn is_contract_violation(&self) -> bool {
        matches!(self, ResolveError::ContractViolation { .. })
    }
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::NotFound {
                origin,
                target,
                intermediate,
            } => {
                write!(f, "`{}` cannot be resolved as `{}`", origin, target)?;
                if let Some(via) = intermediate {
                    write!(f, " via `{}`", via)?;
                }
                Ok(())
            }
            ResolveError::ContractViolation {
                target,
                actual,
                chain,
            } => write!(
                f,
                "Resolver bug: resolving as `{}` produced `{}` (chain: {})",
                target,
                actual,
                if chain.is_empty() {
                    "<empty>".to_string()
                } else {
                    chain.join(" -> ")
                }
            ),
            ResolveError::ResolverFailed { resolver, source } => {
                write!(f, "Resolver `{}` failed: {:#}", resolver, source)
            }
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::ResolverFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = ResolveError::NotFound {
            origin: TypeKey::named("app.A"),
            target: TypeKey::named("app.B"),
            intermediate: None,
        };
        assert_eq!(err.to_string(), "`app.A` cannot be resolved as `app.B`");
        assert!(err.is_not_found());

        let err = ResolveError::NotFound {
            origin: TypeKey::named("app.A"),
            target: TypeKey::named("app.B"),
            intermediate: Some(TypeKey::named("app.I")),
        };
        assert!(err.to_string().ends_with("via `app.I`"));
    }

    #[test]
    fn test_contract_violation_lists_chain() {
        let err = ResolveError::ContractViolation {
            target: TypeKey::named("B"),
            actual: TypeKey::named("C"),
            chain: vec!["a_to_x".into(), "x_to_b".into()],
        };
        let message = err.to_string();
        assert!(message.contains("a_to_x -> x_to_b"));
        assert!(err.is_contract_violation());
        assert!(!err.is_not_found());
    }
}
