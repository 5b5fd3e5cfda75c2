//! The resolution graph.
//!
//! Nodes are runtime type identities, edges are resolvers. Every edge carries
//! the namespace that registered it and a weight: 0 for explicit resolvers,
//! `k` for the generated downcast edge from a type to its `k`-th ancestor.
//!
//! The graph only grows. It sits behind a [`parking_lot::RwLock`]: routes are
//! planned under the read lock and resolvers run after it is released, so a
//! resolver may resolve nested values or even register new resolvers.

use parking_lot::RwLock;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::Direction;
use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::LazyLock;
use toolbridge_types::{BridgeConfig, Namespace, Resolvable, Specificity, TypeKey, Value};
use tracing::{debug, trace, warn};

use crate::decl::{linearize, TypeDecl};
use crate::error::ResolveError;
use crate::export::NodeLinkGraph;
use crate::pathfind::{find_shortest_path, EdgeCost, EdgeRank};
use crate::resolver::Resolver;
use crate::route::{Ambiguity, Route, RouteStep};
use crate::scope::{ResolutionContext, Scope};

static REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
    let registry = Registry::from_config(&BridgeConfig::from_env());
    crate::common::install(&registry);
    registry
});

/// The process-wide registry, with the common resolvers installed.
pub fn current_registry() -> &'static Registry {
    &REGISTRY
}

#[derive(Debug, Clone)]
pub struct ResolveEdge {
    pub resolver: Resolver,
    pub weight: u32,
    pub namespace: Namespace,
}

/// Outcome of [`Registry::add_resolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added,
    /// The same resolver was already registered for this pair and namespace.
    Unchanged,
    /// A different resolver owns this pair in this namespace; it was kept.
    Conflict,
}

struct RegistryState {
    graph: DiGraph<TypeKey, ResolveEdge>,
    nodes: HashMap<TypeKey, NodeIndex>,
    types: HashMap<TypeKey, TypeDecl>,
    /// Namespaces that registered at least one edge
    namespaces: BTreeSet<Namespace>,
    specificity: Specificity,
}

impl RegistryState {
    fn mro(&self, key: &TypeKey) -> Vec<TypeKey> {
        linearize(key, |k| self.types.get(k).map(|decl| decl.parents.as_slice()))
    }

    fn ensure_node(&mut self, key: &TypeKey, downcast: &Resolver) -> NodeIndex {
        if let Some(node) = self.nodes.get(key) {
            return *node;
        }
        let node = self.graph.add_node(key.clone());
        self.nodes.insert(key.clone(), node);
        self.add_downcast_edges(key, downcast);
        node
    }

    fn add_downcast_edges(&mut self, key: &TypeKey, downcast: &Resolver) {
        let Some(&node) = self.nodes.get(key) else {
            return;
        };
        for (distance, ancestor) in self.mro(key).into_iter().enumerate().skip(1) {
            let parent = self.ensure_node(&ancestor, downcast);
            let exists = self
                .graph
                .edges_connecting(node, parent)
                .any(|edge| edge.weight().namespace.is_downcast());
            if exists {
                continue;
            }
            trace!(from = %key, to = %ancestor, distance, "adding downcast edge");
            self.graph.add_edge(
                node,
                parent,
                ResolveEdge {
                    resolver: downcast.clone(),
                    weight: distance as u32,
                    namespace: Namespace::downcast(),
                },
            );
            self.namespaces.insert(Namespace::downcast());
        }
    }

    /// A node is present when at least one visible edge touches it.
    fn is_present(&self, node: NodeIndex, visible: &BTreeSet<Namespace>) -> bool {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .chain(self.graph.edges_directed(node, Direction::Incoming))
            .any(|edge| visible.contains(&edge.weight().namespace))
    }

    fn describe_edge(&self, edge: EdgeIndex) -> String {
        let data = &self.graph[edge];
        format!("`{}` ({})", data.resolver.name(), data.namespace)
    }
}

/// Directed multigraph of resolvers between runtime types.
pub struct Registry {
    state: RwLock<RegistryState>,
    downcast: Resolver,
}

impl Registry {
    pub fn new() -> Self {
        Self::with_specificity(Specificity::default())
    }

    pub fn with_specificity(specificity: Specificity) -> Self {
        Self {
            state: RwLock::new(RegistryState {
                graph: DiGraph::new(),
                nodes: HashMap::new(),
                types: HashMap::new(),
                namespaces: BTreeSet::new(),
                specificity,
            }),
            downcast: Resolver::identity("downcast"),
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::with_specificity(config.specificity)
    }

    pub fn specificity(&self) -> Specificity {
        self.state.read().specificity
    }

    pub fn set_specificity(&self, specificity: Specificity) {
        self.state.write().specificity = specificity;
    }

    /// Record a type's namespace and parents.
    ///
    /// Types already in the graph (the declared type and its descendants)
    /// gain the downcast edges their new ancestors call for. Existing edges
    /// are never re-weighted.
    pub fn declare_type(&self, decl: TypeDecl) {
        let mut state = self.state.write();
        let key = decl.key.clone();
        debug!(ty = %key, parents = ?decl.parents, "declaring type");
        state.types.insert(key.clone(), decl);

        let affected: Vec<TypeKey> = state
            .nodes
            .keys()
            .filter(|node| state.mro(node).contains(&key))
            .cloned()
            .collect();
        for node in affected {
            state.add_downcast_edges(&node, &self.downcast);
        }
    }

    pub fn declaration(&self, key: &TypeKey) -> Option<TypeDecl> {
        self.state.read().types.get(key).cloned()
    }

    /// Ancestor chain of `key`, most specific first, ending with `any`.
    pub fn mro(&self, key: &TypeKey) -> Vec<TypeKey> {
        self.state.read().mro(key)
    }

    pub fn is_instance(&self, key: &TypeKey, target: &TypeKey) -> bool {
        key == target || self.mro(key).contains(target)
    }

    /// Every type with a node in the graph, sorted.
    pub fn types(&self) -> Vec<TypeKey> {
        let mut keys: Vec<TypeKey> = self.state.read().nodes.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn contains_type(&self, key: &TypeKey) -> bool {
        self.state.read().nodes.contains_key(key)
    }

    /// Namespaces that registered at least one edge.
    pub fn namespaces(&self) -> Vec<Namespace> {
        self.state.read().namespaces.iter().cloned().collect()
    }

    pub fn edge_count(&self) -> usize {
        self.state.read().graph.edge_count()
    }

    /// Add the edge `origin -> target` under `namespace`.
    ///
    /// Both endpoints gain downcast edges to their ancestors. At most one
    /// edge exists per pair and namespace: re-registering with a different
    /// resolver keeps the first one and logs a warning.
    pub fn add_resolver(
        &self,
        origin: TypeKey,
        target: TypeKey,
        resolver: Resolver,
        namespace: impl Into<Namespace>,
    ) -> Registration {
        let namespace = namespace.into();
        let mut state = self.state.write();

        if let (Some(&from), Some(&to)) = (state.nodes.get(&origin), state.nodes.get(&target)) {
            let existing = state
                .graph
                .edges_connecting(from, to)
                .map(|edge| edge.weight())
                .find(|edge| edge.namespace == namespace);
            if let Some(existing) = existing {
                if existing.resolver.same_as(&resolver) {
                    trace!(%origin, %target, %namespace, "resolver already registered");
                    return Registration::Unchanged;
                }
                warn!(
                    "Resolver `{}` from `{}` to `{}` already registered in `{}`; keeping it and ignoring `{}`",
                    existing.resolver.name(),
                    origin,
                    target,
                    namespace,
                    resolver.name()
                );
                return Registration::Conflict;
            }
        }

        let from = state.ensure_node(&origin, &self.downcast);
        let to = state.ensure_node(&target, &self.downcast);
        debug!(
            resolver = resolver.name(),
            %origin,
            %target,
            %namespace,
            "registering resolver"
        );
        state.graph.add_edge(
            from,
            to,
            ResolveEdge {
                resolver,
                weight: 0,
                namespace: namespace.clone(),
            },
        );
        state.namespaces.insert(namespace);
        Registration::Added
    }

    /// Register a typed resolver; both keys come from the closure's types.
    ///
    /// Each call wraps `f` in a new [`Resolver`], and resolver identity is
    /// per `Resolver` value: registering the same pair twice in one
    /// namespace this way reports [`Registration::Conflict`]. Keep a
    /// `Resolver` and pass clones to [`Registry::add_resolver`] when
    /// re-registration must be a no-op.
    pub fn register<A, B, F>(&self, namespace: impl Into<Namespace>, name: &str, f: F) -> Registration
    where
        A: Any,
        B: Resolvable,
        F: Fn(A) -> anyhow::Result<B> + Send + Sync + 'static,
    {
        self.add_resolver(
            TypeKey::of::<A>(),
            TypeKey::of::<B>(),
            Resolver::typed(name, f),
            namespace,
        )
    }

    /// Namespaces a caller in `scope` can see, before the value's own
    /// declaring namespace is added. Downcast edges are always visible.
    pub(crate) fn visible_namespaces(&self, scope: &Scope) -> BTreeSet<Namespace> {
        let state = self.state.read();
        let mut visible: BTreeSet<Namespace> = scope
            .candidate_namespaces()
            .into_iter()
            .filter(|ns| state.namespaces.contains(ns))
            .collect();
        visible.insert(Namespace::downcast());
        visible
    }

    /// Plan the chain that would resolve `origin` as `target` for `scope`.
    pub fn route(
        &self,
        scope: &Scope,
        origin: &TypeKey,
        target: &TypeKey,
        intermediate: Option<&TypeKey>,
    ) -> Result<Route, ResolveError> {
        let visible = self.visible_namespaces(scope);
        self.plan(&visible, scope.namespace(), origin, target, intermediate)
    }

    fn plan(
        &self,
        visible: &BTreeSet<Namespace>,
        caller: &Namespace,
        origin: &TypeKey,
        target: &TypeKey,
        intermediate: Option<&TypeKey>,
    ) -> Result<Route, ResolveError> {
        let state = self.state.read();
        let not_found = || ResolveError::NotFound {
            origin: origin.clone(),
            target: target.clone(),
            intermediate: intermediate.cloned(),
        };

        let mut visible = visible.clone();
        if let Some(ns) = state.types.get(origin).and_then(|decl| decl.namespace.as_ref()) {
            if state.namespaces.contains(ns) {
                visible.insert(ns.clone());
            }
        }

        let start = state
            .mro(origin)
            .into_iter()
            .find_map(|key| {
                state
                    .nodes
                    .get(&key)
                    .copied()
                    .filter(|node| state.is_present(*node, &visible))
            })
            .ok_or_else(not_found)?;
        let end = state.nodes.get(target).copied().ok_or_else(not_found)?;
        let via = match intermediate {
            Some(key) => Some(state.nodes.get(key).copied().ok_or_else(not_found)?),
            None => None,
        };

        let specificity = state.specificity;
        let path = find_shortest_path(&state.graph, start, end, via, |_, edge: &ResolveEdge| {
            visible.contains(&edge.namespace).then(|| EdgeCost {
                weight: edge.weight,
                rank: EdgeRank {
                    local: edge.namespace.is_prefix_of(caller),
                    specificity: specificity.score(edge.namespace.depth()),
                },
                identity: edge.resolver.id(),
            })
        })
        .map_err(|err| {
            trace!(%origin, %target, "no route: {}", err);
            not_found()
        })?;

        let steps = path
            .edges
            .iter()
            .filter_map(|&edge| {
                let (from, to) = state.graph.edge_endpoints(edge)?;
                let data = &state.graph[edge];
                Some(RouteStep {
                    from: state.graph[from].clone(),
                    to: state.graph[to].clone(),
                    resolver: data.resolver.clone(),
                    weight: data.weight,
                    namespace: data.namespace.clone(),
                })
            })
            .collect();

        let ambiguities: Vec<Ambiguity> = path
            .ties
            .iter()
            .map(|tie| Ambiguity {
                at: state.graph[tie.node].clone(),
                chosen: state.describe_edge(tie.chosen),
                rivals: tie
                    .rivals
                    .iter()
                    .map(|edge| state.describe_edge(*edge))
                    .collect(),
            })
            .collect();
        for ambiguity in &ambiguities {
            warn!("{} (caller `{}`)", ambiguity, caller);
        }

        Ok(Route {
            origin: origin.clone(),
            target: target.clone(),
            intermediate: intermediate.cloned(),
            steps,
            cost: path.cost,
            ambiguities,
        })
    }

    pub fn resolve(
        &self,
        scope: &Scope,
        value: Value,
        target: &TypeKey,
    ) -> Result<Value, ResolveError> {
        self.resolve_via(scope, value, target, None)
    }

    /// Resolve `value` as `target`, passing through `intermediate` if given.
    pub fn resolve_via(
        &self,
        scope: &Scope,
        value: Value,
        target: &TypeKey,
        intermediate: Option<&TypeKey>,
    ) -> Result<Value, ResolveError> {
        let cx = ResolutionContext::new(self, scope);
        self.resolve_in(&cx, value, target, intermediate)
    }

    pub fn resolve_as<T: Any>(&self, scope: &Scope, value: Value) -> Result<T, ResolveError> {
        ResolutionContext::new(self, scope).resolve_as(value)
    }

    pub(crate) fn resolve_in(
        &self,
        cx: &ResolutionContext<'_>,
        value: Value,
        target: &TypeKey,
        intermediate: Option<&TypeKey>,
    ) -> Result<Value, ResolveError> {
        let origin = value.type_key();
        if &origin == target {
            return Ok(value);
        }

        let route = self.plan(
            cx.visible(),
            cx.scope().namespace(),
            &origin,
            target,
            intermediate,
        )?;
        debug!(
            "{:indent$}Resolving `{}` as `{}`: {}",
            "",
            origin,
            target,
            route,
            indent = cx.depth() * 2
        );

        let resolved = route.apply(value, &cx.nested())?;
        let actual = resolved.type_key();
        if !self.is_instance(&actual, target) {
            return Err(ResolveError::ContractViolation {
                target: target.clone(),
                actual,
                chain: route.chain(),
            });
        }
        Ok(resolved)
    }

    pub fn export_node_link(&self) -> NodeLinkGraph {
        NodeLinkGraph::from_graph(&self.state.read().graph)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Registry")
            .field("types", &state.graph.node_count())
            .field("resolvers", &state.graph.edge_count())
            .field("namespaces", &state.namespaces)
            .field("specificity", &state.specificity)
            .finish()
    }
}
