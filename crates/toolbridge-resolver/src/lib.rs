//! Scoped type resolution.
//!
//! This crate provides:
//! - [`Registry`]: directed multigraph of [`Resolver`]s between runtime types
//! - [`find_shortest_path`]: the ranked Dijkstra search routes are planned with
//! - [`Scope`] / [`ResolutionContext`]: explicit caller scope and per-call state
//! - [`Signature`] / [`resolve_params`]: parameter descriptors and argument
//!   resolution
//! - [`common`]: resolvers every registry starts with
//!
//! # Resolution
//!
//! Resolving a value as a target type:
//!
//! 1. returns the value unchanged if it already has the target type
//! 2. restricts the graph to edges registered in namespaces the caller can
//!    see (its own namespace, enclosing namespaces, imports, and the
//!    namespace that declared the value's type)
//! 3. starts from the value's type, or its nearest ancestor still present in
//!    the restricted graph
//! 4. finds the cheapest chain of resolvers, forced through an intermediate
//!    type if one is given
//! 5. applies the chain and checks the result is an instance of the target
//!
//! Ties on weight are broken by locality (edges registered in or above the
//! caller's namespace win), then by namespace depth according to the
//! registry's [`Specificity`](toolbridge_types::Specificity) policy.

pub mod common;
pub mod decl;
pub mod error;
pub mod export;
pub mod params;
pub mod pathfind;
pub mod registry;
pub mod resolver;
pub mod route;
pub mod scope;

pub use decl::TypeDecl;
pub use error::ResolveError;
pub use export::{LinkEntry, NodeEntry, NodeLinkGraph};
pub use params::{
    resolve_bound, resolve_params, BindError, BoundArg, BoundArgs, CallArgs, Param, ParamKind,
    Passed, ResolveSpec, ResolvedFn, Signature,
};
pub use pathfind::{find_shortest_path, EdgeCost, EdgeRank, PathError, ShortestPath, Tie};
pub use registry::{current_registry, Registration, Registry, ResolveEdge};
pub use resolver::Resolver;
pub use route::{Ambiguity, Route, RouteStep};
pub use scope::{ResolutionContext, Scope};
