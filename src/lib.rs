//! toolbridge: resolve arbitrary values into command-line arguments for
//! external tools, with managed temporary files behind path proxies.
//!
//! The workspace is split into:
//!
//! - [`toolbridge_types`]: type keys, namespaces, type-erased values, config
//! - [`toolbridge_arc`]: temporary file provider and reference counter
//! - [`toolbridge_resolver`]: the scoped resolution graph
//! - [`toolbridge_proxy`]: file proxies, output markers and [`proxify`]
//!
//! This crate re-exports the common entry points and adds the pieces the
//! `toolbridge` binary needs: logging setup and graph inspection.
//!
//! ```ignore
//! use toolbridge::{proxify, CallArgs, Param, ProxyParam, Scope, Signature, ToolReturn};
//!
//! let registry = toolbridge::registry();
//! let volume = toolbridge::named_proxy(registry, "app.maps", "Volume", Some(".mrc"))?;
//!
//! let filter = proxify(
//!     Signature::new(vec![
//!         Param::positional("input"),
//!         Param::keyword("output").output(&volume),
//!     ]),
//!     |args| run_filter(args.require("input")?, args.require("output")?),
//! );
//! let out = filter
//!     .call(&Scope::new("app"), CallArgs::new().arg(input_path))?
//!     .into_proxy()?;
//! ```

pub mod inspect;
pub mod logging;

pub use toolbridge_arc::{FileReferenceCounter, SystemTempFiles, TemporaryFilesProvider};
pub use toolbridge_proxy::{
    named_proxy, proxify, registry, CallOutput, CommandArg, Output, Proxified, Proxy, ProxyKind,
    ProxyParam, ToolArgs, ToolReturn,
};
pub use toolbridge_resolver::{
    resolve_params, CallArgs, Param, ResolveError, Registry, Resolver, Route, Scope, Signature,
    TypeDecl,
};
pub use toolbridge_types::{BridgeConfig, Namespace, Specificity, TypeKey, Value};
