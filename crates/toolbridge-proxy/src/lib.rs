//! File proxies on top of the resolution graph.
//!
//! This crate provides:
//! - [`ProxyKind`] / [`named_proxy`]: file types declared at runtime
//! - [`Proxy`]: path handle, managed (reference counted, deleted with the
//!   last handle) or a plain reference to a caller-owned file
//! - [`Output`]: marker that resolves to a fresh managed temporary proxy
//! - [`CommandArg`]: the string form of an argument handed to a tool
//! - [`register_buffer_kind`]: in-memory `Vec<u8>` buffers as proxies and back
//! - [`proxify`]: wraps a tool closure so arguments are resolved to strings
//!   and output parameters come back as proxies
//!
//! The built-in resolvers live in [`PROXY_NAMESPACE`]; [`registry`] returns
//! the process-wide registry with them installed.

pub mod arg;
pub mod buffer;
pub mod kind;
pub mod output;
pub mod proxify;
pub mod proxy;
pub mod resolvers;

pub use arg::CommandArg;
pub use buffer::register_buffer_kind;
pub use kind::{named_proxy, ProxyKind};
pub use output::Output;
pub use proxify::{proxify, CallOutput, Proxified, ProxyParam, ToolArgs, ToolReturn};
pub use proxy::{Proxy, RetypeError};
pub use resolvers::{install, registry, PROXY_NAMESPACE};
