//! Shared types for the toolbridge workspace.
//!
//! This crate provides the foundational vocabulary used by the resolver and
//! proxy crates:
//!
//! - [`TypeKey`]: runtime identity of a type taking part in resolution
//! - [`Namespace`]: dotted scope label attached to every resolver edge
//! - [`Value`] / [`Resolvable`]: type-erased values moved through resolver chains
//! - [`BridgeConfig`]: environment-driven configuration
//!
//! ## Environment helpers
//!
//! The [`env_utils`] module holds the small parsing helpers that
//! [`BridgeConfig::from_env`] is built on.

pub mod config;
pub mod env_utils;
pub mod key;
pub mod value;

pub use config::{BridgeConfig, Specificity};
pub use key::{Namespace, TypeKey, ANY_TYPE_NAME, DOWNCAST_NAMESPACE};
pub use value::{Resolvable, Tuple, Value};
