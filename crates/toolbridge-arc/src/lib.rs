//! Automatic reference counting of ephemeral file paths.
//!
//! This crate provides:
//! - [`TemporaryFilesProvider`]: allocation and deletion of temporary files
//! - [`SystemTempFiles`]: provider backed by the `tempfile` crate
//! - [`FileReferenceCounter`]: path -> live reference count; deletes the file
//!   when the last reference is released
//! - [`manager`]: the process-wide counter
//!
//! # Lifecycle
//!
//! ```text
//! new_managed_file ──► count = 1 ──add_reference──► count = n + 1
//!                          ▲                            │
//!                          └──────remove_reference──────┘   (n > 1)
//! count = 1 ──remove_reference──► file deleted, path untracked
//! ```

pub mod counter;
pub mod provider;

pub use counter::{manager, ArcError, FileReferenceCounter};
pub use provider::{SystemTempFiles, TemporaryFilesProvider};
