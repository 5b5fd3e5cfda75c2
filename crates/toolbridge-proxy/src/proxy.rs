//! File proxies.
//!
//! A [`Proxy`] binds a logical artifact to a concrete path. Managed proxies
//! hold one reference in a [`FileReferenceCounter`]: cloning takes another
//! and dropping releases it, so the backing file is deleted when the last
//! handle goes away. Reference proxies point at caller-owned files and never
//! delete anything.

use anyhow::{anyhow, bail, Context, Result};
use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use toolbridge_arc::FileReferenceCounter;
use toolbridge_types::{Resolvable, TypeKey};
use tracing::{debug, warn};

use crate::kind::ProxyKind;

pub struct Proxy {
    path: PathBuf,
    kind: ProxyKind,
    /// Counter holding this handle's reference; `None` for reference proxies
    owner: Option<Arc<FileReferenceCounter>>,
}

impl Proxy {
    /// Unmanaged proxy for a caller-owned file.
    pub fn reference(path: impl Into<PathBuf>, kind: ProxyKind) -> Self {
        Self {
            path: path.into(),
            kind,
            owner: None,
        }
    }

    /// Managed proxy for an existing path; takes one reference in `files`.
    pub fn managed(
        path: impl Into<PathBuf>,
        kind: ProxyKind,
        files: Arc<FileReferenceCounter>,
    ) -> Self {
        let path = path.into();
        files.add_reference(&path);
        Self {
            path,
            kind,
            owner: Some(files),
        }
    }

    /// Managed proxy for a fresh temporary file named after `kind`.
    ///
    /// The proxy owns the file's initial reference.
    pub fn new_temporary(kind: &ProxyKind, files: &Arc<FileReferenceCounter>) -> Result<Self> {
        let path = files.new_managed_file(kind.file_ext())?;
        debug!(path = %path.display(), kind = kind.name(), "new temporary proxy");
        Ok(Self {
            path,
            kind: kind.clone(),
            owner: Some(files.clone()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> &ProxyKind {
        &self.kind
    }

    pub fn is_managed(&self) -> bool {
        self.owner.is_some()
    }

    /// Live references to the backing file, `None` for reference proxies.
    pub fn reference_count(&self) -> Option<usize> {
        self.owner.as_ref().map(|files| files.get_count(&self.path))
    }

    /// Re-type an untyped proxy as `kind`.
    ///
    /// The new path is the old one with `kind`'s extension appended. For a
    /// managed proxy the returned handle owns the new path with a count of 1
    /// and `self` releases its reference on the old one. The data follows:
    ///
    /// - `copy_data`: the file is copied and the old path is released.
    /// - otherwise, sole owner: the file is renamed; nothing is deleted.
    /// - otherwise, shared: the file is copied so other handles keep theirs.
    ///
    /// Reference proxies point at caller-owned files, which are never moved;
    /// without `copy_data` the new path is only named, for a tool to write.
    ///
    /// Every file operation runs before ownership changes. On error the
    /// original handle comes back inside the [`RetypeError`], untouched.
    pub fn typed(mut self, kind: &ProxyKind, copy_data: bool) -> Result<Proxy, RetypeError> {
        let new_path = match self.retyped_path(kind) {
            Ok(path) => path,
            Err(err) => return Err(RetypeError::new(self, err)),
        };

        let sole_owner = self.reference_count() == Some(1);
        let rename = self.is_managed() && !copy_data && sole_owner;
        let copy = copy_data || (self.is_managed() && !sole_owner);

        let moved = if rename {
            std::fs::rename(&self.path, &new_path).with_context(|| {
                format!(
                    "Failed to move {} to {}",
                    self.path.display(),
                    new_path.display()
                )
            })
        } else if copy {
            std::fs::copy(&self.path, &new_path)
                .map(|_| ())
                .with_context(|| {
                    format!(
                        "Failed to copy {} to {}",
                        self.path.display(),
                        new_path.display()
                    )
                })
        } else {
            Ok(())
        };
        if let Err(err) = moved {
            return Err(RetypeError::new(self, err));
        }

        let owner = self.owner.clone();
        if let Some(files) = &owner {
            if rename {
                if let Err(err) = files.relocate(&self.path, &new_path) {
                    warn!("{}; tracking {} afresh", err, new_path.display());
                    files.track(&new_path);
                }
                // The count moved with the file; nothing left to release.
                self.owner = None;
            } else {
                files.track(&new_path);
            }
        }
        debug!(
            from = %self.path.display(),
            to = %new_path.display(),
            kind = kind.name(),
            rename,
            copy,
            "re-typed proxy"
        );

        Ok(Proxy {
            path: new_path,
            kind: kind.clone(),
            owner,
        })
    }

    fn retyped_path(&self, kind: &ProxyKind) -> Result<PathBuf> {
        if let Some(ext) = self.kind.file_ext() {
            bail!("Cannot add type to proxy with existing type {}", ext);
        }
        let Some(new_ext) = kind.file_ext() else {
            bail!("Cannot cast a proxy to the untyped kind `{}`", kind.name());
        };
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| anyhow!("Proxy path {} has no file name", self.path.display()))?;
        Ok(self
            .path
            .with_file_name(format!("{}{}", file_name.to_string_lossy(), new_ext)))
    }

    /// Managed proxy of `kind` holding `bytes` in a fresh temporary file.
    pub fn from_bytes(
        kind: &ProxyKind,
        files: &Arc<FileReferenceCounter>,
        bytes: &[u8],
    ) -> Result<Self> {
        let proxy = Self::new_temporary(kind, files)?;
        std::fs::write(&proxy.path, bytes)
            .with_context(|| format!("Failed to write {}", proxy.path.display()))?;
        Ok(proxy)
    }

    /// Contents of the backing file.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.path).with_context(|| format!("Failed to read {}", self.path.display()))
    }
}

/// A failed [`Proxy::typed`], carrying the original handle.
#[derive(Debug)]
pub struct RetypeError {
    proxy: Proxy,
    source: anyhow::Error,
}

impl RetypeError {
    fn new(proxy: Proxy, source: anyhow::Error) -> Self {
        Self { proxy, source }
    }

    /// The proxy that was to be re-typed, still owning its file.
    pub fn into_proxy(self) -> Proxy {
        self.proxy
    }
}

impl fmt::Display for RetypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.source)
    }
}

impl std::error::Error for RetypeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl Clone for Proxy {
    fn clone(&self) -> Self {
        if let Some(files) = &self.owner {
            files.add_reference(&self.path);
        }
        Self {
            path: self.path.clone(),
            kind: self.kind.clone(),
            owner: self.owner.clone(),
        }
    }
}

impl Drop for Proxy {
    fn drop(&mut self) {
        if let Some(files) = &self.owner {
            if let Err(err) = files.try_remove_reference(&self.path) {
                warn!("Failed to release proxy at {}: {}", self.path.display(), err);
            }
        }
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let managed = if self.is_managed() { "managed" } else { "unmanaged" };
        write!(
            f,
            "<{} for {} ({})>",
            self.kind.name(),
            self.path.display(),
            managed
        )
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("managed", &self.is_managed())
            .finish()
    }
}

impl Resolvable for Proxy {
    fn type_key(&self) -> TypeKey {
        self.kind.key().clone()
    }

    fn render(&self) -> String {
        self.path.display().to_string()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}
