// src/resolve/mod.rs

//! Executable registry and resolver.
//!
//! The [`Resolver`] is an explicit context object owning two pieces of
//! mutable state:
//!
//! - the **registry** of [`Executable`] descriptors, created lazily on
//!   first reference and kept for the owner's lifetime;
//! - the **resolve cache**, a base-name → absolute-path memo populated by
//!   the lowest-level search routine.
//!
//! Resolution order for a logical name: cached descriptor path (under
//! `use_cache`), the per-executable override variable, a previously
//! discovered path, then the platform candidate list. A cached path is
//! returned without re-validation; staleness is a documented contract, not
//! a bug.
//!
//! A process-wide instance is available through [`shared`], guarded by a
//! `Mutex`; the free functions ([`resolve`], [`register`], [`which`]) lock
//! it for the duration of each call. Code that wants confinement instead
//! can own a private `Resolver`.

pub mod registry;
mod which;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use tracing::debug;

use crate::env;
use crate::errors::ResolveError;
use crate::platform::{self, Platform};

pub use registry::{Executable, screaming_snake};

use registry::Registry;

/// Options for [`Resolver::resolve`] and the first-match search.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Return cached paths without re-validating them.
    pub use_cache: bool,
    /// Directories searched before the PATH-style list.
    pub prepend_paths: Vec<String>,
}

/// Maps logical executable names to validated absolute paths.
pub struct Resolver {
    platform: &'static dyn Platform,
    registry: Registry,
    cache: HashMap<String, PathBuf>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self::with_platform(platform::current())
    }

    /// Build a resolver against an explicit platform strategy.
    pub fn with_platform(platform: &'static dyn Platform) -> Self {
        Self {
            platform,
            registry: Registry::new(),
            cache: HashMap::new(),
        }
    }

    /// Register a descriptor ahead of time.
    pub fn register(&mut self, exe: Executable) {
        self.registry.register(exe);
    }

    /// Descriptor for `name`, if it has been referenced before.
    pub fn descriptor(&self, name: &str) -> Option<&Executable> {
        self.registry.get(name)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Resolve a logical executable name to an absolute path.
    pub fn resolve(
        &mut self,
        name: &str,
        opts: &ResolveOptions,
    ) -> Result<PathBuf, ResolveError> {
        let exe = self.registry.ensure(name).clone();

        if opts.use_cache {
            if let Some(path) = &exe.path {
                return Ok(path.clone());
            }
        }

        // The override variable wins over everything else.
        if !exe.variable.is_empty() {
            let value = env::get(&exe.variable);
            if !value.is_empty() {
                let value = env::expand_safe(&value);
                if !value.is_empty() {
                    if let Some(found) = self.which_first(&value, opts) {
                        return Ok(self.remember(name, found));
                    }
                }
            }
        }

        // Re-validate a previously discovered path.
        if let Some(prev) = &exe.path {
            let prev = prev.to_string_lossy().into_owned();
            if let Some(found) = self.which_first(&prev, opts) {
                return Ok(self.remember(name, found));
            }
        }

        for candidate in self.platform.candidates(&exe) {
            if candidate.trim().is_empty() {
                continue;
            }
            let expanded = env::expand_safe(candidate);
            if expanded.is_empty() {
                continue;
            }
            if let Some(found) = self.which_first(&expanded, opts) {
                return Ok(self.remember(name, found));
            }
        }

        Err(ResolveError::NotFound(name.to_string()))
    }

    fn remember(&mut self, name: &str, found: PathBuf) -> PathBuf {
        debug!(name, path = %found.display(), "resolved executable");
        if let Some(entry) = self.registry.get_mut(name) {
            entry.path = Some(found.clone());
        }
        found
    }
}

static SHARED: OnceLock<Mutex<Resolver>> = OnceLock::new();

/// The process-wide resolver instance.
pub fn shared() -> &'static Mutex<Resolver> {
    SHARED.get_or_init(|| Mutex::new(Resolver::new()))
}

/// Resolve against the process-wide resolver.
pub fn resolve(name: &str, opts: &ResolveOptions) -> Result<PathBuf, ResolveError> {
    shared()
        .lock()
        .expect("resolver lock poisoned")
        .resolve(name, opts)
}

/// Register a descriptor with the process-wide resolver.
pub fn register(exe: Executable) {
    shared()
        .lock()
        .expect("resolver lock poisoned")
        .register(exe);
}

/// Locate a command along the PATH-style list using the process-wide
/// resolver's cache.
pub fn which(command: &str) -> Option<PathBuf> {
    shared()
        .lock()
        .expect("resolver lock poisoned")
        .which(command)
}
