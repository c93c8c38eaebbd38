// src/resolve/which.rs

//! First-match executable search along a directory list.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::env;

use super::{ResolveOptions, Resolver};

impl Resolver {
    /// Locate `command` along the PATH-style list with default options.
    pub fn which(&mut self, command: &str) -> Option<PathBuf> {
        self.which_first(command, &ResolveOptions::default())
    }

    /// First-match search for a single candidate.
    ///
    /// An absolute candidate is checked with the platform's
    /// executable-lookup rules only when it is a symbolic link; a
    /// non-symlink absolute path falls through to the directory scan, and
    /// an absolute path that does not exist at all is not found.
    /// A directory-scan hit is always memoized by base name; the memo is
    /// never invalidated implicitly.
    pub(crate) fn which_first(
        &mut self,
        candidate: &str,
        opts: &ResolveOptions,
    ) -> Option<PathBuf> {
        if candidate.is_empty() {
            return None;
        }

        let path = Path::new(candidate);
        let requested = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => candidate.to_string(),
        };
        let base = match path.file_stem() {
            Some(stem) => stem.to_string_lossy().into_owned(),
            None => requested.clone(),
        };
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let key = self.cache_key(&base);

        if opts.use_cache {
            if let Some(hit) = self.cache.get(&key) {
                return Some(hit.clone());
            }
        }

        if path.is_absolute() {
            match fs::symlink_metadata(path) {
                Err(_) => return None,
                Ok(meta) if meta.file_type().is_symlink() => {
                    let found = self.platform.check_absolute(path)?;
                    if opts.use_cache {
                        self.cache.insert(key, found.clone());
                    }
                    return Some(found);
                }
                Ok(_) => {}
            }
        }

        for dir in search_dirs(opts) {
            if dir.trim().is_empty() {
                continue;
            }
            let dir_path = Path::new(&dir);
            if !dir_path.is_dir() {
                continue;
            }
            if let Some(found) = self
                .platform
                .find_in_dir(dir_path, &requested, &base, &ext)
            {
                debug!(candidate, found = %found.display(), "executable located");
                self.cache.insert(key, found.clone());
                return Some(found);
            }
        }

        None
    }

    fn cache_key(&self, base: &str) -> String {
        if self.platform.case_insensitive_names() {
            base.to_lowercase()
        } else {
            base.to_string()
        }
    }
}

/// Ordered directory list: prepend paths first, then the PATH-style list.
/// Each entry is template-expanded; an entry whose expansion comes back
/// empty is kept as written.
fn search_dirs(opts: &ResolveOptions) -> Vec<String> {
    let mut dirs = opts.prepend_paths.clone();
    dirs.extend(env::split_path());
    for dir in &mut dirs {
        let expanded = env::expand_safe(dir);
        if !expanded.is_empty() {
            *dir = expanded;
        }
    }
    dirs
}
