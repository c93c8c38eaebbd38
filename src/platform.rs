// src/platform.rs

//! Runtime-selected platform strategy for executable search.
//!
//! The resolver is platform-agnostic; everything that differs between
//! operating systems is behind the [`Platform`] trait:
//!
//! - the name of the PATH-style environment variable and its separator,
//! - which candidate list of an [`Executable`] descriptor applies,
//! - how a directory entry is matched against a requested name
//!   (`PATHEXT` handling on Windows, case-insensitive base-name match
//!   elsewhere),
//! - how an absolute path is checked with the platform's executable-lookup
//!   rules.
//!
//! [`current`] picks the implementation once per process; the Darwin
//! candidate list falls through to the Unix list, Windows does not fall
//! through.

use std::fs;
use std::path::{Path, PathBuf};

use crate::env;
use crate::resolve::Executable;

/// Extension priority list used on Windows when `PATHEXT` is unset.
pub const DEFAULT_PATHEXT: &str = ".com;.exe;.bat;.cmd;.vbs;.vbe;.js;.jse;.wsf;.wsh";

/// Platform-specific pieces of the executable search.
pub trait Platform: Send + Sync {
    /// Name of the PATH-style environment variable (`PATH` or `Path`).
    fn path_variable(&self) -> &'static str;

    /// Separator between entries of the PATH-style list.
    fn path_list_separator(&self) -> char;

    /// Whether resolve-cache keys compare case-insensitively.
    fn case_insensitive_names(&self) -> bool;

    /// Candidate path templates for a descriptor, in search order.
    fn candidates<'a>(&self, exe: &'a Executable) -> Vec<&'a str>;

    /// Check an absolute path with the platform's executable-lookup rules,
    /// returning the usable path on success.
    fn check_absolute(&self, path: &Path) -> Option<PathBuf>;

    /// Find a matching executable entry inside one directory.
    ///
    /// `requested` is the candidate's file name as given, `base` the file
    /// name without extension, `ext` the extension including its dot (or
    /// empty).
    fn find_in_dir(&self, dir: &Path, requested: &str, base: &str, ext: &str) -> Option<PathBuf>;
}

/// The strategy for the platform this process runs on.
pub fn current() -> &'static dyn Platform {
    if cfg!(windows) {
        &Windows
    } else if cfg!(target_os = "macos") {
        &Darwin
    } else {
        &Unix
    }
}

pub struct Unix;
pub struct Darwin;
pub struct Windows;

impl Platform for Unix {
    fn path_variable(&self) -> &'static str {
        "PATH"
    }

    fn path_list_separator(&self) -> char {
        ':'
    }

    fn case_insensitive_names(&self) -> bool {
        false
    }

    fn candidates<'a>(&self, exe: &'a Executable) -> Vec<&'a str> {
        exe.linux.iter().map(String::as_str).collect()
    }

    fn check_absolute(&self, path: &Path) -> Option<PathBuf> {
        unix_check_absolute(path)
    }

    fn find_in_dir(&self, dir: &Path, _requested: &str, base: &str, _ext: &str) -> Option<PathBuf> {
        unix_find_in_dir(dir, base)
    }
}

impl Platform for Darwin {
    fn path_variable(&self) -> &'static str {
        "PATH"
    }

    fn path_list_separator(&self) -> char {
        ':'
    }

    fn case_insensitive_names(&self) -> bool {
        false
    }

    fn candidates<'a>(&self, exe: &'a Executable) -> Vec<&'a str> {
        // Darwin-specific locations first, then the shared Unix list.
        exe.darwin
            .iter()
            .chain(exe.linux.iter())
            .map(String::as_str)
            .collect()
    }

    fn check_absolute(&self, path: &Path) -> Option<PathBuf> {
        unix_check_absolute(path)
    }

    fn find_in_dir(&self, dir: &Path, _requested: &str, base: &str, _ext: &str) -> Option<PathBuf> {
        unix_find_in_dir(dir, base)
    }
}

impl Platform for Windows {
    fn path_variable(&self) -> &'static str {
        "Path"
    }

    fn path_list_separator(&self) -> char {
        ';'
    }

    fn case_insensitive_names(&self) -> bool {
        true
    }

    fn candidates<'a>(&self, exe: &'a Executable) -> Vec<&'a str> {
        exe.windows.iter().map(String::as_str).collect()
    }

    fn check_absolute(&self, path: &Path) -> Option<PathBuf> {
        let exts = pathext_list();
        if let Some(ext) = dotted_extension(path) {
            if exts.iter().any(|e| e.eq_ignore_ascii_case(&ext)) && path.is_file() {
                return Some(path.to_path_buf());
            }
        }
        for ext in &exts {
            let candidate = PathBuf::from(format!("{}{}", path.display(), ext));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }

    fn find_in_dir(&self, dir: &Path, requested: &str, _base: &str, ext: &str) -> Option<PathBuf> {
        let exts = pathext_list();
        let has_ext = !ext.is_empty() && exts.iter().any(|e| e.eq_ignore_ascii_case(ext));

        for name in dir_file_names(dir)? {
            if has_ext {
                // The requested name already carries a recognized extension:
                // exact (case-insensitive) file name match.
                if name.eq_ignore_ascii_case(requested) {
                    return Some(dir.join(name));
                }
                continue;
            }
            let entry_ext = dotted_extension(Path::new(&name)).unwrap_or_default();
            if exts.iter().any(|e| e.eq_ignore_ascii_case(&entry_ext)) {
                return Some(dir.join(name));
            }
        }
        None
    }
}

/// `PATHEXT` as a lowercase extension list, falling back to
/// [`DEFAULT_PATHEXT`] when unset or blank.
fn pathext_list() -> Vec<String> {
    let raw = env::get("PATHEXT");
    let raw = if raw.trim().is_empty() {
        DEFAULT_PATHEXT.to_string()
    } else {
        raw.to_lowercase()
    };
    raw.split(';')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Extension of `path` including the leading dot, if any.
fn dotted_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
}

fn unix_check_absolute(path: &Path) -> Option<PathBuf> {
    let meta = fs::metadata(path).ok()?;
    if meta.is_file() && is_executable(&meta) {
        Some(path.to_path_buf())
    } else {
        None
    }
}

/// Scan one directory for an entry whose name equals the base name,
/// case-insensitively.
fn unix_find_in_dir(dir: &Path, base: &str) -> Option<PathBuf> {
    for name in dir_file_names(dir)? {
        if name.eq_ignore_ascii_case(base) {
            return Some(dir.join(name));
        }
    }
    None
}

/// File (non-directory) entry names of `dir`, in directory order.
fn dir_file_names(dir: &Path) -> Option<Vec<String>> {
    let entries = fs::read_dir(dir).ok()?;
    let mut names = Vec::new();
    for entry in entries.flatten() {
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(true);
        if is_dir {
            continue;
        }
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Some(names)
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &fs::Metadata) -> bool {
    true
}
