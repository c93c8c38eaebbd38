// src/env/mod.rs

//! Process environment helpers and the variable-store capability.
//!
//! - Plain `get`/`set`/`has`/`all` wrappers over `std::env`, returning empty
//!   strings for unset variables (the convention the expander and resolver
//!   rely on).
//! - PATH-list helpers that go through the platform strategy for the
//!   variable name and separator.
//! - [`VarStore`], the lookup/define capability consumed by the expander,
//!   with a [`ProcessEnv`] implementation and a `HashMap` implementation
//!   for scoped or in-memory variables.

pub mod expand;

pub use expand::{ExpandOptions, expand, expand_safe, expand_with};

use std::collections::HashMap;

use crate::platform;

/// Value of `key`, or an empty string when unset.
pub fn get(key: &str) -> String {
    std::env::var(key).unwrap_or_default()
}

/// Whether `key` is set at all (even to an empty value).
pub fn has(key: &str) -> bool {
    std::env::var_os(key).is_some()
}

/// Set `key` in the process environment.
///
/// Process-global mutation: callers own coordination with any threads that
/// read the environment concurrently.
pub fn set(key: &str, value: &str) {
    unsafe { std::env::set_var(key, value) }
}

/// Remove `key` from the process environment.
pub fn remove(key: &str) {
    unsafe { std::env::remove_var(key) }
}

/// Snapshot of the whole environment.
pub fn all() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Value of the platform's PATH-style variable.
pub fn path() -> String {
    get(platform::current().path_variable())
}

/// Replace the platform's PATH-style variable.
pub fn set_path(value: &str) {
    set(platform::current().path_variable(), value);
}

/// The PATH-style list split into its entries.
pub fn split_path() -> Vec<String> {
    let sep = platform::current().path_list_separator();
    path().split(sep).map(String::from).collect()
}

/// Join entries into a PATH-style list.
pub fn join_path<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let sep = platform::current().path_list_separator();
    let mut out = String::new();
    for part in parts {
        if !out.is_empty() {
            out.push(sep);
        }
        out.push_str(part.as_ref());
    }
    out
}

/// Whether `dir` is already an entry of the PATH-style list.
pub fn has_path(dir: &str) -> bool {
    split_path().iter().any(|p| p == dir)
}

/// Append `dir` to the PATH-style list unless already present.
pub fn append_path(dir: &str) {
    if has_path(dir) {
        return;
    }
    let mut parts = split_path();
    parts.push(dir.to_string());
    set_path(&join_path(&parts));
}

/// Prepend `dir` to the PATH-style list unless already present.
pub fn prepend_path(dir: &str) {
    if has_path(dir) {
        return;
    }
    let mut parts = vec![dir.to_string()];
    parts.extend(split_path());
    set_path(&join_path(&parts));
}

/// Variable lookup/define capability used by the expander.
///
/// `get` returns an empty string for unset variables; an empty value and an
/// unset variable are deliberately indistinguishable, matching how defaults
/// and `:?` behave in the expansion grammar.
pub trait VarStore {
    fn get(&self, key: &str) -> String;
    fn set(&mut self, key: &str, value: &str);
}

/// [`VarStore`] backed by the process environment. The default store.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl VarStore for ProcessEnv {
    fn get(&self, key: &str) -> String {
        get(key)
    }

    fn set(&mut self, key: &str, value: &str) {
        set(key, value);
    }
}

impl VarStore for HashMap<String, String> {
    fn get(&self, key: &str) -> String {
        HashMap::get(self, key).cloned().unwrap_or_default()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_empty_for_unset() {
        assert_eq!(get("RUNPIPE_TEST_UNSET_VAR_95721"), "");
    }

    #[test]
    fn set_then_get_roundtrip() {
        set("RUNPIPE_TEST_ROUNDTRIP", "value");
        assert_eq!(get("RUNPIPE_TEST_ROUNDTRIP"), "value");
        assert!(has("RUNPIPE_TEST_ROUNDTRIP"));
        remove("RUNPIPE_TEST_ROUNDTRIP");
        assert!(!has("RUNPIPE_TEST_ROUNDTRIP"));
    }

    #[test]
    fn join_path_uses_platform_separator() {
        let sep = platform::current().path_list_separator();
        let joined = join_path(["/a", "/b"]);
        assert_eq!(joined, format!("/a{sep}/b"));
    }

    #[test]
    fn hashmap_store_reads_and_writes() {
        let mut vars = HashMap::new();
        VarStore::set(&mut vars, "KEY", "VALUE");
        assert_eq!(VarStore::get(&vars, "KEY"), "VALUE");
        assert_eq!(VarStore::get(&vars, "OTHER"), "");
    }
}
