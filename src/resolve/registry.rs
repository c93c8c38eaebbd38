// src/resolve/registry.rs

//! Executable descriptors and the name registry.

use std::collections::HashMap;
use std::path::PathBuf;

/// Descriptor for one logical executable.
///
/// `variable` names an environment variable that overrides the search; it
/// defaults to the upper-snake-case form of the name. The per-platform
/// candidate lists hold path templates (they may contain `$NAME`-style
/// references) tried in order by the resolver.
#[derive(Debug, Clone)]
pub struct Executable {
    pub name: String,
    pub variable: String,
    /// Last successfully resolved path. Once set it is returned verbatim
    /// by cache-using resolutions; staleness is part of the contract.
    pub path: Option<PathBuf>,
    pub windows: Vec<String>,
    pub darwin: Vec<String>,
    pub linux: Vec<String>,
}

impl Executable {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let variable = screaming_snake(&name);
        Self {
            name,
            variable,
            path: None,
            windows: Vec::new(),
            darwin: Vec::new(),
            linux: Vec::new(),
        }
    }

    pub fn windows_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.windows = candidates.into_iter().map(Into::into).collect();
        self
    }

    pub fn darwin_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.darwin = candidates.into_iter().map(Into::into).collect();
        self
    }

    pub fn linux_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.linux = candidates.into_iter().map(Into::into).collect();
        self
    }
}

/// Name-keyed store of [`Executable`] descriptors.
///
/// Entries are created lazily on first reference and live for the owner's
/// lifetime.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    entries: HashMap<String, Executable>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a descriptor, filling in the default override
    /// variable when the caller left it empty.
    pub(crate) fn register(&mut self, mut exe: Executable) {
        if exe.variable.is_empty() {
            exe.variable = screaming_snake(&exe.name);
        }
        self.entries.insert(exe.name.clone(), exe);
    }

    /// Descriptor for `name`, auto-registering a default one if unknown.
    pub(crate) fn ensure(&mut self, name: &str) -> &mut Executable {
        self.entries
            .entry(name.to_string())
            .or_insert_with(|| Executable::new(name))
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Executable> {
        self.entries.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Executable> {
        self.entries.get_mut(name)
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

/// Upper-snake-case ("screaming") form of a name: `my-tool` → `MY_TOOL`,
/// `myTool` → `MY_TOOL`. Characters other than letters, digits, `_`, `-`,
/// and whitespace are dropped.
pub fn screaming_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut last = '\0';

    for c in name.chars() {
        if c.is_alphabetic() {
            if c.is_uppercase() && last.is_alphabetic() && last.is_lowercase() {
                out.push('_');
            }
            out.extend(c.to_uppercase());
            last = c;
        } else if c.is_numeric() {
            out.push(c);
            last = c;
        } else if c == '_' || c == '-' || c.is_whitespace() {
            if out.is_empty() || last == '_' {
                continue;
            }
            out.push('_');
            last = '_';
        }
    }

    if out.ends_with('_') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screaming_snake_forms() {
        assert_eq!(screaming_snake("kubectl"), "KUBECTL");
        assert_eq!(screaming_snake("myTool"), "MY_TOOL");
        assert_eq!(screaming_snake("gh-cli"), "GH_CLI");
        assert_eq!(screaming_snake("docker compose"), "DOCKER_COMPOSE");
        assert_eq!(screaming_snake("tool2"), "TOOL2");
        assert_eq!(screaming_snake("--weird--"), "WEIRD");
        assert_eq!(screaming_snake(""), "");
    }

    #[test]
    fn new_derives_override_variable() {
        let exe = Executable::new("my-tool");
        assert_eq!(exe.variable, "MY_TOOL");
        assert!(exe.path.is_none());
    }

    #[test]
    fn ensure_auto_registers() {
        let mut registry = Registry::new();
        assert!(!registry.contains("jq"));
        registry.ensure("jq");
        assert!(registry.contains("jq"));
        assert_eq!(registry.get("jq").unwrap().variable, "JQ");
    }

    #[test]
    fn register_fills_empty_variable() {
        let mut registry = Registry::new();
        let mut exe = Executable::new("tool");
        exe.variable = String::new();
        registry.register(exe);
        assert_eq!(registry.get("tool").unwrap().variable, "TOOL");
    }
}
