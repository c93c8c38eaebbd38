// src/env/expand.rs

//! Shell-style template expansion.
//!
//! Recognized forms:
//!
//! | Form | Behavior |
//! |---|---|
//! | `\$` | literal `$` |
//! | `$NAME` | bare reference |
//! | `${NAME}` | braced reference |
//! | `${NAME:-default}` | `default` when the value is empty |
//! | `${NAME:=default}` | `default`, with a conditional write-back |
//! | `${NAME:?message}` | error with `message` when the value is empty |
//! | `${NAME:default}` | generic default, same as `:-` |
//!
//! Expansion fails fast: a malformed reference makes the whole call return
//! an error with no partial output. A non-empty lookup result always wins
//! over any default or message clause.

use crate::errors::ExpandError;

use super::{ProcessEnv, VarStore};

/// Options for [`expand_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpandOptions {
    /// When set, a reference whose name parses as an integer substitutes
    /// the process's positional argument at that index (empty when out of
    /// range) instead of a variable lookup.
    pub allow_positional_args: bool,
}

/// Expand `template` against the process environment.
pub fn expand(template: &str) -> Result<String, ExpandError> {
    expand_with(template, &mut ProcessEnv, &ExpandOptions::default())
}

/// Expand `template`, returning an empty string on any error.
///
/// Used where a failed expansion should behave like an absent value, e.g.
/// for resolver candidate templates.
pub fn expand_safe(template: &str) -> String {
    expand(template).unwrap_or_default()
}

/// Expand `template` against an arbitrary variable store.
pub fn expand_with(
    template: &str,
    vars: &mut dyn VarStore,
    opts: &ExpandOptions,
) -> Result<String, ExpandError> {
    let chars: Vec<char> = template.chars().collect();
    let mut out = String::with_capacity(template.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' && chars.get(i + 1) == Some(&'$') {
            out.push('$');
            i += 2;
            continue;
        }

        if c != '$' {
            out.push(c);
            i += 1;
            continue;
        }

        match chars.get(i + 1) {
            Some('{') => {
                let start = i + 2;
                let mut j = start;
                while j < chars.len() && chars[j] != '}' {
                    j += 1;
                }
                if j == chars.len() {
                    return Err(ExpandError::BadSubstitution(
                        "unterminated ${...} interpolation".to_string(),
                    ));
                }
                let body: String = chars[start..j].iter().collect();
                out.push_str(&interpolate(&body, vars)?);
                i = j + 1;
            }
            Some(&next) if is_name_char(next) => {
                let start = i + 1;
                let mut j = start;
                while j < chars.len() && is_name_char(chars[j]) {
                    j += 1;
                }
                let name: String = chars[start..j].iter().collect();
                out.push_str(&bare_reference(&name, vars, opts)?);
                i = j;
            }
            _ => {
                out.push('$');
                i += 1;
            }
        }
    }

    Ok(out)
}

/// Resolve a bare `$NAME` reference.
fn bare_reference(
    name: &str,
    vars: &mut dyn VarStore,
    opts: &ExpandOptions,
) -> Result<String, ExpandError> {
    if opts.allow_positional_args {
        if let Ok(index) = name.parse::<usize>() {
            return Ok(std::env::args().nth(index).unwrap_or_default());
        }
    }
    if !is_valid_name(name) {
        return Err(ExpandError::BadSubstitution(format!(
            "invalid variable name `{name}`"
        )));
    }
    Ok(vars.get(name))
}

/// Resolve the body of a `${...}` interpolation.
fn interpolate(body: &str, vars: &mut dyn VarStore) -> Result<String, ExpandError> {
    // Operator search order matters: `:=` and `:?` would otherwise be
    // shadowed by the generic `:` form.
    let (name, op) = if let Some(pos) = body.find(":-") {
        (&body[..pos], Op::Default(&body[pos + 2..]))
    } else if let Some(pos) = body.find(":=") {
        (&body[..pos], Op::Assign(&body[pos + 2..]))
    } else if let Some(pos) = body.find(":?") {
        (&body[..pos], Op::Require(&body[pos + 2..]))
    } else if let Some(pos) = body.find(':') {
        (&body[..pos], Op::Default(&body[pos + 1..]))
    } else {
        (body, Op::None)
    };

    // The `:=` write-back fires only when the current value's length is
    // exactly 1. Intentionally preserved from the reference behavior; do
    // not "fix" without a product decision.
    if let Op::Assign(default) = op {
        if !name.is_empty() && vars.get(name).chars().count() == 1 {
            vars.set(name, default);
        }
    }

    if name.is_empty() {
        return Err(ExpandError::BadSubstitution(
            "empty variable name in interpolation".to_string(),
        ));
    }
    if !is_valid_name(name) {
        return Err(ExpandError::BadSubstitution(format!(
            "invalid variable name `{name}`"
        )));
    }

    let value = vars.get(name);
    if !value.is_empty() {
        return Ok(value);
    }

    match op {
        Op::Require(message) if !message.is_empty() => Err(ExpandError::UnsetRequiredVariable {
            name: name.to_string(),
            message: message.to_string(),
        }),
        Op::Default(default) | Op::Assign(default) => Ok(default.to_string()),
        Op::Require(_) | Op::None => Ok(String::new()),
    }
}

enum Op<'a> {
    None,
    Default(&'a str),
    Assign(&'a str),
    Require(&'a str),
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(is_name_char)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::env;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn expand_in(
        template: &str,
        store: &mut HashMap<String, String>,
    ) -> Result<String, ExpandError> {
        expand_with(template, store, &ExpandOptions::default())
    }

    #[test]
    fn no_references() {
        let mut store = vars(&[]);
        assert_eq!(expand_in("test", &mut store).unwrap(), "test");
    }

    #[test]
    fn bare_reference_substitutes() {
        let mut store = vars(&[("WORLD", "World")]);
        assert_eq!(expand_in("Hello $WORLD", &mut store).unwrap(), "Hello World");
    }

    #[test]
    fn braced_reference_substitutes() {
        let mut store = vars(&[("WORLD", "World")]);
        assert_eq!(
            expand_in("Hello ${WORLD}", &mut store).unwrap(),
            "Hello World"
        );
    }

    #[test]
    fn adjacent_references() {
        let mut store = vars(&[("A", "1"), ("B", "2")]);
        assert_eq!(expand_in("$A$B", &mut store).unwrap(), "12");
    }

    #[test]
    fn default_when_unset() {
        let mut store = vars(&[("WORLD", "Emma")]);
        assert_eq!(
            expand_in("Hello ${Bad:-World}", &mut store).unwrap(),
            "Hello World"
        );
    }

    #[test]
    fn generic_colon_default() {
        let mut store = vars(&[]);
        assert_eq!(expand_in("${Bad:World}", &mut store).unwrap(), "World");
    }

    #[test]
    fn value_wins_over_default() {
        let mut store = vars(&[("NAME", "value")]);
        assert_eq!(expand_in("${NAME:-default}", &mut store).unwrap(), "value");
    }

    #[test]
    fn empty_default_is_allowed() {
        let mut store = vars(&[]);
        assert_eq!(expand_in("a${Bad:-}b", &mut store).unwrap(), "ab");
    }

    #[test]
    fn required_variable_fails_with_message() {
        let mut store = vars(&[("WORLD", "Emma")]);
        let err = expand_in("Hello ${Bad:?Error}", &mut store).unwrap_err();
        assert_eq!(
            err,
            ExpandError::UnsetRequiredVariable {
                name: "Bad".to_string(),
                message: "Error".to_string(),
            }
        );
    }

    #[test]
    fn assign_writes_back_only_for_single_char_values() {
        // Unset: no write-back, default is still substituted.
        let mut store = vars(&[]);
        assert_eq!(expand_in("${NAME:=World}", &mut store).unwrap(), "World");
        assert_eq!(VarStore::get(&store, "NAME"), "");

        // Length 1: the write-back fires and the lookup observes it.
        let mut store = vars(&[("NAME", "x")]);
        assert_eq!(expand_in("${NAME:=World}", &mut store).unwrap(), "World");
        assert_eq!(VarStore::get(&store, "NAME"), "World");

        // Longer values are left alone.
        let mut store = vars(&[("NAME", "xy")]);
        assert_eq!(expand_in("${NAME:=World}", &mut store).unwrap(), "xy");
        assert_eq!(VarStore::get(&store, "NAME"), "xy");
    }

    #[test]
    fn escaped_dollar_is_literal() {
        let mut store = vars(&[("WORLD", "World")]);
        assert_eq!(expand_in(r"\$WORLD", &mut store).unwrap(), "$WORLD");
    }

    #[test]
    fn lone_dollar_is_literal() {
        let mut store = vars(&[]);
        assert_eq!(expand_in("100$", &mut store).unwrap(), "100$");
        assert_eq!(expand_in("a $ b", &mut store).unwrap(), "a $ b");
    }

    #[test]
    fn empty_name_is_bad_substitution() {
        let mut store = vars(&[]);
        assert!(matches!(
            expand_in("${}", &mut store),
            Err(ExpandError::BadSubstitution(_))
        ));
        assert!(matches!(
            expand_in("${:-default}", &mut store),
            Err(ExpandError::BadSubstitution(_))
        ));
    }

    #[test]
    fn invalid_name_is_bad_substitution() {
        let mut store = vars(&[]);
        assert!(matches!(
            expand_in("${1BAD}", &mut store),
            Err(ExpandError::BadSubstitution(_))
        ));
        assert!(matches!(
            expand_in("$1", &mut store),
            Err(ExpandError::BadSubstitution(_))
        ));
    }

    #[test]
    fn unterminated_interpolation_is_bad_substitution() {
        let mut store = vars(&[]);
        assert!(matches!(
            expand_in("${NAME", &mut store),
            Err(ExpandError::BadSubstitution(_))
        ));
    }

    #[test]
    fn failure_produces_no_partial_output() {
        let mut store = vars(&[("A", "1")]);
        let err = expand_in("$A ${B:?missing}", &mut store);
        assert!(err.is_err());
    }

    #[test]
    fn positional_args_substitute_by_index() {
        let mut store = vars(&[]);
        let opts = ExpandOptions {
            allow_positional_args: true,
        };
        // Index 0 is the program path of the test binary.
        let expanded = expand_with("$0", &mut store, &opts).unwrap();
        assert!(!expanded.is_empty());
        // Out of range substitutes the empty string.
        assert_eq!(expand_with("$9999", &mut store, &opts).unwrap(), "");
    }

    #[test]
    fn expands_against_process_env_by_default() {
        env::set("RUNPIPE_TEST_EXPAND_WORLD", "World");
        assert_eq!(
            expand("Hello $RUNPIPE_TEST_EXPAND_WORLD").unwrap(),
            "Hello World"
        );
        env::remove("RUNPIPE_TEST_EXPAND_WORLD");
    }

    #[test]
    fn expand_safe_swallows_errors() {
        assert_eq!(expand_safe("${"), "");
        assert_eq!(expand_safe("plain"), "plain");
    }

    #[test]
    fn expansion_is_idempotent_per_input() {
        let mut store = vars(&[("A", "1")]);
        let first = expand_in("x $A y", &mut store).unwrap();
        let second = expand_in("x $A y", &mut store).unwrap();
        assert_eq!(first, second);
    }
}
