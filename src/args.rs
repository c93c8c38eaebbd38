// src/args.rs

//! Command-line tokenization.
//!
//! [`split`] turns a command-line string into an argument vector. It never
//! fails: an unterminated quote or a trailing partial token is flushed
//! as-is at end of input.
//!
//! Outside quotes a literal space is the only token-boundary trigger. A
//! space followed by a bare newline, a CRLF, or a backslash/backtick plus
//! (CR)LF is consumed as a line continuation, producing no separator or
//! content of its own. A newline that is *not* preceded by such a space is
//! ordinary token content; it ends up as the first character of the next
//! token when it follows a closing quote.

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Split a command-line string into its argument vector.
///
/// Quote characters that open a token are stripped from the output; a
/// quote character in the middle of an open token is ordinary content.
pub fn split(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut token = String::new();
    let mut quote = Quote::None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        match quote {
            Quote::Single => {
                if c == '\'' {
                    quote = Quote::None;
                    flush(&mut tokens, &mut token);
                } else {
                    token.push(c);
                }
                i += 1;
                continue;
            }
            Quote::Double => {
                if c == '"' {
                    quote = Quote::None;
                    flush(&mut tokens, &mut token);
                } else {
                    token.push(c);
                }
                i += 1;
                continue;
            }
            Quote::None => {}
        }

        if c == ' ' {
            let next = chars.get(i + 1).copied();
            let second = chars.get(i + 2).copied();
            let third = chars.get(i + 3).copied();

            let consumed = match (next, second, third) {
                (Some('\n'), _, _) => 2,
                (Some('\r'), Some('\n'), _) => 3,
                (Some('\\') | Some('`'), Some('\n'), _) => 3,
                (Some('\\') | Some('`'), Some('\r'), Some('\n')) => 4,
                _ => 1,
            };
            flush(&mut tokens, &mut token);
            i += consumed;
            continue;
        }

        if token.is_empty() {
            match c {
                '\'' => {
                    quote = Quote::Single;
                    i += 1;
                    continue;
                }
                '"' => {
                    quote = Quote::Double;
                    i += 1;
                    continue;
                }
                _ => {}
            }
        }

        token.push(c);
        i += 1;
    }

    flush(&mut tokens, &mut token);
    tokens
}

fn flush(tokens: &mut Vec<String>, token: &mut String) {
    if !token.is_empty() {
        tokens.push(std::mem::take(token));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_token() {
        assert_eq!(split("test"), ["test"]);
    }

    #[test]
    fn splits_on_spaces() {
        assert_eq!(split("test test"), ["test", "test"]);
        assert_eq!(split("a b"), ["a", "b"]);
    }

    #[test]
    fn collapses_repeated_spaces() {
        assert_eq!(split("a   b"), ["a", "b"]);
    }

    #[test]
    fn double_quotes_are_stripped() {
        assert_eq!(split("test \"test\""), ["test", "test"]);
    }

    #[test]
    fn single_quotes_are_stripped() {
        assert_eq!(split("--test 'test'"), ["--test", "test"]);
    }

    #[test]
    fn quoted_span_keeps_spaces() {
        assert_eq!(split("echo 'hello world'"), ["echo", "hello world"]);
    }

    #[test]
    fn quote_mid_token_is_content() {
        assert_eq!(split("ab\"cd\""), ["ab\"cd\""]);
    }

    #[test]
    fn closing_quote_is_a_token_boundary() {
        assert_eq!(split("\"a\"b"), ["a", "b"]);
    }

    #[test]
    fn empty_quotes_produce_no_token() {
        assert_eq!(split("a '' b"), ["a", "b"]);
    }

    #[test]
    fn bare_newline_without_space_is_token_content() {
        // A newline right after a closing quote becomes the first
        // character of the next token, not a separator.
        assert_eq!(
            split("--test 'test'\n--test2 'test2'"),
            ["--test", "test", "\n--test2", "test2"]
        );
    }

    #[test]
    fn space_then_newline_is_a_continuation() {
        assert_eq!(split("a \nb"), ["a", "b"]);
        assert_eq!(split("a \r\nb"), ["a", "b"]);
    }

    #[test]
    fn backslash_continuation() {
        assert_eq!(
            split("--test 'test' \\\n--test2 'test2'"),
            ["--test", "test", "--test2", "test2"]
        );
    }

    #[test]
    fn backtick_continuation() {
        assert_eq!(
            split("--test 'test' `\n--test2 'test2'"),
            ["--test", "test", "--test2", "test2"]
        );
    }

    #[test]
    fn backslash_crlf_continuation() {
        assert_eq!(split("a \\\r\nb"), ["a", "b"]);
    }

    #[test]
    fn quoted_newline_is_preserved() {
        assert_eq!(
            split("--test 'test' \"\n--test2 'test2'\""),
            ["--test", "test", "\n--test2 'test2'"]
        );
    }

    #[test]
    fn unterminated_quote_is_flushed() {
        assert_eq!(split("\"abc"), ["abc"]);
        assert_eq!(split("echo 'partial"), ["echo", "partial"]);
    }

    #[test]
    fn trailing_space_flushes_cleanly() {
        assert_eq!(split("a "), ["a"]);
        assert_eq!(split(" "), Vec::<String>::new());
    }

    #[test]
    fn empty_input() {
        assert_eq!(split(""), Vec::<String>::new());
    }

    #[test]
    fn splitting_is_stable() {
        let input = "one \"two three\" four";
        assert_eq!(split(input), split(input));
    }
}
