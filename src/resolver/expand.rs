//! Path Variable Expansion
//!
//! `$VAR`/`${VAR}` interpolation for candidate names and search-directory
//! paths, using current process-environment values. Semantics mirror the
//! value substitution the dotenv parser applies inside files: undefined
//! variables expand to the empty string, and a backslash before `$`
//! suppresses substitution.

/// Expand `$VAR` and `${VAR}` references in `input` from the process
/// environment.
pub(crate) fn expand_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'$') => {
                chars.next();
                out.push('$');
            }
            '$' => match chars.peek() {
                Some('{') => {
                    chars.next();
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if closed {
                        out.push_str(&lookup(&name));
                    } else {
                        // Unterminated reference stays literal.
                        out.push_str("${");
                        out.push_str(&name);
                    }
                }
                Some(c) if is_name_start(*c) => {
                    let mut name = String::new();
                    while let Some(c) = chars.peek() {
                        if is_name_char(*c) {
                            name.push(*c);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    out.push_str(&lookup(&name));
                }
                _ => out.push('$'),
            },
            c => out.push(c),
        }
    }

    out
}

fn lookup(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    std::env::var(name).unwrap_or_default()
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::env_lock;

    #[test]
    fn expands_braced_and_bare_references() {
        let _lock = env_lock().lock().unwrap();
        std::env::set_var("DL_EXPAND_ENV", "prod");

        assert_eq!(expand_env(".env.${DL_EXPAND_ENV}"), ".env.prod");
        assert_eq!(expand_env(".env.$DL_EXPAND_ENV"), ".env.prod");
        assert_eq!(expand_env("conf/$DL_EXPAND_ENV/env"), "conf/prod/env");

        std::env::remove_var("DL_EXPAND_ENV");
    }

    #[test]
    fn undefined_variable_expands_to_empty() {
        let _lock = env_lock().lock().unwrap();
        std::env::remove_var("DL_EXPAND_MISSING");

        assert_eq!(expand_env(".env.${DL_EXPAND_MISSING}"), ".env.");
        assert_eq!(expand_env("$DL_EXPAND_MISSING/x"), "/x");
    }

    #[test]
    fn escaped_dollar_is_literal() {
        let _lock = env_lock().lock().unwrap();
        std::env::set_var("DL_EXPAND_ESC", "nope");

        assert_eq!(expand_env("\\$DL_EXPAND_ESC"), "$DL_EXPAND_ESC");

        std::env::remove_var("DL_EXPAND_ESC");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(expand_env(".env"), ".env");
        assert_eq!(expand_env("a$"), "a$");
        assert_eq!(expand_env("${unterminated"), "${unterminated");
    }
}
