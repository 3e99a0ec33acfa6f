//! core::query
//!
//! Turns a free-text reference query into glob patterns for a reference walk.
//!
//! # Query Language
//!
//! - A leading `^` anchors the query at the start of the name.
//! - A trailing `$` anchors the query at the end of the name.
//! - Characters that can never appear in a reference component (control
//!   characters, space, `~`, `^`, `:`, `?`, `*`, `[`) are silently dropped.
//!
//! # Patterns
//!
//! The walk only understands globs, so a substring query needs one pattern
//! for matching leaf names and one for matching directories on the way:
//!
//! | anchors  | patterns                                       |
//! |----------|------------------------------------------------|
//! | `^...$`  | `<base>Q`                                      |
//! | `...$`   | `<base>**/*Q`                                  |
//! | `^...`   | `<base>Q*`, `<base>Q*/**`                      |
//! | none     | `<base>**/*Q*`, `<base>**/*Q*/**`              |

/// Result of sanitizing a raw query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedQuery {
    /// The query with anchors and illegal characters removed.
    pub text: String,
    /// The raw query started with `^`.
    pub match_prefix: bool,
    /// The raw query ended with `$`.
    pub match_suffix: bool,
}

/// Strip anchors and characters that aren't allowed in a reference name.
///
/// See <https://git-scm.com/docs/git-check-ref-format#_description>
/// (rules 4 and 5).
///
/// # Example
///
/// ```
/// use refkeep::core::query::sanitize_query;
///
/// let q = sanitize_query("^rel*ease$");
/// assert_eq!(q.text, "release");
/// assert!(q.match_prefix && q.match_suffix);
/// ```
pub fn sanitize_query(query: &str) -> SanitizedQuery {
    if query.is_empty() {
        return SanitizedQuery {
            text: String::new(),
            match_prefix: false,
            match_suffix: false,
        };
    }

    // '^' is dropped by the character filter below, '$' is a legal ref
    // character and has to be cut explicitly.
    let match_prefix = query.starts_with('^');
    let match_suffix = query.ends_with('$');
    let query = if match_suffix {
        &query[..query.len() - 1]
    } else {
        query
    };

    let text = query.chars().filter(|c| is_ref_query_char(*c)).collect();

    SanitizedQuery {
        text,
        match_prefix,
        match_suffix,
    }
}

fn is_ref_query_char(c: char) -> bool {
    !matches!(c, '\0'..='\x1f' | '\x7f' | ' ' | '~' | '^' | ':' | '?' | '*' | '[')
}

/// Build the walk patterns restricting a walk to `base_path` and `query`.
///
/// An empty result means "no restriction".
///
/// # Example
///
/// ```
/// use refkeep::core::query::walk_patterns;
///
/// assert!(walk_patterns("", "").is_empty());
/// assert_eq!(walk_patterns("refs/tags", ""), vec!["refs/tags/"]);
/// assert_eq!(
///     walk_patterns("refs/tags/", "^v1"),
///     vec!["refs/tags/v1*", "refs/tags/v1*/**"]
/// );
/// ```
pub fn walk_patterns(base_path: &str, query: &str) -> Vec<String> {
    if base_path.is_empty() && query.is_empty() {
        return Vec::new();
    }

    let mut base = base_path.to_string();
    if !base.is_empty() && !base.ends_with('/') {
        base.push('/');
    }

    if query.is_empty() {
        return vec![base];
    }

    let SanitizedQuery {
        text: q,
        match_prefix,
        match_suffix,
    } = sanitize_query(query);

    match (match_prefix, match_suffix) {
        (true, true) => vec![format!("{base}{q}")],
        (false, true) => vec![format!("{base}**/*{q}")],
        (true, false) => vec![format!("{base}{q}*"), format!("{base}{q}*/**")],
        (false, false) => vec![format!("{base}**/*{q}*"), format!("{base}**/*{q}*/**")],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod sanitize {
        use super::*;

        #[test]
        fn empty() {
            let q = sanitize_query("");
            assert_eq!(q.text, "");
            assert!(!q.match_prefix);
            assert!(!q.match_suffix);
        }

        #[test]
        fn anchors_detected_and_removed() {
            let q = sanitize_query("^v1$");
            assert_eq!(q.text, "v1");
            assert!(q.match_prefix);
            assert!(q.match_suffix);
        }

        #[test]
        fn dollar_inside_is_kept() {
            let q = sanitize_query("a$b");
            assert_eq!(q.text, "a$b");
            assert!(!q.match_suffix);
        }

        #[test]
        fn illegal_chars_dropped() {
            let q = sanitize_query("a b~c^d:e?f*g[h\ti\x7fj");
            assert_eq!(q.text, "abcdefghij");
        }

        #[test]
        fn non_ascii_kept() {
            assert_eq!(sanitize_query("release-ü").text, "release-ü");
        }
    }

    mod patterns {
        use super::*;

        #[test]
        fn no_restriction() {
            assert!(walk_patterns("", "").is_empty());
        }

        #[test]
        fn namespace_only() {
            assert_eq!(walk_patterns("refs/tags/", ""), vec!["refs/tags/"]);
            assert_eq!(walk_patterns("refs/tags", ""), vec!["refs/tags/"]);
        }

        #[test]
        fn exact() {
            assert_eq!(walk_patterns("refs/tags", "^v1.0$"), vec!["refs/tags/v1.0"]);
        }

        #[test]
        fn suffix_only() {
            assert_eq!(walk_patterns("refs/tags", "rc$"), vec!["refs/tags/**/*rc"]);
        }

        #[test]
        fn prefix_only() {
            assert_eq!(
                walk_patterns("refs/heads", "^feat"),
                vec!["refs/heads/feat*", "refs/heads/feat*/**"]
            );
        }

        #[test]
        fn substring() {
            assert_eq!(
                walk_patterns("refs/tags", "1.2"),
                vec!["refs/tags/**/*1.2*", "refs/tags/**/*1.2*/**"]
            );
        }

        #[test]
        fn empty_base_with_query() {
            assert_eq!(walk_patterns("", "^x$"), vec!["x"]);
        }

        #[test]
        fn glob_chars_in_query_are_neutralized() {
            assert_eq!(
                walk_patterns("refs/tags", "v*[1]?"),
                vec!["refs/tags/**/*v1]*", "refs/tags/**/*v1]*/**"]
            );
        }
    }
}
