//! Captured path variables, encoded as trailing query pairs.
//!
//! A match appends one `key=value` pair per captured variable to the
//! request's raw query string. Keys keep their `:` or `*` prefix, which the
//! form encoding turns into `%3A` / `%2A`; those escaped prefixes are how
//! [`strip_vars`] tells router-added pairs from the application's own.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Everything except `A-Z a-z 0-9 - _ . ~` is escaped.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const ESCAPED_COLON: &str = "%3A";
const ESCAPED_STAR: &str = "%2A";

/// Escapes one query component, writing spaces as `+`.
pub fn escape(component: &str) -> String {
    utf8_percent_encode(component, QUERY_COMPONENT)
        .to_string()
        .replace("%20", "+")
}

/// Appends an escaped `key=value` pair to a raw query string.
///
/// ```
/// use segroute::router::append_var;
///
/// assert_eq!(append_var("", ":id", "42"), "%3Aid=42");
/// assert_eq!(append_var("page=2", "*path", "js/app.js"), "page=2&%2Apath=js%2Fapp.js");
/// ```
pub fn append_var(query: &str, key: &str, value: &str) -> String {
    let pair = format!("{}={}", escape(key), escape(value));
    if query.is_empty() {
        pair
    } else {
        format!("{query}&{pair}")
    }
}

/// Recovers the query string a request carried before the router appended
/// its captured variables.
///
/// Pairs are dropped from the end for as long as their key starts with an
/// escaped `:` or `*`. This relies on captured variables being the last pairs
/// in the string: if anything appends further pairs after routing, or an
/// application key itself starts with `:` or `*`, the result is undefined.
///
/// ```
/// use segroute::router::strip_vars;
///
/// assert_eq!(strip_vars("page=2&%3AuserID=7&%2Apath=a%2Fb"), "page=2");
/// assert_eq!(strip_vars("%3Aid=1"), "");
/// assert_eq!(strip_vars("a=1&b=2"), "a=1&b=2");
/// ```
pub fn strip_vars(query: &str) -> &str {
    let mut rest = query;
    loop {
        let (head, last) = match rest.rfind('&') {
            Some(i) => (Some(&rest[..i]), &rest[i + 1..]),
            None => (None, rest),
        };
        if !is_var_key(last) {
            return rest;
        }
        match head {
            Some(head) => rest = head,
            None => return "",
        }
    }
}

fn is_var_key(pair: &str) -> bool {
    pair.starts_with(ESCAPED_COLON) || pair.starts_with(ESCAPED_STAR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::decode_component;

    #[test]
    fn escape_matches_form_encoding() {
        assert_eq!(escape(":userID"), "%3AuserID");
        assert_eq!(escape("*filepath"), "%2Afilepath");
        assert_eq!(escape("js/jquery.js"), "js%2Fjquery.js");
        assert_eq!(escape("a b&c=d"), "a+b%26c%3Dd");
        assert_eq!(escape("~user-name_1.0"), "~user-name_1.0");
        assert_eq!(escape("100%20"), "100%2520");
    }

    #[test]
    fn escape_then_decode_is_identity() {
        for raw in ["a b", "x/y?z", "ünïcode", "%41", "+plus+"] {
            assert_eq!(decode_component(&escape(raw)), raw);
        }
    }

    #[test]
    fn append_uses_ampersand_only_between_pairs() {
        let q = append_var("", ":a", "1");
        let q = append_var(&q, ":b", "2");
        assert_eq!(q, "%3Aa=1&%3Ab=2");
    }

    #[test]
    fn strip_removes_only_trailing_vars() {
        assert_eq!(strip_vars(""), "");
        assert_eq!(strip_vars("%3Aa=1&%3Ab=2"), "");
        assert_eq!(strip_vars("q=1&%3Aa=1"), "q=1");
        // a var-looking pair before an application pair is left alone
        assert_eq!(strip_vars("%3Aa=1&q=1"), "%3Aa=1&q=1");
    }

    #[test]
    fn strip_undoes_any_sequence_of_appends() {
        let originals = ["", "a=1", "a=1&b=two+words", "flag", "x=%3A"];
        let vars: &[(&str, &str)] = &[
            (":userID", "1234"),
            (":postID", "a b"),
            ("*path", "static/js/app.js"),
        ];
        for q in originals {
            for n in 0..=vars.len() {
                let mut injected = q.to_owned();
                for (k, v) in &vars[..n] {
                    injected = append_var(&injected, k, v);
                }
                assert_eq!(strip_vars(&injected), q, "after {n} vars on {q:?}");
            }
        }
    }
}
