//! Pattern compilation: path cleaning and segment classification.

use super::RouteError;

/// One component of a compiled pattern.
///
/// Variable names keep their prefix (`:id`, `*filepath`); the prefixed form
/// is what ends up as the query key on a matched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Literal(&'a str),
    /// `:name`, matches exactly one path component.
    Single(&'a str),
    /// `*name`, matches the rest of the path. Always last.
    Suffix(&'a str),
}

impl<'a> Segment<'a> {
    fn classify(part: &'a str) -> Self {
        if part.starts_with(':') {
            Segment::Single(part)
        } else if part.starts_with('*') {
            Segment::Suffix(part)
        } else {
            Segment::Literal(part)
        }
    }

    pub(crate) fn is_variable(&self) -> bool {
        !matches!(self, Segment::Literal(_))
    }
}

/// Splits a path into its components after lexical cleaning.
///
/// Empty components and `.` are dropped, `..` removes the previous component
/// (never climbing above the root), and a trailing slash is ignored. The path
/// is always treated as rooted, so `"foo"` and `"/foo/"` both give `["foo"]`
/// and `"/"` gives nothing.
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }
    parts
}

/// Returns the canonical, rooted form of `path`.
///
/// ```text
/// /a//b/./c/..   ->  /a/b
/// /foo/          ->  /foo
/// ../x           ->  /x
/// ```
pub(crate) fn clean_path(path: &str) -> String {
    join_rooted(&split_path(path))
}

pub(crate) fn join_rooted(parts: &[&str]) -> String {
    let mut out = String::with_capacity(parts.iter().map(|p| p.len() + 1).sum::<usize>().max(1));
    for part in parts {
        out.push('/');
        out.push_str(part);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Compiles a pattern into its ordered segments.
///
/// # Errors
///
/// [`RouteError::InvalidPattern`] when the pattern is empty or a suffix
/// variable is followed by more segments.
pub(crate) fn compile(pattern: &str) -> Result<Vec<Segment<'_>>, RouteError> {
    if pattern.is_empty() {
        return Err(RouteError::InvalidPattern {
            pattern: String::new(),
            reason: "pattern is empty",
        });
    }

    let segments: Vec<Segment<'_>> = split_path(pattern)
        .into_iter()
        .map(Segment::classify)
        .collect();

    let last = segments.len().saturating_sub(1);
    if let Some(pos) = segments.iter().position(|s| matches!(s, Segment::Suffix(_))) {
        if pos != last {
            return Err(RouteError::InvalidPattern {
                pattern: pattern.to_owned(),
                reason: "suffix variables cannot contain '/'",
            });
        }
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_collapses_dots_and_slashes() {
        assert_eq!(clean_path("/"), "/");
        assert_eq!(clean_path(""), "/");
        assert_eq!(clean_path("/foo/"), "/foo");
        assert_eq!(clean_path("//a///b"), "/a/b");
        assert_eq!(clean_path("/a/./b/../c"), "/a/c");
        assert_eq!(clean_path("/../../x"), "/x");
        assert_eq!(clean_path("/a/b/.."), "/a");
        assert_eq!(clean_path("foo/bar"), "/foo/bar");
    }

    #[test]
    fn trailing_slash_compiles_identically() {
        assert_eq!(compile("/foo").unwrap(), compile("/foo/").unwrap());
    }

    #[test]
    fn root_compiles_to_no_segments() {
        assert!(compile("/").unwrap().is_empty());
    }

    #[test]
    fn classifies_segments() {
        let segs = compile("/users/:userID/files/*path").unwrap();
        assert_eq!(
            segs,
            vec![
                Segment::Literal("users"),
                Segment::Single(":userID"),
                Segment::Literal("files"),
                Segment::Suffix("*path"),
            ]
        );
        assert!(!segs[0].is_variable());
        assert!(segs[1].is_variable());
        assert!(segs[3].is_variable());
    }

    #[test]
    fn rejects_empty_pattern() {
        assert!(matches!(
            compile(""),
            Err(RouteError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn rejects_suffix_not_last() {
        let err = compile("/static/*filepath/foo").unwrap_err();
        assert!(matches!(err, RouteError::InvalidPattern { .. }));
    }

    #[test]
    fn suffix_dropped_by_dotdot_is_fine() {
        // cleaning happens first, so the suffix variable ends up last
        assert_eq!(
            compile("/static/*filepath/foo/..").unwrap(),
            vec![Segment::Literal("static"), Segment::Suffix("*filepath")]
        );
    }
}
