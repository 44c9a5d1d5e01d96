//! The routing trie: one node per path prefix.

use std::collections::HashMap;

use super::handler::Handler;
use super::pattern::Segment;
use super::RouteError;
use crate::http::Method;

/// A variable edge out of a node. The name keeps its `:` or `*` prefix.
struct VarEdge {
    name: String,
    child: Box<Node>,
}

impl VarEdge {
    fn is_suffix(&self) -> bool {
        self.name.starts_with('*')
    }
}

#[derive(Default)]
pub(crate) struct Node {
    children: HashMap<String, Node>,
    var: Option<VarEdge>,
    // Kept in registration order; methods are unique per node.
    handlers: Vec<(Method, Handler)>,
}

/// Result of walking a path through the trie.
pub(crate) struct Walk<'a> {
    pub(crate) node: &'a Node,
    /// Captured `(prefixed name, value)` pairs in root-to-leaf order.
    pub(crate) vars: Vec<(&'a str, String)>,
}

impl Node {
    /// Inserts `handler` for `method` at the node reached by `segments`.
    ///
    /// A conflict can only be detected on nodes that already existed, so a
    /// failed insert never leaves new nodes behind.
    pub(crate) fn insert(
        &mut self,
        pattern: &str,
        segments: &[Segment<'_>],
        method: Method,
        handler: Handler,
    ) -> Result<(), RouteError> {
        let mut node = self;

        for segment in segments {
            node = match *segment {
                Segment::Literal(part) => node.children.entry(part.to_owned()).or_default(),
                Segment::Single(name) | Segment::Suffix(name) => {
                    let edge = node.var.get_or_insert_with(|| VarEdge {
                        name: name.to_owned(),
                        child: Box::default(),
                    });
                    if edge.name != name {
                        return Err(RouteError::ConflictingVariable {
                            pattern: pattern.to_owned(),
                            existing: edge.name.clone(),
                            requested: name.to_owned(),
                        });
                    }
                    &mut *edge.child
                }
            };
        }

        if node.handler(&method).is_some() {
            return Err(RouteError::ConflictingMethod {
                method,
                pattern: pattern.to_owned(),
            });
        }
        node.handlers.push((method, handler));
        Ok(())
    }

    /// Walks `parts` from this node, preferring literal edges over the
    /// variable edge at every step. Never backtracks.
    pub(crate) fn walk<'a>(&'a self, parts: &[&str]) -> Option<Walk<'a>> {
        let mut node = self;
        let mut vars = Vec::new();

        for (i, &part) in parts.iter().enumerate() {
            if let Some(child) = node.children.get(part) {
                node = child;
                continue;
            }
            let edge = node.var.as_ref()?;
            if edge.is_suffix() {
                vars.push((edge.name.as_str(), parts[i..].join("/")));
                node = &*edge.child;
                break;
            }
            vars.push((edge.name.as_str(), part.to_owned()));
            node = &*edge.child;
        }

        Some(Walk { node, vars })
    }

    pub(crate) fn handler(&self, method: &Method) -> Option<&Handler> {
        self.handlers
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, h)| h)
    }

    pub(crate) fn methods(&self) -> impl Iterator<Item = &Method> {
        self.handlers.iter().map(|(m, _)| m)
    }

    pub(crate) fn is_terminal(&self) -> bool {
        !self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Response, StatusCode};
    use crate::router::handler::into_handler;
    use crate::router::pattern::{compile, split_path};

    fn dummy() -> Handler {
        into_handler(|_req| async { Response::new(StatusCode::Ok) })
    }

    fn insert(root: &mut Node, method: Method, pattern: &str) -> Result<(), RouteError> {
        let segments = compile(pattern)?;
        root.insert(pattern, &segments, method, dummy())
    }

    fn walk<'a>(root: &'a Node, path: &str) -> Option<Walk<'a>> {
        root.walk(&split_path(path))
    }

    #[test]
    fn literal_beats_variable() {
        let mut root = Node::default();
        insert(&mut root, Method::Get, "/:x").unwrap();
        insert(&mut root, Method::Get, "/foo").unwrap();

        let w = walk(&root, "/foo").unwrap();
        assert!(w.vars.is_empty());
        assert!(w.node.is_terminal());

        let w = walk(&root, "/bar").unwrap();
        assert_eq!(w.vars, vec![(":x", "bar".to_owned())]);
    }

    #[test]
    fn suffix_captures_the_remainder() {
        let mut root = Node::default();
        insert(&mut root, Method::Get, "/static/*filepath").unwrap();
        let w = walk(&root, "/static/js/jquery.js").unwrap();
        assert_eq!(w.vars, vec![("*filepath", "js/jquery.js".to_owned())]);
        assert!(w.node.is_terminal());
    }

    #[test]
    fn suffix_needs_at_least_one_component() {
        let mut root = Node::default();
        insert(&mut root, Method::Get, "/static/*filepath").unwrap();
        let w = walk(&root, "/static").unwrap();
        assert!(!w.node.is_terminal());
    }

    #[test]
    fn no_backtracking_after_literal_match() {
        let mut root = Node::default();
        insert(&mut root, Method::Get, "/a/b").unwrap();
        insert(&mut root, Method::Get, "/:x/c").unwrap();
        // "a" takes the literal edge, which has no "c" and no variable edge
        assert!(walk(&root, "/a/c").is_none());
        assert!(walk(&root, "/z/c").unwrap().node.is_terminal());
    }

    #[test]
    fn same_variable_name_shares_the_subtree() {
        let mut root = Node::default();
        insert(&mut root, Method::Get, "/accounts/:accountID").unwrap();
        insert(&mut root, Method::Put, "/accounts/:accountID").unwrap();
        insert(&mut root, Method::Post, "/accounts/:accountID/posts").unwrap();

        let w = walk(&root, "/accounts/9").unwrap();
        let methods: Vec<_> = w.node.methods().cloned().collect();
        assert_eq!(methods, vec![Method::Get, Method::Put]);
    }

    #[test]
    fn different_variable_name_conflicts() {
        let mut root = Node::default();
        insert(&mut root, Method::Get, "/users/:userID").unwrap();
        let err = insert(&mut root, Method::Get, "/users/:accountID/x").unwrap_err();
        assert_eq!(
            err,
            RouteError::ConflictingVariable {
                pattern: "/users/:accountID/x".to_owned(),
                existing: ":userID".to_owned(),
                requested: ":accountID".to_owned(),
            }
        );
    }

    #[test]
    fn single_and_suffix_at_same_position_conflict() {
        let mut root = Node::default();
        insert(&mut root, Method::Get, "/").unwrap();
        insert(&mut root, Method::Get, "/*path").unwrap();
        let err = insert(&mut root, Method::Get, "/:name").unwrap_err();
        assert!(matches!(err, RouteError::ConflictingVariable { .. }));
    }

    #[test]
    fn duplicate_method_conflicts() {
        let mut root = Node::default();
        insert(&mut root, Method::Get, "/foo").unwrap();
        let err = insert(&mut root, Method::Get, "/foo/").unwrap_err();
        assert!(matches!(err, RouteError::ConflictingMethod { .. }));
        insert(&mut root, Method::Post, "/foo/").unwrap();
    }
}
