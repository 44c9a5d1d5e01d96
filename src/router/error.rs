use thiserror::Error;

use crate::http::Method;

/// Errors raised while registering routes or building URLs.
///
/// All of them point at a programming mistake, so the non-`try` router
/// methods panic with this message instead of returning it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route: {pattern:?} is not a valid pattern: {reason}")]
    InvalidPattern {
        pattern: String,
        reason: &'static str,
    },

    #[error("route: a handler is required for {method} {pattern:?}")]
    InvalidHandler { method: Method, pattern: String },

    #[error("route: there is already a pattern named {name:?}")]
    DuplicateName { name: String },

    #[error(
        "route: {pattern:?} conflicts with a registered pattern: variable {requested} where {existing} is already registered"
    )]
    ConflictingVariable {
        pattern: String,
        existing: String,
        requested: String,
    },

    #[error("route: {method} {pattern:?} conflicts with a registered pattern")]
    ConflictingMethod { method: Method, pattern: String },

    #[error("route: there is no pattern named {name:?}")]
    UnknownName { name: String },

    #[error("route: not enough arguments to fill in {pattern:?}: expected {expected}, got {got}")]
    TooFewArguments {
        pattern: String,
        expected: usize,
        got: usize,
    },

    #[error("route: too many arguments to fill in {pattern:?}: expected {expected}, got {got}")]
    TooManyArguments {
        pattern: String,
        expected: usize,
        got: usize,
    },
}
