//! The route table.
//!
//! Routes are stored per [`RequestKind`] in registration order. Lookup walks
//! that list and returns the first route whose pattern matches the tokenized
//! input, so when two variable patterns could match the same input the one
//! registered first wins.
//!
//! # Example
//!
//! ```rust
//! use hermes_router::{HandlerRef, RequestKind, RouteTable};
//! use http::Method;
//!
//! let mut table = RouteTable::new();
//! let get = RequestKind::http(Method::GET);
//!
//! table.register(get.clone(), "/users", HandlerRef::new("users", "index"), vec![]).unwrap();
//! table.register(get.clone(), "/users/{user}", HandlerRef::new("users", "show"), vec![]).unwrap();
//!
//! let found = table.lookup(&get, &["users", "7"]).unwrap();
//! assert_eq!(found.route().handler().action(), "show");
//! assert_eq!(found.captures().get("user"), Some("7"));
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::kind::RequestKind;
use crate::params::Captures;
use crate::pattern::{Pattern, PatternError};

/// Identity of the handler a route dispatches to: a controller name and one
/// of its actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerRef {
    controller: String,
    action: String,
}

impl HandlerRef {
    /// Creates a handler reference.
    #[must_use]
    pub fn new(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            action: action.into(),
        }
    }

    /// The controller name.
    #[must_use]
    pub fn controller(&self) -> &str {
        &self.controller
    }

    /// The action (method) name.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.controller, self.action)
    }
}

/// A registered route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    kind: RequestKind,
    pattern: Pattern,
    handler: HandlerRef,
    middleware: Vec<String>,
}

impl RouteEntry {
    /// The request kind this route answers.
    #[must_use]
    pub fn kind(&self) -> &RequestKind {
        &self.kind
    }

    /// The compiled pattern.
    #[must_use]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// The handler this route dispatches to.
    #[must_use]
    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    /// Middleware names, global ones first.
    #[must_use]
    pub fn middleware(&self) -> &[String] {
        &self.middleware
    }
}

/// A route declaration as supplied by a loader at boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDeclaration {
    /// Request kind.
    pub kind: RequestKind,
    /// Pattern source, e.g. `/users/{user}`.
    pub pattern: String,
    /// Handler to dispatch to.
    pub handler: HandlerRef,
    /// Route-specific middleware names.
    pub middleware: Vec<String>,
}

/// A successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    route: &'a RouteEntry,
    captures: Captures,
}

impl<'a> RouteMatch<'a> {
    /// Creates a route match.
    #[must_use]
    pub fn new(route: &'a RouteEntry, captures: Captures) -> Self {
        Self { route, captures }
    }

    /// The matched route.
    #[must_use]
    pub fn route(&self) -> &'a RouteEntry {
        self.route
    }

    /// Variables captured from the input.
    #[must_use]
    pub fn captures(&self) -> &Captures {
        &self.captures
    }

    /// Splits the match into its parts.
    #[must_use]
    pub fn into_parts(self) -> (&'a RouteEntry, Captures) {
        (self.route, self.captures)
    }
}

/// Routes keyed by request kind, in registration order.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<RequestKind, Vec<RouteEntry>>,
    global_middleware: Vec<String>,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table whose routes all start with `middleware`.
    #[must_use]
    pub fn with_global_middleware(middleware: Vec<String>) -> Self {
        Self {
            routes: HashMap::new(),
            global_middleware: middleware,
        }
    }

    /// Global middleware merged into every route registered afterwards.
    #[must_use]
    pub fn global_middleware(&self) -> &[String] {
        &self.global_middleware
    }

    /// Registers a route.
    ///
    /// The stored middleware list is the global middleware followed by the
    /// route's own middleware that is not already global. Registering the
    /// same `(kind, pattern)` twice replaces the earlier entry in place.
    pub fn register(
        &mut self,
        kind: RequestKind,
        pattern: &str,
        handler: HandlerRef,
        middleware: Vec<String>,
    ) -> Result<&RouteEntry, PatternError> {
        let compiled = Pattern::compile(&kind, pattern)?;

        let mut merged = self.global_middleware.clone();
        for name in middleware {
            if !merged.contains(&name) {
                merged.push(name);
            }
        }

        let entry = RouteEntry {
            kind: kind.clone(),
            pattern: compiled,
            handler,
            middleware: merged,
        };

        let routes = self.routes.entry(kind).or_default();
        let index = match routes
            .iter()
            .position(|r| r.pattern.segments() == entry.pattern.segments())
        {
            Some(index) => {
                routes[index] = entry;
                index
            }
            None => {
                routes.push(entry);
                routes.len() - 1
            }
        };

        Ok(&routes[index])
    }

    /// Registers a batch of declarations, stopping at the first bad pattern.
    ///
    /// Returns the number of routes registered.
    pub fn register_all<I>(&mut self, declarations: I) -> Result<usize, PatternError>
    where
        I: IntoIterator<Item = RouteDeclaration>,
    {
        let mut count = 0;
        for decl in declarations {
            self.register(decl.kind, &decl.pattern, decl.handler, decl.middleware)?;
            count += 1;
        }
        Ok(count)
    }

    /// Looks up the first route of `kind` matching `tokens`.
    #[must_use]
    pub fn lookup(&self, kind: &RequestKind, tokens: &[&str]) -> Option<RouteMatch<'_>> {
        self.routes
            .get(kind)?
            .iter()
            .find_map(|route| route.pattern.matches(tokens).map(|c| RouteMatch::new(route, c)))
    }

    /// Tokenizes `input` for `kind` and looks it up.
    #[must_use]
    pub fn lookup_str(&self, kind: &RequestKind, input: &str) -> Option<RouteMatch<'_>> {
        let tokens = kind.tokenize(input);
        self.lookup(kind, &tokens)
    }

    /// Finds the first route of `kind` whose leading literal words equal the
    /// start of `tokens`, regardless of the remaining length.
    ///
    /// Used by command dispatch to report arity problems for a recognized
    /// command instead of "unknown command".
    #[must_use]
    pub fn find_by_head(&self, kind: &RequestKind, tokens: &[&str]) -> Option<&RouteEntry> {
        self.routes.get(kind)?.iter().find(|route| {
            let head = route.pattern.literal_head();
            !head.is_empty() && tokens.len() >= head.len() && head[..] == tokens[..head.len()]
        })
    }

    /// Routes registered for `kind`, in registration order.
    pub fn routes(&self, kind: &RequestKind) -> impl Iterator<Item = &RouteEntry> {
        self.routes.get(kind).into_iter().flatten()
    }

    /// Every registered route, grouped by kind.
    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.routes.values().flatten()
    }

    /// Total number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    /// True if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
