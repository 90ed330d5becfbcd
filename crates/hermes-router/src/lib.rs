//! Route pattern compiler and route table for Hermes.
//!
//! This crate turns route definitions into compiled [`Pattern`]s and keeps
//! them in a [`RouteTable`] keyed by [`RequestKind`] (an HTTP method or a
//! console command type).
//!
//! # Matching rules
//!
//! - Patterns are split into segments: `/` for web paths, whitespace for
//!   commands. `{name}` segments are variables.
//! - A route matches only when the input has exactly as many tokens as the
//!   pattern and every literal segment is equal to its token.
//! - A variable captures exactly one token. There are no wildcards, regular
//!   expressions or prefix matches.
//! - Routes are tried in registration order; the first match wins.
//!
//! # Example
//!
//! ```rust
//! use hermes_router::{HandlerRef, RequestKind, RouteTable};
//! use http::Method;
//!
//! let mut table = RouteTable::new();
//! let get = RequestKind::http(Method::GET);
//! table.register(get.clone(), "/orgs/{org}/users/{user}", HandlerRef::new("users", "show"), vec![]).unwrap();
//!
//! let m = table.lookup_str(&get, "/orgs/acme/users/123").unwrap();
//! assert_eq!(m.captures().get("org"), Some("acme"));
//! assert_eq!(m.captures().get("user"), Some("123"));
//! ```

#![forbid(unsafe_code)]

mod kind;
mod params;
mod pattern;
mod table;

pub use kind::{split_command, split_path, RequestKind, DEFAULT_COMMAND_KIND};
pub use params::Captures;
pub use pattern::{Pattern, PatternError, Segment};
pub use table::{HandlerRef, RouteDeclaration, RouteEntry, RouteMatch, RouteTable};

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use proptest::prelude::*;

    fn segment() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,7}"
    }

    proptest! {
        #[test]
        fn prop_variables_capture_their_positions(
            shape in prop::collection::vec(any::<bool>(), 1..6),
            literals in prop::collection::vec(segment(), 6),
            values in prop::collection::vec(segment(), 6),
        ) {
            let mut source = String::new();
            let mut input = Vec::new();
            for (i, is_var) in shape.iter().enumerate() {
                if *is_var {
                    source.push_str(&format!("/{{v{i}}}"));
                    input.push(values[i].clone());
                } else {
                    source.push_str(&format!("/{}", literals[i]));
                    input.push(literals[i].clone());
                }
            }

            let kind = RequestKind::http(Method::GET);
            let mut table = RouteTable::new();
            table.register(kind.clone(), &source, HandlerRef::new("c", "a"), vec![]).unwrap();

            let tokens: Vec<&str> = input.iter().map(String::as_str).collect();
            let found = table.lookup(&kind, &tokens).unwrap();
            prop_assert_eq!(found.route().pattern().source(), source.as_str());
            for (i, is_var) in shape.iter().enumerate() {
                if *is_var {
                    let name = format!("v{i}");
                    prop_assert_eq!(found.captures().get(&name), Some(values[i].as_str()));
                }
            }
        }

        #[test]
        fn prop_length_mismatch_is_not_found(
            lengths in prop::collection::btree_set(0usize..5, 1..4),
            extra in 5usize..9,
        ) {
            let kind = RequestKind::http(Method::GET);
            let mut table = RouteTable::new();
            for len in &lengths {
                let source: String = (0..*len).map(|i| format!("/{{p{i}}}")).collect();
                let source = if source.is_empty() { "/".to_string() } else { source };
                table.register(kind.clone(), &source, HandlerRef::new("c", "a"), vec![]).unwrap();
            }

            let tokens = vec!["x"; extra];
            prop_assert!(table.lookup(&kind, &tokens).is_none());
        }
    }
}
