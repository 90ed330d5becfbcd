//! Where a bound argument came from.

use std::fmt;

/// Dispatch mode of the binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindMode {
    /// Web dispatch: entity parameters are model bound.
    Web,
    /// Command dispatch: no model binding.
    Command,
}

/// The resolution rule that produced an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindSource {
    /// The live request context.
    Context,
    /// An entity reused from the binding cache.
    CachedEntity,
    /// An entity fetched through the persistence collaborator.
    FetchedEntity,
    /// A registered service.
    Service,
    /// A captured route variable.
    Capture,
    /// The CLI options bag.
    Options,
    /// The parameter's default.
    Default,
}

impl fmt::Display for BindSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Context => write!(f, "context"),
            Self::CachedEntity => write!(f, "cached-entity"),
            Self::FetchedEntity => write!(f, "fetched-entity"),
            Self::Service => write!(f, "service"),
            Self::Capture => write!(f, "capture"),
            Self::Options => write!(f, "options"),
            Self::Default => write!(f, "default"),
        }
    }
}
