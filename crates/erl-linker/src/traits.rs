//! Linking abstractions

use crate::LinkError;
use erl_domain::{Link, Query};

/// Turns a query into a link, always producing an answer unless a backend fails
pub trait Linker: Send + Sync {
    /// Resolve one query
    fn link(&self, query: &Query) -> Result<Link, LinkError>;

    /// Resolve queries in order
    ///
    /// Sequential; the first failure aborts the batch and no partial result
    /// is returned.
    fn batch_link(&self, queries: &[Query]) -> Result<Vec<Link>, LinkError> {
        queries.iter().map(|query| self.link(query)).collect()
    }
}

/// A resolution strategy that may decline a query
///
/// Resolvers are composed into a [`LinkerChain`](crate::LinkerChain); the
/// first one to return `Some` decides the link.
pub trait Resolver: Send + Sync {
    /// Try to resolve a query; `Ok(None)` passes it to the next resolver
    fn resolve(&self, query: &Query) -> Result<Option<Link>, LinkError>;

    /// Label used in log lines
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<L: Linker + ?Sized> Linker for Box<L> {
    fn link(&self, query: &Query) -> Result<Link, LinkError> {
        (**self).link(query)
    }

    fn batch_link(&self, queries: &[Query]) -> Result<Vec<Link>, LinkError> {
        (**self).batch_link(queries)
    }
}

impl<L: Linker + ?Sized> Linker for std::sync::Arc<L> {
    fn link(&self, query: &Query) -> Result<Link, LinkError> {
        (**self).link(query)
    }

    fn batch_link(&self, queries: &[Query]) -> Result<Vec<Link>, LinkError> {
        (**self).batch_link(queries)
    }
}
