//! Ordered resolver chains

use crate::{ExactMatchLinker, LinkError, Linker, NilLinker, Resolver};
use erl_domain::{KnowledgeBase, Link, Query};

/// Resolvers tried in order until one produces a link
///
/// # Examples
///
/// ```
/// use erl_domain::Query;
/// use erl_linker::{Linker, LinkerChain, NilLinker};
///
/// let chain = LinkerChain::new().with(NilLinker::new());
/// let query = Query::new("EL1", "Pariss", "doc").unwrap();
/// assert_eq!(chain.link(&query).unwrap().entity_id(), "NIL1");
/// ```
#[derive(Default)]
pub struct LinkerChain {
    resolvers: Vec<Box<dyn Resolver>>,
}

impl LinkerChain {
    /// Create an empty chain; it declines every query until resolvers are added
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact name match, then a fresh NIL placeholder
    pub fn exact_then_nil<K: KnowledgeBase + 'static>(kb: K) -> Self {
        Self::new()
            .with(ExactMatchLinker::new(kb))
            .with(NilLinker::new())
    }

    /// Append a resolver, builder style
    pub fn with<R: Resolver + 'static>(mut self, resolver: R) -> Self {
        self.push(Box::new(resolver));
        self
    }

    /// Append a resolver
    pub fn push(&mut self, resolver: Box<dyn Resolver>) {
        self.resolvers.push(resolver);
    }

    /// Number of resolvers
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Whether the chain has no resolvers
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Resolver labels in order
    pub fn names(&self) -> Vec<&str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }
}

impl Resolver for LinkerChain {
    fn resolve(&self, query: &Query) -> Result<Option<Link>, LinkError> {
        for resolver in &self.resolvers {
            if let Some(link) = resolver.resolve(query)? {
                tracing::trace!("{} resolved query {} to {}", resolver.name(), query.id(), link.entity_id());
                return Ok(Some(link));
            }
        }
        Ok(None)
    }

    fn name(&self) -> &str {
        "chain"
    }
}

impl Linker for LinkerChain {
    fn link(&self, query: &Query) -> Result<Link, LinkError> {
        self.resolve(query)?
            .ok_or_else(|| LinkError::Unresolved(query.id().to_string()))
    }
}
