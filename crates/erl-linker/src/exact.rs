//! Exact-name matching against a knowledge base

use crate::{LinkError, Linker, NilLinker, Resolver};
use erl_domain::{KnowledgeBase, Link, Query, SearchHit};
use std::collections::BTreeSet;

/// Links a query to the entity whose name equals the mention exactly
///
/// Matching is case- and diacritic-sensitive. When nothing matches, the
/// configured fallback decides (a [`NilLinker`] by default). As a
/// [`Resolver`] it declines instead of falling back.
pub struct ExactMatchLinker<K> {
    kb: K,
    fallback: Box<dyn Linker>,
}

impl<K: KnowledgeBase> ExactMatchLinker<K> {
    /// Match against `kb`, falling back to fresh NIL placeholders
    pub fn new(kb: K) -> Self {
        Self::with_fallback(kb, Box::new(NilLinker::new()))
    }

    /// Match against `kb`, delegating misses to `fallback`
    pub fn with_fallback(kb: K, fallback: Box<dyn Linker>) -> Self {
        Self { kb, fallback }
    }

    /// The knowledge base consulted
    pub fn knowledge_base(&self) -> &K {
        &self.kb
    }

    fn link_hit(query: &Query, hits: &[SearchHit]) -> Result<Option<Link>, LinkError> {
        match hits.iter().find(|hit| hit.name == query.name()) {
            Some(hit) => Ok(Some(Link::for_query(
                query,
                hit.id.clone(),
                hit.entity_type,
                false,
            )?)),
            None => Ok(None),
        }
    }

    fn link_or_fall_back(&self, query: &Query, found: Option<Link>) -> Result<Link, LinkError> {
        match found {
            Some(link) => Ok(link),
            None => {
                tracing::debug!(
                    "No exact match for {:?} (query {}); using fallback",
                    query.name(),
                    query.id()
                );
                self.fallback.link(query)
            }
        }
    }
}

impl<K: KnowledgeBase> Resolver for ExactMatchLinker<K> {
    fn resolve(&self, query: &Query) -> Result<Option<Link>, LinkError> {
        let hits = self.kb.search(query.name())?;
        Self::link_hit(query, &hits)
    }

    fn name(&self) -> &str {
        "exact-match"
    }
}

impl<K: KnowledgeBase> Linker for ExactMatchLinker<K> {
    fn link(&self, query: &Query) -> Result<Link, LinkError> {
        let found = self.resolve(query)?;
        self.link_or_fall_back(query, found)
    }

    /// Resolve queries in order, looking up all distinct names in one batch search
    fn batch_link(&self, queries: &[Query]) -> Result<Vec<Link>, LinkError> {
        let names: BTreeSet<String> = queries.iter().map(|q| q.name().to_string()).collect();
        let results = self.kb.batch_search(&names)?;

        queries
            .iter()
            .map(|query| {
                let hits = results.get(query.name()).map(Vec::as_slice).unwrap_or(&[]);
                let found = Self::link_hit(query, hits)?;
                self.link_or_fall_back(query, found)
            })
            .collect()
    }
}
