//! Link module - resolution decisions

use crate::{DomainError, EntityType, Genre, Query};
use std::fmt;

/// The resolution decision produced for one query
///
/// Links are produced once per query and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    query_id: String,
    entity_id: String,
    entity_type: EntityType,
    web_search: bool,
    genre: Genre,
}

impl Link {
    /// Create a link; query id and entity id must both be non-empty
    pub fn new(
        query_id: impl Into<String>,
        entity_id: impl Into<String>,
        entity_type: EntityType,
        web_search: bool,
        genre: Genre,
    ) -> Result<Self, DomainError> {
        let query_id = query_id.into();
        let entity_id = entity_id.into();
        if query_id.is_empty() {
            return Err(DomainError::EmptyField("query id"));
        }
        if entity_id.is_empty() {
            return Err(DomainError::EmptyField("entity id"));
        }
        Ok(Self {
            query_id,
            entity_id,
            entity_type,
            web_search,
            genre,
        })
    }

    /// Create a link for `query`, deriving the genre from its document id
    ///
    /// # Examples
    ///
    /// ```
    /// use erl_domain::{EntityType, Genre, Link, Query};
    ///
    /// let query = Query::new("EL1", "Paris", "APW_ENG_20080502.0001").unwrap();
    /// let link = Link::for_query(&query, "E0001", EntityType::GeoPolitical, false).unwrap();
    /// assert_eq!(link.genre(), Genre::Newswire);
    /// ```
    pub fn for_query(
        query: &Query,
        entity_id: impl Into<String>,
        entity_type: EntityType,
        web_search: bool,
    ) -> Result<Self, DomainError> {
        Self::new(
            query.id(),
            entity_id,
            entity_type,
            web_search,
            Genre::for_document_id(query.doc_id()),
        )
    }

    /// Id of the query this link answers
    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    /// Resolved KB id or synthetic NIL id
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Type of the resolved entity
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Whether external web search aided the decision
    pub fn web_search(&self) -> bool {
        self.web_search
    }

    /// Genre of the query's source document
    pub fn genre(&self) -> Genre {
        self.genre
    }

    /// Whether the link points at a synthetic placeholder
    pub fn is_nil(&self) -> bool {
        self.entity_id.starts_with(crate::NIL_PREFIX)
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.query_id,
            self.entity_id,
            self.entity_type,
            if self.web_search { "Y" } else { "N" },
            self.genre
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_rejects_empty_ids() {
        assert!(Link::new("", "E1", EntityType::Person, false, Genre::Web).is_err());
        assert!(Link::new("Q1", "", EntityType::Person, false, Genre::Web).is_err());
    }

    #[test]
    fn test_nil_detection() {
        let link = Link::new("Q1", "NIL12", EntityType::Unknown, false, Genre::Web).unwrap();
        assert!(link.is_nil());
        assert_eq!(link.to_string(), "Q1\tNIL12\tUKN\tN\tWB");
    }
}
