//! Query module - mention-resolution requests

use crate::DomainError;

/// Character offsets of a mention within its source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    begin: usize,
    end: usize,
}

impl Span {
    /// Create a span; `begin` must be strictly less than `end`
    pub fn new(begin: usize, end: usize) -> Result<Self, DomainError> {
        if begin >= end {
            return Err(DomainError::InvalidSpan { begin, end });
        }
        Ok(Self { begin, end })
    }

    /// Inclusive begin offset
    pub fn begin(&self) -> usize {
        self.begin
    }

    /// Exclusive end offset
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of characters covered
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    /// Always false; spans are never empty
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// A single mention awaiting resolution
///
/// Supplied by an external annotation pipeline and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    id: String,
    name: String,
    doc_id: String,
    span: Option<Span>,
    gold_entity_id: Option<String>,
}

impl Query {
    /// Create a query; the id must not be empty
    ///
    /// # Examples
    ///
    /// ```
    /// use erl_domain::Query;
    ///
    /// let query = Query::new("EL_00001", "Paris", "APW_ENG_20080502.0001").unwrap();
    /// assert_eq!(query.name(), "Paris");
    /// assert!(Query::new("", "Paris", "doc").is_err());
    /// ```
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        doc_id: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::EmptyField("query id"));
        }
        Ok(Self {
            id,
            name: name.into(),
            doc_id: doc_id.into(),
            span: None,
            gold_entity_id: None,
        })
    }

    /// Attach the mention's location in its document
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Attach the expected entity id (gold-standard query files only)
    pub fn with_gold_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.gold_entity_id = Some(entity_id.into());
        self
    }

    /// Query identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Mention surface text
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source document identifier
    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    /// Mention location, when known
    pub fn span(&self) -> Option<Span> {
        self.span
    }

    /// Expected entity id, when known
    pub fn gold_entity_id(&self) -> Option<&str> {
        self.gold_entity_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_bounds() {
        assert!(Span::new(3, 3).is_err());
        assert!(Span::new(5, 2).is_err());
        let span = Span::new(2, 7).unwrap();
        assert_eq!(span.len(), 5);
    }

    #[test]
    fn test_query_optional_parts() {
        let query = Query::new("EL1", "Paris", "doc1")
            .unwrap()
            .with_span(Span::new(0, 5).unwrap())
            .with_gold_entity_id("E0001");

        assert_eq!(query.span().map(|s| s.begin()), Some(0));
        assert_eq!(query.gold_entity_id(), Some("E0001"));
    }
}
