//! Entity module - canonical knowledge-base records

use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse type of a knowledge-base entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    /// A person
    Person,

    /// An organization
    Organization,

    /// A geo-political entity (country, city, state)
    GeoPolitical,

    /// Type could not be determined
    Unknown,
}

impl EntityType {
    /// Get the corpus type code (`PER`, `ORG`, `GPE`, `UKN`)
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Person => "PER",
            EntityType::Organization => "ORG",
            EntityType::GeoPolitical => "GPE",
            EntityType::Unknown => "UKN",
        }
    }

    /// Parse a corpus type code
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "PER" => Some(EntityType::Person),
            "ORG" => Some(EntityType::Organization),
            "GPE" => Some(EntityType::GeoPolitical),
            "UKN" => Some(EntityType::Unknown),
            _ => None,
        }
    }
}

impl std::str::FromStr for EntityType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| DomainError::UnknownEntityType(s.to_string()))
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fragment of a fact value: free text, or text anchored to another entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactFragment {
    /// Plain text
    Text(String),

    /// A reference to another entity, with its anchor text
    EntityRef {
        /// Referenced entity id
        entity_id: String,
        /// Anchor text as it appears in the infobox
        text: String,
    },
}

impl FactFragment {
    /// Text content of the fragment, regardless of kind
    pub fn text(&self) -> &str {
        match self {
            FactFragment::Text(text) => text,
            FactFragment::EntityRef { text, .. } => text,
        }
    }
}

/// An infobox-style attribute of an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    /// Attribute name (the infobox parameter)
    pub name: String,

    /// Ordered value fragments
    pub fragments: Vec<FactFragment>,
}

impl Fact {
    /// Create a fact with no fragments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fragments: Vec::new(),
        }
    }

    /// Ids of every entity referenced by this fact, in order
    pub fn referenced_ids(&self) -> impl Iterator<Item = &str> {
        self.fragments.iter().filter_map(|fragment| match fragment {
            FactFragment::EntityRef { entity_id, .. } => Some(entity_id.as_str()),
            FactFragment::Text(_) => None,
        })
    }

    /// The fact value rendered as plain text
    pub fn value(&self) -> String {
        self.fragments.iter().map(FactFragment::text).collect()
    }
}

/// A canonical knowledge-base entity
///
/// Entities are immutable once ingested; use [`Entity::builder`] to create one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: String,
    name: String,
    entity_type: EntityType,
    wiki_title: Option<String>,
    facts_class: Option<String>,
    text: Option<String>,
    facts: Vec<Fact>,
}

impl Entity {
    /// Start building an entity
    ///
    /// # Examples
    ///
    /// ```
    /// use erl_domain::{Entity, EntityType};
    ///
    /// let entity = Entity::builder("E0001", "Paris", EntityType::GeoPolitical)
    ///     .text("Paris is the capital of France.")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(entity.name(), "Paris");
    /// ```
    pub fn builder(
        id: impl Into<String>,
        name: impl Into<String>,
        entity_type: EntityType,
    ) -> EntityBuilder {
        EntityBuilder {
            id: id.into(),
            name: name.into(),
            entity_type,
            wiki_title: None,
            facts_class: None,
            text: None,
            facts: Vec::new(),
        }
    }

    /// Unique identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Friendly name, used for exact-name resolution
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entity type
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Canonical article title, if recorded
    pub fn wiki_title(&self) -> Option<&str> {
        self.wiki_title.as_deref()
    }

    /// Infobox template name, if recorded
    pub fn facts_class(&self) -> Option<&str> {
        self.facts_class.as_deref()
    }

    /// Descriptive text, if recorded
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Infobox facts, in corpus order
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }
}

/// Builder for [`Entity`]
#[derive(Debug, Clone)]
pub struct EntityBuilder {
    id: String,
    name: String,
    entity_type: EntityType,
    wiki_title: Option<String>,
    facts_class: Option<String>,
    text: Option<String>,
    facts: Vec<Fact>,
}

impl EntityBuilder {
    /// Set the canonical article title
    pub fn wiki_title(mut self, title: impl Into<String>) -> Self {
        self.wiki_title = Some(title.into());
        self
    }

    /// Set the infobox template name
    pub fn facts_class(mut self, class: impl Into<String>) -> Self {
        self.facts_class = Some(class.into());
        self
    }

    /// Set the descriptive text
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Append a fact
    pub fn fact(mut self, fact: Fact) -> Self {
        self.facts.push(fact);
        self
    }

    /// Finish the entity, rejecting an empty id or name
    pub fn build(self) -> Result<Entity, DomainError> {
        if self.id.is_empty() {
            return Err(DomainError::EmptyField("entity id"));
        }
        if self.name.is_empty() {
            return Err(DomainError::EmptyField("entity name"));
        }
        Ok(Entity {
            id: self.id,
            name: self.name,
            entity_type: self.entity_type,
            wiki_title: self.wiki_title,
            facts_class: self.facts_class,
            text: self.text,
            facts: self.facts,
        })
    }
}
