//! Streaming reader for the XML entity corpus
//!
//! The corpus is a `<knowledge_base>` document holding one `<entity>` record
//! per knowledge-base entry:
//!
//! ```xml
//! <knowledge_base>
//!   <entity id="E0000001" name="Paris" type="GPE" wiki_title="Paris">
//!     <facts class="Infobox City">
//!       <fact name="country"><link entity_id="E0000002">France</link></fact>
//!       <fact name="population">2,193,031</fact>
//!     </facts>
//!     <wiki_text><![CDATA[Paris is the capital of France.]]></wiki_text>
//!   </entity>
//! </knowledge_base>
//! ```
//!
//! Large corpora are split across `kb_part-<n>.xml` files. Any structural
//! problem is reported as [`StoreError::Corpus`] and is fatal to a build.

use crate::StoreError;
use erl_domain::{Entity, EntityBuilder, EntityType, Fact, FactFragment};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

const PART_PREFIX: &str = "kb_part-";
const PART_SUFFIX: &str = ".xml";

/// List the corpus files to ingest, in deterministic order
///
/// A directory expands to every `kb_part-<n>.xml` inside it, sorted by the
/// numeric part. A plain file is returned on its own.
pub fn corpus_files(path: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let metadata = std::fs::metadata(path)?;
    if !metadata.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut parts = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let file_name = entry.file_name();
        if let Some(part) = file_name.to_str().and_then(part_number) {
            parts.push((part, entry.path()));
        }
    }
    parts.sort();

    tracing::debug!("Found {} corpus parts in {}", parts.len(), path.display());
    Ok(parts.into_iter().map(|(_, path)| path).collect())
}

/// Numeric part of a `kb_part-<n>.xml` file name
fn part_number(file_name: &str) -> Option<u64> {
    let digits = file_name
        .strip_prefix(PART_PREFIX)?
        .strip_suffix(PART_SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Iterator over the entity records of one corpus file
///
/// Yields entities in document order. After the first error the iterator is
/// exhausted.
pub struct CorpusReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    source: PathBuf,
    opened: bool,
    finished: bool,
}

impl CorpusReader<BufReader<File>> {
    /// Open a corpus file
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), path))
    }
}

impl<R: BufRead> CorpusReader<R> {
    /// Read a corpus from any buffered source; `source` is used in error messages
    pub fn new(input: R, source: impl Into<PathBuf>) -> Self {
        let mut reader = Reader::from_reader(input);
        reader.config_mut().expand_empty_elements = true;
        Self {
            reader,
            buf: Vec::new(),
            source: source.into(),
            opened: false,
            finished: false,
        }
    }

    fn malformed(&self, message: impl Into<String>) -> StoreError {
        StoreError::Corpus {
            file: self.source.clone(),
            position: self.reader.buffer_position() as u64,
            message: message.into(),
        }
    }

    fn next_event(&mut self) -> Result<Event<'static>, StoreError> {
        self.buf.clear();
        match self.reader.read_event_into(&mut self.buf) {
            Ok(event) => Ok(event.into_owned()),
            Err(e) => Err(self.malformed(e.to_string())),
        }
    }

    fn attribute(&self, element: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, StoreError> {
        for attr in element.attributes() {
            let attr = attr.map_err(|e| self.malformed(e.to_string()))?;
            if attr.key.as_ref() == name {
                let value = attr
                    .unescape_value()
                    .map_err(|e| self.malformed(e.to_string()))?;
                return Ok(Some(value.into_owned()));
            }
        }
        Ok(None)
    }

    fn required_attribute(&self, element: &BytesStart<'_>, name: &str) -> Result<String, StoreError> {
        self.attribute(element, name.as_bytes())?.ok_or_else(|| {
            self.malformed(format!(
                "<{}> is missing required attribute \"{}\"",
                element_name(element),
                name
            ))
        })
    }

    /// Decode a text or CDATA event; `None` for any other event
    fn text_of(&self, event: &Event<'_>) -> Result<Option<String>, StoreError> {
        match event {
            Event::Text(text) => text
                .unescape()
                .map(|t| Some(t.into_owned()))
                .map_err(|e| self.malformed(e.to_string())),
            Event::CData(data) => std::str::from_utf8(data)
                .map(|t| Some(t.to_string()))
                .map_err(|e| self.malformed(e.to_string())),
            _ => Ok(None),
        }
    }

    /// Advance to the next `<entity>` start tag, or `None` at the end of the corpus
    fn next_entity_start(&mut self) -> Result<Option<BytesStart<'static>>, StoreError> {
        loop {
            let event = self.next_event()?;
            match event {
                Event::Start(element)
                    if !self.opened && element.name().as_ref() == b"knowledge_base" =>
                {
                    self.opened = true;
                }
                Event::Start(element) if self.opened && element.name().as_ref() == b"entity" => {
                    return Ok(Some(element));
                }
                Event::Start(element) => {
                    return Err(self.malformed(format!(
                        "unexpected element <{}>",
                        element_name(&element)
                    )))
                }
                Event::End(element) if element.name().as_ref() == b"knowledge_base" => {
                    self.opened = false;
                }
                Event::Eof => {
                    if self.opened {
                        return Err(self.malformed("unexpected end of file inside <knowledge_base>"));
                    }
                    return Ok(None);
                }
                ref other => self.reject_stray_text(other)?,
            }
        }
    }

    fn reject_stray_text(&self, event: &Event<'_>) -> Result<(), StoreError> {
        if let Some(text) = self.text_of(event)? {
            if !text.trim().is_empty() {
                return Err(self.malformed(format!("unexpected text \"{}\"", text.trim())));
            }
        }
        Ok(())
    }

    fn read_entity(&mut self, start: &BytesStart<'_>) -> Result<Entity, StoreError> {
        let id = self.required_attribute(start, "id")?;
        let name = self.required_attribute(start, "name")?;
        let code = self.required_attribute(start, "type")?;
        let entity_type = EntityType::parse(&code)
            .ok_or_else(|| self.malformed(format!("unknown entity type \"{}\"", code)))?;

        let mut builder = Entity::builder(id, name, entity_type);
        if let Some(title) = self.attribute(start, b"wiki_title")? {
            builder = builder.wiki_title(title);
        }

        loop {
            let event = self.next_event()?;
            match event {
                Event::Start(element) => match element.name().as_ref() {
                    b"facts" => builder = self.read_facts(&element, builder)?,
                    b"wiki_text" => {
                        let text = self.read_leaf_text(b"wiki_text")?;
                        builder = builder.text(text);
                    }
                    _ => {
                        return Err(self.malformed(format!(
                            "unexpected element <{}> inside <entity>",
                            element_name(&element)
                        )))
                    }
                },
                Event::End(element) if element.name().as_ref() == b"entity" => break,
                Event::Eof => return Err(self.malformed("unexpected end of file inside <entity>")),
                ref other => self.reject_stray_text(other)?,
            }
        }

        builder.build().map_err(|e| self.malformed(e.to_string()))
    }

    fn read_facts(
        &mut self,
        start: &BytesStart<'_>,
        mut builder: EntityBuilder,
    ) -> Result<EntityBuilder, StoreError> {
        if let Some(class) = self.attribute(start, b"class")? {
            builder = builder.facts_class(class);
        }

        loop {
            let event = self.next_event()?;
            match event {
                Event::Start(element) if element.name().as_ref() == b"fact" => {
                    let name = self.required_attribute(&element, "name")?;
                    let fact = self.read_fact(Fact::new(name))?;
                    builder = builder.fact(fact);
                }
                Event::Start(element) => {
                    return Err(self.malformed(format!(
                        "unexpected element <{}> inside <facts>",
                        element_name(&element)
                    )))
                }
                Event::End(element) if element.name().as_ref() == b"facts" => return Ok(builder),
                Event::Eof => return Err(self.malformed("unexpected end of file inside <facts>")),
                ref other => self.reject_stray_text(other)?,
            }
        }
    }

    fn read_fact(&mut self, mut fact: Fact) -> Result<Fact, StoreError> {
        loop {
            let event = self.next_event()?;
            match event {
                Event::Start(element) if element.name().as_ref() == b"link" => {
                    let entity_id = self.attribute(&element, b"entity_id")?;
                    let text = self.read_leaf_text(b"link")?;
                    fact.fragments.push(match entity_id {
                        Some(entity_id) => FactFragment::EntityRef { entity_id, text },
                        None => FactFragment::Text(text),
                    });
                }
                Event::Start(element) => {
                    return Err(self.malformed(format!(
                        "unexpected element <{}> inside <fact>",
                        element_name(&element)
                    )))
                }
                Event::End(element) if element.name().as_ref() == b"fact" => return Ok(fact),
                Event::Eof => return Err(self.malformed("unexpected end of file inside <fact>")),
                ref other => {
                    if let Some(text) = self.text_of(other)? {
                        if !text.is_empty() {
                            fact.fragments.push(FactFragment::Text(text));
                        }
                    }
                }
            }
        }
    }

    /// Collect the text of an element that must not contain child elements
    fn read_leaf_text(&mut self, tag: &[u8]) -> Result<String, StoreError> {
        let mut text = String::new();
        loop {
            let event = self.next_event()?;
            match event {
                Event::End(element) if element.name().as_ref() == tag => return Ok(text),
                Event::Start(element) => {
                    return Err(self.malformed(format!(
                        "unexpected element <{}> inside <{}>",
                        element_name(&element),
                        String::from_utf8_lossy(tag)
                    )))
                }
                Event::Eof => {
                    return Err(self.malformed(format!(
                        "unexpected end of file inside <{}>",
                        String::from_utf8_lossy(tag)
                    )))
                }
                ref other => {
                    if let Some(chunk) = self.text_of(other)? {
                        text.push_str(&chunk);
                    }
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for CorpusReader<R> {
    type Item = Result<Entity, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = match self.next_entity_start() {
            Ok(Some(start)) => self.read_entity(&start).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(e),
        };
        match result {
            Ok(Some(entity)) => Some(Ok(entity)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

fn element_name<'a>(element: &'a BytesStart<'_>) -> Cow<'a, str> {
    String::from_utf8_lossy(element.name().into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<knowledge_base>
  <entity id="E0000001" name="Paris" type="GPE" wiki_title="Paris">
    <facts class="Infobox City">
      <fact name="country"><link entity_id="E0000002">France</link></fact>
      <fact name="population">2,193,031</fact>
      <fact name="mayor">Anne <link>Hidalgo</link></fact>
    </facts>
    <wiki_text><![CDATA[Paris is the capital of France.]]></wiki_text>
  </entity>
  <entity id="E0000002" name="France" type="GPE"/>
  <entity id="E0000003" name="Caf&#233; &amp; Co" type="ORG">
    <wiki_text>A caf&#233;.</wiki_text>
  </entity>
</knowledge_base>
"#;

    fn read_all(xml: &str) -> Result<Vec<Entity>, StoreError> {
        CorpusReader::new(xml.as_bytes(), "sample.xml").collect()
    }

    #[test]
    fn test_parse_sample_corpus() {
        let entities = read_all(SAMPLE).unwrap();
        assert_eq!(entities.len(), 3);

        let paris = &entities[0];
        assert_eq!(paris.id(), "E0000001");
        assert_eq!(paris.entity_type(), EntityType::GeoPolitical);
        assert_eq!(paris.wiki_title(), Some("Paris"));
        assert_eq!(paris.facts_class(), Some("Infobox City"));
        assert_eq!(paris.text(), Some("Paris is the capital of France."));
        assert_eq!(paris.facts().len(), 3);
        assert_eq!(
            paris.facts()[0].fragments,
            vec![FactFragment::EntityRef {
                entity_id: "E0000002".to_string(),
                text: "France".to_string(),
            }]
        );
        assert_eq!(paris.facts()[1].value(), "2,193,031");
        assert_eq!(paris.facts()[2].value(), "Anne Hidalgo");

        assert!(entities[1].facts().is_empty());
        assert_eq!(entities[1].text(), None);
    }

    #[test]
    fn test_entities_are_unescaped() {
        let entities = read_all(SAMPLE).unwrap();
        assert_eq!(entities[2].name(), "Café & Co");
        assert_eq!(entities[2].text(), Some("A café."));
    }

    #[test]
    fn test_missing_attribute_is_fatal() {
        let xml = r#"<knowledge_base><entity id="E1" type="PER"/></knowledge_base>"#;
        let err = read_all(xml).unwrap_err();
        assert!(matches!(err, StoreError::Corpus { .. }));
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_unknown_type_is_fatal() {
        let xml = r#"<knowledge_base><entity id="E1" name="X" type="LOC"/></knowledge_base>"#;
        assert!(matches!(read_all(xml), Err(StoreError::Corpus { .. })));
    }

    #[test]
    fn test_unexpected_element_is_fatal() {
        let xml = r#"<knowledge_base><entity id="E1" name="X" type="PER"><bogus/></entity></knowledge_base>"#;
        assert!(matches!(read_all(xml), Err(StoreError::Corpus { .. })));
    }

    #[test]
    fn test_truncated_file_is_fatal() {
        let xml = r#"<knowledge_base><entity id="E1" name="X" type="PER"><wiki_text>cut"#;
        assert!(read_all(xml).is_err());
    }

    #[test]
    fn test_iteration_stops_after_error() {
        let xml = r#"<knowledge_base><entity id="E1" name="X" type="PER"/><entity id="E2" type="PER"/><entity id="E3" name="Z" type="PER"/></knowledge_base>"#;
        let mut reader = CorpusReader::new(xml.as_bytes(), "bad.xml");
        assert!(reader.next().unwrap().is_ok());
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_part_number() {
        assert_eq!(part_number("kb_part-0001.xml"), Some(1));
        assert_eq!(part_number("kb_part-12.xml"), Some(12));
        assert_eq!(part_number("kb_part-.xml"), None);
        assert_eq!(part_number("kb_part-1a.xml"), None);
        assert_eq!(part_number("other.xml"), None);
    }

    #[test]
    fn test_corpus_files_sorted_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["kb_part-10.xml", "kb_part-2.xml", "kb_part-1.xml", "notes.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        let files = corpus_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["kb_part-1.xml", "kb_part-2.xml", "kb_part-10.xml"]);
    }

    #[test]
    fn test_corpus_files_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let result = corpus_files(&dir.path().join("absent"));
        assert!(matches!(result, Err(StoreError::Io(_))));
    }
}
