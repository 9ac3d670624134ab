//! Genre module - source-document categories

use std::fmt;

/// Coarse category of the document a mention was drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Genre {
    /// Edited news-wire text
    Newswire,

    /// Web pages, blogs and newsgroups
    Web,

    /// Discussion forum threads
    DiscussionForum,
}

impl Genre {
    /// Classify a document id
    ///
    /// Total and deterministic: every id maps to exactly one genre, with
    /// news-wire as the catch-all.
    ///
    /// # Examples
    ///
    /// ```
    /// use erl_domain::Genre;
    ///
    /// assert_eq!(Genre::for_document_id("APW_ENG_20080502.0001"), Genre::Newswire);
    /// assert_eq!(Genre::for_document_id("eng-WL-11-174588-12960489"), Genre::Web);
    /// assert_eq!(Genre::for_document_id("bolt-eng-DF-170-181103-8882762"), Genre::DiscussionForum);
    /// ```
    pub fn for_document_id(doc_id: &str) -> Self {
        if doc_id.starts_with("bolt-") || doc_id.contains("-DF-") || doc_id.contains("_DF_") {
            Genre::DiscussionForum
        } else if doc_id.starts_with("eng-")
            || ["-WL-", "-NG-", "_WL_", "_NG_"]
                .iter()
                .any(|marker| doc_id.contains(marker))
        {
            Genre::Web
        } else {
            Genre::Newswire
        }
    }

    /// Short code used in link files (`NW`, `WB`, `DF`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Newswire => "NW",
            Genre::Web => "WB",
            Genre::DiscussionForum => "DF",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newswire_is_default() {
        assert_eq!(Genre::for_document_id(""), Genre::Newswire);
        assert_eq!(Genre::for_document_id("NYT_ENG_20070101.0001"), Genre::Newswire);
        assert_eq!(Genre::for_document_id("XIN_ENG_20081203.0179.LDC2009T13"), Genre::Newswire);
    }

    #[test]
    fn test_web_documents() {
        assert_eq!(Genre::for_document_id("eng-NG-31-100578-11879229"), Genre::Web);
        assert_eq!(Genre::for_document_id("sample_WL_document"), Genre::Web);
    }

    #[test]
    fn test_forum_takes_precedence() {
        // a forum id that also starts like a web id
        assert_eq!(Genre::for_document_id("eng-DF-170-181103"), Genre::DiscussionForum);
    }

    #[test]
    fn test_deterministic() {
        let id = "eng-WL-11-174588-12960489";
        assert_eq!(Genre::for_document_id(id), Genre::for_document_id(id));
    }
}
