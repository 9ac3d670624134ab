//! Error types for outputs and evaluation

use thiserror::Error;

/// Errors raised while building, reading or scoring output sets
#[derive(Error, Debug)]
pub enum EvalError {
    /// Confidence outside [0.0, 1.0] or NaN
    #[error("Invalid confidence {confidence} for mention {mention_id}: must be within [0, 1]")]
    InvalidConfidence {
        /// Mention the output was for
        mention_id: String,
        /// Offending value
        confidence: f64,
    },

    /// Output without a mention id
    #[error("Output has an empty mention id")]
    EmptyMentionId,

    /// Output without a kb id
    #[error("Output for mention {0} has an empty kb id")]
    EmptyKbId(String),

    /// An id contains whitespace and could not be written to an output file
    #[error("Output {field} {id:?} contains whitespace")]
    WhitespaceInId {
        /// Which id was rejected (`mention id` or `kb id`)
        field: &'static str,
        /// Offending id
        id: String,
    },

    /// The same mention appears twice in one set
    #[error("Duplicate mention {mention_id} in output set {set}")]
    DuplicateMention {
        /// Output set name
        set: String,
        /// Repeated mention id
        mention_id: String,
    },

    /// A focus mention is missing from an output set
    #[error("Mention {mention_id} not found in output set {set}")]
    UnknownMention {
        /// Output set name
        set: String,
        /// Missing mention id
        mention_id: String,
    },

    /// Nothing to evaluate
    #[error("Focus set is empty")]
    EmptyFocus,

    /// A line of an output file could not be parsed
    #[error("{origin}:{line}: {message}")]
    Parse {
        /// File or stream name
        origin: String,
        /// 1-based line number
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
