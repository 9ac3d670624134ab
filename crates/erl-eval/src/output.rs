//! Outputs and output sets
//!
//! An [`OutputSet`] is the unit of evaluation: a named, ordered list of
//! mention → kb id decisions with two indexes built once at construction.

use crate::EvalError;
use erl_domain::NIL_PREFIX;
use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};

/// One mention resolution with its confidence
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    mention_id: String,
    kb_id: String,
    confidence: f64,
}

impl Output {
    /// Create an output; ids must be non-empty without whitespace and confidence within [0, 1]
    ///
    /// # Examples
    ///
    /// ```
    /// use erl_eval::Output;
    ///
    /// assert!(Output::new("EL1", "E0001", 0.9).is_ok());
    /// assert!(Output::new("EL1", "E0001", 1.5).is_err());
    /// assert!(Output::new("EL1", "", 1.0).is_err());
    /// assert!(Output::new("EL 1", "E0001", 1.0).is_err());
    /// ```
    pub fn new(
        mention_id: impl Into<String>,
        kb_id: impl Into<String>,
        confidence: f64,
    ) -> Result<Self, EvalError> {
        let mention_id = mention_id.into();
        let kb_id = kb_id.into();
        if mention_id.is_empty() {
            return Err(EvalError::EmptyMentionId);
        }
        if kb_id.is_empty() {
            return Err(EvalError::EmptyKbId(mention_id));
        }
        if mention_id.chars().any(char::is_whitespace) {
            return Err(EvalError::WhitespaceInId {
                field: "mention id",
                id: mention_id,
            });
        }
        if kb_id.chars().any(char::is_whitespace) {
            return Err(EvalError::WhitespaceInId {
                field: "kb id",
                id: kb_id,
            });
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(EvalError::InvalidConfidence {
                mention_id,
                confidence,
            });
        }
        Ok(Self {
            mention_id,
            kb_id,
            confidence,
        })
    }

    /// Mention id
    pub fn mention_id(&self) -> &str {
        &self.mention_id
    }

    /// Resolved kb id (possibly a NIL placeholder)
    pub fn kb_id(&self) -> &str {
        &self.kb_id
    }

    /// Confidence in [0, 1]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Whether the kb id is a NIL placeholder
    pub fn is_nil(&self) -> bool {
        self.kb_id.starts_with(NIL_PREFIX)
    }
}

/// Named, immutable collection of outputs with mention and cluster indexes
#[derive(Debug, Clone)]
pub struct OutputSet {
    name: String,
    outputs: Vec<Output>,
    mention_index: HashMap<String, usize>,
    clusters: BTreeMap<String, Vec<usize>>,
}

impl OutputSet {
    /// Build a set, rejecting duplicate mention ids
    pub fn new(name: impl Into<String>, outputs: Vec<Output>) -> Result<Self, EvalError> {
        let name = name.into();
        let mut mention_index = HashMap::with_capacity(outputs.len());
        let mut clusters: BTreeMap<String, Vec<usize>> = BTreeMap::new();

        for (position, output) in outputs.iter().enumerate() {
            if mention_index
                .insert(output.mention_id.clone(), position)
                .is_some()
            {
                return Err(EvalError::DuplicateMention {
                    set: name,
                    mention_id: output.mention_id.clone(),
                });
            }
            clusters
                .entry(output.kb_id.clone())
                .or_default()
                .push(position);
        }

        Ok(Self {
            name,
            outputs,
            mention_index,
            clusters,
        })
    }

    /// Set name, used to label report rows
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Outputs in insertion order
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Number of outputs
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Whether the set has no outputs
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Output for a mention
    pub fn get(&self, mention_id: &str) -> Option<&Output> {
        self.mention_index
            .get(mention_id)
            .map(|&position| &self.outputs[position])
    }

    /// Whether the mention is present
    pub fn contains(&self, mention_id: &str) -> bool {
        self.mention_index.contains_key(mention_id)
    }

    /// Kb id assigned to a mention
    pub fn kb_id(&self, mention_id: &str) -> Result<&str, EvalError> {
        self.get(mention_id)
            .map(Output::kb_id)
            .ok_or_else(|| EvalError::UnknownMention {
                set: self.name.clone(),
                mention_id: mention_id.to_string(),
            })
    }

    /// Mention ids in insertion order
    pub fn mention_ids(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(Output::mention_id)
    }

    /// Distinct kb ids, sorted
    pub fn kb_ids(&self) -> impl Iterator<Item = &str> {
        self.clusters.keys().map(String::as_str)
    }

    /// Number of distinct kb ids
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Outputs sharing `kb_id`, in insertion order
    pub fn cluster(&self, kb_id: &str) -> Vec<&Output> {
        self.clusters
            .get(kb_id)
            .map(|members| members.iter().map(|&i| &self.outputs[i]).collect())
            .unwrap_or_default()
    }

    /// Whether two mentions were given the same raw kb id
    pub fn in_same_cluster(&self, a: &str, b: &str) -> Result<bool, EvalError> {
        Ok(self.kb_id(a)? == self.kb_id(b)?)
    }

    /// Write one `kb_id => {m1, m2}` line per cluster
    ///
    /// Clusters are sorted by kb id and mentions by id so the dump is stable.
    pub fn write_clusters<W: Write>(&self, mut out: W) -> io::Result<()> {
        for (kb_id, members) in &self.clusters {
            let mut mentions: Vec<&str> = members
                .iter()
                .map(|&i| self.outputs[i].mention_id.as_str())
                .collect();
            mentions.sort_unstable();
            writeln!(out, "{} => {{{}}}", kb_id, mentions.join(", "))?;
        }
        Ok(())
    }
}

impl PartialEq for OutputSet {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.outputs == other.outputs
    }
}

impl<'a> IntoIterator for &'a OutputSet {
    type Item = &'a Output;
    type IntoIter = std::slice::Iter<'a, Output>;

    fn into_iter(self) -> Self::IntoIter {
        self.outputs.iter()
    }
}
