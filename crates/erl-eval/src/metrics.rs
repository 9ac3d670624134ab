//! Clustering metrics: accuracy, BCubed and BCubed+
//!
//! All metrics are computed over a focus set of mentions (by default every
//! gold mention). Pairs are formed only between focus mentions, and each
//! mention is always paired with itself.
//!
//! - BCubed counts a pair correct when it is co-clustered in both the system
//!   and the gold set, comparing raw kb ids.
//! - BCubed+ additionally requires all four NIL-normalized ids (system and
//!   gold, for both mentions) to agree. The self-pair is subject to that
//!   check too, so a mention linked to the wrong identity never scores full
//!   precision.

use crate::{EvalError, OutputSet};
use erl_domain::normalize_nil;
use std::collections::{HashMap, HashSet};

/// Pair correctness rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Co-clustered in system and gold
    BCubed,
    /// Co-clustered and linked to the same normalized identity
    BCubedPlus,
}

/// Aggregate precision, recall and F-scores for one metric
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scores {
    /// Mean per-mention precision
    pub precision: f64,
    /// Mean per-mention recall
    pub recall: f64,
    /// Harmonic mean of `precision` and `recall`
    pub f1: f64,
    /// Mean of the per-mention F1 values
    pub micro_f1: f64,
}

/// Per-mention BCubed precision and recall
#[derive(Debug, Clone, PartialEq)]
pub struct MentionScore {
    /// Mention id
    pub mention_id: String,
    /// Fraction of the system cluster correctly paired with this mention
    pub precision: f64,
    /// Fraction of the gold cluster correctly paired with this mention
    pub recall: f64,
}

/// Harmonic mean, 0 when both inputs are 0
pub fn f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

#[derive(Debug, Clone)]
struct FocusMention {
    id: String,
    system: String,
    gold: String,
    system_cluster: usize,
    gold_cluster: usize,
}

/// Evaluation of one system output against gold over a focus set
///
/// Construction validates that every focus mention exists in both sets, so
/// scoring never fails.
///
/// # Examples
///
/// ```
/// use erl_eval::{ClusterEvaluation, Output, OutputSet};
///
/// let gold = OutputSet::new("gold", vec![
///     Output::new("m1", "E1", 1.0).unwrap(),
///     Output::new("m2", "NIL4", 1.0).unwrap(),
/// ]).unwrap();
/// let system = OutputSet::new("sys", vec![
///     Output::new("m1", "E1", 1.0).unwrap(),
///     Output::new("m2", "NIL1", 1.0).unwrap(),
/// ]).unwrap();
///
/// let eval = ClusterEvaluation::new(&system, &gold).unwrap();
/// assert_eq!(eval.accuracy(), 1.0);
/// assert_eq!(eval.bcubed().f1, 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct ClusterEvaluation {
    system_name: String,
    mentions: Vec<FocusMention>,
    system_clusters: Vec<Vec<usize>>,
    gold_clusters: Vec<Vec<usize>>,
}

impl ClusterEvaluation {
    /// Evaluate over every gold mention
    pub fn new(system: &OutputSet, gold: &OutputSet) -> Result<Self, EvalError> {
        Self::with_focus(system, gold, gold.mention_ids())
    }

    /// Evaluate over an explicit focus set; repeated ids count once
    pub fn with_focus<I, S>(system: &OutputSet, gold: &OutputSet, focus: I) -> Result<Self, EvalError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut mentions = Vec::new();
        let mut system_ids: HashMap<String, usize> = HashMap::new();
        let mut gold_ids: HashMap<String, usize> = HashMap::new();
        let mut system_clusters: Vec<Vec<usize>> = Vec::new();
        let mut gold_clusters: Vec<Vec<usize>> = Vec::new();

        for mention in focus {
            let mention = mention.as_ref();
            if !seen.insert(mention.to_string()) {
                continue;
            }
            let system_kb = system.kb_id(mention)?.to_string();
            let gold_kb = gold.kb_id(mention)?.to_string();
            let position = mentions.len();

            let system_cluster = cluster_slot(&mut system_ids, &mut system_clusters, &system_kb);
            system_clusters[system_cluster].push(position);
            let gold_cluster = cluster_slot(&mut gold_ids, &mut gold_clusters, &gold_kb);
            gold_clusters[gold_cluster].push(position);

            mentions.push(FocusMention {
                id: mention.to_string(),
                system: system_kb,
                gold: gold_kb,
                system_cluster,
                gold_cluster,
            });
        }

        if mentions.is_empty() {
            return Err(EvalError::EmptyFocus);
        }

        tracing::debug!(
            "Evaluating {} over {} focus mentions ({} system clusters, {} gold clusters)",
            system.name(),
            mentions.len(),
            system_clusters.len(),
            gold_clusters.len()
        );

        Ok(Self {
            system_name: system.name().to_string(),
            mentions,
            system_clusters,
            gold_clusters,
        })
    }

    /// Name of the evaluated system
    pub fn system_name(&self) -> &str {
        &self.system_name
    }

    /// Number of focus mentions
    pub fn focus_len(&self) -> usize {
        self.mentions.len()
    }

    /// Focus mentions whose NIL-normalized system and gold ids agree
    pub fn true_count(&self) -> usize {
        self.mentions
            .iter()
            .filter(|m| normalize_nil(&m.system) == normalize_nil(&m.gold))
            .count()
    }

    /// Fraction of focus mentions linked correctly after NIL normalization
    ///
    /// This is the KBP2010 micro-averaged accuracy.
    pub fn accuracy(&self) -> f64 {
        self.true_count() as f64 / self.mentions.len() as f64
    }

    fn is_correct(&self, metric: Metric, a: usize, b: usize) -> bool {
        let (a, b) = (&self.mentions[a], &self.mentions[b]);
        let clustered = a.system == b.system && a.gold == b.gold;
        match metric {
            Metric::BCubed => clustered,
            Metric::BCubedPlus => {
                let identity = normalize_nil(&a.system);
                clustered
                    && normalize_nil(&b.system) == identity
                    && normalize_nil(&a.gold) == identity
                    && normalize_nil(&b.gold) == identity
            }
        }
    }

    fn cluster_ratio(&self, metric: Metric, mention: usize, cluster: &[usize]) -> f64 {
        let correct = cluster
            .iter()
            .filter(|&&other| self.is_correct(metric, mention, other))
            .count();
        correct as f64 / cluster.len() as f64
    }

    /// Precision and recall of every focus mention, in focus order
    pub fn mention_scores(&self, metric: Metric) -> Vec<MentionScore> {
        self.mentions
            .iter()
            .enumerate()
            .map(|(i, mention)| MentionScore {
                mention_id: mention.id.clone(),
                precision: self.cluster_ratio(metric, i, &self.system_clusters[mention.system_cluster]),
                recall: self.cluster_ratio(metric, i, &self.gold_clusters[mention.gold_cluster]),
            })
            .collect()
    }

    /// Aggregate scores for `metric`
    pub fn scores(&self, metric: Metric) -> Scores {
        let per_mention = self.mention_scores(metric);
        let n = per_mention.len() as f64;

        let precision = per_mention.iter().map(|s| s.precision).sum::<f64>() / n;
        let recall = per_mention.iter().map(|s| s.recall).sum::<f64>() / n;
        let micro_f1 = per_mention
            .iter()
            .map(|s| f1_score(s.precision, s.recall))
            .sum::<f64>()
            / n;

        Scores {
            precision,
            recall,
            f1: f1_score(precision, recall),
            micro_f1,
        }
    }

    /// BCubed scores
    pub fn bcubed(&self) -> Scores {
        self.scores(Metric::BCubed)
    }

    /// BCubed+ scores
    pub fn bcubed_plus(&self) -> Scores {
        self.scores(Metric::BCubedPlus)
    }
}

fn cluster_slot(ids: &mut HashMap<String, usize>, clusters: &mut Vec<Vec<usize>>, kb_id: &str) -> usize {
    if let Some(&slot) = ids.get(kb_id) {
        return slot;
    }
    let slot = clusters.len();
    clusters.push(Vec::new());
    ids.insert(kb_id.to_string(), slot);
    slot
}
