//! ERL Evaluation
//!
//! Scores system linking output against a gold standard.
//!
//! # Architecture
//!
//! - [`OutputSet`]: named mention → kb id decisions, indexed by mention and by cluster
//! - [`ClusterEvaluation`]: accuracy, BCubed and BCubed+ over a focus set
//! - [`ComparisonReport`]: TSV table comparing several systems
//! - [`io`]: the whitespace-separated output file format
//!
//! # Examples
//!
//! ```
//! use erl_eval::{io::parse_output_set, ComparisonReport};
//!
//! let gold = parse_output_set("gold", "m1 E1\nm2 NIL3\n".as_bytes(), "gold").unwrap();
//! let system = parse_output_set("sys", "m1 E1 0.9\nm2 NIL1 0.4\n".as_bytes(), "sys").unwrap();
//!
//! let report = ComparisonReport::evaluate(&gold, None, [&system]).unwrap();
//! assert_eq!(report.rows()[0].accuracy, 1.0);
//! print!("{}", report);
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod io;
pub mod metrics;
pub mod output;
pub mod report;

pub use error::EvalError;
pub use metrics::{f1_score, ClusterEvaluation, MentionScore, Metric, Scores};
pub use output::{Output, OutputSet};
pub use report::{ComparisonReport, SystemScores, REPORT_HEADER};
