//! Tab-separated comparison of several systems against one gold set

use crate::{ClusterEvaluation, EvalError, OutputSet, Scores};
use std::fmt;
use std::io::Write;

/// Header row of the comparison table
pub const REPORT_HEADER: &str = "system\tKBP2010 micro-average\tB^3 Precision\tB^3 Recall\tB^3 F1\tB^3+ Precision\tB^3+ Recall\tB^3+ F1";

/// Scores of one system
#[derive(Debug, Clone, PartialEq)]
pub struct SystemScores {
    /// System (output set) name
    pub system: String,
    /// NIL-normalized accuracy
    pub accuracy: f64,
    /// BCubed scores
    pub bcubed: Scores,
    /// BCubed+ scores
    pub bcubed_plus: Scores,
}

impl SystemScores {
    /// Score one evaluation
    pub fn from_evaluation(eval: &ClusterEvaluation) -> Self {
        Self {
            system: eval.system_name().to_string(),
            accuracy: eval.accuracy(),
            bcubed: eval.bcubed(),
            bcubed_plus: eval.bcubed_plus(),
        }
    }
}

/// Comparison table, one row per system in input order
///
/// Displays as the TSV report: header then one row per system, every score
/// to three decimals.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComparisonReport {
    rows: Vec<SystemScores>,
}

impl ComparisonReport {
    /// Evaluate every system against `gold`
    ///
    /// `focus` defaults to every gold mention. The first system that cannot
    /// be evaluated aborts the report.
    pub fn evaluate<'a, I>(
        gold: &OutputSet,
        focus: Option<&[String]>,
        systems: I,
    ) -> Result<Self, EvalError>
    where
        I: IntoIterator<Item = &'a OutputSet>,
    {
        let rows = systems
            .into_iter()
            .map(|system| {
                let eval = match focus {
                    Some(focus) => ClusterEvaluation::with_focus(system, gold, focus)?,
                    None => ClusterEvaluation::new(system, gold)?,
                };
                Ok(SystemScores::from_evaluation(&eval))
            })
            .collect::<Result<Vec<_>, EvalError>>()?;

        tracing::info!("Evaluated {} systems against {}", rows.len(), gold.name());
        Ok(Self { rows })
    }

    /// Rows in system order
    pub fn rows(&self) -> &[SystemScores] {
        &self.rows
    }

    /// Write the TSV table
    pub fn write_to<W: Write>(&self, mut out: W) -> Result<(), EvalError> {
        write!(out, "{}", self)?;
        out.flush()?;
        Ok(())
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", REPORT_HEADER)?;
        for row in &self.rows {
            writeln!(
                f,
                "{}\t{:.3}\t{:.3}\t{:.3}\t{:.3}\t{:.3}\t{:.3}\t{:.3}",
                row.system,
                row.accuracy,
                row.bcubed.precision,
                row.bcubed.recall,
                row.bcubed.f1,
                row.bcubed_plus.precision,
                row.bcubed_plus.recall,
                row.bcubed_plus.f1
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Output;

    fn set(name: &str, rows: &[(&str, &str)]) -> OutputSet {
        OutputSet::new(
            name,
            rows.iter()
                .map(|(m, kb)| Output::new(*m, *kb, 1.0).unwrap())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_report_rows_and_format() {
        let gold = set("gold", &[("m1", "E7"), ("m2", "E7"), ("m3", "E9")]);
        let perfect = set("perfect", &[("m1", "E7"), ("m2", "E7"), ("m3", "E9")]);
        let wrong_id = set("wrong-id", &[("m1", "E7"), ("m2", "E7"), ("m3", "E8")]);

        let report = ComparisonReport::evaluate(&gold, None, [&perfect, &wrong_id]).unwrap();
        assert_eq!(report.rows().len(), 2);

        let text = report.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], REPORT_HEADER);
        assert_eq!(lines[1], "perfect\t1.000\t1.000\t1.000\t1.000\t1.000\t1.000\t1.000");
        assert_eq!(lines[2], "wrong-id\t0.667\t1.000\t1.000\t1.000\t0.667\t0.667\t0.667");
    }

    #[test]
    fn test_report_with_focus() {
        let gold = set("gold", &[("m1", "E1"), ("m2", "E2")]);
        let system = set("sys", &[("m1", "E1"), ("m2", "E3")]);
        let focus = vec!["m1".to_string()];

        let report = ComparisonReport::evaluate(&gold, Some(&focus), [&system]).unwrap();
        assert_eq!(report.rows()[0].accuracy, 1.0);
    }

    #[test]
    fn test_report_aborts_on_missing_mention() {
        let gold = set("gold", &[("m1", "E1"), ("m2", "E2")]);
        let partial = set("partial", &[("m1", "E1")]);

        let result = ComparisonReport::evaluate(&gold, None, [&partial]);
        assert!(matches!(result, Err(EvalError::UnknownMention { .. })));
    }

    #[test]
    fn test_empty_report_has_header_only() {
        let gold = set("gold", &[("m1", "E1")]);
        let report = ComparisonReport::evaluate(&gold, None, std::iter::empty()).unwrap();

        let mut buf = Vec::new();
        report.write_to(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), format!("{}\n", REPORT_HEADER));
    }
}
