//! Conversion of finished links into evaluation output

use erl_domain::Link;
use erl_eval::{EvalError, Output, OutputSet};

/// Collect a finished batch of links into an output set, each with confidence 1.0
///
/// Fails with [`EvalError::DuplicateMention`] if two links answer the same query.
pub fn links_to_output_set(name: impl Into<String>, links: &[Link]) -> Result<OutputSet, EvalError> {
    let outputs = links
        .iter()
        .map(|link| Output::new(link.query_id(), link.entity_id(), 1.0))
        .collect::<Result<Vec<_>, _>>()?;
    OutputSet::new(name, outputs)
}
