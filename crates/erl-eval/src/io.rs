//! Reading and writing output files
//!
//! One output per line: `mention_id kb_id [confidence]`, separated by any
//! whitespace. A missing confidence means 1.0 and blank lines are skipped.
//! Files are written tab-separated in insertion order, with confidences in
//! their shortest lossless decimal form.

use crate::{EvalError, Output, OutputSet};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Parse an output set from a reader; `origin` labels parse errors
pub fn parse_output_set<R: BufRead>(
    name: impl Into<String>,
    reader: R,
    origin: &str,
) -> Result<OutputSet, EvalError> {
    let mut outputs = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let number = index + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();

        let parse_error = |message: String| EvalError::Parse {
            origin: origin.to_string(),
            line: number,
            message,
        };

        let (mention_id, kb_id, confidence) = match fields.as_slice() {
            [] => continue,
            [mention_id, kb_id] => (*mention_id, *kb_id, 1.0),
            [mention_id, kb_id, confidence] => {
                let confidence = confidence
                    .parse::<f64>()
                    .map_err(|e| parse_error(format!("bad confidence {:?}: {}", confidence, e)))?;
                (*mention_id, *kb_id, confidence)
            }
            _ => {
                return Err(parse_error(format!(
                    "expected 2 or 3 fields, found {}",
                    fields.len()
                )))
            }
        };

        let output = Output::new(mention_id, kb_id, confidence)
            .map_err(|e| parse_error(e.to_string()))?;
        outputs.push(output);
    }

    OutputSet::new(name, outputs)
}

/// Read an output set from a file, named after the file stem
pub fn read_output_set<P: AsRef<Path>>(path: P) -> Result<OutputSet, EvalError> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let file = File::open(path)?;
    let set = parse_output_set(name, BufReader::new(file), &path.display().to_string())?;
    tracing::debug!("Read {} outputs from {}", set.len(), path.display());
    Ok(set)
}

/// Write outputs tab-separated, one per line, in insertion order
pub fn write_output_set<W: Write>(set: &OutputSet, mut out: W) -> Result<(), EvalError> {
    for output in set {
        writeln!(
            out,
            "{}\t{}\t{}",
            output.mention_id(),
            output.kb_id(),
            output.confidence()
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Write an output set to a file, replacing any existing content
pub fn save_output_set<P: AsRef<Path>>(set: &OutputSet, path: P) -> Result<(), EvalError> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_output_set(set, BufWriter::new(file))?;
    tracing::debug!("Wrote {} outputs to {}", set.len(), path.display());
    Ok(())
}
