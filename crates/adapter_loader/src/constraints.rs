//! Constraint file parser.
//!
//! One constant per line, in slot order:
//!
//! ```text
//! understeer_slope [0,0.05]     # bounded, initial guess 0.025
//! car_mass 280                  # fixed
//! ```
//!
//! The first token names the constant. The second is a float literal
//! (fixed) or a bracketed `[lo,hi]` pair (bounded); whitespace inside the
//! brackets is allowed. Anything after the value is ignored. Blank lines
//! and lines starting with `#` are skipped.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};
use vehicle_models::calibration::{ParameterSpec, ParameterSpecSet};
use vehicle_models::models::{PARAMETER_COUNT, PARAMETER_NAMES};

use crate::error::LoaderError;

/// Parse constraint text into a validated spec set.
///
/// # Errors
///
/// - [`LoaderError::Parse`] for a line whose value is neither a float nor a
///   `[lo,hi]` pair
/// - [`LoaderError::Configuration`] unless exactly nine constants are
///   given, for `lo > hi`, non-finite values, or a known constant name in
///   the wrong slot
pub fn parse_constraints(text: &str) -> Result<ParameterSpecSet, LoaderError> {
    let mut specs = Vec::with_capacity(PARAMETER_COUNT);
    let mut labels = Vec::with_capacity(PARAMETER_COUNT);

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (name, spec) = parse_line(index + 1, line)?;
        labels.push(name.to_string());
        specs.push(spec);
    }

    if specs.len() != PARAMETER_COUNT {
        return Err(LoaderError::configuration(format!(
            "expected {PARAMETER_COUNT} parameter constraints, found {}",
            specs.len()
        )));
    }

    for (slot, label) in labels.iter().enumerate() {
        if label == PARAMETER_NAMES[slot] {
            continue;
        }
        match PARAMETER_NAMES.iter().position(|known| known == label) {
            Some(expected) => {
                return Err(LoaderError::configuration(format!(
                    "{label} belongs in position {} but was given in position {}",
                    expected + 1,
                    slot + 1
                )));
            }
            None => warn!(
                label = %label,
                slot = slot + 1,
                expected = PARAMETER_NAMES[slot],
                "unrecognised constraint name, using position"
            ),
        }
    }

    let set = ParameterSpecSet::with_labels(specs, labels)
        .map_err(|err| LoaderError::configuration(err.to_string()))?;
    debug!(free = set.free_count(), "parsed parameter constraints");
    Ok(set)
}

/// Read and parse a constraint file.
pub fn load_constraints(path: impl AsRef<Path>) -> Result<ParameterSpecSet, LoaderError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|err| LoaderError::io(path, err))?;
    parse_constraints(&text)
}

fn parse_line(line_no: usize, line: &str) -> Result<(&str, ParameterSpec), LoaderError> {
    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim_start()),
        None => (line, ""),
    };
    if rest.is_empty() {
        return Err(LoaderError::parse(line_no, line, "missing value"));
    }

    if let Some(inner) = rest.strip_prefix('[') {
        let close = inner
            .find(']')
            .ok_or_else(|| LoaderError::parse(line_no, line, "unterminated '[' interval"))?;
        let parts: Vec<&str> = inner[..close].split(',').map(str::trim).collect();
        if parts.len() != 2 {
            return Err(LoaderError::parse(
                line_no,
                line,
                format!("interval needs exactly two values, found {}", parts.len()),
            ));
        }
        let lo = parse_float(line_no, line, parts[0])?;
        let hi = parse_float(line_no, line, parts[1])?;
        return Ok((name, ParameterSpec::bounded(lo, hi)));
    }

    let token = rest.split_whitespace().next().unwrap_or(rest);
    let value = parse_float(line_no, line, token)?;
    Ok((name, ParameterSpec::fixed(value)))
}

fn parse_float(line_no: usize, line: &str, token: &str) -> Result<f64, LoaderError> {
    token
        .parse::<f64>()
        .map_err(|err| LoaderError::parse(line_no, line, format!("{token:?} is not a number: {err}")))
}
