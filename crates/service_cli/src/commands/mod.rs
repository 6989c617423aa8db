//! CLI command implementations
//!
//! Each submodule implements one `slipcal` subcommand. The `*_files`
//! functions do the work and return a report; `run` prints it.

pub mod calibrate;
pub mod check;
pub mod evaluate;
pub mod synth;

use std::path::Path;

use vehicle_models::models::{ModelConstants, PARAMETER_COUNT};

use crate::{CliError, Result};

/// Fail early with the path when an input file is missing.
pub(crate) fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CliError::FileNotFound(path.display().to_string()))
    }
}

/// Parse nine comma-separated constants in slot order.
///
/// `default` selects the built-in constants.
pub(crate) fn parse_constants(text: &str) -> Result<ModelConstants<f64>> {
    if text.trim().eq_ignore_ascii_case("default") {
        return Ok(ModelConstants::default());
    }

    let values = text
        .split(',')
        .map(|token| {
            let token = token.trim();
            token.parse::<f64>().map_err(|_| {
                CliError::InvalidArgument(format!("constant {token:?} is not a number"))
            })
        })
        .collect::<Result<Vec<f64>>>()?;
    if values.len() != PARAMETER_COUNT {
        return Err(CliError::InvalidArgument(format!(
            "expected {PARAMETER_COUNT} constants, found {}",
            values.len()
        )));
    }

    let constants = ModelConstants::from_slice(&values)?;
    constants.validate()?;
    Ok(constants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vehicle_models::models::TorqueMode;

    #[test]
    fn test_parse_constants() {
        let constants = parse_constants("0.01, 0.8, 0.75, 4, 230, 2, 0.2, 280, 50").unwrap();
        assert_eq!(constants.torque_mode, TorqueMode::Rwd);
        assert_eq!(constants.car_mass, 280.0);
        assert_eq!(parse_constants("default").unwrap(), ModelConstants::default());
    }

    #[test]
    fn test_parse_constants_errors() {
        assert!(matches!(
            parse_constants("1,2,3"),
            Err(CliError::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_constants("0.01,0.8,0.75,4,230,0,0.2,heavy,50"),
            Err(CliError::InvalidArgument(_))
        ));
        // torque mode 5
        assert!(matches!(
            parse_constants("0.01,0.8,0.75,4,230,5,0.2,280,50"),
            Err(CliError::Model(_))
        ));
        // negative mass
        assert!(matches!(
            parse_constants("0.01,0.8,0.75,4,230,0,0.2,-280,50"),
            Err(CliError::Model(_))
        ));
    }

    #[test]
    fn test_require_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            require_file(&dir.path().join("missing.csv")),
            Err(CliError::FileNotFound(_))
        ));
        let path = dir.path().join("present.csv");
        std::fs::write(&path, "x\n").unwrap();
        assert!(require_file(&path).is_ok());
    }
}
