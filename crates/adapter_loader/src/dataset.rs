//! Transition tables in CSV.
//!
//! One row per logged step, header-named columns in any order:
//!
//! | Column | Meaning |
//! |--------|---------|
//! | `x`, `y`, `v`, `yaw` | state at the start of the step |
//! | `swangle`, `throttle` | logged steering angle and torque command |
//! | `timestep` | step length in seconds, strictly positive |
//! | `nextx`, `nexty`, `nextv`, `nextyaw` | observed state at the end |
//!
//! States are stored in log order `[x, y, v, yaw]`; conversion to the
//! model's order happens in `vehicle_models::calibration::from_schema_order`.
//! Extra columns are ignored.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use vehicle_models::calibration::{to_schema_order, Dataset, TrainingSample};

use crate::error::LoaderError;

/// Columns every dataset must provide.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    "x", "y", "v", "yaw", "swangle", "throttle", "timestep", "nextx", "nexty", "nextv", "nextyaw",
];

/// One CSV row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    /// Start x
    pub x: f64,
    /// Start y
    pub y: f64,
    /// Start speed
    pub v: f64,
    /// Start heading
    pub yaw: f64,
    /// Logged steering angle
    pub swangle: f64,
    /// Logged torque command
    pub throttle: f64,
    /// Step length
    pub timestep: f64,
    /// Observed x
    pub nextx: f64,
    /// Observed y
    pub nexty: f64,
    /// Observed speed
    pub nextv: f64,
    /// Observed heading
    pub nextyaw: f64,
}

impl DatasetRecord {
    /// Convert into a validated sample.
    pub fn into_sample(self, row: usize) -> Result<TrainingSample, LoaderError> {
        let values = [
            ("x", self.x),
            ("y", self.y),
            ("v", self.v),
            ("yaw", self.yaw),
            ("swangle", self.swangle),
            ("throttle", self.throttle),
            ("nextx", self.nextx),
            ("nexty", self.nexty),
            ("nextv", self.nextv),
            ("nextyaw", self.nextyaw),
        ];
        if let Some((column, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(LoaderError::invalid_record(row, format!("{column} = {value} is not finite")));
        }

        TrainingSample::from_schema(
            [self.x, self.y, self.v, self.yaw],
            self.swangle,
            self.throttle,
            self.timestep,
            [self.nextx, self.nexty, self.nextv, self.nextyaw],
        )
        .map_err(|err| LoaderError::invalid_record(row, err.to_string()))
    }

    /// Row for a sample.
    pub fn from_sample(sample: &TrainingSample) -> Self {
        let [x, y, v, yaw] = to_schema_order(&sample.state_in);
        let [nextx, nexty, nextv, nextyaw] = to_schema_order(&sample.state_out_truth);
        Self {
            x,
            y,
            v,
            yaw,
            swangle: sample.action.steering_angle,
            throttle: sample.action.torque_command,
            timestep: sample.timestep,
            nextx,
            nexty,
            nextv,
            nextyaw,
        }
    }
}

/// Read a dataset from any CSV source.
///
/// # Errors
///
/// - [`LoaderError::Schema`] listing every missing required column
/// - [`LoaderError::InvalidRecord`] for a non-finite value or a
///   non-positive timestep
/// - [`LoaderError::Csv`] for malformed CSV or unparsable numbers
pub fn read_dataset<R: Read>(reader: R) -> Result<Dataset, LoaderError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoaderError::Schema { missing });
    }

    let mut samples = Vec::new();
    for (index, record) in csv_reader.deserialize::<DatasetRecord>().enumerate() {
        samples.push(record?.into_sample(index + 1)?);
    }

    debug!(samples = samples.len(), "loaded dataset");
    Ok(Dataset::new(samples))
}

/// Read a dataset file.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Dataset, LoaderError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| LoaderError::io(path, err))?;
    read_dataset(file)
}

/// Write a dataset as CSV with the standard header.
pub fn write_dataset<W: Write>(dataset: &Dataset, writer: W) -> Result<(), LoaderError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for sample in dataset {
        csv_writer.serialize(DatasetRecord::from_sample(sample))?;
    }
    if dataset.is_empty() {
        csv_writer.write_record(REQUIRED_COLUMNS)?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write a dataset file.
pub fn save_dataset(dataset: &Dataset, path: impl AsRef<Path>) -> Result<(), LoaderError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|err| LoaderError::io(path, err))?;
    write_dataset(dataset, file)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "x,y,v,yaw,swangle,throttle,timestep,nextx,nexty,nextv,nextyaw";

    #[test]
    fn test_read_permutes_schema_order() {
        let text = format!("{HEADER}\n1,2,3,4,0.1,50,0.1,5,6,7,8\n");
        let dataset = read_dataset(text.as_bytes()).unwrap();
        let sample = dataset.samples()[0];

        assert_eq!(sample.state_in.speed, 3.0);
        assert_eq!(sample.state_in.yaw, 4.0);
        assert_eq!(sample.state_out_truth.speed, 7.0);
        assert_eq!(sample.state_out_truth.yaw, 8.0);
        assert_eq!(sample.action.steering_angle, 0.1);
        assert_eq!(sample.action.torque_command, 50.0);
    }

    #[test]
    fn test_column_order_free_and_extra_columns_ignored() {
        let text = "time,nextyaw,nextv,nexty,nextx,timestep,throttle,swangle,yaw,v,y,x\n\
                    12.5,8,7,6,5,0.1,50,0.1,4,3,2,1\n";
        let dataset = read_dataset(text.as_bytes()).unwrap();
        assert_eq!(dataset.samples()[0].state_in.x, 1.0);
        assert_eq!(dataset.samples()[0].state_out_truth.yaw, 8.0);
    }

    #[test]
    fn test_missing_columns() {
        let text = "x,y,v,yaw,swangle,throttle,timestep,nextx,nexty\n1,2,3,4,5,6,0.1,7,8\n";
        match read_dataset(text.as_bytes()) {
            Err(LoaderError::Schema { missing }) => assert_eq!(missing, vec!["nextv", "nextyaw"]),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_timestep_reports_row() {
        let text = format!("{HEADER}\n1,2,3,4,0,0,0.1,1,2,3,4\n1,2,3,4,0,0,0,1,2,3,4\n");
        match read_dataset(text.as_bytes()) {
            Err(LoaderError::InvalidRecord { row, .. }) => assert_eq!(row, 2),
            other => panic!("expected invalid record, got {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_value_rejected() {
        let text = format!("{HEADER}\n1,2,NaN,4,0,0,0.1,1,2,3,4\n");
        assert!(matches!(
            read_dataset(text.as_bytes()),
            Err(LoaderError::InvalidRecord { row: 1, .. })
        ));
    }

    #[test]
    fn test_unparsable_number() {
        let text = format!("{HEADER}\n1,2,fast,4,0,0,0.1,1,2,3,4\n");
        assert!(matches!(read_dataset(text.as_bytes()), Err(LoaderError::Csv(_))));
    }

    #[test]
    fn test_write_then_read_preserves_samples() {
        let text = format!("{HEADER}\n1,2,3,4,0.1,50,0.1,5,6,7,8\n-1,0.5,2,0.25,-0.2,10,0.3,0,0,1,0\n");
        let dataset = read_dataset(text.as_bytes()).unwrap();

        let mut buffer = Vec::new();
        write_dataset(&dataset, &mut buffer).unwrap();
        let written = String::from_utf8(buffer).unwrap();
        assert!(written.starts_with(HEADER));
        assert_eq!(read_dataset(written.as_bytes()).unwrap(), dataset);
    }

    #[test]
    fn test_write_empty_dataset_has_header() {
        let mut buffer = Vec::new();
        write_dataset(&Dataset::default(), &mut buffer).unwrap();
        let written = String::from_utf8(buffer).unwrap();
        assert_eq!(written.trim_end(), HEADER);
        assert!(read_dataset(written.as_bytes()).unwrap().is_empty());
    }
}
