use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::bootstrap::{BootstrapEstimator, ConfidenceInterval, SeedStream};
use crate::stats::{mean, std_dev};
use crate::Result;

/// A point estimate with its bootstrap interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub value: f64,
    pub ci: Option<ConfidenceInterval>,
}

impl Metric {
    /// Mean of `values` with a bootstrap interval for the mean.
    pub fn mean_of(
        values: &[f64],
        estimator: &BootstrapEstimator,
        stream: &mut SeedStream,
    ) -> Self {
        Self {
            value: mean(values),
            ci: estimator.mean_interval(values, stream),
        }
    }
}

/// Mean, sample standard deviation and interval of per-unit values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean: f64,
    pub std: f64,
    pub ci: Option<ConfidenceInterval>,
}

impl Summary {
    pub fn of(values: &[f64], estimator: &BootstrapEstimator, stream: &mut SeedStream) -> Self {
        Self {
            mean: mean(values),
            std: std_dev(values, 1),
            ci: estimator.mean_interval(values, stream),
        }
    }
}

/// The three analyses, by output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Analysis {
    Retrieval,
    Stability,
    Spread,
}

impl Analysis {
    pub const ALL: [Analysis; 3] = [Analysis::Retrieval, Analysis::Stability, Analysis::Spread];

    pub fn file_name(self) -> &'static str {
        match self {
            Analysis::Retrieval => "RQ1_results.json",
            Analysis::Stability => "RQ2_results.json",
            Analysis::Spread => "RQ3_results.json",
        }
    }
}

/// Write a report as pretty JSON into `dir`, returning the file path.
pub fn write_report<T: Serialize>(dir: &Path, analysis: Analysis, report: &T) -> Result<PathBuf> {
    let path = dir.join(analysis.file_name());
    tessitura::storage::write_json(&path, report)?;
    Ok(path)
}
