use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Experiment-wide configuration.
///
/// An immutable value handed to every component; there is no process-wide
/// experiment state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Reference presentation level in dB SPL.
    #[serde(default = "ExperimentConfig::default_fixed_level_db")]
    pub fixed_level_db: f32,
    /// Keep the target at the fixed level and move the masker by the SNR;
    /// when false, the masker is the reference and the target moves.
    #[serde(default = "ExperimentConfig::default_fixed_target")]
    pub fixed_target: bool,
    /// Set levels before the distortion stage instead of after it.
    #[serde(default)]
    pub adjust_levels_before_distortion: bool,
    /// dB SPL corresponding to an RMS of 1.
    #[serde(default = "ExperimentConfig::default_reference_offset_db")]
    pub reference_offset_db: f32,
    /// Optional run name, appended to the output filename.
    #[serde(default)]
    pub name: Option<String>,
    /// Write the result table to CSV after the run.
    #[serde(default = "ExperimentConfig::default_write")]
    pub write: bool,
    #[serde(default = "ExperimentConfig::default_output_dir")]
    pub output_dir: PathBuf,
    /// chrono format string for the timestamp in default filenames.
    #[serde(default = "ExperimentConfig::default_timestamp_format")]
    pub timestamp_format: String,
}

impl ExperimentConfig {
    fn default_fixed_level_db() -> f32 {
        65.0
    }
    fn default_fixed_target() -> bool {
        true
    }
    fn default_reference_offset_db() -> f32 {
        100.0
    }
    fn default_write() -> bool {
        true
    }
    fn default_output_dir() -> PathBuf {
        PathBuf::from("./output")
    }
    fn default_timestamp_format() -> String {
        "%Y%m%d-%H%M%S".to_string()
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            fixed_level_db: Self::default_fixed_level_db(),
            fixed_target: Self::default_fixed_target(),
            adjust_levels_before_distortion: false,
            reference_offset_db: Self::default_reference_offset_db(),
            name: None,
            write: Self::default_write(),
            output_dir: Self::default_output_dir(),
            timestamp_format: Self::default_timestamp_format(),
        }
    }
}

/// How the condition cross-product is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// Single worker, strict iteration order.
    Sequential,
    /// Independent workers over a channel-fed pool; the coordinator blocks
    /// until every dispatched item has returned.
    Distributed { workers: usize },
}

impl Default for ExecutionMode {
    fn default() -> Self {
        Self::Sequential
    }
}

/// Per-run options.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Number of target sentences to load; `None` loads everything.
    pub n: Option<usize>,
    /// Seed for material/masker sampling, applied once before loading.
    pub seed: u64,
    pub mode: ExecutionMode,
    /// Overrides the timestamped default output filename.
    pub output_filename: Option<String>,
}
