//! srtlab: controlled psychoacoustic experiments for estimating
//! speech-reception thresholds (SRTs).
//!
//! An experiment evaluates speech intelligibility models over a
//! cross-product of conditions — target sentences, distortions, SNRs — either
//! as a fixed-SNR sweep or with an adaptive staircase that converges on the
//! SNR where a model output crosses a criterion. Results accumulate into a
//! flat table from which thresholds are extracted by linear interpolation.
//!
//! The intelligibility model, the speech material and the optional
//! distortion are external collaborators, specified as traits in
//! [`model`].

pub mod config;
pub mod crossing;
pub mod envelope;
pub mod error;
pub mod experiment;
pub mod model;
pub mod results;
pub mod signal;

pub use config::{ExecutionMode, ExperimentConfig, RunOptions};
pub use error::Error;
pub use experiment::staircase::{Staircase, StaircaseConfig};
pub use experiment::{AdaptiveExperiment, Experiment};
pub use model::{
    Distortion, DistortionParams, IntelligibilityModel, OutputValue, Prediction, SpeechMaterial,
};
pub use results::{ResultRow, ResultTable};
