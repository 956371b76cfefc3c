//! Contracts for the external collaborators of an experiment: the
//! intelligibility model, the speech material provider and the optional
//! distortion process.
//!
//! Models and materials must provide their own name; the experiment never
//! guesses one from the type at call sites.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::Error;

/// One named model output: a scalar or a sampled series.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputValue {
    Scalar(f32),
    Series(Vec<f32>),
}

impl OutputValue {
    pub fn as_scalar(&self) -> Option<f32> {
        match self {
            OutputValue::Scalar(v) => Some(*v),
            OutputValue::Series(_) => None,
        }
    }
}

impl fmt::Display for OutputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputValue::Scalar(v) => write!(f, "{v}"),
            OutputValue::Series(vs) => {
                for (i, v) in vs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ";")?;
                    }
                    write!(f, "{v}")?;
                }
                Ok(())
            }
        }
    }
}

/// Output of one model evaluation.
///
/// The `p` map holds the named predictions the experiment consumes. Anything
/// else the model wants to report goes into `extra` and is carried through
/// untouched for later inspection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Prediction {
    pub p: BTreeMap<String, OutputValue>,
    pub extra: BTreeMap<String, OutputValue>,
}

impl Prediction {
    /// Prediction with a single named scalar output.
    pub fn scalar(name: impl Into<String>, value: f32) -> Self {
        let mut p = BTreeMap::new();
        p.insert(name.into(), OutputValue::Scalar(value));
        Self {
            p,
            extra: BTreeMap::new(),
        }
    }

    /// Scalar value of the named output, if present.
    pub fn scalar_output(&self, name: &str) -> Result<f32, Error> {
        self.p
            .get(name)
            .and_then(OutputValue::as_scalar)
            .ok_or_else(|| Error::MissingOutput(name.to_string()))
    }
}

/// Parameters handed to the distortion process.
///
/// Named parameters become individual result columns; positional parameters
/// are kept together in one consolidated column.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DistortionParams {
    #[default]
    None,
    Positional(Vec<f32>),
    Named(BTreeMap<String, f32>),
}

impl DistortionParams {
    pub fn is_none(&self) -> bool {
        matches!(self, DistortionParams::None)
    }
}

/// A speech intelligibility model.
///
/// `Send + Sync` so that handles can cross worker boundaries as `Arc`s in
/// distributed runs.
pub trait IntelligibilityModel: Send + Sync {
    /// Label used in result rows.
    fn name(&self) -> &str;

    /// Predict intelligibility for one preprocessed (target, mixture,
    /// masker) triple.
    fn predict(
        &self,
        target: &[f32],
        mixture: &[f32],
        masker: &[f32],
    ) -> Result<Prediction, Error>;
}

/// Provider of target sentences and maskers.
pub trait SpeechMaterial {
    /// Label used in result rows.
    fn name(&self) -> &str;

    /// Reset the provider's random state. Called once per run, before any
    /// material is loaded, so masker sampling is reproducible.
    fn reseed(&mut self, _seed: u64) {}

    /// Load up to `n` target sentences (all of them when `None`).
    fn load_files(&mut self, n: Option<usize>) -> Result<Vec<Vec<f32>>, Error>;

    /// Speech-shaped-noise masker keyed to a target.
    fn ssn(&mut self, target: &[f32]) -> Vec<f32>;
}

/// Optional distortion applied to the (target, masker) pair before the
/// levels are set (or after, depending on configuration).
pub trait Distortion: Send + Sync {
    fn apply(
        &self,
        target: &[f32],
        masker: &[f32],
        params: &DistortionParams,
    ) -> (Vec<f32>, Vec<f32>);
}
