//! Condition preprocessing: alignment, optional distortion and level
//! adjustment for one (target, masker, SNR) tuple.

use std::sync::Arc;

use crate::config::ExperimentConfig;
use crate::error::Error;
use crate::model::{Distortion, DistortionParams};
use crate::signal::{add_signals, align_length, set_level};

/// Equal-length signals handed to a model, levels set per condition.
/// Created fresh for every evaluation and owned by the caller.
#[derive(Debug, Clone)]
pub struct Triple {
    pub target: Vec<f32>,
    pub mixture: Vec<f32>,
    pub masker: Vec<f32>,
}

/// Turns a raw (target, masker, SNR, params) tuple into a [`Triple`].
///
/// The masker is truncated to the target's length when it is longer and
/// zero-padded when it is shorter; the target is never extended.
#[derive(Clone)]
pub struct Preprocessor {
    fixed_level_db: f32,
    fixed_target: bool,
    adjust_levels_before_distortion: bool,
    reference_offset_db: f32,
    distortion: Option<Arc<dyn Distortion>>,
}

impl Preprocessor {
    pub fn new(config: &ExperimentConfig, distortion: Option<Arc<dyn Distortion>>) -> Self {
        Self {
            fixed_level_db: config.fixed_level_db,
            fixed_target: config.fixed_target,
            adjust_levels_before_distortion: config.adjust_levels_before_distortion,
            reference_offset_db: config.reference_offset_db,
            distortion,
        }
    }

    pub fn preprocess(
        &self,
        target: &[f32],
        masker: &[f32],
        snr: f32,
        params: &DistortionParams,
    ) -> Result<Triple, Error> {
        let (mut target, mut masker) = if target.len() != masker.len() {
            align_length(target, masker, false)
        } else {
            (target.to_vec(), masker.to_vec())
        };

        if self.adjust_levels_before_distortion {
            (target, masker) = self.adjust_levels(&target, &masker, snr)?;
        }

        if !params.is_none() {
            if let Some(distortion) = &self.distortion {
                (target, masker) = distortion.apply(&target, &masker, params);
            }
        }

        if !self.adjust_levels_before_distortion {
            (target, masker) = self.adjust_levels(&target, &masker, snr)?;
        }

        let mixture = add_signals(&target, &masker);
        Ok(Triple {
            target,
            mixture,
            masker,
        })
    }

    /// Set target and masker levels for the requested SNR.
    ///
    /// One signal stays at the fixed reference level and the other is moved
    /// by the SNR: with `fixed_target`, masker level = fixed − snr,
    /// otherwise target level = fixed + snr.
    pub fn adjust_levels(
        &self,
        target: &[f32],
        masker: &[f32],
        snr: f32,
    ) -> Result<(Vec<f32>, Vec<f32>), Error> {
        let mut target_level = self.fixed_level_db;
        let mut masker_level = self.fixed_level_db;
        if self.fixed_target {
            masker_level -= snr;
        } else {
            target_level += snr;
        }
        let target = set_level(target, target_level, false, self.reference_offset_db)?;
        let masker = set_level(masker, masker_level, false, self.reference_offset_db)?;
        Ok((target, masker))
    }
}
