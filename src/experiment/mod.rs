//! Batch experiment orchestration.
//!
//! An [`Experiment`] enumerates the cross-product of (target, distortion
//! params, SNR, model) and evaluates each condition independently; an
//! [`AdaptiveExperiment`] replaces the SNR dimension with one adaptive
//! staircase per (target, params, model) group. Both execute sequentially or
//! on a worker pool and fold everything into one [`ResultTable`].

pub mod preprocess;
pub mod staircase;
pub mod worker;

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{ExecutionMode, ExperimentConfig, RunOptions};
use crate::error::Error;
use crate::model::{Distortion, DistortionParams, IntelligibilityModel, SpeechMaterial};
use crate::results::{flatten, writer, ResultRow, ResultTable, RowMeta};
use preprocess::Preprocessor;
use staircase::{Staircase, StaircaseConfig};

/// One fixed-SNR condition, fully self-contained so it can cross a worker
/// boundary: it carries its own target and masker and shares the model only
/// through an `Arc`.
pub struct Condition {
    pub sentence: usize,
    pub target: Arc<[f32]>,
    pub masker: Arc<[f32]>,
    pub snr: f32,
    pub params: DistortionParams,
    pub model: Arc<dyn IntelligibilityModel>,
    pub material: String,
}

/// One adaptive staircase run: a (target, params, model) group whose SNR is
/// driven by the staircase instead of the cross-product.
pub struct AdaptiveGroup {
    pub sentence: usize,
    pub target: Arc<[f32]>,
    pub masker: Arc<[f32]>,
    pub params: DistortionParams,
    pub model: Arc<dyn IntelligibilityModel>,
    pub material: String,
    /// Model output the pass/fail criterion reads.
    pub pred_key: String,
    pub threshold: f32,
    pub staircase: StaircaseConfig,
}

/// Independent unit of work; no state is shared between items.
pub enum WorkItem {
    Fixed(Condition),
    Adaptive(AdaptiveGroup),
}

impl WorkItem {
    pub(crate) fn evaluate(&self, pre: &Preprocessor) -> Result<Vec<ResultRow>, Error> {
        match self {
            WorkItem::Fixed(cond) => evaluate_fixed(pre, cond),
            WorkItem::Adaptive(group) => evaluate_adaptive(pre, group),
        }
    }

    fn sentence(&self) -> usize {
        match self {
            WorkItem::Fixed(c) => c.sentence,
            WorkItem::Adaptive(g) => g.sentence,
        }
    }
}

fn evaluate_fixed(pre: &Preprocessor, cond: &Condition) -> Result<Vec<ResultRow>, Error> {
    let triple = pre.preprocess(&cond.target, &cond.masker, cond.snr, &cond.params)?;
    let res = cond
        .model
        .predict(&triple.target, &triple.mixture, &triple.masker)?;
    Ok(flatten(
        &res,
        &RowMeta {
            model: cond.model.name().to_string(),
            material: cond.material.clone(),
            sentence: cond.sentence,
            snr: cond.snr,
            params: cond.params.clone(),
            srt: None,
            reversals: None,
        },
    ))
}

fn evaluate_adaptive(pre: &Preprocessor, group: &AdaptiveGroup) -> Result<Vec<ResultRow>, Error> {
    debug!(
        pred_key = %group.pred_key,
        threshold = group.threshold,
        "starting staircase"
    );
    let mut sc = Staircase::new(group.staircase.clone(), group.threshold);

    let res = loop {
        let triple = pre.preprocess(&group.target, &group.masker, sc.snr(), &group.params)?;
        let res = group
            .model
            .predict(&triple.target, &triple.mixture, &triple.masker)?;
        let pred = res.scalar_output(&group.pred_key)?;
        info!(snr = sc.snr(), sentence = group.sentence, pred, "staircase step");
        sc.observe(pred);
        if sc.converged() {
            break res;
        }
    };

    Ok(flatten(
        &res,
        &RowMeta {
            model: group.model.name().to_string(),
            material: group.material.clone(),
            sentence: group.sentence,
            snr: sc.snr(),
            params: group.params.clone(),
            srt: Some(sc.srt()),
            reversals: Some(sc.total_reversals()),
        },
    ))
}

fn dispatch(
    pre: Preprocessor,
    items: Vec<WorkItem>,
    mode: ExecutionMode,
) -> Result<ResultTable, Error> {
    match mode {
        ExecutionMode::Sequential => {
            let mut table = ResultTable::new();
            for (ii, item) in items.iter().enumerate() {
                info!(simulation = ii, sentence = item.sentence(), "running condition");
                table.extend(item.evaluate(&pre)?);
            }
            Ok(table)
        }
        ExecutionMode::Distributed { workers } => worker::run_pool(pre, items, workers),
    }
}

/// Fixed-SNR sweep over the full condition cross-product.
pub struct Experiment {
    pub config: ExperimentConfig,
    pub models: Vec<Arc<dyn IntelligibilityModel>>,
    pub snrs: Vec<f32>,
    pub dist_params: Vec<DistortionParams>,
    pub distortion: Option<Arc<dyn Distortion>>,
}

impl Experiment {
    pub fn new(models: Vec<Arc<dyn IntelligibilityModel>>, snrs: Vec<f32>) -> Self {
        Self {
            config: ExperimentConfig::default(),
            models,
            snrs,
            dist_params: vec![DistortionParams::None],
            distortion: None,
        }
    }

    /// Run the experiment and return the accumulated table.
    ///
    /// The material provider is reseeded once before loading, so a run is
    /// reproducible for a given seed regardless of execution mode: maskers
    /// are drawn during enumeration, in cross-product order, and every work
    /// item is self-contained from then on.
    pub fn run(
        &self,
        material: &mut dyn SpeechMaterial,
        opts: &RunOptions,
    ) -> Result<ResultTable, Error> {
        material.reseed(opts.seed);
        let targets = material.load_files(opts.n)?;
        let material_name = material.name().to_string();
        info!(
            targets = targets.len(),
            snrs = self.snrs.len(),
            models = self.models.len(),
            "enumerating conditions"
        );

        let mut items = Vec::new();
        for (sentence, target) in targets.iter().enumerate() {
            let target: Arc<[f32]> = Arc::from(target.as_slice());
            for params in &self.dist_params {
                debug!(?params, "enumerating distortion parameters");
                for &snr in &self.snrs {
                    for model in &self.models {
                        let masker: Arc<[f32]> = Arc::from(material.ssn(&target));
                        items.push(WorkItem::Fixed(Condition {
                            sentence,
                            target: Arc::clone(&target),
                            masker,
                            snr,
                            params: params.clone(),
                            model: Arc::clone(model),
                            material: material_name.clone(),
                        }));
                    }
                }
            }
        }

        let pre = Preprocessor::new(&self.config, self.distortion.clone());
        let table = dispatch(pre, items, opts.mode)?;

        if self.config.write {
            writer::write_table(&table, &self.config, opts.output_filename.as_deref())?;
        }
        Ok(table)
    }
}

/// Adaptive-staircase experiment: one SRT track per (target, params, model).
pub struct AdaptiveExperiment {
    pub experiment: Experiment,
    /// Per-model (output name, criterion threshold), parallel to
    /// `experiment.models`. e.g. `("snr_env", 33.5)`.
    pub pred_keys_and_thresholds: Vec<(String, f32)>,
    pub staircase: StaircaseConfig,
}

impl AdaptiveExperiment {
    pub fn new(
        experiment: Experiment,
        pred_keys_and_thresholds: Vec<(String, f32)>,
    ) -> Self {
        Self {
            experiment,
            pred_keys_and_thresholds,
            staircase: StaircaseConfig::default(),
        }
    }

    /// Run one staircase per condition group; each resulting row carries the
    /// converged SRT and total reversal count alongside the last prediction.
    pub fn run(
        &self,
        material: &mut dyn SpeechMaterial,
        opts: &RunOptions,
    ) -> Result<ResultTable, Error> {
        material.reseed(opts.seed);
        let targets = material.load_files(opts.n)?;
        let material_name = material.name().to_string();

        let mut items = Vec::new();
        for (sentence, target) in targets.iter().enumerate() {
            let target: Arc<[f32]> = Arc::from(target.as_slice());
            for params in &self.experiment.dist_params {
                for (model, (pred_key, threshold)) in self
                    .experiment
                    .models
                    .iter()
                    .zip(&self.pred_keys_and_thresholds)
                {
                    let masker: Arc<[f32]> = Arc::from(material.ssn(&target));
                    items.push(WorkItem::Adaptive(AdaptiveGroup {
                        sentence,
                        target: Arc::clone(&target),
                        masker,
                        params: params.clone(),
                        model: Arc::clone(model),
                        material: material_name.clone(),
                        pred_key: pred_key.clone(),
                        threshold: *threshold,
                        staircase: self.staircase.clone(),
                    }));
                }
            }
        }

        let pre = Preprocessor::new(&self.experiment.config, self.experiment.distortion.clone());
        let table = dispatch(pre, items, opts.mode)?;

        if self.experiment.config.write {
            writer::write_table(
                &table,
                &self.experiment.config,
                opts.output_filename.as_deref(),
            )?;
        }
        Ok(table)
    }
}
