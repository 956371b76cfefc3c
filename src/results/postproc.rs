//! Post-processing of a result table: percent-correct conversion, grouping
//! and SRT extraction from intelligibility-vs-SNR curves.

use std::collections::BTreeMap;

use tracing::debug;

use crate::crossing::find_crossing;
use crate::error::Error;
use crate::model::DistortionParams;
use crate::results::{columns, ResultRow, ResultTable};

/// Which rows a percent-correct mapping applies to.
#[derive(Debug, Clone)]
pub enum ModelSelector {
    /// Every row.
    All,
    /// Rows of one model.
    Name(String),
    /// Rows of any of the listed models.
    Names(Vec<String>),
    /// Model name -> output name, for models with several outputs where the
    /// mapping only applies to one of them.
    Outputs(BTreeMap<String, String>),
}

impl ModelSelector {
    fn matches(&self, row: &ResultRow) -> bool {
        match self {
            ModelSelector::All => true,
            ModelSelector::Name(name) => row.model == *name,
            ModelSelector::Names(names) => names.iter().any(|n| row.model == *n),
            ModelSelector::Outputs(map) => map
                .get(&row.model)
                .is_some_and(|output| row.output == *output),
        }
    }
}

/// Numeric column of a result row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Value,
    Intelligibility,
    Srt,
}

impl Column {
    fn get(self, row: &ResultRow) -> Option<f32> {
        match self {
            Column::Value => row.value.as_scalar(),
            Column::Intelligibility => row.intelligibility,
            Column::Srt => row.srt,
        }
    }
}

/// SRT estimate for one condition group and (model, output) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct SrtEstimate {
    /// (column name, value) pairs of the grouping dimensions.
    pub group: Vec<(String, String)>,
    pub model: String,
    pub output: String,
    /// `None` when the curve never crosses the criterion.
    pub srt: Option<f32>,
}

impl ResultRow {
    /// Value of a grouping column for this row, formatted for comparison.
    ///
    /// Named parameters resolve through the params map; the consolidated
    /// positional column formats the whole tuple.
    pub fn param_value(&self, key: &str) -> String {
        if key == columns::DIST_PARAMS {
            match &self.params {
                DistortionParams::Positional(vs) => {
                    let joined = vs
                        .iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("({joined})")
                }
                _ => String::new(),
            }
        } else {
            match &self.params {
                DistortionParams::Named(map) => map
                    .get(key)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
                _ => String::new(),
            }
        }
    }
}

impl ResultTable {
    /// Apply `fc` to `column` for rows matched by `selector`, storing the
    /// result in the intelligibility field. Unselected rows are untouched
    /// (unset until a mapping reaches them). Rows whose column holds no
    /// scalar are skipped.
    pub fn to_percent_correct<F>(&mut self, fc: F, column: Column, selector: &ModelSelector)
    where
        F: Fn(f32) -> f32,
    {
        for row in self.rows_mut() {
            if !selector.matches(row) {
                continue;
            }
            if let Some(v) = column.get(row) {
                row.intelligibility = Some(fc(v));
            }
        }
    }

    /// Grouping dimensions for aggregation: every column that is not part of
    /// the fixed metadata set. A non-trivial consolidated positional-params
    /// column wins over individual named columns. SNR and model are always
    /// the trailing group dimensions.
    pub fn grouping_keys(&self, exclude: Option<&str>) -> Vec<String> {
        let mut keys = if self.has_positional_params() {
            vec![columns::DIST_PARAMS.to_string()]
        } else {
            self.named_param_columns()
        };
        if let Some(var) = exclude {
            keys.retain(|k| k != var);
        }
        debug!(?keys, "parameter grouping keys");
        keys.push(columns::SNR.to_string());
        keys.push(columns::MODEL.to_string());
        keys
    }

    /// Derive SRTs per condition group from the SNR-vs-`column` curves.
    ///
    /// Rows are first averaged across the sentence dimension, then for each
    /// (model, output) pair within a parameter group the curve is
    /// interpolated at the criterion. `per_model` overrides the criterion
    /// for specific (model name, output name) pairs.
    pub fn srts_from_table(
        &self,
        column: Column,
        criterion: f32,
        per_model: &BTreeMap<(String, String), f32>,
    ) -> Result<Vec<SrtEstimate>, Error> {
        let param_keys = if self.has_positional_params() {
            vec![columns::DIST_PARAMS.to_string()]
        } else {
            self.named_param_columns()
        };

        // (group values, model, output) -> snr bits -> (snr, sum, count)
        type CurveAcc = BTreeMap<u32, (f32, f32, usize)>;
        let mut acc: BTreeMap<(Vec<String>, String, String), CurveAcc> = BTreeMap::new();

        for row in self.rows() {
            let Some(v) = column.get(row) else { continue };
            let group: Vec<String> = param_keys.iter().map(|k| row.param_value(k)).collect();
            let key = (group, row.model.clone(), row.output.clone());
            let entry = acc
                .entry(key)
                .or_default()
                .entry(row.snr.to_bits())
                .or_insert((row.snr, 0.0, 0));
            entry.1 += v;
            entry.2 += 1;
        }

        let mut estimates = Vec::with_capacity(acc.len());
        for ((group, model, output), curve) in acc {
            let mut points: Vec<(f32, f32)> = curve
                .into_values()
                .map(|(snr, sum, n)| (snr, sum / n as f32))
                .collect();
            points.sort_by(|a, b| a.0.total_cmp(&b.0));

            let snrs: Vec<f32> = points.iter().map(|p| p.0).collect();
            let means: Vec<f32> = points.iter().map(|p| p.1).collect();
            let target = per_model
                .get(&(model.clone(), output.clone()))
                .copied()
                .unwrap_or(criterion);

            let srt = find_crossing(&snrs, &means, target)?;
            debug!(%model, %output, ?srt, "threshold interpolation");
            estimates.push(SrtEstimate {
                group: param_keys.iter().cloned().zip(group).collect(),
                model,
                output,
                srt,
            });
        }
        Ok(estimates)
    }
}
