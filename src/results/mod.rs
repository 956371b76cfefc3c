//! Result table: flat rows accumulated across all conditions of a run.

pub mod postproc;
pub mod writer;

use std::collections::BTreeSet;

use crate::model::{DistortionParams, OutputValue, Prediction};

/// Fixed column names shared by grouping, aggregation and persistence.
pub mod columns {
    pub const SNR: &str = "SNR";
    pub const MODEL: &str = "Model";
    pub const SENTENCE: &str = "Sentence number";
    pub const MATERIAL: &str = "Material";
    pub const OUTPUT: &str = "Output";
    pub const VALUE: &str = "Value";
    pub const DIST_PARAMS: &str = "Distortion params";
    pub const INTELLIGIBILITY: &str = "Intelligibility";
    pub const SRT: &str = "SRT";
    pub const REVERSALS: &str = "Reversals";
}

/// Condition identity attached to every row produced for one prediction.
#[derive(Debug, Clone)]
pub struct RowMeta {
    pub model: String,
    pub material: String,
    pub sentence: usize,
    pub snr: f32,
    pub params: DistortionParams,
    /// Converged threshold estimate, adaptive runs only.
    pub srt: Option<f32>,
    /// Total direction reversals, adaptive runs only.
    pub reversals: Option<u32>,
}

/// One flattened result record: condition identity plus one named output.
#[derive(Debug, Clone)]
pub struct ResultRow {
    pub model: String,
    pub material: String,
    pub sentence: usize,
    pub snr: f32,
    pub params: DistortionParams,
    pub output: String,
    pub value: OutputValue,
    /// Percent-correct value, set by `to_percent_correct`; `None` until a
    /// mapping has been applied to this row.
    pub intelligibility: Option<f32>,
    pub srt: Option<f32>,
    pub reversals: Option<u32>,
    /// Untouched model output, kept for audit. Dropped when writing CSV.
    pub full_prediction: Option<Prediction>,
}

/// Flatten one prediction into rows, one per named output.
///
/// A prediction with k entries in its `p` map yields exactly k rows, all
/// sharing the same condition metadata and carrying the full prediction.
pub fn flatten(prediction: &Prediction, meta: &RowMeta) -> Vec<ResultRow> {
    prediction
        .p
        .iter()
        .map(|(name, value)| ResultRow {
            model: meta.model.clone(),
            material: meta.material.clone(),
            sentence: meta.sentence,
            snr: meta.snr,
            params: meta.params.clone(),
            output: name.clone(),
            value: value.clone(),
            intelligibility: None,
            srt: meta.srt,
            reversals: meta.reversals,
            full_prediction: Some(prediction.clone()),
        })
        .collect()
}

/// Append-only collection of result rows.
///
/// Row order has no meaning beyond grouping; distributed runs append partial
/// tables in completion order.
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: ResultRow) {
        self.rows.push(row);
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = ResultRow>) {
        self.rows.extend(rows);
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [ResultRow] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Union of named distortion-parameter columns present in the table,
    /// in sorted order.
    pub fn named_param_columns(&self) -> Vec<String> {
        let mut keys = BTreeSet::new();
        for row in &self.rows {
            if let DistortionParams::Named(map) = &row.params {
                keys.extend(map.keys().cloned());
            }
        }
        keys.into_iter().collect()
    }

    /// True when any row carries non-trivial positional distortion params.
    pub fn has_positional_params(&self) -> bool {
        self.rows.iter().any(|row| {
            matches!(&row.params, DistortionParams::Positional(vs) if !vs.is_empty())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OutputValue;
    use std::collections::BTreeMap;

    fn meta() -> RowMeta {
        RowMeta {
            model: "sepsm".into(),
            material: "clue".into(),
            sentence: 3,
            snr: -6.0,
            params: DistortionParams::None,
            srt: None,
            reversals: None,
        }
    }

    #[test]
    fn flatten_yields_one_row_per_output() {
        let mut pred = Prediction::default();
        pred.p.insert("snr_env".into(), OutputValue::Scalar(31.0));
        pred.p.insert("stoi".into(), OutputValue::Scalar(0.7));
        pred.p
            .insert("bands".into(), OutputValue::Series(vec![1.0, 2.0]));

        let rows = flatten(&pred, &meta());
        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert_eq!(row.model, "sepsm");
            assert_eq!(row.material, "clue");
            assert_eq!(row.sentence, 3);
            assert_eq!(row.snr, -6.0);
            assert_eq!(row.full_prediction.as_ref().unwrap(), &pred);
        }
        let outputs: Vec<_> = rows.iter().map(|r| r.output.as_str()).collect();
        assert_eq!(outputs, vec!["bands", "snr_env", "stoi"]);
    }

    #[test]
    fn named_param_columns_are_unioned_and_sorted() {
        let mut table = ResultTable::new();
        let pred = Prediction::scalar("p1", 1.0);

        let mut m = meta();
        let mut params = BTreeMap::new();
        params.insert("reverb_s".to_string(), 0.4);
        m.params = DistortionParams::Named(params);
        table.extend(flatten(&pred, &m));

        let mut m2 = meta();
        let mut params2 = BTreeMap::new();
        params2.insert("cutoff_hz".to_string(), 2000.0);
        m2.params = DistortionParams::Named(params2);
        table.extend(flatten(&pred, &m2));

        assert_eq!(table.named_param_columns(), vec!["cutoff_hz", "reverb_s"]);
        assert!(!table.has_positional_params());
    }
}
