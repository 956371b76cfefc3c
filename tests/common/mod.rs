//! Shared test doubles: a deterministic noise material and synthetic models
//! whose predictions are known functions of the presented SNR.
#![allow(dead_code)]

use std::collections::BTreeMap;

use srtlab::envelope::{fft_filter, hilbert_envelope};
use srtlab::error::Error;
use srtlab::model::{IntelligibilityModel, OutputValue, Prediction, SpeechMaterial};
use srtlab::signal::{dbspl, rms, white_noise, DEFAULT_DB_OFFSET};

/// Noise "speech" material: targets and maskers are seeded filtered noise,
/// so a reseeded provider reproduces the exact same draw sequence.
pub struct NoiseMaterial {
    pub n_sentences: usize,
    pub len: usize,
    next_seed: u64,
}

impl NoiseMaterial {
    pub fn new(n_sentences: usize, len: usize) -> Self {
        Self {
            n_sentences,
            len,
            next_seed: 0,
        }
    }

    fn draw(&mut self) -> Vec<f32> {
        let seed = self.next_seed;
        self.next_seed = self.next_seed.wrapping_add(1);
        // crude spectral shaping, enough to look speech-ish
        let smoothing = [0.25f32, 0.5, 0.25];
        fft_filter(&smoothing, &white_noise(self.len, seed))
    }
}

impl SpeechMaterial for NoiseMaterial {
    fn name(&self) -> &str {
        "noise-material"
    }

    fn reseed(&mut self, seed: u64) {
        self.next_seed = seed.wrapping_mul(1_000_003);
    }

    fn load_files(&mut self, n: Option<usize>) -> Result<Vec<Vec<f32>>, Error> {
        let n = n.unwrap_or(self.n_sentences).min(self.n_sentences);
        Ok((0..n).map(|_| self.draw()).collect())
    }

    fn ssn(&mut self, target: &[f32]) -> Vec<f32> {
        let mut masker = self.draw();
        masker.truncate(target.len());
        masker
    }
}

/// Model whose prediction is a logistic function of the presented SNR,
/// inferred from the target/masker level difference. Deterministic and
/// monotonic, so staircases and sweeps have an analytic threshold at
/// `midpoint_db`.
pub struct LogisticModel {
    pub name: String,
    pub midpoint_db: f32,
    pub slope: f32,
}

impl LogisticModel {
    pub fn new(name: &str, midpoint_db: f32) -> Self {
        Self {
            name: name.to_string(),
            midpoint_db,
            slope: 0.7,
        }
    }
}

impl IntelligibilityModel for LogisticModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(
        &self,
        target: &[f32],
        _mixture: &[f32],
        masker: &[f32],
    ) -> Result<Prediction, Error> {
        let snr = dbspl(target, false, DEFAULT_DB_OFFSET) - dbspl(masker, false, DEFAULT_DB_OFFSET);
        let pc = 100.0 / (1.0 + (-self.slope * (snr - self.midpoint_db)).exp());
        Ok(Prediction::scalar("pc", pc))
    }
}

/// Model with several simultaneous outputs, for flatten/selector tests.
pub struct EnvelopeModel;

impl IntelligibilityModel for EnvelopeModel {
    fn name(&self) -> &str {
        "envelope"
    }

    fn predict(
        &self,
        target: &[f32],
        mixture: &[f32],
        _masker: &[f32],
    ) -> Result<Prediction, Error> {
        let env = hilbert_envelope(mixture);
        let mut p = BTreeMap::new();
        p.insert("env_rms".to_string(), OutputValue::Scalar(rms(&env, false)));
        p.insert(
            "target_rms".to_string(),
            OutputValue::Scalar(rms(target, false)),
        );
        p.insert(
            "env_head".to_string(),
            OutputValue::Series(env.into_iter().take(4).collect()),
        );
        Ok(Prediction {
            p,
            extra: BTreeMap::new(),
        })
    }
}
