//! Adaptive staircase: an up/down search that converges on the SNR where a
//! model output crosses a criterion threshold.
//!
//! The state machine is explicit — one named state (direction, step index,
//! reversal counters) updated by a single transition per observation — so
//! every transition edge can be tested on its own.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Staircase parameters.
///
/// `step_sizes` is ordered, smallest step last; the step index advances on
/// downward reversals and never retreats. With a single-entry schedule the
/// final step is active from the start, so every reversal counts as a test
/// reversal. That is intended, not an edge case to paper over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaircaseConfig {
    #[serde(default = "StaircaseConfig::default_start_snr")]
    pub start_snr: f32,
    #[serde(default = "StaircaseConfig::default_step_sizes")]
    pub step_sizes: Vec<f32>,
    /// Number of final-step reversals used for the SRT estimate.
    #[serde(default = "StaircaseConfig::default_n_test_reversals")]
    pub n_test_reversals: usize,
}

impl StaircaseConfig {
    fn default_start_snr() -> f32 {
        20.0
    }
    fn default_step_sizes() -> Vec<f32> {
        vec![4.0, 2.0, 1.0]
    }
    fn default_n_test_reversals() -> usize {
        6
    }
}

impl Default for StaircaseConfig {
    fn default() -> Self {
        Self {
            start_snr: Self::default_start_snr(),
            step_sizes: Self::default_step_sizes(),
            n_test_reversals: Self::default_n_test_reversals(),
        }
    }
}

/// Movement direction of the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Descending,
    Ascending,
}

/// One staircase run.
///
/// Created at the start of a track, fed one prediction per iteration via
/// [`Staircase::observe`], discarded once the SRT and reversal count have
/// been read out.
#[derive(Debug, Clone)]
pub struct Staircase {
    config: StaircaseConfig,
    threshold: f32,
    snr: f32,
    step_index: usize,
    direction: Direction,
    total_reversals: u32,
    test_reversals: usize,
    history: Vec<(f32, f32)>,
}

impl Staircase {
    pub fn new(config: StaircaseConfig, threshold: f32) -> Self {
        let snr = config.start_snr;
        Self {
            config,
            threshold,
            snr,
            step_index: 0,
            direction: Direction::Descending,
            total_reversals: 0,
            test_reversals: 0,
            history: Vec::new(),
        }
    }

    /// SNR to evaluate next.
    pub fn snr(&self) -> f32 {
        self.snr
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Total direction reversals so far.
    pub fn total_reversals(&self) -> u32 {
        self.total_reversals
    }

    pub fn test_reversals(&self) -> usize {
        self.test_reversals
    }

    /// Evaluated (SNR, prediction) pairs, in order.
    pub fn history(&self) -> &[(f32, f32)] {
        &self.history
    }

    /// The track stops once the test-reversal count exceeds the configured
    /// number — one more reversal than requested, because the check runs
    /// after the increment. Deliberately preserved.
    pub fn converged(&self) -> bool {
        self.test_reversals > self.config.n_test_reversals
    }

    fn at_final_step(&self) -> bool {
        self.step_index == self.config.step_sizes.len() - 1
    }

    /// Feed the model output observed at the current SNR and advance the
    /// state machine by one transition.
    pub fn observe(&mut self, pred: f32) {
        let step = self.config.step_sizes[self.step_index];
        self.history.push((self.snr, pred));

        if pred >= self.threshold {
            self.snr -= step;
            debug!(snr = self.snr, step, "decreased SNR");
            if self.direction == Direction::Ascending {
                self.direction = Direction::Descending;
                self.total_reversals += 1;
                // Step size changes on downward reversals only.
                self.step_index = (self.step_index + 1).min(self.config.step_sizes.len() - 1);
                if self.at_final_step() {
                    self.test_reversals += 1;
                }
                debug!(direction = ?self.direction, step_index = self.step_index, "reversal");
            }
        } else {
            self.snr += step;
            debug!(snr = self.snr, step, "increased SNR");
            if self.direction == Direction::Descending {
                self.direction = Direction::Ascending;
                self.total_reversals += 1;
                if self.at_final_step() {
                    self.test_reversals += 1;
                }
                debug!(direction = ?self.direction, step_index = self.step_index, "reversal");
            }
        }
    }

    /// Converged SRT estimate: the mean SNR of the last `n_test_reversals`
    /// logged observations (observations, not reversals).
    pub fn srt(&self) -> f32 {
        let n = self.config.n_test_reversals.min(self.history.len());
        if n == 0 {
            return self.config.start_snr;
        }
        let tail = &self.history[self.history.len() - n..];
        tail.iter().map(|(snr, _)| snr).sum::<f32>() / n as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(step_sizes: Vec<f32>, n_test_reversals: usize) -> Staircase {
        Staircase::new(
            StaircaseConfig {
                start_snr: 10.0,
                step_sizes,
                n_test_reversals,
            },
            50.0,
        )
    }

    #[test]
    fn descent_without_flip_keeps_step_and_counters() {
        let mut sc = track(vec![4.0, 2.0, 1.0], 6);
        sc.observe(80.0);
        sc.observe(80.0);
        assert_eq!(sc.snr(), 2.0);
        assert_eq!(sc.direction(), Direction::Descending);
        assert_eq!(sc.total_reversals(), 0);
        assert_eq!(sc.test_reversals(), 0);
        assert_eq!(sc.history(), &[(10.0, 80.0), (6.0, 80.0)]);
    }

    #[test]
    fn upward_flip_counts_reversal_but_keeps_step() {
        let mut sc = track(vec![4.0, 2.0, 1.0], 6);
        sc.observe(80.0); // descend to 6
        sc.observe(20.0); // flip: ascend to 10
        assert_eq!(sc.snr(), 10.0);
        assert_eq!(sc.direction(), Direction::Ascending);
        assert_eq!(sc.total_reversals(), 1);
        // step index unchanged on upward flips, and not at final step
        assert_eq!(sc.test_reversals(), 0);
    }

    #[test]
    fn downward_flip_advances_step_size() {
        let mut sc = track(vec![4.0, 2.0, 1.0], 6);
        sc.observe(20.0); // flip up (initial direction is descending)
        sc.observe(80.0); // flip down: advance to step 2.0
        assert_eq!(sc.total_reversals(), 2);
        assert_eq!(sc.test_reversals(), 0);
        // next descent uses the new step size
        sc.observe(80.0);
        assert_eq!(sc.snr(), 10.0 + 4.0 - 4.0 - 2.0);
    }

    #[test]
    fn reversals_at_final_step_are_test_reversals() {
        let mut sc = track(vec![4.0, 2.0, 1.0], 6);
        // Alternate to walk the step schedule down to the final step.
        sc.observe(20.0); // up-flip
        sc.observe(80.0); // down-flip -> step 2.0
        sc.observe(20.0); // up-flip (at step 2.0, not final)
        sc.observe(80.0); // down-flip -> step 1.0 (final): test reversal
        assert_eq!(sc.test_reversals(), 1);
        sc.observe(20.0); // up-flip at final step: test reversal
        assert_eq!(sc.test_reversals(), 2);
        assert_eq!(sc.total_reversals(), 5);
    }

    #[test]
    fn single_step_schedule_makes_every_reversal_a_test_reversal() {
        let mut sc = track(vec![2.0], 3);
        for i in 0..8 {
            sc.observe(if i % 2 == 0 { 20.0 } else { 80.0 });
        }
        assert_eq!(sc.total_reversals(), 8);
        assert_eq!(sc.test_reversals(), 8);
    }

    #[test]
    fn termination_runs_one_reversal_past_the_configured_count() {
        let mut sc = track(vec![2.0], 2);
        let mut iterations = 0;
        while !sc.converged() {
            // alternate so each observation flips direction
            sc.observe(if iterations % 2 == 0 { 20.0 } else { 80.0 });
            iterations += 1;
        }
        // convergence requires test_reversals > n, i.e. n + 1 reversals
        assert_eq!(sc.test_reversals(), 3);
    }

    #[test]
    fn srt_averages_the_last_logged_snrs() {
        let mut sc = track(vec![2.0], 2);
        sc.observe(80.0); // (10, .)
        sc.observe(20.0); // (8, .)
        sc.observe(80.0); // (10, .)
        // last two logged SNRs are 8 and 10
        assert!((sc.srt() - 9.0).abs() < 1e-6);
        assert_eq!(sc.history().len(), 3);
    }
}
