//! Signal conditioning utilities: length alignment, level normalization and
//! signal addition. All functions are pure; inputs are never mutated.
//!
//! Levels follow the dB SPL convention where an RMS of 1 corresponds to the
//! reference offset (100 dB SPL by default).

use rand::{Rng, SeedableRng};

use crate::error::Error;

/// Reference offset: RMS = 1 maps to this many dB SPL.
pub const DEFAULT_DB_OFFSET: f32 = 100.0;

/// Make two signals the same length.
///
/// When `a` is shorter, it is zero-padded to `b`'s length if `extend_first`
/// is true, otherwise `b` is truncated to `a`'s length. When `b` is shorter
/// (or equal), `b` is zero-padded. Truncation drops trailing samples
/// silently; that is the intended policy, not data corruption.
pub fn align_length(a: &[f32], b: &[f32], extend_first: bool) -> (Vec<f32>, Vec<f32>) {
    if a.len() < b.len() {
        if extend_first {
            let mut c = vec![0.0f32; b.len()];
            c[..a.len()].copy_from_slice(a);
            (c, b.to_vec())
        } else {
            (a.to_vec(), b[..a.len()].to_vec())
        }
    } else {
        let mut c = vec![0.0f32; a.len()];
        c[..b.len()].copy_from_slice(b);
        (a.to_vec(), c)
    }
}

/// Elementwise sum of two signals, the shorter one zero-extended.
///
/// Commutative; the output has the length of the longer input.
pub fn add_signals(a: &[f32], b: &[f32]) -> Vec<f32> {
    let (long, short) = if a.len() < b.len() { (b, a) } else { (a, b) };
    let mut c = long.to_vec();
    for (ci, &si) in c.iter_mut().zip(short.iter()) {
        *ci += si;
    }
    c
}

/// Root-mean-square value of a signal.
///
/// With `ac` set, the mean is removed first so only the AC component counts.
pub fn rms(x: &[f32], ac: bool) -> f32 {
    if x.is_empty() {
        return 0.0;
    }
    let n = x.len() as f32;
    if ac {
        let mean = x.iter().sum::<f32>() / n;
        (x.iter().map(|&v| (v - mean) * (v - mean)).sum::<f32>() / n).sqrt()
    } else {
        (x.iter().map(|&v| v * v).sum::<f32>() / n).sqrt()
    }
}

/// Level of a signal in dB SPL: `20*log10(rms) + offset`.
pub fn dbspl(x: &[f32], ac: bool, offset: f32) -> f32 {
    20.0 * rms(x, ac).log10() + offset
}

/// Scale a signal so that its level in dB SPL equals `level_db`.
///
/// Returns `Error::Domain` for a silent signal, where the scaling factor is
/// undefined.
pub fn set_level(x: &[f32], level_db: f32, ac: bool, offset: f32) -> Result<Vec<f32>, Error> {
    let r = rms(x, ac);
    if r == 0.0 {
        return Err(Error::Domain(
            "cannot set the level of a silent (zero-RMS) signal".into(),
        ));
    }
    let gain = 10.0f32.powf((level_db - offset) / 20.0) / r;
    Ok(x.iter().map(|&v| v * gain).collect())
}

/// Uniform white noise in [-1, 1), seeded for reproducibility.
pub fn white_noise(n: usize, seed: u64) -> Vec<f32> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random_range(-1.0..1.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_length_pads_first_when_extending() {
        let a = [1.0, 2.0];
        let b = [3.0, 4.0, 5.0, 6.0];
        let (a2, b2) = align_length(&a, &b, true);
        assert_eq!(a2, vec![1.0, 2.0, 0.0, 0.0]);
        assert_eq!(b2, b.to_vec());
    }

    #[test]
    fn align_length_truncates_second_otherwise() {
        let a = [1.0, 2.0];
        let b = [3.0, 4.0, 5.0, 6.0];
        let (a2, b2) = align_length(&a, &b, false);
        assert_eq!(a2, a.to_vec());
        assert_eq!(b2, vec![3.0, 4.0]);
    }

    #[test]
    fn align_length_pads_second_when_shorter() {
        // extend_first only matters when `a` is the short one
        let a = [1.0, 2.0, 3.0];
        let b = [4.0];
        for extend_first in [true, false] {
            let (a2, b2) = align_length(&a, &b, extend_first);
            assert_eq!(a2, a.to_vec());
            assert_eq!(b2, vec![4.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn add_signals_zero_extends_shorter() {
        let a = [1.0, 2.0, 3.0];
        let b = [10.0, 20.0];
        assert_eq!(add_signals(&a, &b), vec![11.0, 22.0, 3.0]);
        assert_eq!(add_signals(&b, &a), vec![11.0, 22.0, 3.0]);
    }

    #[test]
    fn rms_of_known_signal() {
        let x = [1.0, -1.0, 1.0, -1.0];
        assert!((rms(&x, false) - 1.0).abs() < 1e-6);
        // mean is zero, AC removal changes nothing
        assert!((rms(&x, true) - 1.0).abs() < 1e-6);
        // constant signal has zero AC power
        let y = [0.5; 8];
        assert!(rms(&y, true).abs() < 1e-6);
    }

    #[test]
    fn set_level_round_trip() {
        let x = white_noise(4096, 7);
        for level in [40.0, 65.0, 100.0] {
            let y = set_level(&x, level, false, DEFAULT_DB_OFFSET).unwrap();
            let got = dbspl(&y, false, DEFAULT_DB_OFFSET);
            assert!((got - level).abs() < 1e-3, "level {level} -> {got}");
        }
    }

    #[test]
    fn set_level_rejects_silence() {
        let silent = vec![0.0f32; 128];
        assert!(matches!(
            set_level(&silent, 65.0, false, DEFAULT_DB_OFFSET),
            Err(Error::Domain(_))
        ));
    }
}
