//! Windowed-FFT tone-energy demodulation.
//!
//! No bit-timing recovery loop runs here: windows are fixed at exactly
//! [`SAMPLES_PER_BIT`] samples and unaligned to the true bit boundaries. This
//! tolerates roughly half a bit of misalignment before the error rate
//! degrades, which [`crate::sync`]'s scanning resync compensates for at the
//! frame level.

use std::f64::consts::PI;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::modem::{F0_HZ, F1_HZ, SAMPLES_PER_BIT, SAMPLE_RATE};

/// Demodulate a PCM sample buffer into a bit sequence.
///
/// Partitions `samples` into non-overlapping windows of exactly
/// [`SAMPLES_PER_BIT`] samples starting at sample 0; trailing samples that
/// don't fill a whole window are discarded. The FFT plan is built once and
/// reused across every window in this call, but never cached across calls.
pub fn decode_samples(samples: &[i16]) -> Vec<u8> {
    let num_windows = samples.len() / SAMPLES_PER_BIT;
    if num_windows == 0 {
        return Vec::new();
    }

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(SAMPLES_PER_BIT);
    let window = hanning_window(SAMPLES_PER_BIT);
    let bin0 = nearest_bin(F0_HZ);
    let bin1 = nearest_bin(F1_HZ);

    let mut bits = Vec::with_capacity(num_windows);
    let mut buffer = vec![Complex::new(0f32, 0f32); SAMPLES_PER_BIT];

    for w in 0..num_windows {
        let start = w * SAMPLES_PER_BIT;
        for n in 0..SAMPLES_PER_BIT {
            let normalized = samples[start + n] as f32 / 32768.0;
            buffer[n] = Complex::new(normalized * window[n], 0.0);
        }
        fft.process(&mut buffer);

        let e0 = buffer[bin0].norm();
        let e1 = buffer[bin1].norm();
        // Tie-break deterministically to bit 0 (spec open question (a)).
        bits.push(if e1 > e0 { 1 } else { 0 });
    }

    bits
}

fn nearest_bin(freq_hz: f64) -> usize {
    (freq_hz * SAMPLES_PER_BIT as f64 / SAMPLE_RATE as f64).round() as usize
}

fn hanning_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / (len - 1) as f64).cos())
        .map(|v| v as f32)
        .collect()
}
