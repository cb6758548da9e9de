//! Wavelet denoising for raw Bayer and X-Trans CFA sensor data.
//!
//! Works on single-channel mosaic data before demosaicing. Each color is
//! square-root stabilized, split into five wavelet bands with an à-trous hat
//! transform, soft-thresholded per band, and reconstructed. Supports 2x2 Bayer
//! patterns (RGGB, BGGR, GRBG, GBRG) and 6x6 Fujifilm X-Trans patterns.
//!
//! # Decomposers
//!
//! - [`Bayer`](Decomposer::Bayer): four half-resolution planes, one per
//!   photosite phase, with a cache-ordered separable decomposition
//! - [`XTrans`](Decomposer::XTrans): three full-resolution planes filled from
//!   neighboring sites, translation invariant
//!
//! # Example
//!
//! ```
//! use rawdenoise::{denoise, BandMultipliers, CfaPattern};
//!
//! let width = 8;
//! let height = 8;
//! let cfa = CfaPattern::bayer_rggb();
//! let input = vec![0.25f32; width * height];
//! let mut output = vec![0.0f32; width * height];
//!
//! denoise(&input, width, height, &cfa, 0.01, &BandMultipliers::neutral(), &mut output).unwrap();
//!
//! // a flat mosaic has no detail to remove
//! assert!(output.iter().all(|v| (v - 0.25).abs() < 1e-5));
//! ```
//!
//! Parameters can also come from a serialized record:
//!
//! ```
//! use rawdenoise::{denoise_with_params, CfaPattern, DenoiseParams};
//!
//! let params = DenoiseParams::from_json(r#"{"version":"1","threshold":0.05}"#).unwrap();
//! let input = vec![0.5f32; 36 * 36];
//! let mut output = vec![0.0f32; 36 * 36];
//! denoise_with_params(&input, 36, 36, &CfaPattern::xtrans_default(), &params, &mut output).unwrap();
//! ```

#![warn(missing_docs)]

mod bayer;
mod cfa;
pub mod curve;
mod error;
pub mod hat;
pub mod noise;
pub mod params;
pub mod schedule;
mod xtrans;

use std::fmt;

use tracing::{debug, debug_span};

pub use cfa::{CfaPattern, Channel};
pub use curve::BandCurve;
pub use error::{DenoiseError, Result};
pub use noise::{BandMultipliers, BandNoiseProfile, ChannelGroup};
pub use params::{DenoiseParams, ParamsRecord, DEFAULT_THRESHOLD};

/// Wavelet decomposition strategy, chosen by CFA geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Decomposer {
    /// Half-resolution planes for 2x2 patterns.
    Bayer,
    /// Full-resolution planes for 6x6 patterns.
    XTrans,
}

impl Decomposer {
    /// Decomposer that handles `cfa`.
    pub fn for_cfa(cfa: &CfaPattern) -> Self {
        if cfa.is_bayer() {
            Self::Bayer
        } else {
            Self::XTrans
        }
    }

    /// Noise thresholds this decomposer consumes.
    pub fn noise_profile(self, threshold: f32, multipliers: &BandMultipliers) -> BandNoiseProfile {
        match self {
            Self::Bayer => BandNoiseProfile::bayer(threshold, multipliers),
            Self::XTrans => BandNoiseProfile::xtrans(threshold, multipliers),
        }
    }
}

impl fmt::Display for Decomposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bayer => f.write_str("Bayer"),
            Self::XTrans => f.write_str("X-Trans"),
        }
    }
}

/// Denoise a single-channel CFA mosaic.
///
/// # Arguments
/// - `input`: CFA data, row-major, length = `width * height`. Negative samples
///   are treated as zero.
/// - `width`, `height`: mosaic dimensions, both non-zero
/// - `cfa`: CFA pattern descriptor (Bayer or X-Trans, already shifted if needed)
/// - `threshold`: global noise threshold in `[0, 1]`; zero copies `input` unchanged
/// - `multipliers`: per-band multipliers in `[0, 1]`, 0.5 is neutral
/// - `output`: pre-allocated buffer, length = `width * height`
///
/// Nothing is written to `output` unless every check and allocation succeeds.
pub fn denoise(
    input: &[f32],
    width: usize,
    height: usize,
    cfa: &CfaPattern,
    threshold: f32,
    multipliers: &BandMultipliers,
    output: &mut [f32],
) -> Result<()> {
    let npix = pixel_count(width, height)?;
    if input.len() != npix {
        return Err(DenoiseError::InputSizeMismatch { expected: npix, got: input.len() });
    }
    if output.len() != npix {
        return Err(DenoiseError::OutputSizeMismatch { expected: npix, got: output.len() });
    }
    let plan = Plan::prepare(width, height, cfa, threshold, multipliers)?;

    output.copy_from_slice(input);
    plan.run(output, width, height, cfa);
    Ok(())
}

/// Denoise a mosaic in place.
///
/// Same as [`denoise`] with `data` as both input and output. On error `data`
/// is left untouched.
pub fn denoise_in_place(
    data: &mut [f32],
    width: usize,
    height: usize,
    cfa: &CfaPattern,
    threshold: f32,
    multipliers: &BandMultipliers,
) -> Result<()> {
    let npix = pixel_count(width, height)?;
    if data.len() != npix {
        return Err(DenoiseError::InputSizeMismatch { expected: npix, got: data.len() });
    }
    let plan = Plan::prepare(width, height, cfa, threshold, multipliers)?;
    plan.run(data, width, height, cfa);
    Ok(())
}

/// Denoise with a parameter record, resolving its band curves first.
pub fn denoise_with_params(
    input: &[f32],
    width: usize,
    height: usize,
    cfa: &CfaPattern,
    params: &DenoiseParams,
    output: &mut [f32],
) -> Result<()> {
    let multipliers = params.band_multipliers();
    denoise(input, width, height, cfa, params.threshold, &multipliers, output)
}

/// Reserve a zeroed buffer, reporting failure instead of aborting.
pub(crate) fn alloc_zeroed(len: usize) -> Result<Vec<f32>> {
    let bytes = len.saturating_mul(std::mem::size_of::<f32>());
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| DenoiseError::AllocationFailed { bytes })?;
    buf.resize(len, 0.0);
    Ok(buf)
}

fn pixel_count(width: usize, height: usize) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(DenoiseError::InvalidDimensions { width, height });
    }
    // a product that overflows can't match any buffer length
    width
        .checked_mul(height)
        .ok_or(DenoiseError::InvalidDimensions { width, height })
}

/// Everything a denoise call needs, built before the output is touched.
enum Plan {
    Bypass,
    Bayer(bayer::Scratch, BandNoiseProfile),
    XTrans(xtrans::Scratch, BandNoiseProfile),
}

impl Plan {
    fn prepare(
        width: usize,
        height: usize,
        cfa: &CfaPattern,
        threshold: f32,
        multipliers: &BandMultipliers,
    ) -> Result<Self> {
        params::validate_threshold(threshold)?;
        multipliers.validate()?;

        if threshold <= 0.0 {
            debug!(width, height, "threshold is zero, bypassing");
            return Ok(Self::Bypass);
        }

        let decomposer = Decomposer::for_cfa(cfa);
        let profile = decomposer.noise_profile(threshold, multipliers);
        debug!(%decomposer, %cfa, width, height, threshold, "allocating wavelet scratch");
        Ok(match decomposer {
            Decomposer::Bayer => Self::Bayer(bayer::Scratch::allocate(width, height)?, profile),
            Decomposer::XTrans => Self::XTrans(xtrans::Scratch::allocate(width, height)?, profile),
        })
    }

    fn run(self, data: &mut [f32], width: usize, height: usize, cfa: &CfaPattern) {
        let _span = debug_span!("denoise", width, height, %cfa).entered();
        match self {
            Self::Bypass => {}
            Self::Bayer(mut scratch, profile) => {
                bayer::wavelet(data, width, height, cfa, &profile, &mut scratch)
            }
            Self::XTrans(mut scratch, profile) => {
                xtrans::wavelet(data, width, height, cfa, &profile, &mut scratch)
            }
        }
    }
}
