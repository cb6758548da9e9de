//! Per-band noise thresholds.
//!
//! A user-facing band multiplier `m` in `[0, 1]` enters the threshold as `m^4`,
//! scaled so the neutral value 0.5 leaves the base threshold unchanged. The
//! base table models image detail per band, so it is shared by both sensor
//! families. The Bayer and X-Trans paths fold the constants in differently and
//! are kept apart so existing output does not shift.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cfa::Channel;
use crate::error::{DenoiseError, Result};
use crate::hat::BANDS;

/// Empirical noise power per band, finest first.
const NOISE_BASE: [f32; BANDS] = [0.8002, 0.2735, 0.1202, 0.0585, 0.0291];

/// Group a band multiplier applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelGroup {
    /// Applies to every channel.
    All = 0,
    /// Red photosites only.
    Red = 1,
    /// Green photosites only.
    Green = 2,
    /// Blue photosites only.
    Blue = 3,
}

impl ChannelGroup {
    /// Number of groups.
    pub const COUNT: usize = 4;

    /// All groups in storage order.
    pub const ALL: [ChannelGroup; 4] =
        [ChannelGroup::All, ChannelGroup::Red, ChannelGroup::Green, ChannelGroup::Blue];
}

impl From<Channel> for ChannelGroup {
    fn from(ch: Channel) -> Self {
        match ch {
            Channel::Red => Self::Red,
            Channel::Green => Self::Green,
            Channel::Blue => Self::Blue,
        }
    }
}

impl fmt::Display for ChannelGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Red => f.write_str("R"),
            Self::Green => f.write_str("G"),
            Self::Blue => f.write_str("B"),
        }
    }
}

/// Resolved band multipliers, one row of five per [`ChannelGroup`].
///
/// Index 0 of each row is the leftmost point of the user-facing curve (the
/// coarsest band); the decomposition walks them in reverse.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandMultipliers(pub [[f32; BANDS]; ChannelGroup::COUNT]);

impl BandMultipliers {
    /// Every multiplier at the neutral value 0.5.
    pub fn neutral() -> Self {
        Self::uniform(0.5)
    }

    /// Every multiplier set to `value`.
    pub fn uniform(value: f32) -> Self {
        Self([[value; BANDS]; ChannelGroup::COUNT])
    }

    /// Multipliers of one group.
    pub fn group(&self, group: ChannelGroup) -> &[f32; BANDS] {
        &self.0[group as usize]
    }

    /// Mutable multipliers of one group.
    pub fn group_mut(&mut self, group: ChannelGroup) -> &mut [f32; BANDS] {
        &mut self.0[group as usize]
    }

    /// Check that every multiplier is a finite value in `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        for group in ChannelGroup::ALL {
            for (band, &value) in self.group(group).iter().enumerate() {
                if !(0.0..=1.0).contains(&value) {
                    return Err(DenoiseError::InvalidMultiplier { group, band, value });
                }
            }
        }
        Ok(())
    }

    /// `m^4` for the multiplier feeding decomposition level `level`.
    #[inline]
    fn exp4(&self, group: ChannelGroup, level: usize) -> f32 {
        let mut t = self.group(group)[BANDS - level - 1];
        t *= t;
        t *= t;
        t
    }
}

impl Default for BandMultipliers {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Absolute soft-threshold per decomposition level for every channel group.
///
/// The `all` row holds the group-wide part of the table; the per-channel rows
/// are what the decomposers consume.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandNoiseProfile {
    bands: [[f32; BANDS]; ChannelGroup::COUNT],
}

impl BandNoiseProfile {
    /// Thresholds for the half-resolution Bayer decomposition.
    ///
    /// `noise[i] = base[i] * all^4 * chan^4 * 256`, then scaled by `threshold`.
    pub fn bayer(threshold: f32, multipliers: &BandMultipliers) -> Self {
        let mut bands = [[0.0f32; BANDS]; ChannelGroup::COUNT];
        for i in 0..BANDS {
            let all = NOISE_BASE[i] * multipliers.exp4(ChannelGroup::All, i) * 16.0 * 16.0;
            bands[ChannelGroup::All as usize][i] = all * threshold;
        }
        for ch in Channel::ALL {
            bands[ChannelGroup::from(ch) as usize] = bayer_channel_noise(threshold, multipliers, ch);
        }
        Self { bands }
    }

    /// Thresholds for the full-resolution X-Trans decomposition.
    ///
    /// The group-wide table is built once at `16` and the channel term is
    /// multiplied in afterwards at another `16`; `threshold` is applied last.
    pub fn xtrans(threshold: f32, multipliers: &BandMultipliers) -> Self {
        let all = xtrans_all_noise(multipliers);
        let mut bands = [[0.0f32; BANDS]; ChannelGroup::COUNT];
        bands[ChannelGroup::All as usize] = all;
        for ch in Channel::ALL {
            let noise = xtrans_channel_noise(&all, multipliers, ch);
            let row = &mut bands[ChannelGroup::from(ch) as usize];
            for (t, n) in row.iter_mut().zip(noise) {
                *t = threshold * n;
            }
        }
        Self { bands }
    }

    /// Thresholds for the planes of `channel`, indexed by decomposition level.
    pub fn channel(&self, channel: Channel) -> &[f32; BANDS] {
        &self.bands[ChannelGroup::from(channel) as usize]
    }

    /// Thresholds of any group, indexed by decomposition level.
    pub fn group(&self, group: ChannelGroup) -> &[f32; BANDS] {
        &self.bands[group as usize]
    }
}

fn bayer_channel_noise(threshold: f32, multipliers: &BandMultipliers, ch: Channel) -> [f32; BANDS] {
    let mut noise = [0.0f32; BANDS];
    for (i, n) in noise.iter_mut().enumerate() {
        let chan = multipliers.exp4(ch.into(), i);
        let all = multipliers.exp4(ChannelGroup::All, i);
        *n = NOISE_BASE[i] * all * chan * 16.0 * 16.0;
        // kept as a separate step: folding it into the product above changes the rounding
        *n *= threshold;
    }
    noise
}

fn xtrans_all_noise(multipliers: &BandMultipliers) -> [f32; BANDS] {
    let mut noise = NOISE_BASE;
    for (i, n) in noise.iter_mut().enumerate() {
        *n = *n * multipliers.exp4(ChannelGroup::All, i) * 16.0;
    }
    noise
}

fn xtrans_channel_noise(all: &[f32; BANDS], multipliers: &BandMultipliers, ch: Channel) -> [f32; BANDS] {
    let mut noise = [0.0f32; BANDS];
    for (i, n) in noise.iter_mut().enumerate() {
        *n = all[i] * multipliers.exp4(ch.into(), i) * 16.0;
    }
    noise
}
