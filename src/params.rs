//! Denoise parameter record and its versioned serialized form.
//!
//! Older records are upgraded to the current layout before the core ever sees
//! them; the core itself only takes a threshold and resolved multipliers.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::curve::BandCurve;
use crate::error::{DenoiseError, Result};
use crate::noise::{BandMultipliers, ChannelGroup};

/// Default noise threshold.
pub const DEFAULT_THRESHOLD: f32 = 0.01;

/// Current parameter record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseParams {
    /// Global noise threshold in `[0, 1]`. Zero disables denoising.
    pub threshold: f32,
    /// Band curves indexed by [`ChannelGroup`].
    pub curves: [BandCurve; ChannelGroup::COUNT],
}

impl Default for DenoiseParams {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            curves: [BandCurve::default(); ChannelGroup::COUNT],
        }
    }
}

impl DenoiseParams {
    /// Default curves with the given threshold.
    pub fn with_threshold(threshold: f32) -> Self {
        Self { threshold, ..Self::default() }
    }

    /// Curve of one channel group.
    pub fn curve(&self, group: ChannelGroup) -> &BandCurve {
        &self.curves[group as usize]
    }

    /// Mutable curve of one channel group.
    pub fn curve_mut(&mut self, group: ChannelGroup) -> &mut BandCurve {
        &mut self.curves[group as usize]
    }

    /// Sample every curve into the multipliers the noise profile consumes.
    pub fn band_multipliers(&self) -> BandMultipliers {
        let mut m = BandMultipliers::neutral();
        for group in ChannelGroup::ALL {
            *m.group_mut(group) = self.curve(group).resolve();
        }
        m
    }

    /// Check the threshold and every resolved multiplier.
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.threshold)?;
        self.band_multipliers().validate()
    }

    /// Parse any supported record version and upgrade it.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(ParamsRecord::from_json(text)?.into_current())
    }

    /// Serialize as a current-version record.
    pub fn to_json(&self) -> Result<String> {
        ParamsRecord::from(self.clone()).to_json()
    }
}

/// Check that `threshold` is a finite value in `[0, 1]`.
pub(crate) fn validate_threshold(threshold: f32) -> Result<()> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(DenoiseError::InvalidThreshold(threshold))
    }
}

/// Serialized parameter record, tagged with its layout version.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "version")]
pub enum ParamsRecord {
    /// First layout: a bare threshold, no band curves.
    #[serde(rename = "1")]
    V1 {
        /// Global noise threshold.
        threshold: f32,
    },
    /// Current layout.
    #[serde(rename = "2")]
    V2(DenoiseParams),
}

impl ParamsRecord {
    /// Version written by [`ParamsRecord::to_json`].
    pub const CURRENT_VERSION: u32 = 2;

    /// Layout version of this record.
    pub fn version(&self) -> u32 {
        match self {
            Self::V1 { .. } => 1,
            Self::V2(_) => 2,
        }
    }

    /// Upgrade to the current layout.
    ///
    /// Version 1 keeps its threshold; its curves start out evenly spaced at
    /// the neutral multiplier.
    pub fn into_current(self) -> DenoiseParams {
        match self {
            Self::V1 { threshold } => {
                debug!(threshold, "upgrading version 1 denoise parameters");
                DenoiseParams::with_threshold(threshold)
            }
            Self::V2(params) => params,
        }
    }

    /// Parse a record of any supported version.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize this record.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<DenoiseParams> for ParamsRecord {
    fn from(params: DenoiseParams) -> Self {
        Self::V2(params)
    }
}
