mod wavelet_impl;

pub(crate) use wavelet_impl::Scratch;

use crate::noise::BandNoiseProfile;
use crate::CfaPattern;

pub fn wavelet(
    data: &mut [f32],
    width: usize,
    height: usize,
    cfa: &CfaPattern,
    noise: &BandNoiseProfile,
    scratch: &mut Scratch,
) {
    wavelet_impl::denoise(data, width, height, cfa, noise, scratch);
}
