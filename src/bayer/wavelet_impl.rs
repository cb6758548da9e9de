use rayon::prelude::*;
use tracing::trace;

use crate::cfa::CfaPattern;
use crate::error::Result;
use crate::hat::{level_scale, reflect, soft_threshold, BANDS};
use crate::noise::BandNoiseProfile;
use crate::schedule::RowSchedule;

/// Working buffers for the half-resolution decomposition, sized for the
/// largest of the four color planes.
pub struct Scratch {
    plane: Vec<f32>,
    details: Vec<f32>,
    interm: Vec<f32>,
}

impl Scratch {
    pub fn allocate(width: usize, height: usize) -> Result<Self> {
        let n = width.div_ceil(2) * height.div_ceil(2);
        Ok(Self {
            plane: crate::alloc_zeroed(n)?,
            details: crate::alloc_zeroed(n)?,
            interm: crate::alloc_zeroed(n)?,
        })
    }
}

/// Wavelet denoise of a Bayer mosaic, in place.
///
/// Each of the four photosite phases (R, G1, G2, B for RGGB) is pulled into
/// its own half-resolution plane and denoised independently:
///
/// 1. Gather the phase with `sqrt(max(v, 0))` (variance stabilization)
/// 2. Five levels of separable hat filtering; each level soft-thresholds the
///    detail it removes and keeps what exceeds the band threshold
/// 3. Add the kept detail back onto the residue, square, and scatter
pub fn denoise(
    data: &mut [f32],
    width: usize,
    height: usize,
    cfa: &CfaPattern,
    noise: &BandNoiseProfile,
    scratch: &mut Scratch,
) {
    for c in 0..4 {
        let row0 = c & 1;
        let col0 = c >> 1;
        let color = cfa.color_at(row0, col0);

        // odd dimensions give the phase starting at 0 one extra row/column
        let pw = (width - col0).div_ceil(2);
        let ph = (height - row0).div_ceil(2);
        if pw == 0 || ph == 0 {
            continue;
        }
        let n = pw * ph;
        trace!(phase = c, %color, pw, ph, "denoising Bayer plane");

        let plane = &mut scratch.plane[..n];
        gather(data, width, row0, col0, pw, plane);
        dwt_denoise(
            plane,
            &mut scratch.details[..n],
            &mut scratch.interm[..n],
            pw,
            ph,
            noise.channel(color),
        );
        scatter(plane, width, row0, col0, pw, data);
    }
}

fn gather(data: &[f32], width: usize, row0: usize, col0: usize, pw: usize, plane: &mut [f32]) {
    plane.par_chunks_mut(pw).enumerate().for_each(|(prow, dst)| {
        let src = &data[(row0 + 2 * prow) * width..][..width];
        for (col, d) in dst.iter_mut().enumerate() {
            *d = src[col0 + 2 * col].max(0.0).sqrt();
        }
    });
}

fn scatter(plane: &[f32], width: usize, row0: usize, col0: usize, pw: usize, data: &mut [f32]) {
    data.par_chunks_mut(width)
        .enumerate()
        .filter(|(row, _)| row & 1 == row0)
        .for_each(|(row, dst)| {
            let src = &plane[(row / 2) * pw..][..pw];
            for (col, &d) in src.iter().enumerate() {
                dst[col0 + 2 * col] = d * d;
            }
        });
}

/// Five-level decomposition of one plane, in place.
///
/// `details` accumulates the soft-thresholded detail of every level and is
/// added back onto the residue after the last one.
fn dwt_denoise(
    img: &mut [f32],
    details: &mut [f32],
    interm: &mut [f32],
    width: usize,
    height: usize,
    noise: &[f32; BANDS],
) {
    details.fill(0.0);

    for lev in 0..BANDS {
        let last = lev + 1 == BANDS;
        trace!(lev, thold = noise[lev], "wavelet level");
        vertical_pass(interm, img, width, height, lev);
        horizontal_pass(interm, img, details, width, lev, noise[lev], last);
    }
}

/// Un-normalized `2*center + above + below` with rows `scale` apart.
///
/// Rows are handed out in [`RowSchedule`] order so each worker walks down a
/// column of rows it has just read.
fn vertical_pass(out: &mut [f32], input: &[f32], width: usize, height: usize, lev: usize) {
    let vscale = level_scale(lev, height);
    let mut rows: Vec<Option<&mut [f32]>> = out.chunks_mut(width).map(Some).collect();
    let ordered: Vec<(usize, &mut [f32])> = RowSchedule::new(height, vscale)
        .filter_map(|row| rows[row].take().map(|r| (row, r)))
        .collect();

    ordered.into_par_iter().for_each(|(row, outrow)| {
        let above = reflect(row as isize - vscale as isize, height);
        let below = reflect((row + vscale) as isize, height);
        let center = &input[row * width..][..width];
        let above = &input[above * width..][..width];
        let below = &input[below * width..][..width];
        for col in 0..width {
            outrow[col] = 2.0 * center[col] + above[col] + below[col];
        }
    });
}

/// Horizontal hat over the vertical sums, normalized by 16 for both passes.
///
/// `img` holds the previous coarse level on entry and the new one on exit;
/// the difference, shrunk by `thold`, is added to `accum`.
fn horizontal_pass(
    coarse: &[f32],
    img: &mut [f32],
    accum: &mut [f32],
    width: usize,
    lev: usize,
    thold: f32,
    last: bool,
) {
    let hscale = level_scale(lev, width);
    let head = hscale.min(width);
    let tail = width.saturating_sub(hscale).max(head);

    img.par_chunks_mut(width)
        .zip(accum.par_chunks_mut(width))
        .zip(coarse.par_chunks(width))
        .for_each(|((details, accum_row), coarse)| {
            let mut update = |col: usize, left: f32, right: f32| {
                let hat = (2.0 * coarse[col] + left + right) / 16.0;
                let diff = details[col] - hat;
                details[col] = hat;
                accum_row[col] += soft_threshold(diff, thold);
            };
            let mirrored = |col: usize, side: isize| {
                coarse[reflect(col as isize + side * hscale as isize, width)]
            };

            for col in 0..head {
                update(col, mirrored(col, -1), mirrored(col, 1));
            }
            for col in head..tail {
                update(col, coarse[col - hscale], coarse[col + hscale]);
            }
            for col in tail..width {
                update(col, mirrored(col, -1), mirrored(col, 1));
            }

            if last {
                for (d, a) in details.iter_mut().zip(accum_row.iter()) {
                    *d += *a;
                }
            }
        });
}
