use std::mem;

use rayon::prelude::*;
use tracing::trace;

use crate::cfa::{CfaPattern, Channel};
use crate::error::Result;
use crate::hat::{hat_transform, level_scale, soft_threshold, BANDS};
use crate::noise::BandNoiseProfile;

/// Fill priority for green gaps: left, above, then the rest of the 3x3 ring.
const GREEN_NEIGHBORS: [(isize, isize); 8] =
    [(0, -1), (-1, 0), (1, 1), (1, 0), (1, -1), (0, 1), (-1, 1), (-1, -1)];

/// Fill priority for red/blue gaps: the 3x3 ring, last site in row-major order first.
const RB_NEIGHBORS: [(isize, isize); 8] =
    [(1, 1), (1, 0), (1, -1), (0, 1), (0, -1), (-1, 1), (-1, 0), (-1, -1)];

/// Largest ring searched when the 3x3 neighborhood has no site of the color.
/// Any color of a 6x6 pattern is within this distance of every pixel.
const MAX_FILL_RADIUS: isize = 5;

/// Full-resolution working planes: the running approximation, the two most
/// recent coarse levels, and a transposed intermediate.
pub struct Scratch {
    approx: Vec<f32>,
    prev: Vec<f32>,
    next: Vec<f32>,
    transposed: Vec<f32>,
}

impl Scratch {
    pub fn allocate(width: usize, height: usize) -> Result<Self> {
        let n = width * height;
        Ok(Self {
            approx: crate::alloc_zeroed(n)?,
            prev: crate::alloc_zeroed(n)?,
            next: crate::alloc_zeroed(n)?,
            transposed: crate::alloc_zeroed(n)?,
        })
    }
}

/// Translation-invariant wavelet denoise of an X-Trans mosaic, in place.
///
/// The 6x6 pattern has no regular 2x2 subsampling, so each color is handled
/// at full resolution:
///
/// 1. Build a dense plane: own sites get `sqrt(max(v, 0))`, every other pixel
///    copies a nearby site of the same color
/// 2. Five levels of hat filtering (columns then rows, each through a
///    transpose so writes stay sequential)
/// 3. Soft-threshold the difference between consecutive levels into the
///    running approximation
/// 4. Write `(approx + residue)^2` back at the color's own sites
pub fn denoise(
    data: &mut [f32],
    width: usize,
    height: usize,
    cfa: &CfaPattern,
    noise: &BandNoiseProfile,
    scratch: &mut Scratch,
) {
    let Scratch { approx, prev, next, transposed } = scratch;

    for ch in Channel::ALL {
        trace!(%ch, "denoising X-Trans color");
        let thresholds: &[f32; BANDS] = noise.channel(ch);

        approx.fill(0.0);
        fill_plane(data, width, height, cfa, ch, prev);

        for (lev, &thold) in thresholds.iter().enumerate() {
            trace!(lev, thold, "wavelet level");
            let vscale = level_scale(lev, height);
            let hscale = level_scale(lev, width);

            let src: &[f32] = prev;
            transposed.par_chunks_mut(height).enumerate().for_each(|(col, out)| {
                hat_transform(out, &src[col..], width, height, vscale);
            });
            let tsrc: &[f32] = transposed;
            next.par_chunks_mut(width).enumerate().for_each(|(row, out)| {
                hat_transform(out, &tsrc[row..], height, width, hscale);
            });

            approx
                .par_iter_mut()
                .zip(prev.par_iter())
                .zip(next.par_iter())
                .for_each(|((a, &p), &n)| *a += soft_threshold(p - n, thold));

            mem::swap(&mut *prev, &mut *next);
        }

        // `prev` now holds the coarsest level
        let residue: &[f32] = prev;
        let kept: &[f32] = approx;
        data.par_chunks_mut(width).enumerate().for_each(|(row, out)| {
            let base = row * width;
            for (col, o) in out.iter_mut().enumerate() {
                if cfa.color_at(row, col) == ch {
                    let d = kept[base + col] + residue[base + col];
                    *o = d * d;
                }
            }
        });
    }
}

/// Dense square-root plane for one color.
///
/// Each pixel pulls from a fixed-priority neighbor, so the result depends only
/// on position and is identical however rows are split across threads.
fn fill_plane(
    data: &[f32],
    width: usize,
    height: usize,
    cfa: &CfaPattern,
    ch: Channel,
    plane: &mut [f32],
) {
    plane.par_chunks_mut(width).enumerate().for_each(|(row, dst)| {
        for (col, d) in dst.iter_mut().enumerate() {
            *d = match source_site(width, height, cfa, ch, row, col) {
                Some(i) => data[i].max(0.0).sqrt(),
                None => 0.0,
            };
        }
    });
}

/// Index of the site of color `ch` that pixel (`row`, `col`) takes its value from.
fn source_site(
    width: usize,
    height: usize,
    cfa: &CfaPattern,
    ch: Channel,
    row: usize,
    col: usize,
) -> Option<usize> {
    if cfa.color_at(row, col) == ch {
        return Some(row * width + col);
    }
    let site = |(dy, dx): (isize, isize)| {
        let r = row as isize + dy;
        let c = col as isize + dx;
        if r < 0 || c < 0 || r >= height as isize || c >= width as isize {
            return None;
        }
        let (r, c) = (r as usize, c as usize);
        (cfa.color_at(r, c) == ch).then_some(r * width + c)
    };

    let ring = if ch == Channel::Green { &GREEN_NEIGHBORS } else { &RB_NEIGHBORS };
    ring.iter().copied().find_map(site).or_else(|| {
        (2..=MAX_FILL_RADIUS).find_map(|r| {
            (-r..=r)
                .flat_map(|dy| (-r..=r).map(move |dx| (dy, dx)))
                .filter(|(dy, dx)| dy.abs().max(dx.abs()) == r)
                .find_map(site)
        })
    })
}
