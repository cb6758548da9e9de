//! À-trous "hat" smoothing, the low-pass step of the undecimated wavelet
//! decomposition used by both decomposers.

/// Number of wavelet bands (decomposition levels).
pub const BANDS: usize = 5;

/// Offset of the hat kernel at `level`, clamped to the dimension it indexes.
///
/// Small images would otherwise reach further than their own extent.
#[inline]
pub fn level_scale(level: usize, dim: usize) -> usize {
    (1usize << level).min(dim)
}

/// Mirror an index into `[0, size)`.
///
/// `-k` maps to `k` and `size - 1 + k` maps to `size - 1 - k`. Offsets larger
/// than the dimension keep bouncing between the edges, so the result is always
/// in range.
#[inline]
pub fn reflect(idx: isize, size: usize) -> usize {
    if size <= 1 {
        return 0;
    }
    let period = 2 * (size as isize - 1);
    let m = idx.rem_euclid(period);
    if m >= size as isize {
        (period - m) as usize
    } else {
        m as usize
    }
}

/// 1-D hat transform with mirror boundaries.
///
/// Reads `size` samples from `input` spaced `stride` apart and writes
/// `(2*in[i] + in[i-scale] + in[i+scale]) / 4` contiguously into `out`.
/// Passing a column view (stride = row width) and a contiguous `out` yields
/// the transposed result, which is how the X-Trans path filters both axes
/// with sequential writes.
///
/// # Panics
///
/// Panics if `out` is shorter than `size` or `input` is shorter than
/// `(size - 1) * stride + 1`.
pub fn hat_transform(out: &mut [f32], input: &[f32], stride: usize, size: usize, scale: usize) {
    if size == 0 {
        return;
    }
    let out = &mut out[..size];
    let at = |i: usize| input[i * stride];
    let mirrored = |i: usize| {
        let c = at(i);
        let l = at(reflect(i as isize - scale as isize, size));
        let r = at(reflect(i as isize + scale as isize, size));
        (c + c + l + r) * 0.25
    };

    let head = scale.min(size);
    let tail = size.saturating_sub(scale).max(head);

    for (i, o) in out[..head].iter_mut().enumerate() {
        *o = mirrored(i);
    }
    for i in head..tail {
        out[i] = (2.0 * at(i) + at(i - scale) + at(i + scale)) * 0.25;
    }
    for (i, o) in out.iter_mut().enumerate().skip(tail) {
        *o = mirrored(i);
    }
}

/// Soft threshold: shrink `diff` toward zero by `thold`, clamping at zero.
#[inline(always)]
pub fn soft_threshold(diff: f32, thold: f32) -> f32 {
    // written as a sum so it vectorizes
    (diff - thold).max(0.0) + (diff + thold).min(0.0)
}
