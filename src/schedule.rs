//! Cache-friendly row ordering for the vertical wavelet pass.
//!
//! The vertical pass at scale `s` reads rows `r - s`, `r` and `r + s`. Walking
//! rows `0, s, 2s, ...` then `1, s + 1, 2s + 1, ...` means each row read was
//! touched `s` rows ago on the same pass and is still hot in cache.

/// Map a processing index to the row it should process.
///
/// Rows are grouped into `scale` passes; pass `p` visits `p, p + scale, ...`.
/// When `height` is not a multiple of `scale`, the first `height % scale`
/// passes are one row longer than the rest. The mapping is a permutation of
/// `0..height` and degenerates to the identity when `height <= scale`.
#[inline]
pub fn rowid_to_row(rowid: usize, height: usize, scale: usize) -> usize {
    if height <= scale {
        return rowid;
    }
    let per_pass = height.div_ceil(scale);
    let long_passes = height % scale;
    if long_passes == 0 || rowid < long_passes * per_pass {
        return (rowid / per_pass) + scale * (rowid % per_pass);
    }
    let rowid2 = rowid - long_passes * per_pass;
    long_passes + (rowid2 / (per_pass - 1)) + scale * (rowid2 % (per_pass - 1))
}

/// Iterator over the rows of an image in scheduled order.
#[derive(Clone, Debug)]
pub struct RowSchedule {
    next: usize,
    height: usize,
    scale: usize,
}

impl RowSchedule {
    /// Schedule `height` rows for a vertical pass at `scale`.
    pub fn new(height: usize, scale: usize) -> Self {
        Self { next: 0, height, scale: scale.max(1) }
    }
}

impl Iterator for RowSchedule {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next >= self.height {
            return None;
        }
        let row = rowid_to_row(self.next, self.height, self.scale);
        self.next += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.height - self.next;
        (n, Some(n))
    }
}

impl ExactSizeIterator for RowSchedule {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_is_permutation() {
        for height in 1..=37 {
            for scale in [1, 2, 4, 8, 16, 32] {
                let mut seen = vec![false; height];
                for row in RowSchedule::new(height, scale.min(height)) {
                    assert!(row < height, "row {row} out of range for h={height} s={scale}");
                    assert!(!seen[row], "row {row} visited twice for h={height} s={scale}");
                    seen[row] = true;
                }
                assert!(seen.iter().all(|&s| s), "missing row for h={height} s={scale}");
            }
        }
    }

    #[test]
    fn unclamped_scale_is_identity() {
        for height in 1..=8 {
            let rows: Vec<usize> = RowSchedule::new(height, 16).collect();
            assert_eq!(rows, (0..height).collect::<Vec<_>>());
        }
    }

    #[test]
    fn passes_step_by_scale() {
        // 10 rows at scale 4: passes of length 3, 3, 2, 2
        let rows: Vec<usize> = RowSchedule::new(10, 4).collect();
        assert_eq!(rows, vec![0, 4, 8, 1, 5, 9, 2, 6, 3, 7]);
    }

    #[test]
    fn even_split() {
        let rows: Vec<usize> = RowSchedule::new(8, 2).collect();
        assert_eq!(rows, vec![0, 2, 4, 6, 1, 3, 5, 7]);
        assert_eq!(RowSchedule::new(8, 2).len(), 8);
    }
}
