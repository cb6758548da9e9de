//! Band-multiplier curves.
//!
//! Each channel group carries five (x, y) control points over `[0, 1]`. The
//! curve is sampled once per band to produce the multipliers the noise profile
//! consumes. Interpolation is monotone cubic Hermite (Fritsch–Carlson), so a
//! curve whose points rise or fall never overshoots between them.

use serde::{Deserialize, Serialize};

use crate::hat::BANDS;

const MIN_KNOT_SPACING: f64 = 1e-6;

/// Five control points of one channel group's band curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandCurve {
    /// Knot positions in `[0, 1]`.
    pub x: [f32; BANDS],
    /// Multiplier at each knot, in `[0, 1]`.
    pub y: [f32; BANDS],
}

impl Default for BandCurve {
    /// Evenly spaced knots at the neutral multiplier.
    fn default() -> Self {
        let mut x = [0.0f32; BANDS];
        for (k, v) in x.iter_mut().enumerate() {
            *v = k as f32 / (BANDS - 1) as f32;
        }
        Self { x, y: [0.5; BANDS] }
    }
}

impl BandCurve {
    /// Curve through evenly spaced knots with the given values.
    pub fn from_values(y: [f32; BANDS]) -> Self {
        Self { y, ..Self::default() }
    }

    /// Sample the curve at each band position `k / 4`.
    pub fn resolve(&self) -> [f32; BANDS] {
        let knots = Knots::new(self);
        let mut out = [0.0f32; BANDS];
        for (k, v) in out.iter_mut().enumerate() {
            *v = knots.eval(k as f64 / (BANDS - 1) as f64) as f32;
        }
        out
    }

    /// Evaluate the curve at `t`, holding the end values outside the knots.
    pub fn eval(&self, t: f32) -> f32 {
        Knots::new(self).eval(f64::from(t)) as f32
    }
}

/// Sorted, deduplicated knots with Fritsch–Carlson tangents.
struct Knots {
    x: [f64; BANDS],
    y: [f64; BANDS],
    m: [f64; BANDS],
    n: usize,
}

impl Knots {
    fn new(curve: &BandCurve) -> Self {
        let mut order: [usize; BANDS] = std::array::from_fn(|i| i);
        order.sort_by(|&a, &b| curve.x[a].total_cmp(&curve.x[b]));

        let mut x = [0.0f64; BANDS];
        let mut y = [0.0f64; BANDS];
        let mut n = 0;
        for &i in &order {
            let (xi, yi) = (f64::from(curve.x[i]), f64::from(curve.y[i]));
            if n > 0 && xi - x[n - 1] < MIN_KNOT_SPACING {
                // coincident knots: the later one wins
                y[n - 1] = yi;
                continue;
            }
            x[n] = xi;
            y[n] = yi;
            n += 1;
        }

        let mut knots = Self { x, y, m: [0.0; BANDS], n };
        knots.compute_tangents();
        knots
    }

    fn compute_tangents(&mut self) {
        let n = self.n;
        if n < 2 {
            return;
        }
        let mut delta = [0.0f64; BANDS];
        for k in 0..n - 1 {
            delta[k] = (self.y[k + 1] - self.y[k]) / (self.x[k + 1] - self.x[k]);
        }

        self.m[0] = delta[0];
        self.m[n - 1] = delta[n - 2];
        for k in 1..n - 1 {
            self.m[k] = if delta[k - 1] * delta[k] <= 0.0 {
                0.0
            } else {
                0.5 * (delta[k - 1] + delta[k])
            };
        }

        for k in 0..n - 1 {
            if delta[k] == 0.0 {
                self.m[k] = 0.0;
                self.m[k + 1] = 0.0;
                continue;
            }
            let a = self.m[k] / delta[k];
            let b = self.m[k + 1] / delta[k];
            let s = a * a + b * b;
            if s > 9.0 {
                let tau = 3.0 / s.sqrt();
                self.m[k] = tau * a * delta[k];
                self.m[k + 1] = tau * b * delta[k];
            }
        }
    }

    fn eval(&self, t: f64) -> f64 {
        let n = self.n;
        if n == 0 {
            return 0.0;
        }
        let v = if n == 1 || t <= self.x[0] {
            self.y[0]
        } else if t >= self.x[n - 1] {
            self.y[n - 1]
        } else {
            let k = (0..n - 1).rfind(|&k| self.x[k] <= t).unwrap_or(0);
            let h = self.x[k + 1] - self.x[k];
            let s = (t - self.x[k]) / h;
            let s2 = s * s;
            let s3 = s2 * s;
            let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
            let h10 = s3 - 2.0 * s2 + s;
            let h01 = -2.0 * s3 + 3.0 * s2;
            let h11 = s3 - s2;
            h00 * self.y[k] + h10 * h * self.m[k] + h01 * self.y[k + 1] + h11 * h * self.m[k + 1]
        };
        v.clamp(0.0, 1.0)
    }
}
