//! "Nice" axis bounds for chart value axes.
//!
//! Raw min/max make cramped axes that jitter every time the data updates.
//! Snapping the tick step to 1, 2 or 5 × 10^k keeps gridlines stable and labels
//! readable:
//!
//! 1. raw step = range / 4 (a flat series uses `|v| / 3`, or 1 at zero, as its range)
//! 2. snap the step to the nearest nice number
//! 3. floor/ceil the extremes to the step, then pad one step on each side
//! 4. optionally clamp the minimum at zero for naturally non-negative metrics

/// Interior intervals targeted across the data range.
pub const TARGET_INTERVALS: f64 = 4.0;

/// Value-axis range and tick spacing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBounds {
    pub min: f64,
    pub max: f64,
    pub tick_interval: f64,
}

impl AxisBounds {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Number of tick intervals between `min` and `max` (rounded).
    pub fn tick_count(&self) -> usize {
        (self.span() / self.tick_interval).round().max(0.0) as usize
    }

    /// Tick values from `min` to `max` inclusive.
    ///
    /// A clamped minimum may sit between steps; ticks then start at `min` and
    /// continue on the step grid.
    pub fn ticks(&self) -> Vec<f64> {
        let step = self.tick_interval;
        let mut out = vec![self.min];
        let mut t = (self.min / step).floor() * step + step;
        let eps = step * 1e-9;
        while t < self.max - eps {
            if t > self.min + eps {
                out.push(clean(t, step));
            }
            t += step;
        }
        out.push(self.max);
        out
    }

    pub fn as_array(&self) -> [f64; 2] {
        [self.min, self.max]
    }
}

/// Compute nice bounds for `values`.
///
/// Non-finite values are ignored; `None` when nothing finite remains.
pub fn compute_bounds(values: &[f64], clamp_min_to_zero: bool) -> Option<AxisBounds> {
    let (lo, hi) = finite_extent(values)?;

    let (mut min, max, step) = if lo == hi {
        let pseudo_range = if lo == 0.0 { 1.0 } else { lo.abs() / 3.0 };
        let step = nice_step(pseudo_range / TARGET_INTERVALS);
        (lo - step, lo + step, step)
    } else {
        let step = nice_step((hi - lo) / TARGET_INTERVALS);
        let min = (lo / step).floor() * step - step;
        let max = (hi / step).ceil() * step + step;
        (clean(min, step), clean(max, step), step)
    };

    // Data entirely below zero has no floor to clamp to.
    if clamp_min_to_zero && max > 0.0 {
        min = min.max(0.0);
    }

    Some(AxisBounds {
        min,
        max,
        tick_interval: step,
    })
}

/// Snap a raw step to 1, 2, 5 or 10 × 10^k.
///
/// Zero, negative and non-finite steps fall back to `1`.
pub fn nice_step(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }
    let exponent = raw.log10().floor();
    let magnitude = 10f64.powf(exponent);
    // Guard the [1, 10) contract against log10 rounding near powers of ten.
    let mut base = raw / magnitude;
    let mut magnitude = magnitude;
    if base >= 10.0 {
        base /= 10.0;
        magnitude *= 10.0;
    } else if base < 1.0 {
        base *= 10.0;
        magnitude /= 10.0;
    }

    let nice = if base < 1.5 {
        1.0
    } else if base < 3.0 {
        2.0
    } else if base < 7.0 {
        5.0
    } else {
        10.0
    };
    let step = nice * magnitude;
    if step.is_finite() && step > 0.0 { step } else { 1.0 }
}

/// Is `step` of the form {1, 2, 5} × 10^k (within float tolerance)?
pub fn is_nice_step(step: f64) -> bool {
    if !step.is_finite() || step <= 0.0 {
        return false;
    }
    let magnitude = 10f64.powf(step.log10().floor());
    let base = step / magnitude;
    [1.0, 2.0, 5.0, 10.0]
        .iter()
        .any(|b| (base - b).abs() < 1e-6 * b)
}

fn finite_extent(values: &[f64]) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in values.iter().filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
}

/// Remove float noise like `0.30000000000000004` from step multiples.
fn clean(v: f64, step: f64) -> f64 {
    let decimals = (-step.log10().floor()).max(0.0) as i32 + 2;
    let f = 10f64.powi(decimals.min(15));
    let out = (v * f).round() / f;
    if out == 0.0 { 0.0 } else { out }
}
