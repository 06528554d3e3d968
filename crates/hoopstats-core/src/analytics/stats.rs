// Shared formula helpers: zero-guarded division, fixed-precision rounding,
// possession estimates, and sample dispersion.

use crate::model::StatLine;

/// Weight applied to free-throw attempts when estimating possessions.
pub const FREE_THROW_POSSESSION_FACTOR: f64 = 0.44;

/// Extra credit a made three receives in eFG%.
pub const THREE_POINT_MULTIPLIER: f64 = 0.5;

/// Variance and standard deviation need at least this many samples.
pub const MIN_SAMPLES_FOR_VARIANCE: usize = 2;

// ---------------------------------------------------------------------------
// Division and rounding
// ---------------------------------------------------------------------------

/// `num / den`, or 0 when the denominator is not positive.
pub fn safe_div(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// `num / den × 100`, zero-guarded like [`safe_div`].
pub fn pct(num: f64, den: f64) -> f64 {
    safe_div(num, den) * 100.0
}

/// Round half away from zero to `places` decimals. Non-finite input maps to 0.
pub fn round_to(value: f64, places: i32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Percentages.
pub fn round1(value: f64) -> f64 {
    round_to(value, 1)
}

/// Ratios.
pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

/// Points per possession and per-possession rates.
pub fn round3(value: f64) -> f64 {
    round_to(value, 3)
}

// ---------------------------------------------------------------------------
// Box-score formulas
// ---------------------------------------------------------------------------

/// `fga + 0.44·fta − oreb + to`.
pub fn est_possessions(line: &StatLine) -> f64 {
    line.fga as f64 + FREE_THROW_POSSESSION_FACTOR * line.fta as f64 - line.oreb as f64
        + line.to as f64
}

/// Shooting possessions: `fga + 0.44·fta`.
pub fn shooting_possessions(line: &StatLine) -> f64 {
    line.fga as f64 + FREE_THROW_POSSESSION_FACTOR * line.fta as f64
}

/// `(fg + 0.5·fg3) / fga × 100`, unrounded.
pub fn efg_pct(line: &StatLine) -> f64 {
    pct(
        line.fg as f64 + THREE_POINT_MULTIPLIER * line.fg3 as f64,
        line.fga as f64,
    )
}

/// `points / (2·(fga + 0.44·fta)) × 100`, unrounded.
pub fn ts_pct(points: f64, line: &StatLine) -> f64 {
    pct(points, 2.0 * shooting_possessions(line))
}

// ---------------------------------------------------------------------------
// Dispersion
// ---------------------------------------------------------------------------

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n − 1 denominator); 0 below [`MIN_SAMPLES_FOR_VARIANCE`].
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < MIN_SAMPLES_FOR_VARIANCE {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq = values.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    sum_sq / (values.len() - 1) as f64
}

pub fn sample_std_dev(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

/// Unrounded spread of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dispersion {
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Mean, sample variance/stdev and range of a series.
///
/// Returns all zeros for an empty slice; with a single value the range is that
/// value and variance is 0.
pub fn compute_dispersion(values: &[f64]) -> Dispersion {
    if values.is_empty() {
        return Dispersion {
            mean: 0.0,
            variance: 0.0,
            std_dev: 0.0,
            min: 0.0,
            max: 0.0,
        };
    }
    let variance = sample_variance(values);
    Dispersion {
        mean: mean(values),
        variance,
        std_dev: variance.sqrt(),
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}
