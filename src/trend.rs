//! Ordinary least-squares trend estimation.

use serde::Serialize;

/// Slopes within this distance of zero are reported as sideways.
pub const SLOPE_EPSILON: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Upward,
    Downward,
    Sideways,
    InsufficientData,
}

impl TrendDirection {
    pub fn from_slope(slope: f64) -> Self {
        if slope > SLOPE_EPSILON {
            TrendDirection::Upward
        } else if slope < -SLOPE_EPSILON {
            TrendDirection::Downward
        } else {
            TrendDirection::Sideways
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrendDirection::Upward => "Upward",
            TrendDirection::Downward => "Downward",
            TrendDirection::Sideways => "Sideways",
            TrendDirection::InsufficientData => "Insufficient Data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendResult {
    pub direction: TrendDirection,
    pub slope: f64,
    pub points: usize,
}

impl TrendResult {
    pub fn insufficient(points: usize) -> Self {
        Self {
            direction: TrendDirection::InsufficientData,
            slope: 0.0,
            points,
        }
    }

    pub fn is_significant(&self) -> bool {
        self.slope.abs() > SLOPE_EPSILON
    }
}

/// Fits `y = slope * x + b` over the finite points of `series`.
///
/// Fewer than two usable points gives [`TrendDirection::InsufficientData`]. A
/// series whose x values are all equal has no defined slope and is reported as
/// sideways with slope zero.
pub fn fit_trend<I>(series: I) -> TrendResult
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let points = series
        .into_iter()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect::<Vec<_>>();
    if points.len() < 2 {
        return TrendResult::insufficient(points.len());
    }
    let n = points.len() as f64;
    let (sum_x, sum_y, sum_xy, sum_x2) = points.iter().fold(
        (0.0, 0.0, 0.0, 0.0),
        |(sx, sy, sxy, sx2), (x, y)| (sx + x, sy + y, sxy + x * y, sx2 + x * x),
    );
    let denominator = n * sum_x2 - sum_x * sum_x;
    let slope = if denominator == 0.0 {
        0.0
    } else {
        (n * sum_xy - sum_x * sum_y) / denominator
    };
    let slope = if slope.is_finite() { slope } else { 0.0 };
    TrendResult {
        direction: TrendDirection::from_slope(slope),
        slope,
        points: points.len(),
    }
}

/// Fits a trend against each value's position in `values`.
///
/// Unparseable entries keep their position so gaps do not compress the x axis.
pub fn fit_indexed<I>(values: I) -> TrendResult
where
    I: IntoIterator<Item = Option<f64>>,
{
    fit_trend(
        values
            .into_iter()
            .enumerate()
            .filter_map(|(idx, value)| value.map(|v| (idx as f64, v))),
    )
}
