//! Data extents and the pan/zoom viewport.

use serde::{Deserialize, Serialize};

use crate::geom::{DataPoint, ScreenPoint, Size};

/// Numeric range with inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
}

impl Range {
    /// Create a new range, swapping bounds if needed.
    pub fn new(mut min: f64, mut max: f64) -> Self {
        if min > max {
            std::mem::swap(&mut min, &mut max);
        }
        Self { min, max }
    }

    /// Span of the range.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Check whether both bounds are finite.
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Expand the range to include a value.
    pub fn expand_to_include(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    /// Clamp a value into the range.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

/// Axis-aligned bounding box in data space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// X extent.
    pub x: Range,
    /// Y extent.
    pub y: Range,
}

impl Bounds {
    /// Bounding box of a set of points, skipping non-finite coordinates.
    ///
    /// Returns `None` when no finite point is supplied.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = DataPoint>,
    {
        let mut bounds: Option<Bounds> = None;
        for point in points {
            if !point.is_finite() {
                continue;
            }
            match bounds.as_mut() {
                None => {
                    bounds = Some(Bounds {
                        x: Range::new(point.x, point.x),
                        y: Range::new(point.y, point.y),
                    });
                }
                Some(existing) => {
                    existing.x.expand_to_include(point.x);
                    existing.y.expand_to_include(point.y);
                }
            }
        }
        bounds
    }

    /// Width of the box.
    pub fn width(&self) -> f64 {
        self.x.span()
    }

    /// Height of the box.
    pub fn height(&self) -> f64 {
        self.y.span()
    }
}

/// Allowed range for the interactive zoom factor.
///
/// Requests outside the range are clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLimits {
    /// Smallest zoom factor.
    pub min: f64,
    /// Largest zoom factor.
    pub max: f64,
}

impl ZoomLimits {
    /// Create zoom limits, swapping bounds if needed.
    pub fn new(min: f64, max: f64) -> Self {
        let range = Range::new(min, max);
        Self {
            min: range.min,
            max: range.max,
        }
    }

    /// Clamp a requested zoom factor.
    ///
    /// NaN falls back to the lower limit.
    pub fn clamp(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return self.min;
        }
        Range::new(self.min, self.max).clamp(zoom)
    }

    /// Check whether a zoom factor lies within the limits.
    pub fn contains(&self, zoom: f64) -> bool {
        zoom >= self.min && zoom <= self.max
    }
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self { min: 0.5, max: 4.0 }
    }
}

/// Current pan/zoom state applied to data space before rendering.
///
/// `scale_x` and `scale_y` are the fitted per-axis base scales (pixels per
/// data unit); `zoom` is the interactive factor on top of them and always
/// lies within the session's [`ZoomLimits`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Base pixels per data unit on X.
    pub scale_x: f64,
    /// Base pixels per data unit on Y.
    pub scale_y: f64,
    /// Interactive zoom factor.
    pub zoom: f64,
    /// Screen translation applied after scaling.
    pub translate: ScreenPoint,
    /// Container dimensions.
    pub size: Size,
}

impl Viewport {
    /// Create a viewport with unit zoom.
    pub fn new(scale_x: f64, scale_y: f64, translate: ScreenPoint, size: Size) -> Self {
        Self {
            scale_x,
            scale_y,
            zoom: 1.0,
            translate,
            size,
        }
    }

    /// Identity mapping for a container: one pixel per data unit, no offset.
    pub fn identity(size: Size) -> Self {
        Self::new(1.0, 1.0, ScreenPoint::new(0.0, 0.0), size)
    }

    /// Effective pixels per data unit on X.
    pub fn pixels_per_unit_x(&self) -> f64 {
        self.scale_x * self.zoom
    }

    /// Effective pixels per data unit on Y.
    pub fn pixels_per_unit_y(&self) -> f64 {
        self.scale_y * self.zoom
    }

    /// Check whether the viewport describes an invertible mapping.
    pub fn is_valid(&self) -> bool {
        let finite = |v: f64| v.is_finite() && v > 0.0;
        finite(self.scale_x)
            && finite(self.scale_y)
            && finite(self.zoom)
            && self.translate.x.is_finite()
            && self.translate.y.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_skip_non_finite() {
        let bounds = Bounds::from_points([
            DataPoint::new(1.0, 2.0),
            DataPoint::new(f64::NAN, 100.0),
            DataPoint::new(-3.0, 5.0),
        ])
        .expect("finite points present");
        assert_eq!(bounds.x, Range::new(-3.0, 1.0));
        assert_eq!(bounds.y, Range::new(2.0, 5.0));
    }

    #[test]
    fn bounds_empty_is_none() {
        assert!(Bounds::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn zoom_limits_clamp() {
        let limits = ZoomLimits::default();
        assert_eq!(limits.clamp(10.0), 4.0);
        assert_eq!(limits.clamp(0.1), 0.5);
        assert_eq!(limits.clamp(2.0), 2.0);
        assert_eq!(limits.clamp(f64::NAN), 0.5);
        assert_eq!(limits.clamp(f64::INFINITY), 4.0);
    }
}
