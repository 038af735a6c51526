//! Coordinate transforms between data and screen space.
//!
//! The mapping is affine and independent per axis:
//! `screen = data * scale_axis * zoom + translate`.

use crate::geom::{DataPoint, ScreenPoint};
use crate::view::Viewport;

/// Transform from data coordinates into screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    viewport: Viewport,
    kx: f64,
    ky: f64,
}

impl Transform {
    /// Create a transform for the given viewport.
    ///
    /// Returns `None` when the viewport has a zero, negative, or non-finite
    /// scale, since such a mapping has no inverse.
    pub fn new(viewport: Viewport) -> Option<Self> {
        if !viewport.is_valid() {
            return None;
        }
        Some(Self {
            viewport,
            kx: viewport.pixels_per_unit_x(),
            ky: viewport.pixels_per_unit_y(),
        })
    }

    /// Access the viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Map a data point into screen space.
    pub fn data_to_screen(&self, point: DataPoint) -> ScreenPoint {
        ScreenPoint::new(
            point.x * self.kx + self.viewport.translate.x,
            point.y * self.ky + self.viewport.translate.y,
        )
    }

    /// Map a screen point into data space.
    pub fn screen_to_data(&self, point: ScreenPoint) -> DataPoint {
        DataPoint::new(
            (point.x - self.viewport.translate.x) / self.kx,
            (point.y - self.viewport.translate.y) / self.ky,
        )
    }

    /// Pixels per data unit on each axis at the current zoom.
    pub(crate) fn pixels_per_unit(&self) -> (f64, f64) {
        (self.kx, self.ky)
    }

    /// Convert a pixel length into data units on each axis.
    pub fn pixels_to_data(&self, pixels: f64) -> (f64, f64) {
        (pixels / self.kx, pixels / self.ky)
    }
}

/// Map a data point to screen space under `viewport`.
///
/// Returns `None` for a non-invertible viewport.
pub fn to_screen(point: DataPoint, viewport: &Viewport) -> Option<ScreenPoint> {
    Transform::new(*viewport).map(|transform| transform.data_to_screen(point))
}

/// Map a screen position back to data space under `viewport`.
///
/// Returns `None` for a non-invertible viewport.
pub fn to_data(screen_x: f64, screen_y: f64, viewport: &Viewport) -> Option<DataPoint> {
    Transform::new(*viewport)
        .map(|transform| transform.screen_to_data(ScreenPoint::new(screen_x, screen_y)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Size;

    fn viewport(scale_x: f64, scale_y: f64, zoom: f64, tx: f64, ty: f64) -> Viewport {
        let mut viewport = Viewport::new(
            scale_x,
            scale_y,
            ScreenPoint::new(tx, ty),
            Size::new(400.0, 300.0),
        );
        viewport.zoom = zoom;
        viewport
    }

    #[test]
    fn linear_roundtrip() {
        let samples = [
            (1.0, 1.0, 1.0, 0.0, 0.0),
            (32.0, 32.0, 0.5, 40.0, -12.5),
            (3.5, 0.25, 4.0, -1000.0, 250.0),
            (1e-3, 1e3, 1.7, 0.1, 0.2),
        ];
        let points = [
            DataPoint::new(0.0, 0.0),
            DataPoint::new(5.0, 7.5),
            DataPoint::new(-123.456, 98.765),
            DataPoint::new(1e4, -1e4),
        ];
        for (sx, sy, zoom, tx, ty) in samples {
            let transform =
                Transform::new(viewport(sx, sy, zoom, tx, ty)).expect("valid transform");
            for point in points {
                let roundtrip = transform.screen_to_data(transform.data_to_screen(point));
                assert!((roundtrip.x - point.x).abs() < 1e-6);
                assert!((roundtrip.y - point.y).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn scale_applies_before_translation() {
        let transform = Transform::new(viewport(2.0, 3.0, 1.5, 10.0, 20.0)).unwrap();
        let screen = transform.data_to_screen(DataPoint::new(4.0, 1.0));
        assert!((screen.x - (4.0 * 2.0 * 1.5 + 10.0)).abs() < 1e-12);
        assert!((screen.y - (1.0 * 3.0 * 1.5 + 20.0)).abs() < 1e-12);
    }

    #[test]
    fn rejects_non_invertible_viewport() {
        assert!(Transform::new(viewport(0.0, 1.0, 1.0, 0.0, 0.0)).is_none());
        assert!(Transform::new(viewport(1.0, f64::INFINITY, 1.0, 0.0, 0.0)).is_none());
        assert!(to_data(1.0, 1.0, &viewport(1.0, 1.0, -1.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn free_functions_match_transform() {
        let vp = viewport(2.0, 2.0, 1.0, 5.0, 5.0);
        let screen = to_screen(DataPoint::new(1.0, 2.0), &vp).unwrap();
        assert_eq!(screen, ScreenPoint::new(7.0, 9.0));
        let data = to_data(screen.x, screen.y, &vp).unwrap();
        assert_eq!(data, DataPoint::new(1.0, 2.0));
    }
}
