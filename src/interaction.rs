//! Interaction helpers for panning, zooming, and tooltip placement.
//!
//! These are pure viewport transitions; the session decides when to apply
//! them.

use crate::geom::ScreenPoint;
use crate::view::{Viewport, ZoomLimits};

/// Pan a viewport by a pixel delta.
pub fn pan_viewport(viewport: Viewport, delta: ScreenPoint) -> Viewport {
    if !delta.x.is_finite() || !delta.y.is_finite() {
        return viewport;
    }
    Viewport {
        translate: ScreenPoint::new(viewport.translate.x + delta.x, viewport.translate.y + delta.y),
        ..viewport
    }
}

/// Multiply the zoom by `factor` around a fixed screen point.
///
/// The result is clamped into `limits`. A factor that is zero, negative, or
/// non-finite leaves the requested zoom unchanged but still clamps it.
pub fn zoom_viewport(
    viewport: Viewport,
    factor: f64,
    center: ScreenPoint,
    limits: ZoomLimits,
) -> Viewport {
    let requested = if factor.is_finite() && factor > 0.0 {
        viewport.zoom * factor
    } else {
        viewport.zoom
    };
    set_zoom(viewport, requested, center, limits)
}

/// Set an absolute zoom (clamped into `limits`) around a fixed screen point.
pub fn set_zoom(
    viewport: Viewport,
    requested: f64,
    center: ScreenPoint,
    limits: ZoomLimits,
) -> Viewport {
    let zoom = limits.clamp(requested);
    let ratio = if viewport.zoom.is_finite() && viewport.zoom > 0.0 {
        zoom / viewport.zoom
    } else {
        1.0
    };
    Viewport {
        zoom,
        translate: ScreenPoint::new(
            center.x - (center.x - viewport.translate.x) * ratio,
            center.y - (center.y - viewport.translate.y) * ratio,
        ),
        ..viewport
    }
}

/// Whether a drag is dominantly vertical.
pub fn is_vertical_drag(delta: ScreenPoint) -> bool {
    delta.y.abs() > delta.x.abs()
}

/// Keep a tooltip of `width` inside a container, `edge` pixels from either
/// side.
///
/// The right edge is checked first, then the left edge wins, so a container
/// narrower than the tooltip pins it to the left margin. The vertical
/// position is unchanged.
pub fn tooltip_anchor(
    pointer: ScreenPoint,
    container_width: f64,
    width: f64,
    edge: f64,
) -> ScreenPoint {
    let mut x = pointer.x;
    if x + width > container_width {
        x = container_width - width - edge;
    }
    if x < edge {
        x = edge;
    }
    ScreenPoint::new(x, pointer.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{DataPoint, Size};
    use crate::transform::Transform;

    fn viewport() -> Viewport {
        Viewport::new(10.0, 10.0, ScreenPoint::new(40.0, 20.0), Size::new(400.0, 300.0))
    }

    #[test]
    fn pan_shifts_translation() {
        let panned = pan_viewport(viewport(), ScreenPoint::new(5.0, -3.0));
        assert_eq!(panned.translate, ScreenPoint::new(45.0, 17.0));
        assert_eq!(panned.zoom, 1.0);
        let ignored = pan_viewport(viewport(), ScreenPoint::new(f64::NAN, 0.0));
        assert_eq!(ignored, viewport());
    }

    #[test]
    fn zoom_keeps_center_fixed() {
        let vp = viewport();
        let center = vp.size.center();
        let before = Transform::new(vp).unwrap().screen_to_data(center);
        let zoomed = zoom_viewport(vp, 2.5, center, ZoomLimits::default());
        let after = Transform::new(zoomed).unwrap().screen_to_data(center);
        assert!((zoomed.zoom - 2.5).abs() < 1e-12);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn zoom_is_always_clamped() {
        let limits = ZoomLimits::default();
        let mut vp = viewport();
        for factor in [10.0, 10.0, 0.001, f64::INFINITY, -2.0, 0.0, f64::NAN, 1.3] {
            vp = zoom_viewport(vp, factor, vp.size.center(), limits);
            assert!(limits.contains(vp.zoom), "zoom {} after factor {factor}", vp.zoom);
        }
        let out_of_range = Viewport { zoom: 9.0, ..viewport() };
        let fixed = zoom_viewport(out_of_range, f64::NAN, ScreenPoint::new(0.0, 0.0), limits);
        assert_eq!(fixed.zoom, 4.0);
    }

    #[test]
    fn set_zoom_round_trips_points() {
        let vp = set_zoom(viewport(), 3.0, ScreenPoint::new(12.0, 34.0), ZoomLimits::default());
        let transform = Transform::new(vp).unwrap();
        let point = DataPoint::new(-7.25, 3.5);
        let back = transform.screen_to_data(transform.data_to_screen(point));
        assert!((back.x - point.x).abs() < 1e-9);
        assert!((back.y - point.y).abs() < 1e-9);
    }

    #[test]
    fn drag_direction() {
        assert!(is_vertical_drag(ScreenPoint::new(1.0, -4.0)));
        assert!(!is_vertical_drag(ScreenPoint::new(4.0, 4.0)));
    }

    #[test]
    fn tooltip_stays_inside_container() {
        assert_eq!(
            tooltip_anchor(ScreenPoint::new(350.0, 50.0), 400.0, 200.0, 10.0),
            ScreenPoint::new(190.0, 50.0)
        );
        assert_eq!(
            tooltip_anchor(ScreenPoint::new(2.0, 50.0), 400.0, 200.0, 10.0),
            ScreenPoint::new(10.0, 50.0)
        );
        assert_eq!(
            tooltip_anchor(ScreenPoint::new(100.0, 5.0), 400.0, 200.0, 10.0),
            ScreenPoint::new(100.0, 5.0)
        );
        assert_eq!(
            tooltip_anchor(ScreenPoint::new(50.0, 0.0), 150.0, 200.0, 10.0),
            ScreenPoint::new(10.0, 0.0)
        );
    }
}
