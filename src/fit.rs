//! Fitting the data extent into a container.
//!
//! The solver picks a uniform scale so the bounding box of all points,
//! shrunk by a margin factor, fits the container, and centers the result.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::dataset::Dataset;
use crate::geom::{DataPoint, ScreenPoint, Size};
use crate::view::{Bounds, Viewport};

/// Errors raised by the fit solver.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum FitError {
    /// No finite point was supplied.
    #[error("cannot fit an empty point set")]
    EmptyInput,

    /// The points span zero extent on both axes.
    #[error("point data spans zero extent on both axes ({width} x {height})")]
    Degenerate {
        /// Data-space width of the bounding box.
        width: f64,
        /// Data-space height of the bounding box.
        height: f64,
    },

    /// The container has no usable area.
    #[error("container {width} x {height} has no usable area")]
    InvalidContainer {
        /// Requested width.
        width: f64,
        /// Requested height.
        height: f64,
    },

    /// A fit parameter is zero, negative, or non-finite.
    #[error("invalid fit parameter {name} = {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
}

/// Display mode of the map container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Map embedded in a page.
    #[default]
    Embedded,
    /// Map filling the screen next to a side panel.
    FullScreen,
}

/// Tunables of the fit computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitParams {
    /// Share of the container width available to the map.
    pub width_fraction: f64,
    /// Share of the available area the data extent may occupy.
    pub margin_factor: f64,
    /// Extra multiplier applied to the fitted scale.
    pub scale_factor: f64,
}

impl FitParams {
    /// Parameters with only a margin factor.
    pub fn with_margin(margin_factor: f64) -> Self {
        Self {
            width_fraction: 1.0,
            margin_factor,
            scale_factor: 1.0,
        }
    }

    /// Preset for embedded maps.
    pub fn embedded() -> Self {
        Self::with_margin(0.8)
    }

    /// Preset for full-screen maps.
    pub fn full_screen() -> Self {
        Self {
            width_fraction: 0.75,
            margin_factor: 0.6,
            scale_factor: 0.8,
        }
    }

    fn validate(&self) -> Result<(), FitError> {
        for (name, value) in [
            ("width_fraction", self.width_fraction),
            ("margin_factor", self.margin_factor),
            ("scale_factor", self.scale_factor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(FitError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}

impl Default for FitParams {
    fn default() -> Self {
        Self::embedded()
    }
}

/// Fit points into a `width` x `height` container with a margin factor.
pub fn fit<I>(
    points: I,
    container_width: f64,
    container_height: f64,
    margin_factor: f64,
) -> Result<Viewport, FitError>
where
    I: IntoIterator<Item = DataPoint>,
{
    fit_with_params(
        points,
        Size::new(container_width, container_height),
        FitParams::with_margin(margin_factor),
    )
}

/// Fit points into a container using full fit parameters.
///
/// An axis with zero extent places no constraint on the scale; if both axes
/// are degenerate the fit fails with [`FitError::Degenerate`].
pub fn fit_with_params<I>(points: I, size: Size, params: FitParams) -> Result<Viewport, FitError>
where
    I: IntoIterator<Item = DataPoint>,
{
    if !size.is_valid() {
        return Err(FitError::InvalidContainer {
            width: size.width,
            height: size.height,
        });
    }
    params.validate()?;
    let bounds = Bounds::from_points(points).ok_or(FitError::EmptyInput)?;

    let data_width = bounds.width();
    let data_height = bounds.height();
    let available_width = size.width * params.width_fraction;

    let scale_x = axis_scale(available_width * params.margin_factor, data_width);
    let scale_y = axis_scale(size.height * params.margin_factor, data_height);
    let scale = match (scale_x, scale_y) {
        (Some(sx), Some(sy)) => sx.min(sy),
        (Some(sx), None) => sx,
        (None, Some(sy)) => sy,
        (None, None) => {
            return Err(FitError::Degenerate {
                width: data_width,
                height: data_height,
            });
        }
    } * params.scale_factor;

    let tx = (available_width - data_width * scale) / 2.0 - bounds.x.min * scale;
    let ty = (size.height - data_height * scale) / 2.0 - bounds.y.min * scale;
    Ok(Viewport::new(scale, scale, ScreenPoint::new(tx, ty), size))
}

fn axis_scale(available: f64, extent: f64) -> Option<f64> {
    if extent <= 0.0 {
        return None;
    }
    let scale = available / extent;
    (scale.is_finite() && scale > 0.0).then_some(scale)
}

/// Inputs that determine a fit result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FitKey {
    generation: u64,
    size: (u64, u64),
    params: (u64, u64, u64),
}

impl FitKey {
    fn new(dataset: &Dataset, size: Size, params: FitParams) -> Self {
        Self {
            generation: dataset.generation(),
            size: (size.width.to_bits(), size.height.to_bits()),
            params: (
                params.width_fraction.to_bits(),
                params.margin_factor.to_bits(),
                params.scale_factor.to_bits(),
            ),
        }
    }
}

/// Result of a cached fit request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Refit {
    /// Inputs were unchanged; the cached viewport is returned.
    Unchanged(Viewport),
    /// Inputs changed and the viewport was recomputed.
    Recomputed(Viewport),
    /// The fit failed. `cached` is set when the inputs are the ones that
    /// already failed last time.
    Failed {
        /// Why the fit failed.
        error: FitError,
        /// Whether this failure was returned from the cache.
        cached: bool,
    },
}

impl Refit {
    /// The fitted viewport, if the fit succeeded.
    pub fn viewport(&self) -> Option<Viewport> {
        match *self {
            Self::Unchanged(viewport) | Self::Recomputed(viewport) => Some(viewport),
            Self::Failed { .. } => None,
        }
    }

    /// The fit error, if the fit failed.
    pub fn error(&self) -> Option<FitError> {
        match *self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Whether the inputs matched the previous request.
    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Unchanged(_) | Self::Failed { cached: true, .. })
    }
}

/// Memoizes fits against dataset generation, container size, and parameters.
#[derive(Debug, Clone, Default)]
pub struct FitCache {
    entry: Option<(FitKey, Result<Viewport, FitError>)>,
}

impl FitCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit all points of `dataset`, reusing the previous result (success or
    /// failure) when the inputs are identical.
    pub fn update(&mut self, dataset: &Dataset, size: Size, params: FitParams) -> Refit {
        let key = FitKey::new(dataset, size, params);
        if let Some((cached_key, result)) = &self.entry {
            if *cached_key == key {
                return match *result {
                    Ok(viewport) => Refit::Unchanged(viewport),
                    Err(error) => Refit::Failed {
                        error,
                        cached: true,
                    },
                };
            }
        }
        let result = fit_with_params(dataset.points().map(|p| p.position), size, params);
        debug!(
            generation = dataset.generation(),
            width = size.width,
            height = size.height,
            ok = result.is_ok(),
            "viewport refit"
        );
        self.entry = Some((key, result));
        match result {
            Ok(viewport) => Refit::Recomputed(viewport),
            Err(error) => Refit::Failed {
                error,
                cached: false,
            },
        }
    }

    /// Drop the cached result.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Cluster;
    use crate::transform::Transform;

    fn triangle() -> Vec<DataPoint> {
        vec![
            DataPoint::new(0.0, 0.0),
            DataPoint::new(10.0, 0.0),
            DataPoint::new(5.0, 10.0),
        ]
    }

    #[test]
    fn fits_and_centers_triangle() {
        let viewport = fit(triangle(), 400.0, 400.0, 0.8).unwrap();
        assert!((viewport.scale_x - 32.0).abs() < 1e-9);
        assert!((viewport.translate.x - 40.0).abs() < 1e-9);
        assert!((viewport.translate.y - 40.0).abs() < 1e-9);
        assert_eq!(viewport.zoom, 1.0);
    }

    #[test]
    fn uniform_scale_uses_tighter_axis() {
        let points = [DataPoint::new(0.0, 0.0), DataPoint::new(20.0, 5.0)];
        let viewport = fit(points, 200.0, 200.0, 1.0).unwrap();
        assert!((viewport.scale_x - 10.0).abs() < 1e-9);
        assert_eq!(viewport.scale_x, viewport.scale_y);
        let transform = Transform::new(viewport).unwrap();
        let top = transform.data_to_screen(DataPoint::new(0.0, 0.0));
        let bottom = transform.data_to_screen(DataPoint::new(20.0, 5.0));
        assert!((top.y - (200.0 - bottom.y)).abs() < 1e-9);
    }

    #[test]
    fn colinear_points_use_remaining_axis() {
        let points = [DataPoint::new(0.0, 3.0), DataPoint::new(8.0, 3.0)];
        let viewport = fit(points, 100.0, 50.0, 0.8).unwrap();
        assert!((viewport.scale_x - 10.0).abs() < 1e-9);
        assert!((viewport.translate.y - (25.0 - 30.0)).abs() < 1e-9);
    }

    #[test]
    fn identical_points_are_degenerate() {
        let points = [DataPoint::new(1.0, 1.0), DataPoint::new(1.0, 1.0)];
        assert_eq!(
            fit(points, 100.0, 100.0, 0.8),
            Err(FitError::Degenerate {
                width: 0.0,
                height: 0.0
            })
        );
        assert_eq!(
            fit(std::iter::empty(), 100.0, 100.0, 0.8),
            Err(FitError::EmptyInput)
        );
    }

    #[test]
    fn rejects_bad_container_and_params() {
        assert!(matches!(
            fit(triangle(), 0.0, 100.0, 0.8),
            Err(FitError::InvalidContainer { .. })
        ));
        assert!(matches!(
            fit(triangle(), 100.0, 100.0, -1.0),
            Err(FitError::InvalidParameter {
                name: "margin_factor",
                ..
            })
        ));
    }

    #[test]
    fn full_screen_preset_shrinks_width() {
        let viewport =
            fit_with_params(triangle(), Size::new(400.0, 400.0), FitParams::full_screen())
                .unwrap();
        // 300 * 0.6 / 10 = 18, 400 * 0.6 / 10 = 24 -> 18 * 0.8
        assert!((viewport.scale_x - 14.4).abs() < 1e-9);
        assert!((viewport.translate.x - (300.0 - 144.0) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn fit_is_idempotent() {
        let a = fit(triangle(), 321.0, 123.0, 0.7).unwrap();
        let b = fit(triangle(), 321.0, 123.0, 0.7).unwrap();
        assert_eq!(a.scale_x.to_bits(), b.scale_x.to_bits());
        assert_eq!(a.translate.x.to_bits(), b.translate.x.to_bits());
        assert_eq!(a.translate.y.to_bits(), b.translate.y.to_bits());
    }

    #[test]
    fn cache_reuses_identical_inputs() {
        let dataset = Dataset::new(vec![
            Cluster::new("a", "A")
                .with_point("a1", 0.0, 0.0)
                .with_point("a2", 10.0, 0.0),
            Cluster::new("b", "B").with_point("b1", 5.0, 10.0),
        ])
        .unwrap();
        let mut cache = FitCache::new();
        let size = Size::new(400.0, 400.0);
        let first = cache.update(&dataset, size, FitParams::embedded());
        assert!(matches!(first, Refit::Recomputed(_)));
        let second = cache.update(&dataset, size, FitParams::embedded());
        assert_eq!(second, Refit::Unchanged(first.viewport().unwrap()));
        assert!(second.is_cached());

        let resized = cache.update(&dataset, Size::new(800.0, 400.0), FitParams::embedded());
        assert!(matches!(resized, Refit::Recomputed(_)));

        cache.invalidate();
        assert!(matches!(
            cache.update(&dataset, size, FitParams::embedded()),
            Refit::Recomputed(_)
        ));
    }

    #[test]
    fn cache_marks_repeated_failures() {
        let dataset =
            Dataset::new(vec![Cluster::new("a", "A").with_point("p", 3.0, 4.0)]).unwrap();
        let mut cache = FitCache::new();
        let size = Size::new(400.0, 400.0);

        let first = cache.update(&dataset, size, FitParams::embedded());
        assert_eq!(
            first,
            Refit::Failed {
                error: FitError::Degenerate {
                    width: 0.0,
                    height: 0.0
                },
                cached: false
            }
        );
        assert!(first.viewport().is_none());
        assert!(!first.is_cached());

        let again = cache.update(&dataset, size, FitParams::embedded());
        assert!(matches!(again, Refit::Failed { cached: true, .. }));
        assert_eq!(again.error(), first.error());

        let resized = cache.update(&dataset, Size::new(500.0, 400.0), FitParams::embedded());
        assert!(matches!(resized, Refit::Failed { cached: false, .. }));
    }
}
