//! Geometric primitives shared by the mapper, locator, and scene builder.
//!
//! Data-space and screen-space coordinates are kept as distinct types so a
//! pointer position can never be fed into the mapper as a data coordinate.

/// A position in data space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    /// X value in data coordinates.
    pub x: f64,
    /// Y value in data coordinates.
    pub y: f64,
}

impl DataPoint {
    /// Create a new data point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Check whether both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A position in screen space (logical pixels, origin at the container's
/// top-left corner).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    /// X value in pixels.
    pub x: f64,
    /// Y value in pixels.
    pub y: f64,
}

impl ScreenPoint {
    /// Create a new screen point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another screen point.
    pub fn distance(&self, other: ScreenPoint) -> f64 {
        distance_sq(*self, other).sqrt()
    }
}

/// Container dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Size {
    /// Create a new size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Check whether the size has positive, finite area.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Center of a container with this size.
    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.width * 0.5, self.height * 0.5)
    }
}

/// A rectangle in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    /// Top-left corner.
    pub min: ScreenPoint,
    /// Bottom-right corner.
    pub max: ScreenPoint,
}

impl ScreenRect {
    /// Create a new screen rectangle from corners.
    pub fn new(min: ScreenPoint, max: ScreenPoint) -> Self {
        Self { min, max }
    }

    /// Rectangle anchored at the origin covering a container.
    pub fn from_size(size: Size) -> Self {
        Self::new(
            ScreenPoint::new(0.0, 0.0),
            ScreenPoint::new(size.width, size.height),
        )
    }

    /// Rectangle width in pixels.
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Rectangle height in pixels.
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Check whether the point lies inside the rectangle (edges inclusive).
    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
}

pub(crate) fn distance_sq(a: ScreenPoint, b: ScreenPoint) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_edges() {
        let rect = ScreenRect::from_size(Size::new(10.0, 10.0));
        assert!(rect.contains(ScreenPoint::new(0.0, 0.0)));
        assert!(rect.contains(ScreenPoint::new(10.0, 10.0)));
        assert!(!rect.contains(ScreenPoint::new(10.5, 5.0)));
    }

    #[test]
    fn size_rejects_degenerate() {
        assert!(Size::new(1.0, 1.0).is_valid());
        assert!(!Size::new(0.0, 1.0).is_valid());
        assert!(!Size::new(f64::NAN, 1.0).is_valid());
    }
}
