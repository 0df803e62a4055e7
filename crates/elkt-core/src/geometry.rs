//! Geometric primitives attached to graph elements.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate, used for positions, section end points and bend points
//! - [`ShapeLayout`] - The optional position and size written for a node, port or label
//! - [`Bounds`] - A fully populated rectangle derived from a [`ShapeLayout`]
//!
//! Coordinates are `f64`, matching the precision layout engines work with.
//! Following the ELK convention, a shape's position is relative to its
//! parent node and the Y axis grows downward.

/// A 2D point.
///
/// # Examples
///
/// ```
/// # use elkt_core::geometry::Point;
/// let p = Point::new(10.0, 20.0);
/// assert_eq!(p.x(), 10.0);
/// assert_eq!(p.y(), 20.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f64 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f64 {
        self.y
    }
}

/// Position and size of a shape as written in a `layout [ ... ]` block.
///
/// Every attribute is optional. Unset attributes stay `None` so that a
/// document can be written back exactly as it was read.
///
/// # Examples
///
/// ```
/// # use elkt_core::geometry::{Point, ShapeLayout};
/// let layout = ShapeLayout::default()
///     .with_position(Point::new(10.0, 20.0))
///     .with_size(30.0, 40.0);
///
/// assert_eq!(layout.width(), Some(30.0));
/// assert_eq!(layout.bounds().max_y(), 60.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShapeLayout {
    position: Option<Point>,
    width: Option<f64>,
    height: Option<f64>,
}

impl ShapeLayout {
    /// Sets the position.
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    /// Sets the width.
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// Sets the height.
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    /// Sets width and height at once.
    pub fn with_size(self, width: f64, height: f64) -> Self {
        self.with_width(width).with_height(height)
    }

    /// Returns the position, if one was given.
    pub fn position(&self) -> Option<Point> {
        self.position
    }

    /// Returns the width, if one was given.
    pub fn width(&self) -> Option<f64> {
        self.width
    }

    /// Returns the height, if one was given.
    pub fn height(&self) -> Option<f64> {
        self.height
    }

    /// Returns `true` if no attribute is set.
    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.width.is_none() && self.height.is_none()
    }

    /// Returns the bounds of the shape, treating unset attributes as zero.
    pub fn bounds(&self) -> Bounds {
        let position = self.position.unwrap_or_default();
        Bounds {
            x: position.x(),
            y: position.y(),
            width: self.width.unwrap_or_default(),
            height: self.height.unwrap_or_default(),
        }
    }
}

/// A rectangle given by its top-left corner and its size.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Bounds {
    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// Returns `true` if the point lies inside or on the border.
    pub fn contains(&self, point: Point) -> bool {
        point.x() >= self.x
            && point.x() <= self.max_x()
            && point.y() >= self.y
            && point.y() <= self.max_y()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_layout_default_is_empty() {
        let layout = ShapeLayout::default();
        assert!(layout.is_empty());
        assert_eq!(layout.bounds(), Bounds::default());
    }

    #[test]
    fn test_shape_layout_partial() {
        let layout = ShapeLayout::default().with_height(5.0);

        assert!(!layout.is_empty());
        assert_eq!(layout.position(), None);
        assert_eq!(layout.width(), None);
        assert_eq!(layout.height(), Some(5.0));
        assert_eq!(layout.bounds().height(), 5.0);
        assert_eq!(layout.bounds().width(), 0.0);
    }

    #[test]
    fn test_bounds_contains() {
        let bounds = ShapeLayout::default()
            .with_position(Point::new(10.0, 10.0))
            .with_size(20.0, 20.0)
            .bounds();

        assert!(bounds.contains(Point::new(10.0, 10.0)));
        assert!(bounds.contains(Point::new(30.0, 30.0)));
        assert!(!bounds.contains(Point::new(31.0, 15.0)));
    }
}
