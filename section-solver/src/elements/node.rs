//! Node - a point of the section mesh

use serde::{Deserialize, Serialize};

use crate::math::Point;

/// A 2D node of the cross-section mesh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Node {
    /// Create a new node at the given coordinates
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Get the coordinates as an array
    pub fn coords(&self) -> Point {
        [self.x, self.y]
    }

    /// Calculate distance to another node
    pub fn distance_to(&self, other: &Node) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// This node translated by (dx, dy)
    pub fn shifted(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// This node rotated by `angle` degrees about `origin`
    pub fn rotated(&self, angle: f64, origin: Point) -> Self {
        let (s, c) = angle.to_radians().sin_cos();
        let dx = self.x - origin[0];
        let dy = self.y - origin[1];
        Self::new(origin[0] + dx * c - dy * s, origin[1] + dx * s + dy * c)
    }
}

impl From<Point> for Node {
    fn from(p: Point) -> Self {
        Self::new(p[0], p[1])
    }
}
