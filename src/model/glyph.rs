//! Glyph — pixel-level evidence backing an interpretation.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::Shape;

/// Opaque glyph identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlyphId(pub u64);

impl std::fmt::Display for GlyphId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Integer bounding box in sheet pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn center_x(&self) -> i32 {
        self.x + (self.width as i32) / 2
    }

    pub fn center_y(&self) -> i32 {
        self.y + (self.height as i32) / 2
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width as i32).max(other.x + other.width as i32);
        let bottom = (self.y + self.height as i32).max(other.y + other.height as i32);
        Bounds { x, y, width: (right - x) as u32, height: (bottom - y) as u32 }
    }
}

/// A glyph: a connected pixel aggregate, read-only from this core's
/// perspective. Segmentation produced it; the classifier consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    pub id: GlyphId,
    /// Pixel count.
    pub weight: u32,
    pub bounds: Bounds,
    /// Shapes ruled out for this glyph by earlier pipeline decisions.
    pub forbidden: SmallVec<[Shape; 2]>,
}

impl Glyph {
    pub fn new(id: GlyphId, weight: u32, bounds: Bounds) -> Self {
        Self { id, weight, bounds, forbidden: SmallVec::new() }
    }

    pub fn with_forbidden(mut self, shapes: impl IntoIterator<Item = Shape>) -> Self {
        self.forbidden.extend(shapes);
        self
    }

    /// Weight normalized by the square of the staff interline, so that
    /// thresholds are scale-independent.
    pub fn normalized_weight(&self, interline: u32) -> f64 {
        self.weight as f64 / (interline as f64 * interline as f64)
    }

    pub fn is_forbidden(&self, shape: Shape) -> bool {
        self.forbidden.contains(&shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_weight() {
        let g = Glyph::new(GlyphId(1), 400, Bounds::new(0, 0, 20, 20));
        assert_eq!(g.normalized_weight(20), 1.0);
        assert_eq!(g.normalized_weight(10), 4.0);
    }

    #[test]
    fn test_bounds_union() {
        let a = Bounds::new(0, 0, 10, 10);
        let b = Bounds::new(5, 5, 10, 10);
        assert_eq!(a.union(&b), Bounds::new(0, 0, 15, 15));
    }

    #[test]
    fn test_forbidden_shapes() {
        let g = Glyph::new(GlyphId(2), 100, Bounds::new(0, 0, 4, 4))
            .with_forbidden([Shape::Stem]);
        assert!(g.is_forbidden(Shape::Stem));
        assert!(!g.is_forbidden(Shape::Slur));
    }
}
