//! # Symbol Model
//!
//! Plain DTOs shared by every layer: shapes, glyphs, geometry.
//! These types cross every boundary: classifier ↔ sig ↔ score ↔ caller.
//!
//! Design rule: pure data — no locks, no I/O, no graph state here.

pub mod glyph;
pub mod shape;

pub use glyph::{Bounds, Glyph, GlyphId};
pub use shape::Shape;
