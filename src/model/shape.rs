//! Closed enumeration of recognizable symbol shapes.

use serde::{Deserialize, Serialize};

/// A symbol shape, as distinguished by the classifier.
///
/// Shapes are ordinally comparable. The *physical* shapes, the ones a
/// classifier is trained on, come first and end at [`Shape::LAST_PHYSICAL`].
/// Shapes past that boundary are auxiliary or derived: built by the pipeline
/// (chords) or used as sink categories (noise, clutter), never emitted by a
/// classifier evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Shape {
    // Physical shapes
    NoteheadBlack,
    NoteheadVoid,
    WholeNote,
    Stem,
    Slur,
    Beam,
    BeamHook,
    Flag1,
    Flag2,
    AugmentationDot,
    Sharp,
    Flat,
    Natural,
    GClef,
    FClef,
    CClef,
    QuarterRest,
    EighthRest,
    HalfRest,
    WholeRest,
    Barline,
    Text,

    // Auxiliary / derived shapes
    Chord,
    Noise,
    Clutter,
}

impl Shape {
    /// Boundary between trainable shapes and auxiliary/derived ones.
    pub const LAST_PHYSICAL: Shape = Shape::Text;

    const ALL: [Shape; 25] = [
        Shape::NoteheadBlack,
        Shape::NoteheadVoid,
        Shape::WholeNote,
        Shape::Stem,
        Shape::Slur,
        Shape::Beam,
        Shape::BeamHook,
        Shape::Flag1,
        Shape::Flag2,
        Shape::AugmentationDot,
        Shape::Sharp,
        Shape::Flat,
        Shape::Natural,
        Shape::GClef,
        Shape::FClef,
        Shape::CClef,
        Shape::QuarterRest,
        Shape::EighthRest,
        Shape::HalfRest,
        Shape::WholeRest,
        Shape::Barline,
        Shape::Text,
        Shape::Chord,
        Shape::Noise,
        Shape::Clutter,
    ];

    /// Position in the enumeration order.
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Whether this shape can be emitted by a classifier evaluation.
    pub fn is_physical(self) -> bool {
        self <= Shape::LAST_PHYSICAL
    }

    /// Whether this shape is a note head (black, void or whole).
    pub fn is_head(self) -> bool {
        matches!(self, Shape::NoteheadBlack | Shape::NoteheadVoid | Shape::WholeNote)
    }

    /// Whether this shape is a rest.
    pub fn is_rest(self) -> bool {
        matches!(
            self,
            Shape::QuarterRest | Shape::EighthRest | Shape::HalfRest | Shape::WholeRest
        )
    }

    /// All shapes, in ordinal order.
    pub fn all() -> impl Iterator<Item = Shape> {
        Self::ALL.into_iter()
    }

    /// Physical shapes only, in ordinal order.
    pub fn physical() -> impl Iterator<Item = Shape> {
        Self::ALL.into_iter().filter(|s| s.is_physical())
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
