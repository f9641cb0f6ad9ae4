//! Inter — one interpretation of a glyph as a shape with a confidence grade.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::model::{Bounds, GlyphId, Shape};
use crate::score::{SystemId, VoiceId};

/// Inter identifier, unique within its owning SIG only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterId(pub u64);

impl std::fmt::Display for InterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cross-system inter address.
///
/// Inter IDs are per-SIG, so anything that crosses a system boundary (slur
/// extensions, cross-page link maps) must carry the system as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterRef {
    pub system: SystemId,
    pub inter: InterId,
}

/// Interpretation-family payload.
///
/// A tagged variant per family replaces subclass hierarchies: the payload is
/// fixed when the inter is created and checked against the shape then.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InterData {
    /// A note head. `pitch` is the staff-based pitch position (0 on the middle
    /// line, increasing downward).
    Head { pitch: i32 },
    Stem,
    /// A slur, possibly marked as a tie, possibly extended into the adjacent
    /// system on either side (slurs may span system breaks).
    Slur {
        tie: bool,
        left_extension: Option<InterRef>,
        right_extension: Option<InterRef>,
    },
    /// A chord: an ordered ensemble of note-head inters of the same SIG.
    /// The note order is the deterministic scanning order for tie detection.
    Chord { notes: SmallVec<[InterId; 4]> },
    /// No family-specific payload.
    Plain,
}

impl InterData {
    pub fn slur(tie: bool) -> Self {
        InterData::Slur { tie, left_extension: None, right_extension: None }
    }

    pub fn head_pitch(&self) -> Option<i32> {
        match self {
            InterData::Head { pitch } => Some(*pitch),
            _ => None,
        }
    }

    pub fn is_tie(&self) -> bool {
        matches!(self, InterData::Slur { tie: true, .. })
    }

    pub fn chord_notes(&self) -> Option<&[InterId]> {
        match self {
            InterData::Chord { notes } => Some(notes),
            _ => None,
        }
    }

    /// Payload/shape compatibility, validated at inter creation.
    pub fn fits_shape(&self, shape: Shape) -> bool {
        match self {
            InterData::Head { .. } => shape.is_head(),
            InterData::Stem => shape == Shape::Stem,
            InterData::Slur { .. } => shape == Shape::Slur,
            InterData::Chord { .. } => shape == Shape::Chord,
            InterData::Plain => true,
        }
    }
}

/// One candidate interpretation in a SIG.
///
/// After creation only `grade`, the `voice` linkage and slur extension wiring
/// may change; everything else is fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inter {
    pub id: InterId,
    pub shape: Shape,
    /// Confidence in [0, 1].
    pub grade: f64,
    /// Backing pixel evidence, absent for derived inters such as chords.
    pub glyph: Option<GlyphId>,
    pub bounds: Bounds,
    /// Voice this inter was assigned to, if any.
    pub voice: Option<VoiceId>,
    pub data: InterData,
}

impl Inter {
    pub fn is_head(&self) -> bool {
        self.shape.is_head()
    }

    /// Left extension of a slur inter, if wired.
    pub fn left_extension(&self) -> Option<InterRef> {
        match &self.data {
            InterData::Slur { left_extension, .. } => *left_extension,
            _ => None,
        }
    }

    /// Right extension of a slur inter, if wired.
    pub fn right_extension(&self) -> Option<InterRef> {
        match &self.data {
            InterData::Slur { right_extension, .. } => *right_extension,
            _ => None,
        }
    }
}

/// Vertical order of inters: top of bounds, then left edge, then ID so the
/// order is total and reproducible.
pub fn by_ordinate(a: &Inter, b: &Inter) -> std::cmp::Ordering {
    a.bounds
        .y
        .cmp(&b.bounds.y)
        .then(a.bounds.x.cmp(&b.bounds.x))
        .then(a.id.0.cmp(&b.id.0))
}
