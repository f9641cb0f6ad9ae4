//! Relation — typed, directed edge between two inters.

use serde::{Deserialize, Serialize};

use crate::model::Shape;
use super::InterId;

/// Relation identifier, unique within its owning SIG only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationId(pub u64);

impl std::fmt::Display for RelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Horizontal attachment side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HorizontalSide {
    Left,
    Right,
}

/// Payload-free relation discriminant, used for kind filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationTag {
    SlurHead,
    HeadStem,
    BeamStem,
    FlagStem,
    DotHead,
}

/// Relation kind with its kind-specific attributes.
///
/// Each kind fixes which shapes are valid at which endpoint; compatibility is
/// validated when the relation is created, never via downcasts at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    /// Slur (src) to head (dst). `side` is the end of the slur the head
    /// attaches to.
    SlurHead { side: HorizontalSide },
    /// Head (src) to stem (dst). `head_side` is the side of the head the stem
    /// attaches to, defined with respect to the head, not the stem.
    HeadStem { head_side: HorizontalSide },
    /// Beam (src) to stem (dst).
    BeamStem,
    /// Flag (src) to stem (dst).
    FlagStem,
    /// Augmentation dot (src) to head (dst).
    DotHead,
}

impl RelationKind {
    pub fn tag(&self) -> RelationTag {
        match self {
            RelationKind::SlurHead { .. } => RelationTag::SlurHead,
            RelationKind::HeadStem { .. } => RelationTag::HeadStem,
            RelationKind::BeamStem => RelationTag::BeamStem,
            RelationKind::FlagStem => RelationTag::FlagStem,
            RelationKind::DotHead => RelationTag::DotHead,
        }
    }

    /// Endpoint role table.
    pub fn roles_match(&self, src: Shape, dst: Shape) -> bool {
        match self.tag() {
            RelationTag::SlurHead => src == Shape::Slur && dst.is_head(),
            RelationTag::HeadStem => src.is_head() && dst == Shape::Stem,
            RelationTag::BeamStem => {
                matches!(src, Shape::Beam | Shape::BeamHook) && dst == Shape::Stem
            }
            RelationTag::FlagStem => matches!(src, Shape::Flag1 | Shape::Flag2) && dst == Shape::Stem,
            RelationTag::DotHead => src == Shape::AugmentationDot && dst.is_head(),
        }
    }
}

/// A typed, directed edge. Direction is fixed at creation and is semantically
/// meaningful per kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationId,
    pub src: InterId,
    pub dst: InterId,
    pub kind: RelationKind,
}

impl Relation {
    /// The "other" end of the relation from the given inter, if `from` is an
    /// endpoint at all.
    pub fn other_end(&self, from: InterId) -> Option<InterId> {
        if from == self.src {
            Some(self.dst)
        } else if from == self.dst {
            Some(self.src)
        } else {
            None
        }
    }
}
