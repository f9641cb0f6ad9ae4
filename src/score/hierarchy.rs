//! Structural entities of the score hierarchy.
//!
//! Every entity lives in an arena on [`super::Score`] and refers to its
//! neighbors by ID only; ownership never crosses entity boundaries.

use serde::{Deserialize, Serialize};

use super::voice::VoiceId;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Opaque page identifier.
    PageId
);
id_type!(
    /// Opaque system identifier.
    SystemId
);
id_type!(
    /// Opaque part identifier (one physical part per system).
    PartId
);
id_type!(
    /// Opaque measure-stack identifier.
    StackId
);
id_type!(
    /// Opaque measure identifier.
    MeasureId
);
id_type!(
    /// Opaque slot identifier.
    SlotId
);

/// A page of the score, owning its systems in reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    /// 1-based position within the score.
    pub index: u32,
    pub systems: Vec<SystemId>,
    /// Logical parts present on this page.
    pub logical_parts: Vec<LogicalPart>,
}

impl Page {
    pub fn logical_part(&self, logical_id: u32) -> Option<&LogicalPart> {
        self.logical_parts.iter().find(|lp| lp.id == logical_id)
    }
}

/// A page/score-level part identity that physical parts map onto by ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalPart {
    pub id: u32,
    pub name: String,
}

/// One system: a row of staves read together, with its parts and its
/// sequence of measure stacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct System {
    pub id: SystemId,
    pub page: PageId,
    pub parts: Vec<PartId>,
    pub stacks: Vec<StackId>,
}

/// A physical part within one system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub id: PartId,
    pub system: SystemId,
    /// Top-to-bottom position within the system; the part ordering key.
    pub index: u32,
    /// The logical part this physical part realizes.
    pub logical_id: u32,
    pub measures: Vec<MeasureId>,
}

/// The set of parallel measures (one per part) sharing a time span across a
/// system, plus the time slots of that span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureStack {
    pub id: StackId,
    pub system: SystemId,
    /// Time slots in definition order.
    pub slots: Vec<SlotId>,
    pub measures: Vec<MeasureId>,
}

/// One part's music within a stack's time span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub id: MeasureId,
    pub part: PartId,
    pub stack: StackId,
    /// Voices in this measure. Order is meaningful: stack refinement sorts it
    /// vertically.
    pub voices: Vec<VoiceId>,
}

/// An ordered time position within a measure stack where chords may begin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    pub stack: StackId,
    /// 0-based position within the stack's timeline.
    pub index: u32,
}
