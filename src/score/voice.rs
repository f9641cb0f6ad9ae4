//! Voice — a numbered sequence of chords occupying slots within one measure.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::sig::InterId;
use super::hierarchy::{MeasureId, SlotId};

/// Opaque voice identifier: the arena key, distinct from the musical voice
/// number that reconciliation reassigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoiceId(pub u64);

impl std::fmt::Display for VoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a voice at one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceStatus {
    /// A chord of this voice begins at the slot.
    Begin,
    /// A chord begun earlier is still sounding.
    Continue,
}

/// What a voice does at one slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotVoice {
    pub status: VoiceStatus,
    /// The chord inter occupying the slot, present iff status is `Begin`.
    pub chord: Option<InterId>,
}

/// A voice within one measure.
///
/// The musical number `num` is unique within the owning part at assignment
/// time; reconciliation swaps numbers between voices of the same scope but
/// never creates or destroys the voices themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub id: VoiceId,
    /// Musical voice number, 1-based.
    pub num: u32,
    pub measure: MeasureId,
    /// First chord of the voice (a whole-measure rest voice has its rest
    /// chord here).
    pub first_chord: Option<InterId>,
    slots: HashMap<SlotId, SlotVoice>,
}

impl Voice {
    pub fn new(id: VoiceId, num: u32, measure: MeasureId) -> Self {
        Self { id, num, measure, first_chord: None, slots: HashMap::new() }
    }

    /// What this voice does at `slot`, if anything.
    pub fn slot_info(&self, slot: SlotId) -> Option<&SlotVoice> {
        self.slots.get(&slot)
    }

    /// Chord beginning at `slot` for this voice, if any.
    pub fn chord_at(&self, slot: SlotId) -> Option<InterId> {
        match self.slot_info(slot) {
            Some(SlotVoice { status: VoiceStatus::Begin, chord }) => *chord,
            _ => None,
        }
    }

    pub(crate) fn set_slot_info(&mut self, slot: SlotId, info: SlotVoice) {
        self.slots.insert(slot, info);
    }
}
