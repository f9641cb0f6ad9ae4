//! # Score Hierarchy
//!
//! Arena-style storage for the recognized score structure:
//! Score → Page → System → Part / MeasureStack → Measure → Voice, plus one
//! [`Sig`] per system.
//!
//! Entities live in HashMaps keyed by stable ID newtypes; every cross-link
//! (measure ↔ stack ↔ part, voice → chord) is an ID lookup, never ownership.
//! Reconciliation reassigns voice numbers through the scope-specific swap
//! operations here; it never creates or deletes entities.

pub mod hierarchy;
pub mod voice;

use hashbrown::HashMap;
use tracing::debug;

use crate::model::Shape;
use crate::sig::{HorizontalSide, InterId, InterRef, Sig};
use crate::{Error, Result};

pub use hierarchy::{
    LogicalPart, Measure, MeasureId, MeasureStack, Page, PageId, Part, PartId, Slot, SlotId,
    StackId, System, SystemId,
};
pub use voice::{SlotVoice, Voice, VoiceId, VoiceStatus};

// ============================================================================
// Score
// ============================================================================

/// The whole recognized score: arenas for every hierarchy level and the
/// per-system interpretation graphs.
pub struct Score {
    pages: Vec<PageId>,
    page_map: HashMap<PageId, Page>,
    systems: HashMap<SystemId, System>,
    parts: HashMap<PartId, Part>,
    stacks: HashMap<StackId, MeasureStack>,
    measures: HashMap<MeasureId, Measure>,
    slots: HashMap<SlotId, Slot>,
    voices: HashMap<VoiceId, Voice>,
    sigs: HashMap<SystemId, Sig>,
    /// Score-level logical parts.
    logical_parts: Vec<LogicalPart>,
    next_id: u64,
}

impl Score {
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            page_map: HashMap::new(),
            systems: HashMap::new(),
            parts: HashMap::new(),
            stacks: HashMap::new(),
            measures: HashMap::new(),
            slots: HashMap::new(),
            voices: HashMap::new(),
            sigs: HashMap::new(),
            logical_parts: Vec::new(),
            next_id: 1,
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // ========================================================================
    // Builders (pipeline-facing)
    // ========================================================================

    pub fn add_page(&mut self) -> PageId {
        let id = PageId(self.next_id());
        let index = self.pages.len() as u32 + 1;
        self.pages.push(id);
        self.page_map.insert(id, Page { id, index, systems: Vec::new(), logical_parts: Vec::new() });
        id
    }

    /// Declare a logical part at score level.
    pub fn add_logical_part(&mut self, id: u32, name: impl Into<String>) {
        self.logical_parts.push(LogicalPart { id, name: name.into() });
    }

    /// Declare a logical part on one page.
    pub fn add_page_logical_part(
        &mut self,
        page: PageId,
        id: u32,
        name: impl Into<String>,
    ) -> Result<()> {
        let page = self.page_mut(page)?;
        page.logical_parts.push(LogicalPart { id, name: name.into() });
        Ok(())
    }

    /// Create a system on a page, along with its (empty) SIG.
    pub fn add_system(&mut self, page: PageId) -> Result<SystemId> {
        let id = SystemId(self.next_id());
        self.page_mut(page)?.systems.push(id);
        self.systems.insert(id, System { id, page, parts: Vec::new(), stacks: Vec::new() });
        self.sigs.insert(id, Sig::new(id));
        Ok(id)
    }

    pub fn add_part(&mut self, system: SystemId, logical_id: u32) -> Result<PartId> {
        let id = PartId(self.next_id());
        let sys = self.system_mut(system)?;
        let index = sys.parts.len() as u32;
        sys.parts.push(id);
        self.parts.insert(id, Part { id, system, index, logical_id, measures: Vec::new() });
        Ok(id)
    }

    pub fn add_stack(&mut self, system: SystemId) -> Result<StackId> {
        let id = StackId(self.next_id());
        self.system_mut(system)?.stacks.push(id);
        self.stacks
            .insert(id, MeasureStack { id, system, slots: Vec::new(), measures: Vec::new() });
        Ok(id)
    }

    /// Create the measure of `part` within `stack` (one measure per part and
    /// stack).
    pub fn add_measure(&mut self, stack: StackId, part: PartId) -> Result<MeasureId> {
        let id = MeasureId(self.next_id());
        self.stack_mut(stack)?.measures.push(id);
        self.part_mut(part)?.measures.push(id);
        self.measures.insert(id, Measure { id, part, stack, voices: Vec::new() });
        Ok(id)
    }

    pub fn add_slot(&mut self, stack: StackId) -> Result<SlotId> {
        let id = SlotId(self.next_id());
        let stack_entity = self.stack_mut(stack)?;
        let index = stack_entity.slots.len() as u32;
        stack_entity.slots.push(id);
        self.slots.insert(id, Slot { id, stack, index });
        Ok(id)
    }

    pub fn add_voice(&mut self, measure: MeasureId, num: u32) -> Result<VoiceId> {
        let id = VoiceId(self.next_id());
        self.measure_mut(measure)?.voices.push(id);
        self.voices.insert(id, Voice::new(id, num, measure));
        Ok(id)
    }

    pub fn set_first_chord(&mut self, voice: VoiceId, chord: InterId) -> Result<()> {
        self.voice_mut(voice)?.first_chord = Some(chord);
        Ok(())
    }

    pub fn set_slot_voice(
        &mut self,
        voice: VoiceId,
        slot: SlotId,
        status: VoiceStatus,
        chord: Option<InterId>,
    ) -> Result<()> {
        self.voice_mut(voice)?.set_slot_info(slot, SlotVoice { status, chord });
        Ok(())
    }

    /// Record the voice assignment of a chord on the chord inter and all its
    /// note heads.
    pub fn assign_chord_to_voice(&self, voice: VoiceId, chord: InterId) -> Result<()> {
        let measure = self.voice(voice)?.measure;
        let sig = self.sig(self.system_of_measure(measure)?)?;
        sig.set_voice(chord, Some(voice))?;
        if let Some(inter) = sig.inter(chord) {
            if let Some(notes) = inter.data.chord_notes() {
                for &note in notes {
                    sig.set_voice(note, Some(voice))?;
                }
            }
        }
        Ok(())
    }

    /// Wire a slur extension across a system break: `left` is the slur in the
    /// earlier system, `right` its continuation in the later one.
    pub fn link_slur_extension(&self, left: InterRef, right: InterRef) -> Result<()> {
        self.sig(left.system)?.set_slur_extension(left.inter, HorizontalSide::Right, Some(right))?;
        self.sig(right.system)?.set_slur_extension(right.inter, HorizontalSide::Left, Some(left))?;
        Ok(())
    }

    // ========================================================================
    // Getters
    // ========================================================================

    pub fn pages(&self) -> &[PageId] {
        &self.pages
    }

    pub fn logical_parts(&self) -> &[LogicalPart] {
        &self.logical_parts
    }

    pub fn page(&self, id: PageId) -> Result<&Page> {
        self.page_map.get(&id).ok_or_else(|| Error::NotFound(format!("Page {id}")))
    }

    pub fn system(&self, id: SystemId) -> Result<&System> {
        self.systems.get(&id).ok_or_else(|| Error::NotFound(format!("System {id}")))
    }

    pub fn part(&self, id: PartId) -> Result<&Part> {
        self.parts.get(&id).ok_or_else(|| Error::NotFound(format!("Part {id}")))
    }

    pub fn stack(&self, id: StackId) -> Result<&MeasureStack> {
        self.stacks.get(&id).ok_or_else(|| Error::NotFound(format!("Stack {id}")))
    }

    pub fn measure(&self, id: MeasureId) -> Result<&Measure> {
        self.measures.get(&id).ok_or_else(|| Error::NotFound(format!("Measure {id}")))
    }

    pub fn slot(&self, id: SlotId) -> Result<&Slot> {
        self.slots.get(&id).ok_or_else(|| Error::NotFound(format!("Slot {id}")))
    }

    pub fn voice(&self, id: VoiceId) -> Result<&Voice> {
        self.voices.get(&id).ok_or_else(|| Error::NotFound(format!("Voice {id}")))
    }

    pub fn sig(&self, system: SystemId) -> Result<&Sig> {
        self.sigs.get(&system).ok_or_else(|| Error::NotFound(format!("Sig of system {system}")))
    }

    fn page_mut(&mut self, id: PageId) -> Result<&mut Page> {
        self.page_map.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Page {id}")))
    }

    fn system_mut(&mut self, id: SystemId) -> Result<&mut System> {
        self.systems.get_mut(&id).ok_or_else(|| Error::NotFound(format!("System {id}")))
    }

    fn part_mut(&mut self, id: PartId) -> Result<&mut Part> {
        self.parts.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Part {id}")))
    }

    fn stack_mut(&mut self, id: StackId) -> Result<&mut MeasureStack> {
        self.stacks.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Stack {id}")))
    }

    fn measure_mut(&mut self, id: MeasureId) -> Result<&mut Measure> {
        self.measures.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Measure {id}")))
    }

    fn voice_mut(&mut self, id: VoiceId) -> Result<&mut Voice> {
        self.voices.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Voice {id}")))
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn first_system(&self, page: PageId) -> Option<SystemId> {
        self.page_map.get(&page).and_then(|p| p.systems.first().copied())
    }

    pub fn last_system(&self, page: PageId) -> Option<SystemId> {
        self.page_map.get(&page).and_then(|p| p.systems.last().copied())
    }

    /// Physical part of `system` realizing the given logical part, if the
    /// part is present in that system at all.
    pub fn part_by_logical(&self, system: SystemId, logical_id: u32) -> Option<PartId> {
        let sys = self.systems.get(&system)?;
        sys.parts
            .iter()
            .copied()
            .find(|pid| self.parts.get(pid).is_some_and(|p| p.logical_id == logical_id))
    }

    /// The measure of `part` within `stack`, if any.
    pub fn measure_at(&self, stack: StackId, part: PartId) -> Option<MeasureId> {
        let stack = self.stacks.get(&stack)?;
        stack
            .measures
            .iter()
            .copied()
            .find(|mid| self.measures.get(mid).is_some_and(|m| m.part == part))
    }

    pub fn first_measure(&self, part: PartId) -> Option<MeasureId> {
        self.parts.get(&part).and_then(|p| p.measures.first().copied())
    }

    pub fn system_of_measure(&self, measure: MeasureId) -> Result<SystemId> {
        let stack = self.measure(measure)?.stack;
        Ok(self.stack(stack)?.system)
    }

    // ========================================================================
    // Voice numbering (reconciliation plumbing)
    // ========================================================================

    /// Sort a measure's voices by vertical position.
    pub fn sort_voices(&mut self, measure: MeasureId) -> Result<()> {
        let mut vids = self.measure(measure)?.voices.clone();
        {
            let score = &*self;
            vids.sort_by(|a, b| match (score.voices.get(a), score.voices.get(b)) {
                (Some(va), Some(vb)) => crate::rhythm::voices::by_ordinate(score, va, vb),
                _ => std::cmp::Ordering::Equal,
            });
        }
        if let Some(m) = self.measures.get_mut(&measure) {
            m.voices = vids;
        }
        Ok(())
    }

    /// Renumber a measure's voices 1..n in their current order.
    pub fn rename_voices(&mut self, measure: MeasureId) -> Result<()> {
        let vids = self.measure(measure)?.voices.clone();
        for (i, vid) in vids.iter().enumerate() {
            self.voice_mut(*vid)?.num = i as u32 + 1;
        }
        Ok(())
    }

    /// Give `voice` the number `new_num` within its measure; whichever voice
    /// of the measure held `new_num` receives the old number in exchange.
    pub fn swap_voice_num(&mut self, measure: MeasureId, voice: VoiceId, new_num: u32) -> Result<()> {
        let old_num = self.voice(voice)?.num;
        if old_num == new_num {
            return Ok(());
        }

        let vids = self.measure(measure)?.voices.clone();
        for vid in vids {
            if vid != voice && self.voice(vid)?.num == new_num {
                self.voice_mut(vid)?.num = old_num;
                break;
            }
        }
        self.voice_mut(voice)?.num = new_num;
        Ok(())
    }

    /// Swap the voice numbers `a` and `b` in every measure of a part.
    pub fn swap_voice_nums_in_part(&mut self, part: PartId, a: u32, b: u32) -> Result<()> {
        if a == b {
            return Ok(());
        }
        let measures = self.part(part)?.measures.clone();
        for mid in measures {
            let vids = self.measure(mid)?.voices.clone();
            for vid in vids {
                let num = self.voice(vid)?.num;
                if num == a {
                    self.voice_mut(vid)?.num = b;
                } else if num == b {
                    self.voice_mut(vid)?.num = a;
                }
            }
        }
        Ok(())
    }

    /// Swap the voice numbers `a` and `b` in every system of a page, for the
    /// physical parts realizing the given logical part.
    pub fn swap_voice_nums_in_logical_part(
        &mut self,
        page: PageId,
        logical_id: u32,
        a: u32,
        b: u32,
    ) -> Result<()> {
        let systems = self.page(page)?.systems.clone();
        for system in systems {
            if let Some(part) = self.part_by_logical(system, logical_id) {
                self.swap_voice_nums_in_part(part, a, b)?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Cross-page slur correspondence
    // ========================================================================

    /// Within the same logical part, match the orphan slurs at the beginning
    /// of `part` with the orphan slurs at the end of `preceding`, by
    /// attached-head pitch (a tie joins two notes of equal pitch), vertical
    /// order as tiebreak.
    ///
    /// Returns links slur → preceding slur; possibly empty, never an error.
    /// Ties across pages cannot be persisted, so callers recompute this map
    /// on the fly.
    pub fn connect_slurs(
        &self,
        part: PartId,
        preceding: PartId,
    ) -> Result<HashMap<InterRef, InterRef>> {
        let cur_system = self.part(part)?.system;
        let prev_system = self.part(preceding)?.system;
        let sig = self.sig(cur_system)?;
        let prev_sig = self.sig(prev_system)?;

        // Slurs of `part` with a free left end.
        let mut starting: Vec<(i32, i32, u64)> = Vec::new();
        for slur in sig.inters_by_shape(Shape::Slur) {
            if slur.left_extension().is_some() || sig.slur_head(slur.id, HorizontalSide::Left).is_some()
            {
                continue;
            }
            let Some(head) = sig.slur_head(slur.id, HorizontalSide::Right) else {
                continue;
            };
            if !self.head_in_part(head.voice, part) {
                continue;
            }
            let Some(pitch) = head.data.head_pitch() else {
                continue;
            };
            starting.push((pitch, head.bounds.y, slur.id.0));
        }

        // Slurs of `preceding` with a free right end.
        let mut ending: Vec<(i32, i32, u64)> = Vec::new();
        for slur in prev_sig.inters_by_shape(Shape::Slur) {
            if slur.right_extension().is_some()
                || prev_sig.slur_head(slur.id, HorizontalSide::Right).is_some()
            {
                continue;
            }
            let Some(head) = prev_sig.slur_head(slur.id, HorizontalSide::Left) else {
                continue;
            };
            if !self.head_in_part(head.voice, preceding) {
                continue;
            }
            let Some(pitch) = head.data.head_pitch() else {
                continue;
            };
            ending.push((pitch, head.bounds.y, slur.id.0));
        }

        starting.sort_unstable();
        ending.sort_unstable();

        let mut links = HashMap::new();
        let (mut i, mut j) = (0, 0);
        while i < starting.len() && j < ending.len() {
            match starting[i].0.cmp(&ending[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    links.insert(
                        InterRef { system: cur_system, inter: crate::sig::InterId(starting[i].2) },
                        InterRef { system: prev_system, inter: crate::sig::InterId(ending[j].2) },
                    );
                    i += 1;
                    j += 1;
                }
            }
        }

        debug!(part = %part, preceding = %preceding, links = links.len(), "connected orphan slurs");
        Ok(links)
    }

    fn head_in_part(&self, voice: Option<VoiceId>, part: PartId) -> bool {
        voice
            .and_then(|v| self.voices.get(&v))
            .and_then(|v| self.measures.get(&v.measure))
            .is_some_and(|m| m.part == part)
    }
}

impl Default for Score {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
