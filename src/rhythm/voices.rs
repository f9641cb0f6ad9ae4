//! Voice reconciliation: comparators, tie detection, scope refinement.
//!
//! Initial voice numbers reflect creation order. The four refinement passes
//! normalize them outward, scope by scope:
//!
//! 1. [`refine_stack`]: per measure, sort voices vertically and renumber.
//! 2. [`refine_system`]: connect voices across the stacks of a system.
//! 3. [`refine_page`]: connect voices across the systems of a page.
//! 4. [`refine_score`]: connect voices across pages.
//!
//! Levels 2–4 share one tie-detection routine and differ only in how the
//! "initial slur" is resolved, which [`SlurResolver`] makes explicit.
//!
//! The passes must run in that order, sequentially: each level reads the
//! numbers the previous level stabilized, and within a pass later measures
//! read the swaps earlier measures performed.

use std::cmp::Ordering;

use hashbrown::HashMap;
use tracing::debug;

use crate::score::{MeasureStack, PageId, Score, StackId, SystemId, Voice};
use crate::sig::{HorizontalSide, InterRef, RelationKind, RelationTag};
use crate::Result;

// ============================================================================
// Comparators
// ============================================================================

/// Order voices by their musical number.
pub fn by_id(v1: &Voice, v2: &Voice) -> Ordering {
    v1.num.cmp(&v2.num)
}

/// Order voices by vertical position within their common measure stack.
///
/// Ordering rules, in priority order:
/// 1. voices of different parts follow the part order;
/// 2. at the first slot where both voices begin a chord, the chords'
///    vertical order decides;
/// 3. failing a common slot, the earlier own first-begin slot wins;
/// 4. failing that (whole-measure rests), the first chords' vertical order
///    decides.
///
/// # Panics
///
/// Comparing voices from different stacks has no defined meaning and panics.
pub fn by_ordinate(score: &Score, v1: &Voice, v2: &Voice) -> Ordering {
    let m1 = score.measure(v1.measure).expect("voice belongs to a measure");
    let m2 = score.measure(v2.measure).expect("voice belongs to a measure");

    if m1.stack != m2.stack {
        panic!("Comparing voices in different stacks");
    }

    // Voices located in different parts follow the part order.
    if m1.part != m2.part {
        let p1 = score.part(m1.part).expect("measure belongs to a part");
        let p2 = score.part(m2.part).expect("measure belongs to a part");
        return p1.index.cmp(&p2.index);
    }

    let stack = score.stack(m1.stack).expect("measure belongs to a stack");
    let sig = score.sig(stack.system).expect("system owns a sig");

    // Look for the first time slot with incoming chords for both voices and
    // compare the two chords' ordinates there.
    for &slot in &stack.slots {
        if let (Some(c1), Some(c2)) = (v1.chord_at(slot), v2.chord_at(slot)) {
            if let (Some(i1), Some(i2)) = (sig.inter(c1), sig.inter(c2)) {
                return crate::sig::by_ordinate(&i1, &i2);
            }
        }
    }

    // No common slot found, use each voice's own first begin slot.
    let f1 = first_begin_index(stack, v1);
    let f2 = first_begin_index(stack, v2);
    if let (Some(f1), Some(f2)) = (f1, f2) {
        return f1.cmp(&f2);
    }

    // Use ordinate directly (there is a whole rest).
    match (
        v1.first_chord.and_then(|c| sig.inter(c)),
        v2.first_chord.and_then(|c| sig.inter(c)),
    ) {
        (Some(i1), Some(i2)) => crate::sig::by_ordinate(&i1, &i2),
        _ => Ordering::Equal,
    }
}

fn first_begin_index(stack: &MeasureStack, voice: &Voice) -> Option<usize> {
    stack.slots.iter().position(|s| voice.chord_at(*s).is_some())
}

// ============================================================================
// Slur resolution strategies
// ============================================================================

/// How to find the predecessor slur during tie detection, per scope.
///
/// Within a system the slur itself already reaches the previous measure;
/// across systems its left extension must be followed; across pages the
/// correspondence has to be recomputed and handed in as a link map.
pub enum SlurResolver<'a> {
    Identity,
    LeftExtension,
    LinkMap(&'a HashMap<InterRef, InterRef>),
}

impl SlurResolver<'_> {
    /// The slur connected to the left of the provided one, if resolvable.
    pub fn initial_slur(&self, score: &Score, slur: InterRef) -> Option<InterRef> {
        match self {
            SlurResolver::Identity => Some(slur),
            SlurResolver::LeftExtension => {
                score.sig(slur.system).ok()?.inter(slur.inter)?.left_extension()
            }
            SlurResolver::LinkMap(links) => links.get(&slur).copied(),
        }
    }
}

// ============================================================================
// Tie detection
// ============================================================================

/// Number imposed on `voice` by a tie from a previous voice, if any.
///
/// Scans the voice's first chord's heads in chord-note order and, per head,
/// its incoming slur relations in insertion order; only tie-marked slurs
/// attached on the right side of a head qualify. The first chain that
/// resolves through `resolver` to a slur with a left-side head wins, and
/// that head's voice provides the number.
pub fn tied_num(score: &Score, voice: &Voice, resolver: &SlurResolver<'_>) -> Result<Option<u32>> {
    let Some(first_chord) = voice.first_chord else {
        return Ok(None);
    };
    let system = score.system_of_measure(voice.measure)?;
    let sig = score.sig(system)?;
    let Some(chord) = sig.inter(first_chord) else {
        return Ok(None);
    };

    // Is there an incoming tie on a head of this chord?
    for &note in chord.data.chord_notes().unwrap_or(&[]) {
        let Some(head) = sig.inter(note) else {
            continue;
        };
        if !head.is_head() {
            continue;
        }
        for rel in sig.relations_of(note, Some(RelationTag::SlurHead)) {
            let RelationKind::SlurHead { side } = rel.kind else {
                continue;
            };
            if side != HorizontalSide::Right {
                continue;
            }
            let slur = sig.opposite(note, &rel)?;
            if !slur.data.is_tie() {
                continue;
            }
            let Some(prev) =
                resolver.initial_slur(score, InterRef { system, inter: slur.id })
            else {
                continue;
            };
            let prev_sig = score.sig(prev.system)?;
            let Some(left_head) = prev_sig.slur_head(prev.inter, HorizontalSide::Left) else {
                continue;
            };
            let Some(left_voice_id) = left_head.voice else {
                continue;
            };
            let left_voice = score.voice(left_voice_id)?;
            debug!(
                slur = %slur.id,
                voice = voice.num,
                tied_to = left_voice.num,
                "tie carries voice number over"
            );
            return Ok(Some(left_voice.num));
        }
    }

    Ok(None)
}

// ============================================================================
// Refinement passes
// ============================================================================

/// Refine voice numbers within a stack.
///
/// Initial numbers were assigned in voice creation order; here each measure's
/// voices are simply renamed top to bottom. Idempotent.
pub fn refine_stack(score: &mut Score, stack: StackId) -> Result<()> {
    for measure in score.stack(stack)?.measures.clone() {
        score.sort_voices(measure)?;
        score.rename_voices(measure)?;
    }
    Ok(())
}

/// Connect voices within the same part across all measures of a system.
///
/// Each stack already carries a stabilized voice sequence; this pass links
/// them from one stack to the next through tie slurs.
pub fn refine_system(score: &mut Score, system: SystemId) -> Result<()> {
    let stacks = score.system(system)?.stacks.clone();
    let parts = score.system(system)?.parts.clone();
    let first_stack = stacks.first().copied();

    for part in parts {
        for &stack in &stacks {
            if Some(stack) == first_stack {
                continue;
            }
            // Check tied voices from same part in previous measure.
            let Some(measure) = score.measure_at(stack, part) else {
                continue;
            };
            for vid in score.measure(measure)?.voices.clone() {
                let (num, tied) = {
                    let voice = score.voice(vid)?;
                    (voice.num, tied_num(score, voice, &SlurResolver::Identity)?)
                };
                if let Some(tied) = tied {
                    if tied != num {
                        score.swap_voice_num(measure, vid, tied)?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Connect voices within the same logical part across all systems of a page.
pub fn refine_page(score: &mut Score, page: PageId) -> Result<()> {
    let systems = score.page(page)?.systems.clone();
    let first_system = systems.first().copied();
    let logical_ids: Vec<u32> = score.page(page)?.logical_parts.iter().map(|lp| lp.id).collect();

    for logical_id in logical_ids {
        for &system in &systems {
            let Some(part) = score.part_by_logical(system, logical_id) else {
                continue;
            };
            if Some(system) == first_system {
                continue;
            }
            // Check tied voices from previous system.
            let Some(measure) = score.first_measure(part) else {
                continue;
            };
            for vid in score.measure(measure)?.voices.clone() {
                let (num, tied) = {
                    let voice = score.voice(vid)?;
                    (voice.num, tied_num(score, voice, &SlurResolver::LeftExtension)?)
                };
                if let Some(tied) = tied {
                    if tied != num {
                        score.swap_voice_nums_in_part(part, num, tied)?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Connect voices within the same logical part across all pages of the score.
///
/// Ties across pages cannot easily be persisted, so the slur correspondence
/// between the last system of the previous page and the first system of the
/// current one is recomputed on the fly.
pub fn refine_score(score: &mut Score) -> Result<()> {
    let mut prev_system: Option<SystemId> = None;

    for page in score.pages().to_vec() {
        if let Some(prev) = prev_system {
            let logical_ids: Vec<u32> = score.logical_parts().iter().map(|lp| lp.id).collect();
            for logical_id in logical_ids {
                // Check tied voices from same logical part in previous page.
                if score.page(page)?.logical_part(logical_id).is_none() {
                    continue;
                }
                let Some(first_system) = score.first_system(page) else {
                    continue;
                };
                let Some(part) = score.part_by_logical(first_system, logical_id) else {
                    continue;
                };
                let Some(prev_part) = score.part_by_logical(prev, logical_id) else {
                    continue;
                };

                let links = score.connect_slurs(part, prev_part)?;
                let resolver = SlurResolver::LinkMap(&links);

                let Some(measure) = score.first_measure(part) else {
                    continue;
                };
                for vid in score.measure(measure)?.voices.clone() {
                    let (num, tied) = {
                        let voice = score.voice(vid)?;
                        (voice.num, tied_num(score, voice, &resolver)?)
                    };
                    if let Some(tied) = tied {
                        if tied != num {
                            score.swap_voice_nums_in_logical_part(page, logical_id, num, tied)?;
                        }
                    }
                }
            }
        }

        prev_system = score.last_system(page);
    }
    Ok(())
}

/// Run all four refinement passes in their mandatory order.
pub fn refine(score: &mut Score) -> Result<()> {
    for page in score.pages().to_vec() {
        for system in score.page(page)?.systems.clone() {
            for stack in score.system(system)?.stacks.clone() {
                refine_stack(score, stack)?;
            }
        }
    }
    for page in score.pages().to_vec() {
        for system in score.page(page)?.systems.clone() {
            refine_system(score, system)?;
        }
    }
    for page in score.pages().to_vec() {
        refine_page(score, page)?;
    }
    refine_score(score)
}

// ============================================================================
// Tests
// ============================================================================
