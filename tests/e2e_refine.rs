//! End-to-end tests for voice reconciliation across all four scopes.
//!
//! Each fixture builds the hierarchy and the per-system SIG content by hand,
//! the way the surrounding pipeline would, then runs refinement passes and
//! checks the resulting voice numbers.

use omr_rs::rhythm::{self, SlurResolver};
use omr_rs::{
    Bounds, HorizontalSide, InterData, InterId, MeasureId, RelationKind, Score, Shape, SlotId,
    SystemId, VoiceId, VoiceStatus,
};

// ============================================================================
// Fixture helpers
// ============================================================================

/// One voice holding a single one-note chord beginning at `slot`.
/// Returns (voice, chord inter, head inter).
fn add_note_voice(
    score: &mut Score,
    measure: MeasureId,
    slot: SlotId,
    num: u32,
    pitch: i32,
    y: i32,
) -> (VoiceId, InterId, InterId) {
    let system = score.system_of_measure(measure).unwrap();
    let (chord, head) = {
        let sig = score.sig(system).unwrap();
        let head = sig
            .add_inter(
                Shape::NoteheadBlack,
                0.9,
                None,
                Bounds::new(0, y, 10, 10),
                InterData::Head { pitch },
            )
            .unwrap();
        let chord = sig
            .add_inter(
                Shape::Chord,
                0.9,
                None,
                Bounds::new(0, y, 10, 10),
                InterData::Chord { notes: [head].into_iter().collect() },
            )
            .unwrap();
        (chord, head)
    };

    let voice = score.add_voice(measure, num).unwrap();
    score.set_first_chord(voice, chord).unwrap();
    score.set_slot_voice(voice, slot, VoiceStatus::Begin, Some(chord)).unwrap();
    score.assign_chord_to_voice(voice, chord).unwrap();
    (voice, chord, head)
}

/// A tie slur within one SIG, left end on `left_head`, right end on
/// `right_head`.
fn add_tie(score: &Score, system: SystemId, left_head: InterId, right_head: InterId) -> InterId {
    let sig = score.sig(system).unwrap();
    let slur = sig
        .add_inter(Shape::Slur, 0.8, None, Bounds::new(0, 0, 40, 8), InterData::slur(true))
        .unwrap();
    sig.add_relation(slur, left_head, RelationKind::SlurHead { side: HorizontalSide::Left })
        .unwrap();
    sig.add_relation(slur, right_head, RelationKind::SlurHead { side: HorizontalSide::Right })
        .unwrap();
    slur
}

/// A tie spanning a system break: one half-slur per system, wired together by
/// an extension link. Returns (left slur, right slur).
fn add_broken_tie(
    score: &Score,
    left_system: SystemId,
    left_head: InterId,
    right_system: SystemId,
    right_head: InterId,
) -> (InterId, InterId) {
    let left_slur = {
        let sig = score.sig(left_system).unwrap();
        let slur = sig
            .add_inter(Shape::Slur, 0.8, None, Bounds::new(50, 0, 20, 8), InterData::slur(true))
            .unwrap();
        sig.add_relation(slur, left_head, RelationKind::SlurHead { side: HorizontalSide::Left })
            .unwrap();
        slur
    };
    let right_slur = {
        let sig = score.sig(right_system).unwrap();
        let slur = sig
            .add_inter(Shape::Slur, 0.8, None, Bounds::new(0, 0, 20, 8), InterData::slur(true))
            .unwrap();
        sig.add_relation(slur, right_head, RelationKind::SlurHead { side: HorizontalSide::Right })
            .unwrap();
        slur
    };
    score
        .link_slur_extension(
            score.sig(left_system).unwrap().inter_ref(left_slur),
            score.sig(right_system).unwrap().inter_ref(right_slur),
        )
        .unwrap();
    (left_slur, right_slur)
}

fn voice_num(score: &Score, voice: VoiceId) -> u32 {
    score.voice(voice).unwrap().num
}

// ============================================================================
// Stack refinement
// ============================================================================

#[test]
fn test_stack_refinement_orders_by_vertical_position() {
    // 2 parts; part A's voices created bottom to top, so the top voice starts
    // with the higher number.
    let mut score = Score::new();
    let page = score.add_page();
    let system = score.add_system(page).unwrap();
    let part_a = score.add_part(system, 1).unwrap();
    let part_b = score.add_part(system, 2).unwrap();
    let stack = score.add_stack(system).unwrap();
    let measure_a = score.add_measure(stack, part_a).unwrap();
    let measure_b = score.add_measure(stack, part_b).unwrap();
    let slot = score.add_slot(stack).unwrap();

    let (a_bottom, _, _) = add_note_voice(&mut score, measure_a, slot, 1, 4, 50);
    let (a_top, _, _) = add_note_voice(&mut score, measure_a, slot, 2, 0, 10);
    let (b_top, _, _) = add_note_voice(&mut score, measure_b, slot, 1, 0, 110);
    let (b_bottom, _, _) = add_note_voice(&mut score, measure_b, slot, 2, 4, 150);

    rhythm::refine_stack(&mut score, stack).unwrap();

    assert_eq!(voice_num(&score, a_top), 1);
    assert_eq!(voice_num(&score, a_bottom), 2);
    assert_eq!(voice_num(&score, b_top), 1);
    assert_eq!(voice_num(&score, b_bottom), 2);
}

#[test]
fn test_stack_refinement_is_idempotent() {
    let mut score = Score::new();
    let page = score.add_page();
    let system = score.add_system(page).unwrap();
    let part = score.add_part(system, 1).unwrap();
    let stack = score.add_stack(system).unwrap();
    let measure = score.add_measure(stack, part).unwrap();
    let slot = score.add_slot(stack).unwrap();

    let (v1, _, _) = add_note_voice(&mut score, measure, slot, 7, 2, 30);
    let (v2, _, _) = add_note_voice(&mut score, measure, slot, 3, 0, 10);

    rhythm::refine_stack(&mut score, stack).unwrap();
    let first = (voice_num(&score, v1), voice_num(&score, v2));

    rhythm::refine_stack(&mut score, stack).unwrap();
    let second = (voice_num(&score, v1), voice_num(&score, v2));

    assert_eq!(first, second);
    assert_eq!(first, (2, 1));
}

#[test]
fn test_stack_refinement_numbers_are_contiguous() {
    let mut score = Score::new();
    let page = score.add_page();
    let system = score.add_system(page).unwrap();
    let part = score.add_part(system, 1).unwrap();
    let stack = score.add_stack(system).unwrap();
    let measure = score.add_measure(stack, part).unwrap();
    let slot = score.add_slot(stack).unwrap();

    for (num, y) in [(5, 80), (9, 20), (2, 50)] {
        add_note_voice(&mut score, measure, slot, num, 0, y);
    }

    rhythm::refine_stack(&mut score, stack).unwrap();

    let mut nums: Vec<u32> = score
        .measure(measure)
        .unwrap()
        .voices
        .iter()
        .map(|v| score.voice(*v).unwrap().num)
        .collect();
    // Measure order is the vertical order after refinement, so the numbers
    // come out already sorted.
    assert_eq!(nums, vec![1, 2, 3]);
    nums.sort_unstable();
    assert_eq!(nums, vec![1, 2, 3]);
}

#[test]
fn test_voice_order_without_common_slot_uses_first_begin() {
    // v1 begins at slot 0, v2 only at slot 1: no common slot, earlier start
    // wins even though v2 sits higher on the staff.
    let mut score = Score::new();
    let page = score.add_page();
    let system = score.add_system(page).unwrap();
    let part = score.add_part(system, 1).unwrap();
    let stack = score.add_stack(system).unwrap();
    let measure = score.add_measure(stack, part).unwrap();
    let slot0 = score.add_slot(stack).unwrap();
    let slot1 = score.add_slot(stack).unwrap();

    let (v1, _, _) = add_note_voice(&mut score, measure, slot0, 1, 4, 50);
    let (v2, _, _) = add_note_voice(&mut score, measure, slot1, 2, 0, 10);

    rhythm::refine_stack(&mut score, stack).unwrap();

    assert_eq!(voice_num(&score, v1), 1);
    assert_eq!(voice_num(&score, v2), 2);
}

// ============================================================================
// System refinement
// ============================================================================

/// System with two stacks, three voices each; returns the voices of both
/// measures (top to bottom creation) plus the heads of the chosen tie ends.
struct TwoStacks {
    score: Score,
    system: SystemId,
    stack1_voices: Vec<VoiceId>,
    stack2_voices: Vec<VoiceId>,
    stack1_heads: Vec<InterId>,
    stack2_heads: Vec<InterId>,
}

fn two_stack_system() -> TwoStacks {
    let mut score = Score::new();
    let page = score.add_page();
    let system = score.add_system(page).unwrap();
    let part = score.add_part(system, 1).unwrap();

    let stack1 = score.add_stack(system).unwrap();
    let stack2 = score.add_stack(system).unwrap();
    let m1 = score.add_measure(stack1, part).unwrap();
    let m2 = score.add_measure(stack2, part).unwrap();
    let slot1 = score.add_slot(stack1).unwrap();
    let slot2 = score.add_slot(stack2).unwrap();

    let mut stack1_voices = Vec::new();
    let mut stack2_voices = Vec::new();
    let mut stack1_heads = Vec::new();
    let mut stack2_heads = Vec::new();

    // Creation numbers run bottom-up on purpose; stack refinement is expected
    // to normalize them top-down.
    for (i, y) in [10, 30, 50].into_iter().enumerate() {
        let (v, _, h) = add_note_voice(&mut score, m1, slot1, 3 - i as u32, i as i32 * 2, y);
        stack1_voices.push(v);
        stack1_heads.push(h);
        let (v, _, h) = add_note_voice(&mut score, m2, slot2, 3 - i as u32, i as i32 * 2, y);
        stack2_voices.push(v);
        stack2_heads.push(h);
    }

    rhythm::refine_stack(&mut score, stack1).unwrap();
    rhythm::refine_stack(&mut score, stack2).unwrap();

    TwoStacks { score, system, stack1_voices, stack2_voices, stack1_heads, stack2_heads }
}

#[test]
fn test_system_refinement_swaps_tied_voice() {
    let mut fx = two_stack_system();

    // Stack 1's bottom voice (number 3) ties over to stack 2's top voice
    // (number 1).
    add_tie(&fx.score, fx.system, fx.stack1_heads[2], fx.stack2_heads[0]);

    rhythm::refine_system(&mut fx.score, fx.system).unwrap();

    // The tied voice adopted 3; the previous holder of 3 got 1 in exchange.
    assert_eq!(voice_num(&fx.score, fx.stack2_voices[0]), 3);
    assert_eq!(voice_num(&fx.score, fx.stack2_voices[1]), 2);
    assert_eq!(voice_num(&fx.score, fx.stack2_voices[2]), 1);
    // Stack 1 itself is untouched.
    assert_eq!(voice_num(&fx.score, fx.stack1_voices[2]), 3);
}

#[test]
fn test_system_refinement_without_tie_changes_nothing() {
    let mut fx = two_stack_system();

    rhythm::refine_system(&mut fx.score, fx.system).unwrap();

    for (i, v) in fx.stack2_voices.iter().enumerate() {
        assert_eq!(voice_num(&fx.score, *v), i as u32 + 1);
    }
}

#[test]
fn test_system_refinement_ignores_plain_slurs() {
    let mut fx = two_stack_system();

    // A slur that is not a tie must not drag voice numbers around.
    let sig = fx.score.sig(fx.system).unwrap();
    let slur = sig
        .add_inter(Shape::Slur, 0.8, None, Bounds::new(0, 0, 40, 8), InterData::slur(false))
        .unwrap();
    sig.add_relation(slur, fx.stack1_heads[2], RelationKind::SlurHead { side: HorizontalSide::Left })
        .unwrap();
    sig.add_relation(slur, fx.stack2_heads[0], RelationKind::SlurHead { side: HorizontalSide::Right })
        .unwrap();

    rhythm::refine_system(&mut fx.score, fx.system).unwrap();

    assert_eq!(voice_num(&fx.score, fx.stack2_voices[0]), 1);
}

// ============================================================================
// Page refinement
// ============================================================================

#[test]
fn test_page_refinement_follows_slur_extension() {
    let mut score = Score::new();
    let page = score.add_page();
    score.add_page_logical_part(page, 1, "Piano").unwrap();

    let sys1 = score.add_system(page).unwrap();
    let sys2 = score.add_system(page).unwrap();
    let part1 = score.add_part(sys1, 1).unwrap();
    let part2 = score.add_part(sys2, 1).unwrap();
    let stack1 = score.add_stack(sys1).unwrap();
    let stack2 = score.add_stack(sys2).unwrap();
    let m1 = score.add_measure(stack1, part1).unwrap();
    let m2 = score.add_measure(stack2, part2).unwrap();
    let slot1 = score.add_slot(stack1).unwrap();
    let slot2 = score.add_slot(stack2).unwrap();

    // System 1: two voices; the bottom one (number 2) carries the tie.
    let (_v1_top, _, _) = add_note_voice(&mut score, m1, slot1, 1, 0, 10);
    let (v1_bottom, _, h1) = add_note_voice(&mut score, m1, slot1, 2, 4, 50);

    // System 2: two voices; the tie lands on the top one (number 1).
    let (v2_top, _, h2) = add_note_voice(&mut score, m2, slot2, 1, 4, 10);
    let (v2_bottom, _, _) = add_note_voice(&mut score, m2, slot2, 2, 6, 50);

    add_broken_tie(&score, sys1, h1, sys2, h2);

    rhythm::refine_page(&mut score, page).unwrap();

    assert_eq!(voice_num(&score, v1_bottom), 2);
    assert_eq!(voice_num(&score, v2_top), 2);
    assert_eq!(voice_num(&score, v2_bottom), 1);
}

#[test]
fn test_page_refinement_skips_absent_part() {
    let mut score = Score::new();
    let page = score.add_page();
    score.add_page_logical_part(page, 1, "Flute").unwrap();
    score.add_page_logical_part(page, 2, "Oboe").unwrap();

    let sys1 = score.add_system(page).unwrap();
    let sys2 = score.add_system(page).unwrap();
    score.add_part(sys1, 1).unwrap();
    score.add_part(sys1, 2).unwrap();
    // Logical part 2 is missing from system 2 entirely.
    score.add_part(sys2, 1).unwrap();

    // Nothing to reconcile, but nothing to fail on either.
    rhythm::refine_page(&mut score, page).unwrap();
}

// ============================================================================
// Score refinement
// ============================================================================

#[test]
fn test_score_refinement_reconnects_across_pages() {
    let mut score = Score::new();
    score.add_logical_part(1, "Violin");

    let page1 = score.add_page();
    score.add_page_logical_part(page1, 1, "Violin").unwrap();
    let page2 = score.add_page();
    score.add_page_logical_part(page2, 1, "Violin").unwrap();

    let sys1 = score.add_system(page1).unwrap();
    let sys2 = score.add_system(page2).unwrap();
    let part1 = score.add_part(sys1, 1).unwrap();
    let part2 = score.add_part(sys2, 1).unwrap();
    let stack1 = score.add_stack(sys1).unwrap();
    let stack2 = score.add_stack(sys2).unwrap();
    let m1 = score.add_measure(stack1, part1).unwrap();
    let m2 = score.add_measure(stack2, part2).unwrap();
    let slot1 = score.add_slot(stack1).unwrap();
    let slot2 = score.add_slot(stack2).unwrap();

    // End of page 1: the bottom voice (number 2) holds a tie whose slur stays
    // open to the right.
    let (_v1_top, _, _) = add_note_voice(&mut score, m1, slot1, 1, 0, 10);
    let (v1_bottom, _, h1) = add_note_voice(&mut score, m1, slot1, 2, 5, 50);
    {
        let sig = score.sig(sys1).unwrap();
        let slur = sig
            .add_inter(Shape::Slur, 0.8, None, Bounds::new(60, 40, 20, 8), InterData::slur(true))
            .unwrap();
        sig.add_relation(slur, h1, RelationKind::SlurHead { side: HorizontalSide::Left }).unwrap();
    }

    // Start of page 2: the tie lands on the top voice (number 1), same pitch.
    let (v2_top, _, h2) = add_note_voice(&mut score, m2, slot2, 1, 5, 10);
    let (v2_bottom, _, _) = add_note_voice(&mut score, m2, slot2, 2, 7, 50);
    {
        let sig = score.sig(sys2).unwrap();
        let slur = sig
            .add_inter(Shape::Slur, 0.8, None, Bounds::new(0, 0, 20, 8), InterData::slur(true))
            .unwrap();
        sig.add_relation(slur, h2, RelationKind::SlurHead { side: HorizontalSide::Right }).unwrap();
    }

    rhythm::refine_score(&mut score).unwrap();

    assert_eq!(voice_num(&score, v1_bottom), 2);
    assert_eq!(voice_num(&score, v2_top), 2);
    assert_eq!(voice_num(&score, v2_bottom), 1);
}

#[test]
fn test_score_refinement_skips_logical_part_absent_from_page() {
    let mut score = Score::new();
    score.add_logical_part(1, "Violin");
    score.add_logical_part(2, "Cello");

    let page1 = score.add_page();
    score.add_page_logical_part(page1, 1, "Violin").unwrap();
    score.add_page_logical_part(page1, 2, "Cello").unwrap();
    let page2 = score.add_page();
    // Cello drops out on page 2.
    score.add_page_logical_part(page2, 1, "Violin").unwrap();

    let sys1 = score.add_system(page1).unwrap();
    score.add_part(sys1, 1).unwrap();
    score.add_part(sys1, 2).unwrap();
    let sys2 = score.add_system(page2).unwrap();
    score.add_part(sys2, 1).unwrap();

    rhythm::refine_score(&mut score).unwrap();
}

// ============================================================================
// Full driver
// ============================================================================

#[test]
fn test_refine_runs_all_scopes_in_order() {
    // Creation-order numbers are deliberately reversed; the full driver has
    // to normalize them per stack first, then carry the tie across stacks.
    let mut fx = two_stack_system();
    add_tie(&fx.score, fx.system, fx.stack1_heads[2], fx.stack2_heads[0]);

    let page = fx.score.pages()[0];
    fx.score.add_page_logical_part(page, 1, "Solo").unwrap();

    rhythm::refine(&mut fx.score).unwrap();

    assert_eq!(voice_num(&fx.score, fx.stack2_voices[0]), 3);
    assert_eq!(voice_num(&fx.score, fx.stack2_voices[2]), 1);
}

// ============================================================================
// Tie detection plumbing
// ============================================================================

#[test]
fn test_tied_num_resolves_through_identity() {
    let fx = {
        let mut fx = two_stack_system();
        add_tie(&fx.score, fx.system, fx.stack1_heads[2], fx.stack2_heads[0]);
        fx
    };

    let voice = fx.score.voice(fx.stack2_voices[0]).unwrap();
    let tied = rhythm::voices::tied_num(&fx.score, voice, &SlurResolver::Identity).unwrap();
    assert_eq!(tied, Some(3));

    let untied = fx.score.voice(fx.stack2_voices[1]).unwrap();
    let tied = rhythm::voices::tied_num(&fx.score, untied, &SlurResolver::Identity).unwrap();
    assert_eq!(tied, None);
}
