//! End-to-end tests for the SIG: glyphs through the classifier seam into the
//! graph, then typed queries over the result.

use omr_rs::{
    Bounds, Classifier, Evaluation, Glyph, GlyphId, HorizontalSide, InterData, Recognizer,
    RelationKind, Score, Shape,
};

// ============================================================================
// A small heuristic fake classifier
// ============================================================================

/// Grades a handful of shapes from gross glyph geometry; everything else
/// gets a token score.
struct GeometryClassifier;

impl Classifier for GeometryClassifier {
    fn natural_evaluations(&self, glyph: &Glyph, interline: u32) -> Vec<Evaluation> {
        let w = glyph.bounds.width.max(1) as f64;
        let h = glyph.bounds.height.max(1) as f64;
        let il = interline.max(1) as f64;

        Shape::physical()
            .map(|shape| {
                let grade = match shape {
                    Shape::Stem if h / w >= 4.0 => 0.95,
                    Shape::NoteheadBlack if (h - il).abs() < il / 2.0 && w <= 2.0 * il => 0.9,
                    Shape::Slur if w >= 2.0 * h => 0.85,
                    _ => 0.05,
                };
                Evaluation::new(shape, grade)
            })
            .collect()
    }

    fn name(&self) -> &str {
        "geometry"
    }
}

fn stem_glyph(id: u64) -> Glyph {
    Glyph::new(GlyphId(id), 80, Bounds::new(30, 0, 2, 40))
}

fn head_glyph(id: u64, y: i32) -> Glyph {
    Glyph::new(GlyphId(id), 150, Bounds::new(20, y, 12, 10))
}

// ============================================================================
// Accepting evaluations into the graph
// ============================================================================

#[test]
fn test_accept_best_evaluation_into_sig() {
    let recognizer = Recognizer::with_classifier(GeometryClassifier);
    let builder = recognizer.symbols(10, 0.5);

    let mut score = Score::new();
    let page = score.add_page();
    let system = score.add_system(page).unwrap();
    let sig = score.sig(system).unwrap();

    let glyph = stem_glyph(1);
    let eval = builder.best_evaluation(&glyph).unwrap();
    assert_eq!(eval.shape, Shape::Stem);

    let stem = builder.accept(sig, &glyph, eval, InterData::Stem).unwrap();
    let inter = sig.inter(stem).unwrap();
    assert_eq!(inter.shape, Shape::Stem);
    assert_eq!(inter.glyph, Some(GlyphId(1)));
    assert_eq!(inter.grade, 0.95);
}

#[test]
fn test_noise_glyph_yields_no_interpretation() {
    let recognizer = Recognizer::with_classifier(GeometryClassifier);
    let builder = recognizer.symbols(100, 0.5);

    // 80 px at interline 100 → far below the noise floor.
    let glyph = stem_glyph(2);
    assert!(!recognizer.classifier().is_big_enough_glyph(&glyph, 100));
    assert_eq!(builder.best_evaluation(&glyph), None);

    let mut score = Score::new();
    let page = score.add_page();
    let system = score.add_system(page).unwrap();
    let sig = score.sig(system).unwrap();

    let err = builder.accept(sig, &glyph, Evaluation::new(Shape::Stem, 0.9), InterData::Stem);
    assert!(err.is_err());
}

#[test]
fn test_build_chord_over_heads() {
    let recognizer = Recognizer::with_classifier(GeometryClassifier);
    let builder = recognizer.symbols(10, 0.5);

    let mut score = Score::new();
    let page = score.add_page();
    let system = score.add_system(page).unwrap();
    let sig = score.sig(system).unwrap();

    let g1 = head_glyph(1, 0);
    let g2 = head_glyph(2, 20);
    let h1 = builder
        .accept(sig, &g1, builder.best_evaluation(&g1).unwrap(), InterData::Head { pitch: 0 })
        .unwrap();
    let h2 = builder
        .accept(sig, &g2, builder.best_evaluation(&g2).unwrap(), InterData::Head { pitch: 4 })
        .unwrap();

    let chord = builder.build_chord(sig, &[h1, h2]).unwrap();
    let inter = sig.inter(chord).unwrap();
    assert_eq!(inter.shape, Shape::Chord);
    assert_eq!(inter.bounds, Bounds::new(20, 0, 12, 30));
    assert_eq!(inter.data.chord_notes(), Some(&[h1, h2][..]));
}

// ============================================================================
// Typed relation lookups
// ============================================================================

#[test]
fn test_stem_head_lookup_by_side_and_pitch() {
    let recognizer = Recognizer::with_classifier(GeometryClassifier);
    let builder = recognizer.symbols(10, 0.5);

    let mut score = Score::new();
    let page = score.add_page();
    let system = score.add_system(page).unwrap();
    let sig = score.sig(system).unwrap();

    let gs = stem_glyph(1);
    let stem = builder
        .accept(sig, &gs, builder.best_evaluation(&gs).unwrap(), InterData::Stem)
        .unwrap();

    let g1 = head_glyph(2, 0);
    let g2 = head_glyph(3, 30);
    let left = builder
        .accept(sig, &g1, builder.best_evaluation(&g1).unwrap(), InterData::Head { pitch: -2 })
        .unwrap();
    let right = builder
        .accept(sig, &g2, builder.best_evaluation(&g2).unwrap(), InterData::Head { pitch: 3 })
        .unwrap();

    sig.add_relation(left, stem, RelationKind::HeadStem { head_side: HorizontalSide::Left })
        .unwrap();
    sig.add_relation(right, stem, RelationKind::HeadStem { head_side: HorizontalSide::Right })
        .unwrap();

    assert_eq!(sig.lookup_head(stem, HorizontalSide::Right, 3).map(|i| i.id), Some(right));
    assert_eq!(sig.lookup_head(stem, HorizontalSide::Left, 3), None);
    assert_eq!(sig.lookup_head(stem, HorizontalSide::Left, -2).map(|i| i.id), Some(left));
}

#[test]
fn test_removal_detaches_relations() {
    let mut score = Score::new();
    let page = score.add_page();
    let system = score.add_system(page).unwrap();
    let sig = score.sig(system).unwrap();

    let head = sig
        .add_inter(
            Shape::NoteheadBlack,
            0.9,
            None,
            Bounds::new(0, 0, 10, 10),
            InterData::Head { pitch: 0 },
        )
        .unwrap();
    let slur = sig
        .add_inter(Shape::Slur, 0.7, None, Bounds::new(0, 0, 40, 10), InterData::slur(true))
        .unwrap();
    sig.add_relation(slur, head, RelationKind::SlurHead { side: HorizontalSide::Right }).unwrap();

    // A competing interpretation won; the slur goes away, and so must its
    // edge.
    assert!(sig.remove_inter(slur));
    assert_eq!(sig.relation_count(), 0);
    assert_eq!(sig.relations_of(head, None), Vec::new());
    assert_eq!(sig.slur_head(slur, HorizontalSide::Right), None);
}
