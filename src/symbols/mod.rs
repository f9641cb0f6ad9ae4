//! # Symbols — accepting classifier output into the graph
//!
//! The bridge across the classifier seam: glyphs go in, inters come out.
//! The builder never trains or second-guesses the classifier; it gates on the
//! noise threshold, forwards the evaluation request, and installs accepted
//! evaluations as inters backed by their glyph.

use tracing::debug;

use crate::classifier::{Classifier, Condition, Evaluation};
use crate::model::{Bounds, Glyph, Shape};
use crate::sig::{InterData, InterId, Sig};
use crate::{Error, Recognizer, Result};

/// Builds inters from classifier evaluations, for one scale context.
pub struct SymbolsBuilder<'a, C: Classifier> {
    recognizer: &'a Recognizer<C>,
    interline: u32,
    min_grade: f64,
}

impl<'a, C: Classifier> SymbolsBuilder<'a, C> {
    pub fn new(recognizer: &'a Recognizer<C>, interline: u32, min_grade: f64) -> Self {
        Self { recognizer, interline, min_grade }
    }

    /// Candidate evaluations for a glyph, noise-gated.
    ///
    /// An empty result means "no acceptable interpretation", not an error.
    pub fn evaluate_glyph(
        &self,
        glyph: &Glyph,
        count: usize,
        conditions: &[Condition],
    ) -> Vec<Evaluation> {
        let classifier = self.recognizer.classifier();
        if !classifier.is_big_enough_glyph(glyph, self.interline) {
            return Vec::new();
        }
        classifier.evaluate(glyph, self.interline, count, self.min_grade, conditions)
    }

    /// Single best acceptable evaluation, with both conditions applied.
    pub fn best_evaluation(&self, glyph: &Glyph) -> Option<Evaluation> {
        self.evaluate_glyph(glyph, 1, &[Condition::Allowed, Condition::Checked]).into_iter().next()
    }

    /// Accept an evaluation into `sig` as an inter backed by `glyph`.
    pub fn accept(
        &self,
        sig: &Sig,
        glyph: &Glyph,
        eval: Evaluation,
        data: InterData,
    ) -> Result<InterId> {
        if !self.recognizer.classifier().is_big_enough_glyph(glyph, self.interline) {
            return Err(Error::InvariantViolation(format!("Glyph {} is noise", glyph.id)));
        }
        let id = sig.add_inter(eval.shape, eval.grade, Some(glyph.id), glyph.bounds, data)?;
        debug!(inter = %id, shape = %eval.shape, grade = eval.grade, "accepted interpretation");
        Ok(id)
    }

    /// Build a derived chord inter over existing head inters.
    ///
    /// The chord's bounds are the union of its notes' bounds and its grade the
    /// minimum of theirs. Note order is preserved.
    pub fn build_chord(&self, sig: &Sig, notes: &[InterId]) -> Result<InterId> {
        let mut bounds: Option<Bounds> = None;
        let mut grade = 1.0f64;

        for &note in notes {
            let head = sig.inter(note).ok_or_else(|| Error::NotFound(format!("Inter {note}")))?;
            if !head.is_head() {
                return Err(Error::InvariantViolation(format!("Inter {note} is not a head")));
            }
            grade = grade.min(head.grade);
            bounds = Some(match bounds {
                None => head.bounds,
                Some(b) => b.union(&head.bounds),
            });
        }

        let bounds = bounds
            .ok_or_else(|| Error::InvariantViolation("A chord needs at least one note".into()))?;

        sig.add_inter(
            Shape::Chord,
            grade,
            None,
            bounds,
            InterData::Chord { notes: notes.iter().copied().collect() },
        )
    }
}
