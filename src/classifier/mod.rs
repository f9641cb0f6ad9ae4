//! # Classifier Boundary
//!
//! This is THE contract between the recognition core and any shape classifier.
//! The core never trains or persists a model; it consumes evaluations.
//!
//! Implementations provide raw per-shape scores via
//! [`Classifier::natural_evaluations`]; the filtering pipeline around them
//! (conditions, grade floor, ordering, truncation) is shared and lives here,
//! so every classifier, real or fake, filters identically.

use serde::{Deserialize, Serialize};

use crate::model::{Glyph, Shape};

/// Number of shapes a classifier distinguishes.
pub const SHAPE_COUNT: usize = 1 + Shape::LAST_PHYSICAL as usize;

/// Normalized-weight floor below which a glyph is considered noise.
const MIN_WEIGHT: f64 = 0.08;

/// One (shape, grade) pair reported by a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub shape: Shape,
    /// Confidence in [0, 1].
    pub grade: f64,
}

impl Evaluation {
    pub fn new(shape: Shape, grade: f64) -> Self {
        Self { shape, grade }
    }
}

impl std::fmt::Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:.3})", self.shape, self.grade)
    }
}

/// Optional filters applied during [`Classifier::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    /// Drop shapes blacklisted by the glyph at hand.
    Allowed,
    /// Drop shapes that fail their specific plausibility checks.
    Checked,
}

/// Empty condition set.
pub const NO_CONDITIONS: &[Condition] = &[];

/// A glyph shape classifier.
///
/// Implementations supply raw scores; `evaluate` and the noise predicates are
/// provided so filtering semantics cannot drift between implementations.
pub trait Classifier {
    /// Raw evaluations for every physical shape, ordered by shape ordinal,
    /// with no filtering whatsoever.
    fn natural_evaluations(&self, glyph: &Glyph, interline: u32) -> Vec<Evaluation>;

    /// Declared name of this classifier.
    fn name(&self) -> &str;

    /// The best evaluations for `glyph`, filtered by `conditions` and
    /// `min_grade`, sorted by descending grade (shape ordinal breaks ties,
    /// so the order is deterministic), truncated to `count` entries.
    ///
    /// `count` is clamped to `1..=SHAPE_COUNT`. An empty result means
    /// "no acceptable interpretation" and is never an error.
    fn evaluate(
        &self,
        glyph: &Glyph,
        interline: u32,
        count: usize,
        min_grade: f64,
        conditions: &[Condition],
    ) -> Vec<Evaluation> {
        let count = count.clamp(1, SHAPE_COUNT);
        let mut evals: Vec<Evaluation> = self
            .natural_evaluations(glyph, interline)
            .into_iter()
            .filter(|e| e.grade >= min_grade)
            .filter(|e| {
                !conditions.contains(&Condition::Allowed) || !glyph.is_forbidden(e.shape)
            })
            .filter(|e| {
                !conditions.contains(&Condition::Checked)
                    || shape_checks_pass(e.shape, glyph, interline)
            })
            .collect();

        evals.sort_by(|a, b| {
            b.grade
                .partial_cmp(&a.grade)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.shape.cmp(&b.shape))
        });
        evals.truncate(count);
        evals
    }

    /// Noise test on a pre-normalized weight.
    fn is_big_enough(&self, normalized_weight: f64) -> bool {
        normalized_weight >= MIN_WEIGHT
    }

    /// Noise test on a glyph plus its scale context.
    fn is_big_enough_glyph(&self, glyph: &Glyph, interline: u32) -> bool {
        self.is_big_enough(glyph.normalized_weight(interline))
    }
}

/// Shape-specific plausibility checks backing [`Condition::Checked`].
///
/// Only gross geometry is verified here; anything finer is the classifier's
/// own business.
pub fn shape_checks_pass(shape: Shape, glyph: &Glyph, interline: u32) -> bool {
    let w = glyph.bounds.width.max(1) as f64;
    let h = glyph.bounds.height.max(1) as f64;
    let il = interline.max(1) as f64;

    match shape {
        // A stem is a tall thin segment, at least one interline high.
        Shape::Stem => h / w >= 4.0 && h >= il,
        // Heads occupy roughly one interline vertically.
        s if s.is_head() => h >= 0.5 * il && h <= 2.0 * il,
        // A dot is small and compact.
        Shape::AugmentationDot => w <= il && h <= il,
        // Beams are wider than tall.
        Shape::Beam | Shape::BeamHook => w >= h,
        _ => true,
    }
}
