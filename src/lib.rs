//! # omr-rs — Optical Music Recognition Core
//!
//! The recognition core of an OMR system: classifier outputs become shape
//! hypotheses, hypotheses and their structural relations form a per-system
//! graph, and recognized chords are reconciled into musically consistent
//! voices across the whole score.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: [`classifier::Classifier`] is the contract between the
//!    core and any shape classifier; fakes drop in for tests
//! 2. **Typed graph**: SIG relations are tagged variants with role
//!    constraints checked at construction, not downcasts at query time
//! 3. **Arena hierarchy**: score entities live in ID-keyed arenas; every
//!    back-reference is an ID lookup, never shared ownership
//! 4. **Explicit context**: [`Recognizer`] owns the classifier, so there is
//!    no global singleton state
//!
//! ## Quick Start
//!
//! ```rust
//! use omr_rs::{rhythm, Score};
//!
//! # fn example() -> omr_rs::Result<()> {
//! let mut score = Score::new();
//! let page = score.add_page();
//! let system = score.add_system(page)?;
//!
//! // ... the pipeline fills the system's SIG and the hierarchy ...
//!
//! // Harmonize voice numbers across all scopes.
//! rhythm::refine(&mut score)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Scope
//!
//! | Concern | Here? |
//! |---------|-------|
//! | SIG graph model & queries | yes |
//! | Voice reconciliation | yes |
//! | Classifier contract (consumed) | yes |
//! | Pixel segmentation, classifier training | no — external |
//! | GUI, persistence, packaging | no — external |

// ============================================================================
// Modules
// ============================================================================

pub mod classifier;
pub mod model;
pub mod rhythm;
pub mod score;
pub mod sig;
pub mod symbols;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{Bounds, Glyph, GlyphId, Shape};

// ============================================================================
// Re-exports: Classifier boundary
// ============================================================================

pub use classifier::{Classifier, Condition, Evaluation, NO_CONDITIONS, SHAPE_COUNT};

// ============================================================================
// Re-exports: SIG
// ============================================================================

pub use sig::{
    HorizontalSide, Inter, InterData, InterId, InterRef, Relation, RelationId, RelationKind,
    RelationTag, Sig,
};

// ============================================================================
// Re-exports: Score hierarchy
// ============================================================================

pub use score::{
    LogicalPart, Measure, MeasureId, MeasureStack, Page, PageId, Part, PartId, Score, Slot,
    SlotId, SlotVoice, StackId, System, SystemId, Voice, VoiceId, VoiceStatus,
};

// ============================================================================
// Top-level Recognizer handle
// ============================================================================

use symbols::SymbolsBuilder;

/// The primary entry point. A `Recognizer` wraps a classifier and hands out
/// scale-bound symbol builders.
pub struct Recognizer<C: Classifier> {
    classifier: C,
}

impl<C: Classifier> Recognizer<C> {
    /// Create a Recognizer around the given classifier.
    pub fn with_classifier(classifier: C) -> Self {
        Self { classifier }
    }

    /// Access the underlying classifier.
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// A symbol builder bound to one scale context.
    pub fn symbols(&self, interline: u32, min_grade: f64) -> SymbolsBuilder<'_, C> {
        SymbolsBuilder::new(self, interline, min_grade)
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A structural precondition was broken; continuing would mask corruption.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A relation kind was offered endpoints whose shapes it cannot connect.
    #[error("Role mismatch: {kind:?} cannot connect {src} -> {dst}")]
    RoleMismatch { kind: sig::RelationTag, src: Shape, dst: Shape },

    /// An ID did not resolve in its owning arena or graph.
    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
