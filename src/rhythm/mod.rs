//! # Rhythm — voice ordering and reconciliation
//!
//! Connects voices and harmonizes their numbers within a stack, a system, a
//! page and the whole score, using tie slurs as the continuity signal.

pub mod voices;

pub use voices::{
    by_id, by_ordinate, refine, refine_page, refine_score, refine_stack, refine_system,
    SlurResolver,
};
