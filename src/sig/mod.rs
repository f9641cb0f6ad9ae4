//! # Symbol Interpretation Graph
//!
//! One `Sig` per system: it owns the inters and relations of that system and
//! nothing else; no inter or relation is ever shared across systems.
//!
//! The graph is a set of HashMaps protected by RwLock, with an adjacency map
//! from inter to incident relations and a shape index for scans.
//!
//! ## Concurrency
//!
//! Queries take `&self` and clone results out, so independent readers may run
//! concurrently. Mutation is pipeline-driven; interleaving reads and writes on
//! the same SIG must be serialized by the caller.

pub mod inter;
pub mod relation;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashMap;
use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::model::{Bounds, GlyphId, Shape};
use crate::score::{SystemId, VoiceId};
use crate::{Error, Result};

pub use inter::{by_ordinate, Inter, InterData, InterId, InterRef};
pub use relation::{HorizontalSide, Relation, RelationId, RelationKind, RelationTag};

// ============================================================================
// Sig
// ============================================================================

/// The symbol interpretation graph of one system.
pub struct Sig {
    system: SystemId,
    inner: Arc<SigInner>,
}

struct SigInner {
    inters: RwLock<HashMap<InterId, Inter>>,
    relations: RwLock<HashMap<RelationId, Relation>>,
    /// inter → incident relation IDs, in insertion order.
    adjacency: RwLock<HashMap<InterId, SmallVec<[RelationId; 4]>>>,
    /// shape → inter IDs, in insertion order.
    shape_index: RwLock<HashMap<Shape, Vec<InterId>>>,
    next_inter_id: AtomicU64,
    next_rel_id: AtomicU64,
}

impl Sig {
    pub fn new(system: SystemId) -> Self {
        Self {
            system,
            inner: Arc::new(SigInner {
                inters: RwLock::new(HashMap::new()),
                relations: RwLock::new(HashMap::new()),
                adjacency: RwLock::new(HashMap::new()),
                shape_index: RwLock::new(HashMap::new()),
                next_inter_id: AtomicU64::new(1),
                next_rel_id: AtomicU64::new(1),
            }),
        }
    }

    /// The system this SIG belongs to.
    pub fn system(&self) -> SystemId {
        self.system
    }

    /// Cross-system address of an inter of this SIG.
    pub fn inter_ref(&self, inter: InterId) -> InterRef {
        InterRef { system: self.system, inter }
    }

    // ========================================================================
    // Inter CRUD
    // ========================================================================

    /// Accept an interpretation into the graph.
    pub fn add_inter(
        &self,
        shape: Shape,
        grade: f64,
        glyph: Option<GlyphId>,
        bounds: Bounds,
        data: InterData,
    ) -> Result<InterId> {
        if !data.fits_shape(shape) {
            return Err(Error::InvariantViolation(format!(
                "Payload {data:?} does not fit shape {shape}"
            )));
        }

        let id = InterId(self.inner.next_inter_id.fetch_add(1, Ordering::Relaxed));
        let inter = Inter { id, shape, grade, glyph, bounds, voice: None, data };

        self.inner.shape_index.write().entry(shape).or_default().push(id);
        self.inner.inters.write().insert(id, inter);
        self.inner.adjacency.write().insert(id, SmallVec::new());

        Ok(id)
    }

    pub fn inter(&self, id: InterId) -> Option<Inter> {
        self.inner.inters.read().get(&id).cloned()
    }

    /// Remove an inter and all its incident relations, so no edge is ever
    /// left dangling.
    pub fn remove_inter(&self, id: InterId) -> bool {
        let incident = self.inner.adjacency.write().remove(&id).unwrap_or_default();
        {
            let mut relations = self.inner.relations.write();
            let mut adjacency = self.inner.adjacency.write();
            for rid in incident {
                if let Some(rel) = relations.remove(&rid) {
                    // Detach from the opposite endpoint as well.
                    if let Some(other) = rel.other_end(id) {
                        if let Some(rels) = adjacency.get_mut(&other) {
                            rels.retain(|r| *r != rid);
                        }
                    }
                }
            }
        }

        let removed = self.inner.inters.write().remove(&id);
        if let Some(inter) = &removed {
            let mut idx = self.inner.shape_index.write();
            if let Some(ids) = idx.get_mut(&inter.shape) {
                ids.retain(|iid| *iid != id);
            }
        }
        removed.is_some()
    }

    /// Update the confidence grade of an inter.
    pub fn set_grade(&self, id: InterId, grade: f64) -> Result<()> {
        let mut inters = self.inner.inters.write();
        let inter = inters.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Inter {id}")))?;
        inter.grade = grade;
        Ok(())
    }

    /// Update the voice linkage of an inter.
    pub fn set_voice(&self, id: InterId, voice: Option<VoiceId>) -> Result<()> {
        let mut inters = self.inner.inters.write();
        let inter = inters.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Inter {id}")))?;
        inter.voice = voice;
        Ok(())
    }

    /// Wire one side of a slur's cross-system extension.
    pub fn set_slur_extension(
        &self,
        id: InterId,
        side: HorizontalSide,
        extension: Option<InterRef>,
    ) -> Result<()> {
        let mut inters = self.inner.inters.write();
        let inter = inters.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Inter {id}")))?;
        match &mut inter.data {
            InterData::Slur { left_extension, right_extension, .. } => {
                match side {
                    HorizontalSide::Left => *left_extension = extension,
                    HorizontalSide::Right => *right_extension = extension,
                }
                Ok(())
            }
            _ => Err(Error::InvariantViolation(format!("Inter {id} is not a slur"))),
        }
    }

    // ========================================================================
    // Relation CRUD
    // ========================================================================

    /// Create a typed edge. Both endpoints must already belong to this SIG and
    /// their shapes must match the kind's role table.
    pub fn add_relation(&self, src: InterId, dst: InterId, kind: RelationKind) -> Result<RelationId> {
        let (src_shape, dst_shape) = {
            let inters = self.inner.inters.read();
            let s = inters.get(&src).ok_or_else(|| Error::NotFound(format!("Source inter {src}")))?;
            let d = inters.get(&dst).ok_or_else(|| Error::NotFound(format!("Target inter {dst}")))?;
            (s.shape, d.shape)
        };

        if !kind.roles_match(src_shape, dst_shape) {
            return Err(Error::RoleMismatch { kind: kind.tag(), src: src_shape, dst: dst_shape });
        }

        let id = RelationId(self.inner.next_rel_id.fetch_add(1, Ordering::Relaxed));
        self.inner.relations.write().insert(id, Relation { id, src, dst, kind });

        let mut adjacency = self.inner.adjacency.write();
        adjacency.entry(src).or_default().push(id);
        if src != dst {
            adjacency.entry(dst).or_default().push(id);
        }

        Ok(id)
    }

    pub fn relation(&self, id: RelationId) -> Option<Relation> {
        self.inner.relations.read().get(&id).copied()
    }

    pub fn remove_relation(&self, id: RelationId) -> bool {
        let removed = self.inner.relations.write().remove(&id);
        if let Some(rel) = &removed {
            let mut adjacency = self.inner.adjacency.write();
            if let Some(rels) = adjacency.get_mut(&rel.src) {
                rels.retain(|rid| *rid != id);
            }
            if rel.src != rel.dst {
                if let Some(rels) = adjacency.get_mut(&rel.dst) {
                    rels.retain(|rid| *rid != id);
                }
            }
        }
        removed.is_some()
    }

    // ========================================================================
    // Graph queries (read-only)
    // ========================================================================

    /// All relations incident to `inter`, optionally restricted to one kind.
    ///
    /// Returns an empty vector if the inter has no edges (or is unknown).
    /// The order is the relation insertion order, so it is deterministic.
    pub fn relations_of(&self, inter: InterId, tag: Option<RelationTag>) -> Vec<Relation> {
        let adjacency = self.inner.adjacency.read();
        let relations = self.inner.relations.read();

        let Some(rel_ids) = adjacency.get(&inter) else {
            return Vec::new();
        };

        rel_ids
            .iter()
            .filter_map(|rid| relations.get(rid))
            .filter(|rel| tag.is_none_or(|t| rel.kind.tag() == t))
            .copied()
            .collect()
    }

    /// The endpoint of `relation` opposite to `inter`.
    ///
    /// It is an invariant violation to pass an inter that is not an endpoint
    /// of the relation.
    pub fn opposite(&self, inter: InterId, relation: &Relation) -> Result<Inter> {
        let other = relation.other_end(inter).ok_or_else(|| {
            Error::InvariantViolation(format!(
                "Inter {inter} is not an endpoint of relation {}",
                relation.id
            ))
        })?;
        self.inter(other).ok_or_else(|| Error::NotFound(format!("Inter {other}")))
    }

    /// Source endpoint of a relation.
    pub fn source(&self, relation: &Relation) -> Result<Inter> {
        self.inter(relation.src).ok_or_else(|| Error::NotFound(format!("Inter {}", relation.src)))
    }

    /// Target endpoint of a relation.
    pub fn target(&self, relation: &Relation) -> Result<Inter> {
        self.inter(relation.dst).ok_or_else(|| Error::NotFound(format!("Inter {}", relation.dst)))
    }

    // ========================================================================
    // Scans
    // ========================================================================

    pub fn inter_count(&self) -> usize {
        self.inner.inters.read().len()
    }

    pub fn relation_count(&self) -> usize {
        self.inner.relations.read().len()
    }

    pub fn all_inters(&self) -> Vec<Inter> {
        self.inner.inters.read().values().cloned().collect()
    }

    /// Inters of the given shape, in insertion order.
    pub fn inters_by_shape(&self, shape: Shape) -> Vec<Inter> {
        let idx = self.inner.shape_index.read();
        let inters = self.inner.inters.read();

        let ids = idx.get(&shape).cloned().unwrap_or_default();
        ids.iter().filter_map(|id| inters.get(id).cloned()).collect()
    }

    /// Distinct shapes present in this SIG, in ordinal order.
    pub fn shapes(&self) -> Vec<Shape> {
        let idx = self.inner.shape_index.read();
        let mut shapes: Vec<Shape> =
            idx.iter().filter(|(_, ids)| !ids.is_empty()).map(|(s, _)| *s).collect();
        shapes.sort();
        shapes
    }

    // ========================================================================
    // Domain lookups
    // ========================================================================

    /// Head connected to `stem` with the given head side and pitch.
    /// Beware: side is defined with respect to the head, not the stem.
    pub fn lookup_head(&self, stem: InterId, side: HorizontalSide, pitch: i32) -> Option<Inter> {
        for rel in self.relations_of(stem, Some(RelationTag::HeadStem)) {
            let RelationKind::HeadStem { head_side } = rel.kind else {
                continue;
            };
            if head_side != side {
                continue;
            }
            let head = self.inter(rel.src)?;
            if head.data.head_pitch() == Some(pitch) {
                return Some(head);
            }
        }
        None
    }

    /// Head attached at the given end of `slur`, if any.
    pub fn slur_head(&self, slur: InterId, side: HorizontalSide) -> Option<Inter> {
        for rel in self.relations_of(slur, Some(RelationTag::SlurHead)) {
            let RelationKind::SlurHead { side: rel_side } = rel.kind else {
                continue;
            };
            if rel_side == side {
                return self.inter(rel.dst);
            }
        }
        None
    }
}

// ============================================================================
// Tests
// ============================================================================
