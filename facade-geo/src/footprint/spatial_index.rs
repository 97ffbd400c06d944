//! Spatial index over footprint bounding boxes.
//!
//! Broad phase for ray/footprint intersection: given the bounding box of a
//! ray, return the footprints whose bounding boxes overlap it. Backed by an
//! R-tree, so it works the same in degrees and in meters.

use rstar::{AABB, RTree, RTreeObject};

use super::BuildingFootprint;
use crate::core::Bounds;

/// A footprint envelope for R-tree storage.
#[derive(Clone, Debug)]
struct IndexedFootprint {
    bounds: Bounds,
    /// Position of the footprint in the input collection.
    index: usize,
}

impl RTreeObject for IndexedFootprint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        aabb(&self.bounds)
    }
}

fn aabb(bounds: &Bounds) -> AABB<[f64; 2]> {
    AABB::from_corners([bounds.min.x, bounds.min.y], [bounds.max.x, bounds.max.y])
}

/// Broad-phase index over footprint bounding boxes.
#[derive(Clone, Debug)]
pub struct FootprintIndex {
    tree: RTree<IndexedFootprint>,
    len: usize,
}

impl FootprintIndex {
    /// Bulk-load the index. Footprints without a finite bounding box are
    /// never returned by queries.
    pub fn build(footprints: &[BuildingFootprint]) -> Self {
        let indexed: Vec<IndexedFootprint> = footprints
            .iter()
            .enumerate()
            .map(|(index, f)| IndexedFootprint {
                bounds: f.bounds(),
                index,
            })
            .filter(|f| !f.bounds.is_empty() && f.bounds.min.is_finite() && f.bounds.max.is_finite())
            .collect();

        Self {
            tree: RTree::bulk_load(indexed),
            len: footprints.len(),
        }
    }

    /// Indices of footprints whose bounding boxes overlap `query`, sorted
    /// ascending (input order).
    pub fn query(&self, query: &Bounds) -> Vec<usize> {
        if query.is_empty() {
            return Vec::new();
        }

        let mut result: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&aabb(query))
            .map(|indexed| indexed.index)
            .collect();
        // Tree order is arbitrary
        result.sort_unstable();
        result
    }

    /// Number of footprints the index was built from.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of footprints actually stored in the tree.
    #[inline]
    pub fn indexed(&self) -> usize {
        self.tree.size()
    }
}
