//! Building footprints and the broad-phase index over them.

mod polygon;
mod spatial_index;

pub use polygon::Polygon;
pub use spatial_index::FootprintIndex;

use crate::core::{Bounds, Frame};
use crate::transform::{Reproject, convert};

/// A building's ground-plane outline, tagged with its reference frame.
///
/// Supplied by an external provider and never mutated here.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildingFootprint {
    /// Provider-assigned identifier.
    pub id: String,
    /// Outline geometry.
    pub polygon: Polygon,
    /// Frame the outline coordinates are expressed in.
    pub frame: Frame,
}

impl BuildingFootprint {
    /// Create a footprint.
    pub fn new(id: impl Into<String>, polygon: Polygon, frame: Frame) -> Self {
        Self {
            id: id.into(),
            polygon,
            frame,
        }
    }

    /// Bounding box in the footprint's own frame.
    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.polygon.bounds()
    }

    /// Non-empty and geometrically valid.
    #[inline]
    pub fn is_usable(&self) -> bool {
        !self.polygon.is_empty() && self.polygon.is_valid()
    }
}

impl Reproject for BuildingFootprint {
    fn frame(&self) -> Frame {
        self.frame
    }

    fn reproject(&self, target: Frame) -> Self {
        if target == self.frame {
            return self.clone();
        }
        let from = self.frame;
        Self {
            id: self.id.clone(),
            polygon: self.polygon.map_points(|p| convert(p, from, target)),
            frame: target,
        }
    }
}
