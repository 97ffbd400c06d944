//! Footprints held in memory.

use facade_geo::{BuildingFootprint, Frame, GeoPoint, Reproject};

use super::{FootprintProvider, is_within};
use crate::error::Result;

/// A fixed list of footprints, filtered by distance on every query.
#[derive(Clone, Debug, Default)]
pub struct StaticFootprints {
    footprints: Vec<BuildingFootprint>,
}

impl StaticFootprints {
    /// Footprints in any frame; they are stored geographic.
    pub fn new(footprints: Vec<BuildingFootprint>) -> Self {
        Self {
            footprints: footprints
                .into_iter()
                .map(|f| f.reproject(Frame::Geographic))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }
}

impl FootprintProvider for StaticFootprints {
    fn footprints_near(&self, center: GeoPoint, radius_m: f64) -> Result<Vec<BuildingFootprint>> {
        Ok(self
            .footprints
            .iter()
            .filter(|f| is_within(f, center, radius_m))
            .cloned()
            .collect())
    }
}
