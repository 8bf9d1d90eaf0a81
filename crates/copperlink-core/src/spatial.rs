use rstar::{RTree, RTreeObject, AABB};

use crate::geometry::{BBox, Point};
use crate::object::ObjectId;

/// An entry in the R-tree spatial index, referencing a board object.
#[derive(Debug, Clone)]
pub struct SpatialEntry {
    pub object_id: ObjectId,
    /// Bounding box of the object's copper.
    pub bbox: BBox,
}

impl RTreeObject for SpatialEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bbox.min.x, self.bbox.min.y],
            [self.bbox.max.x, self.bbox.max.y],
        )
    }
}

/// Spatial index for touch-candidate and point queries.
pub struct SpatialIndex {
    tree: RTree<SpatialEntry>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self {
            tree: RTree::new(),
        }
    }

    /// Build the index from a list of object bounding boxes.
    pub fn build(entries: Vec<SpatialEntry>) -> Self {
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Ids of all objects whose bounding box contains the point, ascending.
    pub fn query_point(&self, point: &Point) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self
            .tree
            .locate_in_envelope_intersecting(&AABB::from_point([point.x, point.y]))
            .map(|e| e.object_id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Ids of all objects whose bounding box intersects `area`, ascending.
    pub fn query_bbox(&self, area: &BBox) -> Vec<ObjectId> {
        let envelope = AABB::from_corners([area.min.x, area.min.y], [area.max.x, area.max.y]);
        let mut ids: Vec<ObjectId> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|e| e.object_id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}
