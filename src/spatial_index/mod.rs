//! Bounding-box index over stored features.
//!
//! The tree itself knows nothing about features: it stores boxes in an
//! arena. This wrapper keeps the two lookup tables that tie a feature id to
//! its tree entry and back, so a feature can be moved or removed by id.

pub mod bbox;
mod rtree;

pub use bbox::BBox;

use crate::error::SpatialIndexError;
use crate::geometry::{FeatureId, Geometry};
use rtree::{NodeId, RTree, DEFAULT_MAX_ENTRIES};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    tree: RTree,
    id_to_node: HashMap<FeatureId, NodeId>,
    node_to_id: HashMap<NodeId, FeatureId>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    /// Index with a custom node capacity (at least 4)
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            tree: RTree::new(max_entries),
            id_to_node: HashMap::new(),
            node_to_id: HashMap::new(),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.tree.max_entries()
    }

    pub fn min_entries(&self) -> usize {
        self.tree.min_entries()
    }

    pub fn len(&self) -> usize {
        self.id_to_node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_node.is_empty()
    }

    pub fn contains(&self, id: &FeatureId) -> bool {
        self.id_to_node.contains_key(id)
    }

    pub fn insert(&mut self, id: &FeatureId, geometry: &Geometry) -> Result<(), SpatialIndexError> {
        if self.contains(id) {
            return Err(SpatialIndexError::AlreadyIndexed(id.clone()));
        }
        let bbox = BBox::from_geometry(geometry)?;
        let node = self.tree.insert(bbox);
        self.link(id.clone(), node);
        Ok(())
    }

    /// Bulk insert. Every box is computed and every id checked before the
    /// tree is touched, so a failure leaves the index unchanged.
    pub fn load<'a, I>(&mut self, features: I) -> Result<(), SpatialIndexError>
    where
        I: IntoIterator<Item = (&'a FeatureId, &'a Geometry)>,
    {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        let mut boxes = Vec::new();

        for (id, geometry) in features {
            if self.contains(id) || !seen.insert(id) {
                return Err(SpatialIndexError::DuplicateId(id.clone()));
            }
            boxes.push(BBox::from_geometry(geometry)?);
            ids.push(id.clone());
        }

        let nodes = self.tree.load(&boxes);
        for (id, node) in ids.into_iter().zip(nodes) {
            self.link(id, node);
        }
        Ok(())
    }

    pub fn update(&mut self, id: &FeatureId, geometry: &Geometry) -> Result<(), SpatialIndexError> {
        let bbox = BBox::from_geometry(geometry)?;
        self.remove(id)?;
        let node = self.tree.insert(bbox);
        self.link(id.clone(), node);
        Ok(())
    }

    pub fn remove(&mut self, id: &FeatureId) -> Result<(), SpatialIndexError> {
        let node = *self
            .id_to_node
            .get(id)
            .ok_or_else(|| SpatialIndexError::NotIndexed(id.clone()))?;
        if !self.tree.remove(node) {
            return Err(SpatialIndexError::NotIndexed(id.clone()));
        }
        self.id_to_node.remove(id);
        self.node_to_id.remove(&node);
        Ok(())
    }

    /// Ids of every feature whose box intersects the box of `geometry`
    pub fn search(&self, geometry: &Geometry) -> Result<Vec<FeatureId>, SpatialIndexError> {
        let bbox = BBox::from_geometry(geometry)?;
        Ok(self.search_bbox(&bbox))
    }

    pub fn search_bbox(&self, bbox: &BBox) -> Vec<FeatureId> {
        self.tree
            .search(bbox)
            .into_iter()
            .filter_map(|node| self.node_to_id.get(&node).cloned())
            .collect()
    }

    pub fn collides(&self, geometry: &Geometry) -> Result<bool, SpatialIndexError> {
        let bbox = BBox::from_geometry(geometry)?;
        Ok(self.tree.collides(&bbox))
    }

    pub fn clear(&mut self) {
        self.tree.clear();
        self.id_to_node.clear();
        self.node_to_id.clear();
    }

    fn link(&mut self, id: FeatureId, node: NodeId) {
        self.node_to_id.insert(node, id.clone());
        self.id_to_node.insert(id, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_of_stale_link_keeps_lookup_tables() {
        let mut index = SpatialIndex::new();
        let kept = FeatureId::from("kept");
        let gone = FeatureId::from("gone");
        index.insert(&kept, &Geometry::Point([0.0, 0.0])).unwrap();
        index.insert(&gone, &Geometry::Point([1.0, 1.0])).unwrap();
        let node = index.id_to_node[&gone];
        index.remove(&gone).unwrap();

        // points at an entry the tree has already released
        let stale = FeatureId::from("stale");
        index.link(stale.clone(), node);

        assert_eq!(index.remove(&stale), Err(SpatialIndexError::NotIndexed(stale.clone())));
        assert!(index.contains(&stale));
        assert_eq!(index.search_bbox(&BBox::new(-1.0, -1.0, 2.0, 2.0)), vec![kept]);
    }
}
