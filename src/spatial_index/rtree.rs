//! Arena-backed R-tree with R*-style splits and OMT bulk loading.
//!
//! Every node lives in `nodes` and is addressed by index. Entries (the
//! indexed boxes) are nodes too, with height 0 and no children; container
//! nodes have height >= 1 and are leaves when their children are entries.

use super::bbox::BBox;

/// Index of a node in the arena
pub(crate) type NodeId = usize;

/// Default maximum number of children per node
pub(crate) const DEFAULT_MAX_ENTRIES: usize = 9;

#[derive(Debug, Clone)]
struct Node {
    bbox: BBox,
    children: Vec<NodeId>,
    height: usize,
    leaf: bool,
}

impl Node {
    fn container(children: Vec<NodeId>) -> Self {
        Self {
            bbox: BBox::EMPTY,
            children,
            height: 1,
            leaf: true,
        }
    }

    fn entry(bbox: BBox) -> Self {
        Self {
            bbox,
            children: Vec::new(),
            height: 0,
            leaf: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    X,
    Y,
}

#[derive(Debug, Clone)]
pub(crate) struct RTree {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    root: NodeId,
    max_entries: usize,
    min_entries: usize,
}

impl Default for RTree {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl RTree {
    pub(crate) fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(4);
        let min_entries = 2.max((max_entries as f64 * 0.4).ceil() as usize);
        let mut tree = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: 0,
            max_entries,
            min_entries,
        };
        tree.root = tree.alloc(Node::container(Vec::new()));
        tree
    }

    pub(crate) fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub(crate) fn min_entries(&self) -> usize {
        self.min_entries
    }

    pub(crate) fn height(&self) -> usize {
        self.node(self.root).height
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        self.nodes[id].children.clear();
        self.free.push(id);
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = self.alloc(Node::container(Vec::new()));
    }

    /// Adds one box and returns the entry that now represents it
    pub(crate) fn insert(&mut self, bbox: BBox) -> NodeId {
        let entry = self.alloc(Node::entry(bbox));
        let level = self.height() - 1;
        self.insert_at(entry, level);
        entry
    }

    /// Adds many boxes at once. Small batches fall back to single inserts;
    /// larger ones are packed into a balanced subtree first.
    pub(crate) fn load(&mut self, bboxes: &[BBox]) -> Vec<NodeId> {
        if bboxes.is_empty() {
            return Vec::new();
        }
        if bboxes.len() < self.min_entries {
            return bboxes.iter().map(|bbox| self.insert(*bbox)).collect();
        }

        let entries: Vec<NodeId> = bboxes.iter().map(|bbox| self.alloc(Node::entry(*bbox))).collect();
        let mut items = entries.clone();
        let right = items.len() - 1;
        let mut subtree = self.build(&mut items, 0, right, 0);

        if self.node(self.root).children.is_empty() {
            let old_root = self.root;
            self.root = subtree;
            self.release(old_root);
        } else if self.height() == self.node(subtree).height {
            self.split_root(self.root, subtree);
        } else {
            if self.height() < self.node(subtree).height {
                std::mem::swap(&mut self.root, &mut subtree);
            }
            let level = self.height() - self.node(subtree).height - 1;
            self.insert_at(subtree, level);
        }

        entries
    }

    /// Detaches an entry. Returns false if it is not reachable from the root.
    pub(crate) fn remove(&mut self, entry: NodeId) -> bool {
        let bbox = self.node(entry).bbox;
        let mut path = Vec::new();
        if !self.find_path(self.root, entry, &bbox, &mut path) {
            return false;
        }
        let Some(&leaf) = path.last() else {
            return false;
        };
        self.node_mut(leaf).children.retain(|&child| child != entry);
        self.release(entry);
        self.condense(&path);
        true
    }

    /// Entries whose boxes intersect `bbox`
    pub(crate) fn search(&self, bbox: &BBox) -> Vec<NodeId> {
        let mut result = Vec::new();
        if !bbox.intersects(&self.node(self.root).bbox) {
            return result;
        }

        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            for &child_id in &node.children {
                let child = self.node(child_id);
                if !bbox.intersects(&child.bbox) {
                    continue;
                }
                if node.leaf {
                    result.push(child_id);
                } else if bbox.contains(&child.bbox) {
                    self.collect_all(child_id, &mut result);
                } else {
                    stack.push(child_id);
                }
            }
        }
        result
    }

    /// Whether any entry intersects `bbox`
    pub(crate) fn collides(&self, bbox: &BBox) -> bool {
        if !bbox.intersects(&self.node(self.root).bbox) {
            return false;
        }

        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            for &child_id in &node.children {
                let child = self.node(child_id);
                if bbox.intersects(&child.bbox) {
                    if node.leaf || bbox.contains(&child.bbox) {
                        return true;
                    }
                    stack.push(child_id);
                }
            }
        }
        false
    }

    fn collect_all(&self, id: NodeId, result: &mut Vec<NodeId>) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if node.leaf {
                result.extend_from_slice(&node.children);
            } else {
                stack.extend_from_slice(&node.children);
            }
        }
    }

    fn find_path(&self, id: NodeId, entry: NodeId, bbox: &BBox, path: &mut Vec<NodeId>) -> bool {
        let node = self.node(id);
        if node.leaf {
            if node.children.contains(&entry) {
                path.push(id);
                return true;
            }
            return false;
        }
        if !node.bbox.contains(bbox) {
            return false;
        }

        path.push(id);
        for &child in &node.children {
            if self.find_path(child, entry, bbox, path) {
                return true;
            }
        }
        path.pop();
        false
    }

    /// Drops emptied nodes along `path` and tightens the remaining boxes
    fn condense(&mut self, path: &[NodeId]) {
        for i in (0..path.len()).rev() {
            let id = path[i];
            if self.node(id).children.is_empty() {
                if i > 0 {
                    self.node_mut(path[i - 1]).children.retain(|&child| child != id);
                    self.release(id);
                } else {
                    self.clear();
                }
            } else {
                self.recalc_bbox(id);
            }
        }
    }

    fn insert_at(&mut self, item: NodeId, level: usize) {
        let bbox = self.node(item).bbox;
        let mut path = Vec::new();
        let target = self.choose_subtree(&bbox, level, &mut path);

        let node = self.node_mut(target);
        node.children.push(item);
        node.bbox.extend(&bbox);

        // split on node overflow; propagate upwards if necessary
        let mut level = level as isize;
        while level >= 0 {
            let depth = level as usize;
            if self.node(path[depth]).children.len() > self.max_entries {
                self.split(&path, depth);
                level -= 1;
            } else {
                break;
            }
        }

        // adjust bboxes along the insertion path
        while level >= 0 {
            self.node_mut(path[level as usize]).bbox.extend(&bbox);
            level -= 1;
        }
    }

    fn choose_subtree(&self, bbox: &BBox, level: usize, path: &mut Vec<NodeId>) -> NodeId {
        let mut id = self.root;
        loop {
            path.push(id);
            let node = self.node(id);
            if node.leaf || path.len() - 1 == level {
                return id;
            }

            let mut min_area = f64::INFINITY;
            let mut min_enlargement = f64::INFINITY;
            let mut target = None;

            for &child_id in &node.children {
                let child = &self.node(child_id).bbox;
                let area = child.area();
                let enlargement = bbox.enlarged_area(child) - area;

                if enlargement < min_enlargement {
                    min_enlargement = enlargement;
                    min_area = area.min(min_area);
                    target = Some(child_id);
                } else if enlargement == min_enlargement && area < min_area {
                    min_area = area;
                    target = Some(child_id);
                }
            }

            id = match target {
                Some(child) => child,
                None => node.children[0],
            };
        }
    }

    fn split(&mut self, path: &[NodeId], level: usize) {
        let id = path[level];
        let total = self.node(id).children.len();
        let min = self.min_entries;

        self.choose_split_axis(id, min, total);
        let split_index = self.choose_split_index(id, min, total);

        let node = self.node_mut(id);
        let moved = node.children.split_off(split_index);
        let mut sibling = Node::container(moved);
        sibling.height = node.height;
        sibling.leaf = node.leaf;
        let sibling = self.alloc(sibling);

        self.recalc_bbox(id);
        self.recalc_bbox(sibling);

        if level > 0 {
            self.node_mut(path[level - 1]).children.push(sibling);
        } else {
            self.split_root(id, sibling);
        }
    }

    fn split_root(&mut self, left: NodeId, right: NodeId) {
        let height = self.node(left).height + 1;
        let root = self.alloc(Node {
            bbox: BBox::EMPTY,
            children: vec![left, right],
            height,
            leaf: false,
        });
        self.root = root;
        self.recalc_bbox(root);
    }

    fn choose_split_index(&self, id: NodeId, min: usize, total: usize) -> usize {
        let mut index = None;
        let mut min_overlap = f64::INFINITY;
        let mut min_area = f64::INFINITY;

        for i in min..=(total - min) {
            let first = self.dist_bbox(id, 0, i);
            let second = self.dist_bbox(id, i, total);

            let overlap = first.intersection_area(&second);
            let area = first.area() + second.area();

            if overlap < min_overlap {
                min_overlap = overlap;
                index = Some(i);
                min_area = area.min(min_area);
            } else if overlap == min_overlap && area < min_area {
                min_area = area;
                index = Some(i);
            }
        }

        index.unwrap_or(total - min)
    }

    /// Sorts the node's children along the axis with the smaller margin sum
    fn choose_split_axis(&mut self, id: NodeId, min: usize, total: usize) {
        let x_margin = self.all_dist_margin(id, min, total, Axis::X);
        let y_margin = self.all_dist_margin(id, min, total, Axis::Y);

        // children are left sorted by Y; re-sort if X is the better axis
        if x_margin < y_margin {
            self.sort_children(id, Axis::X);
        }
    }

    fn all_dist_margin(&mut self, id: NodeId, min: usize, total: usize, axis: Axis) -> f64 {
        self.sort_children(id, axis);

        let mut left = self.dist_bbox(id, 0, min);
        let mut right = self.dist_bbox(id, total - min, total);
        let mut margin = left.margin() + right.margin();

        let children = &self.node(id).children;
        for &child in &children[min..total - min] {
            left.extend(&self.node(child).bbox);
            margin += left.margin();
        }
        for &child in children[min..total - min].iter().rev() {
            right.extend(&self.node(child).bbox);
            margin += right.margin();
        }
        margin
    }

    fn sort_children(&mut self, id: NodeId, axis: Axis) {
        let mut children = std::mem::take(&mut self.node_mut(id).children);
        self.sort_by_axis(&mut children, axis);
        self.node_mut(id).children = children;
    }

    fn sort_by_axis(&self, items: &mut [NodeId], axis: Axis) {
        items.sort_by(|a, b| {
            let (a, b) = (&self.node(*a).bbox, &self.node(*b).bbox);
            match axis {
                Axis::X => a.min_x.total_cmp(&b.min_x),
                Axis::Y => a.min_y.total_cmp(&b.min_y),
            }
        });
    }

    /// Box of the children in `start..end`
    fn dist_bbox(&self, id: NodeId, start: usize, end: usize) -> BBox {
        let mut bbox = BBox::EMPTY;
        for &child in &self.node(id).children[start..end] {
            bbox.extend(&self.node(child).bbox);
        }
        bbox
    }

    fn recalc_bbox(&mut self, id: NodeId) {
        let len = self.node(id).children.len();
        let bbox = self.dist_bbox(id, 0, len);
        self.node_mut(id).bbox = bbox;
    }

    /// Overlap-minimizing top-down packing of `items[left..=right]`
    fn build(&mut self, items: &mut [NodeId], left: usize, right: usize, height: usize) -> NodeId {
        let count = right - left + 1;
        let mut max = self.max_entries;

        if count <= max {
            // reached leaf level; return leaf
            let leaf = self.alloc(Node::container(items[left..=right].to_vec()));
            self.recalc_bbox(leaf);
            return leaf;
        }

        let mut height = height;
        if height == 0 {
            // target height of the bulk-loaded tree
            height = ((count as f64).ln() / (max as f64).ln()).ceil() as usize;
            // target number of root entries to maximize storage utilization
            max = (count as f64 / (max as f64).powi(height as i32 - 1)).ceil() as usize;
        }

        // split the items into M mostly square tiles
        let group = (count as f64 / max as f64).ceil() as usize;
        let column = group * (max as f64).sqrt().ceil() as usize;

        self.sort_by_axis(&mut items[left..=right], Axis::X);

        let mut children = Vec::new();
        let mut i = left;
        while i <= right {
            let column_end = (i + column - 1).min(right);
            self.sort_by_axis(&mut items[i..=column_end], Axis::Y);

            let mut j = i;
            while j <= column_end {
                let group_end = (j + group - 1).min(column_end);
                children.push(self.build(items, j, group_end, height - 1));
                j += group;
            }
            i += column;
        }

        let node = self.alloc(Node {
            bbox: BBox::EMPTY,
            children,
            height,
            leaf: false,
        });
        self.recalc_bbox(node);
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square(i: usize) -> BBox {
        let x = (i % 40) as f64 * 2.0;
        let y = (i / 40) as f64 * 2.0;
        BBox::new(x, y, x + 1.0, y + 1.0)
    }

    /// Walks the tree checking box containment, fill and uniform leaf depth
    fn check_invariants(tree: &RTree) {
        fn walk(tree: &RTree, id: NodeId, depth: usize, is_root: bool, leaf_depths: &mut Vec<usize>) {
            let node = tree.node(id);
            if !is_root {
                assert!(node.children.len() <= tree.max_entries);
            }
            for &child in &node.children {
                assert!(node.bbox.contains(&tree.node(child).bbox));
                if node.leaf {
                    assert_eq!(tree.node(child).height, 0);
                } else {
                    assert_eq!(tree.node(child).height + 1, node.height);
                    walk(tree, child, depth + 1, false, leaf_depths);
                }
            }
            if node.leaf {
                leaf_depths.push(depth);
            }
        }

        let mut depths = Vec::new();
        walk(tree, tree.root, 0, true, &mut depths);
        depths.dedup();
        assert!(depths.len() <= 1, "leaves at different depths: {depths:?}");
    }

    #[test]
    fn test_min_entries_derived_from_max() {
        let tree = RTree::new(9);
        assert_eq!(tree.max_entries(), 9);
        assert_eq!(tree.min_entries(), 4);

        let tiny = RTree::new(1);
        assert_eq!(tiny.max_entries(), 4);
        assert_eq!(tiny.min_entries(), 2);
    }

    #[test]
    fn test_insert_splits_and_stays_balanced() {
        let mut tree = RTree::default();
        let entries: Vec<_> = (0..200).map(|i| tree.insert(unit_square(i))).collect();

        assert!(tree.height() > 1);
        check_invariants(&tree);

        let found = tree.search(&unit_square(57));
        assert_eq!(found, vec![entries[57]]);
    }

    #[test]
    fn test_bulk_load_builds_balanced_tree() {
        let mut tree = RTree::default();
        let boxes: Vec<_> = (0..1000).map(unit_square).collect();
        let entries = tree.load(&boxes);

        assert_eq!(entries.len(), 1000);
        check_invariants(&tree);

        let everything = tree.search(&BBox::new(-1.0, -1.0, 1000.0, 1000.0));
        assert_eq!(everything.len(), 1000);
    }

    #[test]
    fn test_load_into_non_empty_tree() {
        let mut tree = RTree::default();
        for i in 0..30 {
            tree.insert(unit_square(i));
        }
        let boxes: Vec<_> = (30..130).map(unit_square).collect();
        tree.load(&boxes);

        check_invariants(&tree);
        assert_eq!(tree.search(&BBox::new(-1.0, -1.0, 1000.0, 1000.0)).len(), 130);
    }

    #[test]
    fn test_remove_condenses_tree() {
        let mut tree = RTree::default();
        let entries: Vec<_> = (0..100).map(|i| tree.insert(unit_square(i))).collect();

        for entry in &entries[..90] {
            assert!(tree.remove(*entry));
        }
        check_invariants(&tree);
        assert_eq!(tree.search(&BBox::new(-1.0, -1.0, 1000.0, 1000.0)).len(), 10);

        for entry in &entries[90..] {
            assert!(tree.remove(*entry));
        }
        assert!(!tree.collides(&BBox::new(-1.0, -1.0, 1000.0, 1000.0)));
        assert_eq!(tree.height(), 1);
    }

    #[test]
    fn test_collides_short_circuits() {
        let mut tree = RTree::default();
        tree.insert(BBox::new(0.0, 0.0, 1.0, 1.0));
        assert!(tree.collides(&BBox::new(0.5, 0.5, 2.0, 2.0)));
        assert!(!tree.collides(&BBox::new(2.0, 2.0, 3.0, 3.0)));
    }
}
