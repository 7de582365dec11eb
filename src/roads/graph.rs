//! Planar road graph: junction nodes joined by polyline edges.

use super::tier::RoadTier;
use crate::model::geometry::polyline_length;
use crate::model::Point;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeId(pub usize);

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadNode {
    pub id: NodeId,
    pub position: Point,
    pub edges: Vec<EdgeId>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadEdge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub tier: RoadTier,
    /// Carriageway width in meters.
    pub width: f64,
    /// Geometry from `from` to `to`, endpoints included.
    pub points: Vec<Point>,
    pub length: f64,
    /// Added during connectivity repair rather than traced.
    pub connector: bool,
}

impl RoadEdge {
    pub fn other(&self, node: NodeId) -> NodeId {
        if self.from == node {
            self.to
        } else {
            self.from
        }
    }
}

/// Road network handed to rendering and export.
///
/// Ids are dense indices into `nodes()` / `edges()`.
///
/// # Examples
///
/// ```
/// use u_siteplan::model::Point;
/// use u_siteplan::roads::{RoadGraph, RoadTier};
///
/// let mut graph = RoadGraph::new();
/// let a = graph.find_or_create_node(Point::new(0.0, 0.0), 1.0);
/// let b = graph.find_or_create_node(Point::new(50.0, 0.0), 1.0);
/// graph.add_edge(a, b, RoadTier::Secondary, vec![Point::new(0.0, 0.0), Point::new(50.0, 0.0)], false);
/// assert_eq!(graph.total_length(), 50.0);
/// assert!(graph.is_connected());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadGraph {
    nodes: Vec<RoadNode>,
    edges: Vec<RoadEdge>,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[RoadNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[RoadEdge] {
        &self.edges
    }

    pub fn node(&self, id: NodeId) -> Option<&RoadNode> {
        self.nodes.get(id.0)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&RoadEdge> {
        self.edges.get(id.0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Nearest node within `snap` of `position`, or a new node there.
    pub fn find_or_create_node(&mut self, position: Point, snap: f64) -> NodeId {
        let nearest = self
            .nodes
            .iter()
            .map(|n| (n.id, n.position.distance(position)))
            .filter(|&(_, d)| d <= snap)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((id, _)) = nearest {
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(RoadNode {
            id,
            position,
            edges: Vec::new(),
        });
        id
    }

    /// Adds an edge whose geometry is pinned to the node positions.
    ///
    /// Returns `None` for unknown nodes.
    pub fn add_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        tier: RoadTier,
        mut points: Vec<Point>,
        connector: bool,
    ) -> Option<EdgeId> {
        let start = self.node(from)?.position;
        let end = self.node(to)?.position;
        match points.len() {
            0 | 1 => points = vec![start, end],
            _ => {
                points[0] = start;
                if let Some(last) = points.last_mut() {
                    *last = end;
                }
            }
        }
        let id = EdgeId(self.edges.len());
        let length = polyline_length(&points);
        self.edges.push(RoadEdge {
            id,
            from,
            to,
            tier,
            width: tier.width(),
            points,
            length,
            connector,
        });
        self.nodes[from.0].edges.push(id);
        if to != from {
            self.nodes[to.0].edges.push(id);
        }
        Some(id)
    }

    pub fn degree(&self, id: NodeId) -> usize {
        self.node(id).map_or(0, |n| n.edges.len())
    }

    /// Nodes where three or more edges meet.
    pub fn intersections(&self) -> Vec<NodeId> {
        self.nodes.iter().filter(|n| n.edges.len() >= 3).map(|n| n.id).collect()
    }

    pub fn total_length(&self) -> f64 {
        self.edges.iter().map(|e| e.length).sum()
    }

    pub fn length_by_tier(&self) -> BTreeMap<RoadTier, f64> {
        let mut out = BTreeMap::new();
        for e in &self.edges {
            *out.entry(e.tier).or_insert(0.0) += e.length;
        }
        out
    }

    /// Connected components as node lists, largest total edge length first.
    pub fn components(&self) -> Vec<Vec<NodeId>> {
        let mut uf = UnionFind::new(self.nodes.len());
        for e in &self.edges {
            uf.union(e.from.0, e.to.0);
        }
        let mut groups: BTreeMap<usize, (Vec<NodeId>, f64)> = BTreeMap::new();
        for n in &self.nodes {
            groups.entry(uf.find(n.id.0)).or_default().0.push(n.id);
        }
        for e in &self.edges {
            if let Some(g) = groups.get_mut(&uf.find(e.from.0)) {
                g.1 += e.length;
            }
        }
        let mut out: Vec<(Vec<NodeId>, f64)> = groups.into_values().collect();
        out.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0[0].cmp(&b.0[0])));
        out.into_iter().map(|(nodes, _)| nodes).collect()
    }

    pub fn component_count(&self) -> usize {
        self.components().len()
    }

    /// True for graphs with at most one component.
    pub fn is_connected(&self) -> bool {
        self.component_count() <= 1
    }

    /// Copy keeping only edges accepted by `keep`; nodes left without edges
    /// are dropped and ids renumbered.
    pub fn retain_edges(&self, keep: impl Fn(&RoadEdge) -> bool) -> RoadGraph {
        let mut out = RoadGraph::new();
        let mut remap: BTreeMap<NodeId, NodeId> = BTreeMap::new();
        let mut map_node = |out: &mut RoadGraph, id: NodeId| {
            *remap.entry(id).or_insert_with(|| {
                let new_id = NodeId(out.nodes.len());
                out.nodes.push(RoadNode {
                    id: new_id,
                    position: self.nodes[id.0].position,
                    edges: Vec::new(),
                });
                new_id
            })
        };
        for e in self.edges.iter().filter(|e| keep(e)) {
            let from = map_node(&mut out, e.from);
            let to = map_node(&mut out, e.to);
            out.add_edge(from, to, e.tier, e.points.clone(), e.connector);
        }
        out
    }
}

/// Disjoint sets with path halving and union by size.
#[derive(Debug, Clone)]
pub(crate) struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    pub(crate) fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Returns false if already joined.
    pub(crate) fn union(&mut self, a: usize, b: usize) -> bool {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    /// Two separate segments plus a T attached to the first.
    fn sample() -> RoadGraph {
        let mut g = RoadGraph::new();
        let a = g.find_or_create_node(p(0.0, 0.0), 1.0);
        let b = g.find_or_create_node(p(100.0, 0.0), 1.0);
        let c = g.find_or_create_node(p(50.0, 0.0), 1.0);
        let d = g.find_or_create_node(p(50.0, 40.0), 1.0);
        g.add_edge(a, c, RoadTier::Primary, vec![p(0.0, 0.0), p(50.0, 0.0)], false);
        g.add_edge(c, b, RoadTier::Primary, vec![p(50.0, 0.0), p(100.0, 0.0)], false);
        g.add_edge(c, d, RoadTier::Pedestrian, vec![], false);
        let e = g.find_or_create_node(p(0.0, 200.0), 1.0);
        let f = g.find_or_create_node(p(10.0, 200.0), 1.0);
        g.add_edge(e, f, RoadTier::Bicycle, vec![p(0.0, 200.0), p(10.0, 200.0)], false);
        g
    }

    #[test]
    fn test_find_or_create_snaps_to_nearest() {
        let mut g = RoadGraph::new();
        let a = g.find_or_create_node(p(0.0, 0.0), 5.0);
        let b = g.find_or_create_node(p(8.0, 0.0), 5.0);
        assert_ne!(a, b);
        assert_eq!(g.find_or_create_node(p(5.0, 0.0), 5.0), b, "nearest wins");
        assert_eq!(g.find_or_create_node(p(1.0, 1.0), 5.0), a);
        assert_eq!(g.node_count(), 2);
    }

    #[test]
    fn test_edge_geometry_pinned_to_nodes() {
        let mut g = RoadGraph::new();
        let a = g.find_or_create_node(p(0.0, 0.0), 1.0);
        let b = g.find_or_create_node(p(30.0, 40.0), 1.0);
        let id = g
            .add_edge(a, b, RoadTier::Secondary, vec![p(0.5, 0.5), p(29.0, 39.0)], false)
            .unwrap();
        let e = g.edge(id).unwrap();
        assert_eq!(e.points, vec![p(0.0, 0.0), p(30.0, 40.0)]);
        assert_eq!(e.length, 50.0);
        assert_eq!(e.width, 8.0);
        assert!(g.add_edge(a, NodeId(9), RoadTier::Primary, vec![], false).is_none());
    }

    #[test]
    fn test_queries() {
        let g = sample();
        assert_eq!(g.edge_count(), 4);
        assert_eq!(g.degree(NodeId(2)), 3);
        assert_eq!(g.intersections(), vec![NodeId(2)]);
        assert_eq!(g.total_length(), 100.0 + 40.0 + 10.0);
        let by_tier = g.length_by_tier();
        assert_eq!(by_tier[&RoadTier::Primary], 100.0);
        assert_eq!(by_tier[&RoadTier::Pedestrian], 40.0);
        assert!(!by_tier.contains_key(&RoadTier::Secondary));
    }

    #[test]
    fn test_components_largest_first() {
        let g = sample();
        let comps = g.components();
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].len(), 4);
        assert_eq!(comps[1], vec![NodeId(4), NodeId(5)]);
        assert!(!g.is_connected());
        assert!(RoadGraph::new().is_connected());
    }

    #[test]
    fn test_retain_edges_compacts() {
        let g = sample();
        let kept = g.retain_edges(|e| e.tier != RoadTier::Bicycle);
        assert_eq!(kept.edge_count(), 3);
        assert_eq!(kept.node_count(), 4);
        assert!(kept.is_connected());
        for (i, e) in kept.edges().iter().enumerate() {
            assert_eq!(e.id, EdgeId(i));
            assert!(kept.node(e.from).is_some() && kept.node(e.to).is_some());
        }
    }

    #[test]
    fn test_union_find() {
        let mut uf = UnionFind::new(5);
        assert!(uf.union(0, 1));
        assert!(uf.union(3, 4));
        assert!(!uf.union(1, 0));
        assert_eq!(uf.find(0), uf.find(1));
        assert_ne!(uf.find(1), uf.find(3));
    }
}
