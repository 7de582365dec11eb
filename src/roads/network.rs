//! Road graph assembly and connectivity repair.

use super::config::NetworkConfig;
use super::graph::{NodeId, RoadGraph};
use super::tier::Road;
use crate::error::LayoutResult;
use crate::model::geometry::{closest_on_segment, distance_to_polyline, polyline_length};
use crate::model::Point;

/// Turns classified roads into a [`RoadGraph`].
///
/// Steps, in order: optional pruning of roads that duplicate a
/// higher-priority neighbor, splitting roads where another road ends on
/// them, endpoint merging within `merge_radius`, then fragment repair
/// (drop short disconnected pieces, connect the rest when close enough).
#[derive(Debug, Clone, Default)]
pub struct NetworkAssembler {
    config: NetworkConfig,
}

impl NetworkAssembler {
    pub fn new(config: NetworkConfig) -> LayoutResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn assemble(&self, roads: &[Road]) -> RoadGraph {
        let usable: Vec<&Road> = roads
            .iter()
            .filter(|r| r.points.len() >= 2 && r.points.iter().all(|p| p.is_finite()))
            .collect();
        let usable = if self.config.prune_parallel {
            self.prune_parallel(usable)
        } else {
            usable
        };

        let radius = self.config.merge_radius;
        let mut graph = RoadGraph::new();
        for (i, road) in usable.iter().enumerate() {
            let cuts = junction_cuts(i, &usable, radius);
            for piece in split_polyline(&road.points, cuts) {
                let (Some(&start), Some(&end)) = (piece.first(), piece.last()) else {
                    continue;
                };
                let from = graph.find_or_create_node(start, radius);
                let to = graph.find_or_create_node(end, radius);
                if from == to && polyline_length(&piece) < 2.0 * radius {
                    continue;
                }
                graph.add_edge(from, to, road.tier, piece, false);
            }
        }

        let graph = self.repair(graph);
        log::info!(
            "road network: {} nodes, {} edges, {:.0} m, {} component(s)",
            graph.node_count(),
            graph.edge_count(),
            graph.total_length(),
            graph.component_count()
        );
        graph
    }

    /// Keeps the higher-tier (then longer) road of each side-by-side pair.
    fn prune_parallel<'a>(&self, mut roads: Vec<&'a Road>) -> Vec<&'a Road> {
        roads.sort_by(|a, b| a.tier.cmp(&b.tier).then_with(|| b.length().total_cmp(&a.length())));
        let before = roads.len();
        let mut kept: Vec<&Road> = Vec::with_capacity(before);
        for road in roads {
            if !kept.iter().any(|k| self.runs_alongside(road, k)) {
                kept.push(road);
            }
        }
        if kept.len() < before {
            log::debug!("pruned {} parallel roads", before - kept.len());
        }
        kept
    }

    /// Most of `road` lies within `parallel_distance` of `other`, heading
    /// the same way (either sense).
    fn runs_alongside(&self, road: &Road, other: &Road) -> bool {
        let near = road
            .points
            .iter()
            .filter(|&&p| distance_to_polyline(p, &other.points) <= self.config.parallel_distance)
            .count();
        if (near as f64) < 0.8 * road.points.len() as f64 {
            return false;
        }
        let (Some(start), Some(end)) = (road.start(), road.end()) else {
            return false;
        };
        let Some(chord) = (end - start).normalized() else {
            return false;
        };
        let Some((seg, ..)) = project_on_polyline(start.lerp(end, 0.5), &other.points) else {
            return false;
        };
        let Some(tangent) = (other.points[seg + 1] - other.points[seg]).normalized() else {
            return false;
        };
        chord.dot(tangent).abs() >= self.config.parallel_angle_tolerance.cos()
    }

    /// Links disconnected fragments to the main (longest) component when a
    /// short connector exists; short fragments that cannot be linked are
    /// dropped.
    fn repair(&self, mut graph: RoadGraph) -> RoadGraph {
        let components = graph.components();
        if components.len() <= 1 {
            return graph;
        }
        let mut component_of = vec![0usize; graph.node_count()];
        for (ci, nodes) in components.iter().enumerate() {
            for n in nodes {
                component_of[n.0] = ci;
            }
        }
        let mut lengths = vec![0.0; components.len()];
        for e in graph.edges() {
            lengths[component_of[e.from.0]] += e.length;
        }

        let mut dropped = vec![false; components.len()];
        let mut attached = vec![false; components.len()];
        attached[0] = true;
        let mut connectors = 0usize;
        for ci in 1..components.len() {
            if lengths[ci] <= 0.0 {
                dropped[ci] = true;
                continue;
            }
            let short = lengths[ci] < self.config.min_fragment_length;
            let nearest = if self.config.connect_fragments {
                closest_pair(&graph, &components[ci], |n| attached[component_of[n.0]])
            } else {
                None
            };
            let tier = graph
                .edges()
                .iter()
                .filter(|e| component_of[e.from.0] == ci)
                .map(|e| e.tier)
                .min();
            match (nearest, tier) {
                (Some((a, b, distance)), Some(tier)) if distance <= self.config.max_connector_length => {
                    graph.add_edge(a, b, tier, Vec::new(), true);
                    attached[ci] = true;
                    connectors += 1;
                }
                _ if short => dropped[ci] = true,
                (Some((_, _, distance)), _) => log::warn!(
                    "road fragment of {:.0} m is {distance:.0} m from the network, left disconnected",
                    lengths[ci]
                ),
                _ => {}
            }
        }

        let dropped_count = dropped.iter().filter(|&&d| d).count();
        if dropped_count > 0 || connectors > 0 {
            log::debug!("fragment repair: {dropped_count} dropped, {connectors} connected");
        }
        graph.retain_edges(|e| !dropped[component_of[e.from.0]])
    }
}

/// Nearest (fragment node, accepted node) pair.
fn closest_pair(
    graph: &RoadGraph,
    fragment: &[NodeId],
    accept: impl Fn(NodeId) -> bool,
) -> Option<(NodeId, NodeId, f64)> {
    let targets: Vec<(NodeId, Point)> = graph
        .nodes()
        .iter()
        .filter(|n| accept(n.id))
        .map(|n| (n.id, n.position))
        .collect();
    let mut best: Option<(NodeId, NodeId, f64)> = None;
    for &a in fragment {
        let Some(pa) = graph.node(a).map(|n| n.position) else {
            continue;
        };
        for &(b, pb) in &targets {
            let d = pa.distance(pb);
            if best.map_or(true, |(.., bd)| d < bd) {
                best = Some((a, b, d));
            }
        }
    }
    best
}

/// Closest point of a polyline: (segment index, parameter, point, distance).
fn project_on_polyline(p: Point, points: &[Point]) -> Option<(usize, f64, Point, f64)> {
    let mut best: Option<(usize, f64, Point, f64)> = None;
    for (i, pair) in points.windows(2).enumerate() {
        let q = closest_on_segment(p, pair[0], pair[1]);
        let d = p.distance(q);
        if best.map_or(true, |(.., bd)| d < bd) {
            let len = pair[0].distance(pair[1]);
            let t = if len > 0.0 { pair[0].distance(q) / len } else { 0.0 };
            best = Some((i, t, q, d));
        }
    }
    best
}

/// Split positions on road `i` where another road ends within `radius` of
/// its interior.
fn junction_cuts(i: usize, roads: &[&Road], radius: f64) -> Vec<(usize, f64)> {
    let road = roads[i];
    let (Some(start), Some(end)) = (road.start(), road.end()) else {
        return Vec::new();
    };
    let mut cuts = Vec::new();
    for (j, other) in roads.iter().enumerate() {
        if j == i {
            continue;
        }
        for endpoint in [other.start(), other.end()].into_iter().flatten() {
            if let Some((seg, t, q, d)) = project_on_polyline(endpoint, &road.points) {
                if d <= radius && q.distance(start) > radius && q.distance(end) > radius {
                    cuts.push((seg, t));
                }
            }
        }
    }
    cuts
}

fn push_distinct(points: &mut Vec<Point>, p: Point) {
    if points.last() != Some(&p) {
        points.push(p);
    }
}

/// Cuts a polyline at `(segment, t)` positions; the cut point ends one piece
/// and starts the next.
fn split_polyline(points: &[Point], mut cuts: Vec<(usize, f64)>) -> Vec<Vec<Point>> {
    let Some(&first) = points.first() else {
        return Vec::new();
    };
    cuts.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.total_cmp(&b.1)));
    let mut cuts = cuts.into_iter().peekable();
    let mut pieces = Vec::new();
    let mut current = vec![first];
    for (i, pair) in points.windows(2).enumerate() {
        while let Some(&(_, t)) = cuts.peek().filter(|c| c.0 == i) {
            cuts.next();
            let q = pair[0].lerp(pair[1], t);
            push_distinct(&mut current, q);
            pieces.push(std::mem::replace(&mut current, vec![q]));
        }
        push_distinct(&mut current, pair[1]);
    }
    pieces.push(current);
    pieces.retain(|piece| piece.len() >= 2);
    pieces
}
