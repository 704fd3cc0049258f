//! Cave segments and the arena that owns them together with their meshes.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    config::CaveConfig,
    graph::CaveGraph,
    mesh::{RibbonMesh, build_corridor},
    types::{NodeId, SegmentId},
};

/// Shape family of a segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentType {
    Corridor,
}

impl SegmentType {
    /// Cumulative roll thresholds out of 100, ascending. A roll in `0..=100`
    /// picks the first entry whose threshold it does not exceed.
    pub const WEIGHTS: &'static [(u32, SegmentType)] = &[(100, SegmentType::Corridor)];

    /// Draws a segment type from [`Self::WEIGHTS`]. Always consumes one value
    /// from `rng`.
    pub fn roll(rng: &mut impl Rng) -> Self {
        let roll: u32 = rng.random_range(0..=100);
        Self::WEIGHTS
            .iter()
            .find(|(threshold, _)| roll <= *threshold)
            .map(|(_, kind)| *kind)
            .unwrap_or(SegmentType::Corridor)
    }
}

/// One directed tree edge.
#[derive(Clone, Debug, PartialEq)]
pub struct CaveSegment {
    pub origin: Vec2,
    pub target: Vec2,
    pub origin_node: NodeId,
    pub target_node: NodeId,
    /// Index of the owning connection in `CaveGraph::connections`.
    pub connection: usize,
    /// Number of branches the owning connection produced.
    pub sibling_count: usize,
    pub kind: SegmentType,
}

impl CaveSegment {
    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.target - self.origin
    }
}

/// Turns every graph edge into a segment, in connection order, rolling a
/// type for each.
pub fn collect_segments(graph: &CaveGraph, rng: &mut impl Rng) -> Vec<CaveSegment> {
    let mut segments = Vec::with_capacity(graph.edge_count());
    for (index, connection) in graph.connections.iter().enumerate() {
        for &target in &connection.targets {
            segments.push(CaveSegment {
                origin: graph.pos(connection.origin),
                target: graph.pos(target),
                origin_node: connection.origin,
                target_node: target,
                connection: index,
                sibling_count: connection.targets.len(),
                kind: SegmentType::roll(rng),
            });
        }
    }
    segments
}

#[derive(Debug, Clone)]
pub struct SegmentRecord {
    pub segment: CaveSegment,
    pub mesh: RibbonMesh,
}

/// Segments and the meshes they own, addressed by [`SegmentId`].
#[derive(Debug, Clone, Default)]
pub struct SegmentArena {
    records: Vec<SegmentRecord>,
}

impl SegmentArena {
    /// Meshes every segment in order.
    pub fn build(segments: Vec<CaveSegment>, cfg: &CaveConfig, rng: &mut impl Rng) -> Self {
        let records = segments
            .into_iter()
            .map(|segment| {
                let mesh = match segment.kind {
                    SegmentType::Corridor => build_corridor(&segment, cfg, rng),
                };
                SegmentRecord { segment, mesh }
            })
            .collect();
        Self { records }
    }

    /// Assembles an arena from already built records.
    pub fn from_records(records: Vec<SegmentRecord>) -> Self {
        Self { records }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn segment(&self, id: SegmentId) -> &CaveSegment {
        &self.records[id].segment
    }

    #[inline]
    pub fn mesh(&self, id: SegmentId) -> &RibbonMesh {
        &self.records[id].mesh
    }

    pub fn iter(&self) -> impl Iterator<Item = (SegmentId, &SegmentRecord)> + '_ {
        self.records.iter().enumerate()
    }

    /// Segments continuing from the end of `id`.
    pub fn children(&self, id: SegmentId) -> impl Iterator<Item = SegmentId> + '_ {
        let node = self.segment(id).target_node;
        self.iter()
            .filter(move |(_, r)| r.segment.origin_node == node)
            .map(|(i, _)| i)
    }

    /// The segment leading into the start of `id`, if any.
    pub fn parent(&self, id: SegmentId) -> Option<SegmentId> {
        let node = self.segment(id).origin_node;
        self.iter()
            .find(|(_, r)| r.segment.target_node == node)
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeConnection;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn forked_graph() -> CaveGraph {
        let mut graph = CaveGraph::new(Vec2::ZERO);
        let a = graph.add_node(Vec2::new(6.0, 0.0));
        let b = graph.add_node(Vec2::new(12.0, 3.0));
        let c = graph.add_node(Vec2::new(12.0, -3.0));
        graph.connections.push(NodeConnection { origin: 0, targets: vec![a] });
        graph.connections.push(NodeConnection { origin: a, targets: vec![b, c] });
        graph
    }

    #[test]
    fn roll_only_reaches_corridor() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        for _ in 0..200 {
            assert_eq!(SegmentType::roll(&mut rng), SegmentType::Corridor);
        }
    }

    #[test]
    fn segments_follow_connection_order() {
        let graph = forked_graph();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let segments = collect_segments(&graph, &mut rng);

        assert_eq!(segments.len(), 3);
        assert_eq!((segments[0].origin_node, segments[0].target_node), (0, 1));
        assert_eq!((segments[1].origin_node, segments[1].target_node), (1, 2));
        assert_eq!((segments[2].origin_node, segments[2].target_node), (1, 3));
        assert_eq!(segments[0].sibling_count, 1);
        assert_eq!(segments[1].sibling_count, 2);
        assert_eq!(segments[2].connection, 1);
    }

    #[test]
    fn arena_links_parents_and_children() {
        let graph = forked_graph();
        let cfg = CaveConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let segments = collect_segments(&graph, &mut rng);
        let arena = SegmentArena::build(segments, &cfg, &mut rng);

        assert_eq!(arena.len(), 3);
        assert_eq!(arena.children(0).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(arena.children(1).count(), 0);
        assert_eq!(arena.parent(0), None);
        assert_eq!(arena.parent(1), Some(0));
        assert_eq!(arena.parent(2), Some(0));
        assert_eq!(arena.mesh(2).rail_len(), cfg.vertices_per_segment);
    }
}
