//! Shared fixtures for unit tests: hand-placed segments with straight
//! (wobble-free) ribbons so overlaps are predictable.

use glam::Vec2;

use crate::{
    config::CaveConfig,
    curve::Curve,
    mesh::build_ribbon,
    segment::{CaveSegment, SegmentArena, SegmentRecord, SegmentType},
    types::NodeId,
};

pub fn segment(origin: Vec2, target: Vec2, origin_node: NodeId, target_node: NodeId) -> CaveSegment {
    CaveSegment {
        origin,
        target,
        origin_node,
        target_node,
        connection: origin_node,
        sibling_count: 1,
        kind: SegmentType::Corridor,
    }
}

/// Builds an arena of straight ribbons for `segments`.
pub fn straight_arena(segments: Vec<CaveSegment>, cfg: &CaveConfig) -> SegmentArena {
    let width = cfg.cave_width;
    straight_arena_with_widths(segments.into_iter().map(|s| (s, width)).collect(), cfg)
}

/// Like [`straight_arena`], with a ribbon width per segment.
pub fn straight_arena_with_widths(segments: Vec<(CaveSegment, f32)>, cfg: &CaveConfig) -> SegmentArena {
    let flat = Curve::constant(0.0);
    SegmentArena::from_records(
        segments
            .into_iter()
            .map(|(segment, width)| {
                let cfg = CaveConfig {
                    cave_width: width,
                    ..cfg.clone()
                };
                SegmentRecord {
                    mesh: build_ribbon(&segment, &cfg, &flat),
                    segment,
                }
            })
            .collect(),
    )
}

/// Corridor `(0,0) → (10,0)` crossed by a vertical corridor at each x in
/// `crossings`, running `(x,-5) → (x,5)`.
///
/// With the default width the vertices 4 and 5 of the first corridor's top
/// rail are buried in the crossing at `x = 5`.
pub fn crossed_corridor(sibling_count: usize, crossings: &[f32]) -> Vec<CaveSegment> {
    let mut first = segment(Vec2::ZERO, Vec2::new(10.0, 0.0), 0, 1);
    first.sibling_count = sibling_count;

    let mut segments = vec![first];
    for (k, &x) in crossings.iter().enumerate() {
        let node = 10 + 2 * k;
        segments.push(segment(Vec2::new(x, -5.0), Vec2::new(x, 5.0), node, node + 1));
    }
    segments
}

/// Root corridor plus `count` unconnected corridors stacked far above it,
/// each a separate loop for the inner walk.
pub fn stacked_corridors(count: usize) -> Vec<CaveSegment> {
    (0..=count)
        .map(|k| {
            let y = 100.0 * k as f32;
            segment(Vec2::new(0.0, y), Vec2::new(10.0, y), 2 * k, 2 * k + 1)
        })
        .collect()
}
