//! Point-in-mesh queries against every segment ribbon.
//!
//! The index is a plain linear scan. Segments whose origin lies farther than
//! `4 * max_node_distance` from the query point are assumed not to overlap
//! it and are skipped without testing their triangles.

use glam::Vec2;

use crate::{geometry::point_in_triangle, segment::SegmentArena, types::SegmentId};

/// Segment and triangle a point was found in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlapHit {
    pub segment: SegmentId,
    pub triangle: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct OverlapIndex<'a> {
    arena: &'a SegmentArena,
    prune_radius: f32,
}

impl<'a> OverlapIndex<'a> {
    pub fn new(arena: &'a SegmentArena, max_node_distance: f32) -> Self {
        Self {
            arena,
            prune_radius: 4.0 * max_node_distance,
        }
    }

    pub fn arena(&self) -> &'a SegmentArena {
        self.arena
    }

    fn candidates(&self, point: Vec2, exclude: SegmentId) -> impl Iterator<Item = SegmentId> + '_ {
        self.arena
            .iter()
            .filter(move |(id, record)| {
                *id != exclude && record.segment.origin.distance(point) <= self.prune_radius
            })
            .map(|(id, _)| id)
    }

    fn first_triangle_containing(&self, segment: SegmentId, point: Vec2) -> Option<usize> {
        self.arena
            .mesh(segment)
            .triangles()
            .position(|[a, b, c]| point_in_triangle(point, a, b, c))
    }

    /// First segment (other than `exclude`) with a triangle containing
    /// `point`.
    pub fn collides(&self, point: Vec2, exclude: SegmentId) -> Option<OverlapHit> {
        self.candidates(point, exclude).find_map(|segment| {
            self.first_triangle_containing(segment, point)
                .map(|triangle| OverlapHit { segment, triangle })
        })
    }

    /// Every segment (other than `exclude`) containing `point`, ascending.
    pub fn colliding_segments(&self, point: Vec2, exclude: SegmentId) -> Vec<SegmentId> {
        self.candidates(point, exclude)
            .filter(|&segment| self.first_triangle_containing(segment, point).is_some())
            .collect()
    }
}
