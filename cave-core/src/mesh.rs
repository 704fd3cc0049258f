//! Ribbon meshes for cave segments.
//!
//! A [`RibbonMesh`] is a quad strip with two rails of equal length. The
//! first half of the vertex buffer is the top rail (left of the direction
//! of travel), the second half the bottom rail. Hull tracing depends on this
//! split being exact.

use glam::Vec2;
use rand::Rng;

use crate::{config::CaveConfig, curve::{Curve, Keyframe}, segment::CaveSegment};

#[derive(Debug, Clone, PartialEq)]
pub struct RibbonMesh {
    pub vertices: Vec<Vec2>,
    pub uvs: Vec<Vec2>,
    /// Triangle list, three indices per triangle.
    pub indices: Vec<u32>,
}

impl RibbonMesh {
    /// Number of vertices on each rail.
    #[inline]
    pub fn rail_len(&self) -> usize {
        self.vertices.len() / 2
    }

    /// Whether `index` lies on the top rail.
    #[inline]
    pub fn is_top(&self, index: usize) -> bool {
        index < self.rail_len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex indices of triangle `tri`.
    #[inline]
    pub fn triangle(&self, tri: usize) -> [usize; 3] {
        let base = 3 * tri;
        [
            self.indices[base] as usize,
            self.indices[base + 1] as usize,
            self.indices[base + 2] as usize,
        ]
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec2; 3]> + '_ {
        (0..self.triangle_count()).map(|t| {
            let [a, b, c] = self.triangle(t);
            [self.vertices[a], self.vertices[b], self.vertices[c]]
        })
    }

    /// Moves one index up (`ascending`) or down without leaving the rail
    /// `index` is on.
    pub fn step_along_rail(&self, index: usize, ascending: bool) -> Option<usize> {
        let stepped = if ascending {
            index.checked_add(1)?
        } else {
            index.checked_sub(1)?
        };
        (stepped < self.vertices.len() && self.is_top(stepped) == self.is_top(index)).then_some(stepped)
    }
}

/// Lateral wobble profile of a corridor: zero at both ends, two random
/// control values at the thirds.
fn wobble_curve(rng: &mut impl Rng) -> Curve {
    let first = rng.random_range(-1.0..=1.0);
    let second = rng.random_range(-1.0..=1.0);
    Curve::new(vec![
        Keyframe::flat(0.0, 0.0),
        Keyframe::flat(1.0 / 3.0, first),
        Keyframe::flat(2.0 / 3.0, second),
        Keyframe::flat(1.0, 0.0),
    ])
}

/// Builds the corridor ribbon for `segment`.
///
/// The segment is extended by `segment_overlap` at both ends, the rails sit
/// `cave_width / 2` either side of it and both are shifted sideways by the
/// wobble curve. Draws two values from `rng`.
pub fn build_corridor(segment: &CaveSegment, cfg: &CaveConfig, rng: &mut impl Rng) -> RibbonMesh {
    let wobble = wobble_curve(rng);
    build_ribbon(segment, cfg, &wobble)
}

/// Builds a ribbon for `segment` with an explicit lateral `wobble` profile
/// over `0..=1`.
pub fn build_ribbon(segment: &CaveSegment, cfg: &CaveConfig, wobble: &Curve) -> RibbonMesh {
    let count = cfg.vertices_per_segment;
    let half_width = cfg.cave_width / 2.0;

    let direction = (segment.target - segment.origin).normalize_or_zero();
    let normal = direction.perp();

    let start = segment.origin - direction * cfg.segment_overlap;
    let end = segment.target + direction * cfg.segment_overlap;
    let line = end - start;

    let mut vertices = vec![Vec2::ZERO; 2 * count];
    let denom = (count - 1).max(1) as f32;
    for i in 0..count {
        let f = i as f32 / denom;
        let along = start + line * f;
        let shift = normal * wobble.evaluate(f) * cfg.cave_width;

        vertices[i] = along + (normal + shift) * half_width;
        vertices[i + count] = along - (normal - shift) * half_width;
    }

    let uvs = vertices.iter().map(|v| *v / cfg.uv_tiling).collect();

    let mut indices = Vec::with_capacity(6 * count.saturating_sub(1));
    for quad in 0..count.saturating_sub(1) {
        let top = quad as u32;
        let bottom = (quad + count) as u32;
        indices.extend_from_slice(&[top, top + 1, bottom + 1, bottom + 1, bottom, top]);
    }

    RibbonMesh {
        vertices,
        uvs,
        indices,
    }
}
