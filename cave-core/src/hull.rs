//! Hull tracing.
//!
//! The cave outline is never computed as a polygon union. Instead the
//! tracer walks the rails of the ribbon meshes: along the top rail of a
//! segment, across to the next segment at a branch end, back along the
//! bottom rails, and onto a neighbouring mesh whenever the next vertex turns
//! out to be buried inside it. The first walk starts at vertex 0 of segment
//! 0 and yields the outer hull; every vertex it did not consume and that is
//! not buried seeds a walk around an interior hole.
//!
//! Every vertex consumed by any walk is recorded in a checked set shared
//! across the whole run.

use std::collections::HashSet;

use glam::Vec2;
use log::{debug, error, info, warn};
use thiserror::Error;

use crate::{
    geometry::unsigned_angle,
    overlap::{OverlapHit, OverlapIndex},
    segment::SegmentArena,
    types::{SegmentId, VertexRef},
};

/// Number of mesh-to-mesh hops a detour may take before falling back to
/// ranking every overlapping vertex.
pub const MAX_DETOUR_HOPS: usize = 1;
/// Cap on the number of inner hull walks per run.
pub const INNER_HULL_LIMIT: usize = 200;
/// Entry vertices whose heading deviates more than this (degrees) from the
/// segment direction would send the walk backwards.
const INVERSION_ANGLE: f32 = 160.0;

/// One boundary edge of a hull.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSegment {
    pub origin: Vec2,
    pub target: Vec2,
}

/// A closed boundary loop.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CaveHull {
    pub segments: Vec<LineSegment>,
}

impl CaveHull {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last target equals first origin.
    pub fn is_closed(&self) -> bool {
        match (self.segments.first(), self.segments.last()) {
            (Some(first), Some(last)) => first.origin == last.target,
            _ => false,
        }
    }

    /// The loop's corner points (edge origins) in walk order.
    pub fn points(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.segments.iter().map(|s| s.origin)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TraceError {
    #[error("there are no segments to trace")]
    Empty,
    #[error("hull walk exceeded {0} steps")]
    IterationLimit(usize),
    #[error("every entry vertex of segment {0} is buried or points backwards")]
    NoEntryVertex(SegmentId),
    #[error("hull walk stopped on a consumed vertex after {0} edges")]
    Open(usize),
}

/// Outer hull plus every inner hull that closed.
#[derive(Clone, Debug, Default)]
pub struct HullSet {
    pub outer: CaveHull,
    pub inner: Vec<CaveHull>,
    /// Inner walks that failed to close and were dropped.
    pub discarded_inner: usize,
    pub hit_inner_limit: bool,
}

impl HullSet {
    pub fn count(&self) -> usize {
        1 + self.inner.len()
    }
}

/// How the vertex a walk landed on was resolved against the other meshes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Not buried in any other mesh.
    Clear,
    /// Moved onto the boundary of the mesh it was buried in.
    Detour(VertexRef),
    /// Picked by ranking every vertex of the overlapping meshes.
    Fallback(VertexRef),
}

impl Resolution {
    pub fn vertex_or(self, landed: VertexRef) -> VertexRef {
        match self {
            Resolution::Clear => landed,
            Resolution::Detour(v) | Resolution::Fallback(v) => v,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TraceMode {
    Outer,
    Inner,
}

pub struct HullTracer<'a> {
    arena: &'a SegmentArena,
    index: OverlapIndex<'a>,
    checked: HashSet<VertexRef>,
    iteration_limit: usize,
}

impl<'a> HullTracer<'a> {
    pub fn new(index: OverlapIndex<'a>, iteration_limit: usize) -> Self {
        Self {
            arena: index.arena(),
            index,
            checked: HashSet::new(),
            iteration_limit,
        }
    }

    pub fn is_checked(&self, v: VertexRef) -> bool {
        self.checked.contains(&v)
    }

    #[inline]
    fn pos(&self, v: VertexRef) -> Vec2 {
        self.arena.mesh(v.segment).vertices[v.index]
    }

    #[inline]
    fn collides(&self, v: VertexRef) -> bool {
        self.index.collides(self.pos(v), v.segment).is_some()
    }

    /// Traces the outer hull and then every inner hull.
    ///
    /// Fails only if the outer hull cannot be closed.
    pub fn trace_all(mut self) -> Result<HullSet, TraceError> {
        let outer = self.trace_outer()?;
        let buried = self.discard_colliding_vertices();
        debug!("outer hull closed with {} edges, {buried} buried vertices set aside", outer.len());

        let mut set = HullSet {
            outer,
            ..HullSet::default()
        };

        let mut budget = INNER_HULL_LIMIT;
        let mut from = 0;
        while let Some(seed) = self.next_unchecked(from) {
            budget -= 1;
            if budget == 0 {
                error!("inner hull tracing hit its limit of {INNER_HULL_LIMIT} walks");
                set.hit_inner_limit = true;
                break;
            }
            from = seed.segment;

            match self.trace(seed, TraceMode::Inner) {
                Ok(hull) => set.inner.push(hull),
                Err(e) => {
                    debug!("discarding inner hull started at {seed:?}: {e}");
                    set.discarded_inner += 1;
                }
            }
        }

        info!(
            "traced {} hulls ({} inner walks discarded)",
            set.count(),
            set.discarded_inner
        );
        Ok(set)
    }

    /// Traces the outer hull starting at vertex 0 of segment 0.
    pub fn trace_outer(&mut self) -> Result<CaveHull, TraceError> {
        if self.arena.is_empty() {
            return Err(TraceError::Empty);
        }
        self.trace(VertexRef::new(0, 0), TraceMode::Outer)
            .inspect_err(|e| warn!("outer hull failed: {e}"))
    }

    fn trace(&mut self, start: VertexRef, mode: TraceMode) -> Result<CaveHull, TraceError> {
        let mut edges = Vec::new();
        let mut current = start;
        let mut failure = None;
        let mut closed = false;
        let mut steps = 0;

        while !closed {
            if steps == self.iteration_limit {
                failure = Some(TraceError::IterationLimit(self.iteration_limit));
                break;
            }
            steps += 1;

            let landed = match self.advance(current) {
                Ok(v) => v,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            };

            if mode == TraceMode::Outer {
                if self.checked.contains(&landed) {
                    break;
                }
                self.checked.insert(landed);
            }

            let target = self.resolve_overlap(landed, current).vertex_or(landed);
            if target != landed {
                self.checked.remove(&landed);
                self.checked.insert(target);
            } else if mode == TraceMode::Inner && self.checked.contains(&target) {
                break;
            }

            if mode == TraceMode::Inner {
                self.checked.insert(target);
            }

            edges.push(LineSegment {
                origin: self.pos(current),
                target: self.pos(target),
            });
            current = target;
            closed = target == start;
        }

        self.checked.insert(start);
        self.checked.insert(current);

        if closed && edges.len() > 1 {
            Ok(CaveHull { segments: edges })
        } else {
            Err(failure.unwrap_or(TraceError::Open(edges.len())))
        }
    }

    /// Next vertex along the rail, jumping to the neighbouring segment at the
    /// end of a rail.
    fn advance(&self, current: VertexRef) -> Result<VertexRef, TraceError> {
        let segment = current.segment;
        let mesh = self.arena.mesh(segment);
        let rail = mesh.rail_len();
        let from = self.pos(current);

        if mesh.is_top(current.index) {
            if current.index + 1 < rail {
                return Ok(VertexRef::new(segment, current.index + 1));
            }
            match self.next_segment(segment, from) {
                None => Ok(VertexRef::new(segment, 2 * rail - 1)),
                Some(next) => self
                    .entry_vertex(next, from, true)
                    .map(|i| VertexRef::new(next, i))
                    .ok_or(TraceError::NoEntryVertex(next)),
            }
        } else {
            if current.index > rail {
                return Ok(VertexRef::new(segment, current.index - 1));
            }
            match self.arena.parent(segment) {
                None => Ok(VertexRef::new(segment, 0)),
                Some(prev) => self
                    .entry_vertex(prev, from, false)
                    .map(|i| VertexRef::new(prev, i))
                    .ok_or(TraceError::NoEntryVertex(prev)),
            }
        }
    }

    /// Child segment to continue on after the top rail of `segment` ends.
    ///
    /// At a fork, the child owning the unburied top-rail vertex closest to
    /// `from` wins.
    fn next_segment(&self, segment: SegmentId, from: Vec2) -> Option<SegmentId> {
        let children: Vec<SegmentId> = self.arena.children(segment).collect();
        match children.as_slice() {
            [] => return None,
            [only] => return Some(*only),
            _ => {}
        }

        let mut best: Option<(SegmentId, f32)> = None;
        for &child in &children {
            let mesh = self.arena.mesh(child);
            for index in 0..mesh.rail_len() {
                let v = VertexRef::new(child, index);
                if self.collides(v) {
                    continue;
                }
                let dist = self.pos(v).distance(from);
                if best.is_none_or(|(_, d)| dist < d) {
                    best = Some((child, dist));
                }
            }
        }
        best.map(|(child, _)| child)
    }

    /// First unburied vertex of `segment`'s top rail (scanning forward) or
    /// bottom rail (scanning backward from the far end) that does not send
    /// the walk back the way it came.
    fn entry_vertex(&self, segment: SegmentId, from: Vec2, top: bool) -> Option<usize> {
        let mesh = self.arena.mesh(segment);
        let rail = mesh.rail_len();
        let seg = self.arena.segment(segment);
        let heading = if top { seg.direction() } else { -seg.direction() };

        let accept = |index: usize| {
            let v = VertexRef::new(segment, index);
            !self.collides(v) && unsigned_angle(heading, self.pos(v) - from) <= INVERSION_ANGLE
        };

        if top {
            (0..rail).find(|&i| accept(i))
        } else {
            (rail..2 * rail).rev().find(|&i| accept(i))
        }
    }

    /// Resolves a landed vertex against the other meshes.
    ///
    /// A vertex buried in another mesh first detours onto the crossed
    /// triangle of that mesh. Once the hop budget is spent the overlapping
    /// meshes are ranked instead; the detour result stands only if ranking
    /// finds nothing.
    pub fn resolve_overlap(&self, landed: VertexRef, last: VertexRef) -> Resolution {
        let Some(first_hit) = self.index.collides(self.pos(landed), landed.segment) else {
            return Resolution::Clear;
        };
        let last_pos = self.pos(last);

        let mut visited = HashSet::from([landed, last]);
        let mut candidate = landed;
        let mut hops_left = MAX_DETOUR_HOPS;
        let mut hit = Some(first_hit);

        while let Some(h) = hit
            && hops_left > 0
        {
            candidate = self.detour_hop(h, last_pos, &visited);
            if self.checked.contains(&candidate) {
                hops_left = 0;
                break;
            }
            visited.insert(candidate);
            hops_left -= 1;
            hit = self.index.collides(self.pos(candidate), candidate.segment);
        }

        if hops_left > 0 {
            return Resolution::Detour(candidate);
        }

        match self.rank_overlapping(landed, last_pos) {
            Some(v) => Resolution::Fallback(v),
            None => Resolution::Detour(candidate),
        }
    }

    /// Picks a vertex of the crossed triangle to continue from.
    fn detour_hop(&self, hit: OverlapHit, last_pos: Vec2, visited: &HashSet<VertexRef>) -> VertexRef {
        let segment = hit.segment;
        let mesh = self.arena.mesh(segment);
        let [a, b, c] = mesh.triangle(hit.triangle);

        let mut index = if self.collides(VertexRef::new(segment, a)) { b } else { a };
        if mesh.vertices[c].distance(last_pos) < mesh.vertices[index].distance(last_pos) {
            index = c;
        }

        // Top rails are walked upward, bottom rails downward.
        let ascending = mesh.is_top(index);
        if self.checked.contains(&VertexRef::new(segment, index)) {
            index = if ascending {
                (index + 1).min(mesh.vertices.len() - 1)
            } else {
                index.saturating_sub(1)
            };
        }

        // Bounced back onto a vertex of this detour: keep going along the rail.
        if visited.contains(&VertexRef::new(segment, index))
            && let Some(stepped) = mesh.step_along_rail(index, ascending)
        {
            index = stepped;
        }

        VertexRef::new(segment, index)
    }

    /// Ranks every vertex of every mesh overlapping `landed` by distance to
    /// the last valid vertex and returns the first usable one.
    ///
    /// Vertices on the other rail side are skipped only when exactly one mesh
    /// overlaps and `landed` sits on a straight, non-forking segment.
    fn rank_overlapping(&self, landed: VertexRef, last_pos: Vec2) -> Option<VertexRef> {
        let overlapping = self.index.colliding_segments(self.pos(landed), landed.segment);
        let top_side = self.arena.mesh(landed.segment).is_top(landed.index);
        let same_side_only =
            overlapping.len() == 1 && self.arena.segment(landed.segment).sibling_count == 1;

        let mut ranked: Vec<(f32, VertexRef)> = overlapping
            .iter()
            .flat_map(|&segment| {
                self.arena
                    .mesh(segment)
                    .vertices
                    .iter()
                    .enumerate()
                    .map(move |(i, v)| (v.distance(last_pos), VertexRef::new(segment, i)))
            })
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

        ranked.into_iter().map(|(_, v)| v).find(|&v| {
            v != landed
                && !self.checked.contains(&v)
                && (!same_side_only || self.arena.mesh(v.segment).is_top(v.index) == top_side)
                && !self.collides(v)
        })
    }

    /// Marks every unconsumed vertex that is buried in another mesh as
    /// checked, so inner walks only start on genuine hole boundaries.
    fn discard_colliding_vertices(&mut self) -> usize {
        let arena = self.arena;
        let mut discarded = 0;
        for (segment, record) in arena.iter() {
            for index in 0..record.mesh.vertices.len() {
                let v = VertexRef::new(segment, index);
                if self.checked.contains(&v) || !self.collides(v) {
                    continue;
                }
                self.checked.insert(v);
                discarded += 1;
            }
        }
        discarded
    }

    /// First unchecked vertex at or after segment `from`, in arena order.
    fn next_unchecked(&self, from: SegmentId) -> Option<VertexRef> {
        (from..self.arena.len())
            .flat_map(|segment| {
                (0..self.arena.mesh(segment).vertices.len()).map(move |i| VertexRef::new(segment, i))
            })
            .find(|v| !self.checked.contains(v))
    }
}
