//! The phases of one generation pass.
//!
//! A pass runs, in order:
//! 1. [`graph_phase`] grows the node graph.
//! 2. [`segment_phase`] turns graph edges into segments and meshes each one.
//! 3. [`hull_phase`] traces the outer hull and every inner hull.
//! 4. [`tessellation_phase`] triangulates the hulls into layered meshes.
//!
//! All randomness is drawn from the one generator handed to the first two
//! phases; the later phases are deterministic given their input.

use log::{debug, info, warn};
use rand::Rng;

use crate::{
    config::CaveConfig,
    graph::{CaveGraph, GraphReport, build_graph},
    hull::{HullSet, HullTracer, TraceError},
    overlap::OverlapIndex,
    segment::{SegmentArena, collect_segments},
    tessellate::{HullMesh, TessellationError, Tessellator, tessellate_hulls},
};

/// Grows the cave graph and logs how growth ended.
///
/// Hitting the graph iteration limit is not an error; the partial graph is
/// returned and the report says so.
///
/// ### Parameters
/// - `cfg` - Growth parameters (angles, distances, branch distribution).
/// - `rng` - The pass's random stream; consumed for branch counts, lengths
///   and angles.
///
/// ### Returns
/// The graph and a [`GraphReport`].
pub fn graph_phase(cfg: &CaveConfig, rng: &mut impl Rng) -> (CaveGraph, GraphReport) {
    let (graph, report) = build_graph(cfg, rng);
    if report.hit_iteration_limit {
        warn!("cave graph is partial: growth hit the iteration limit");
    }
    info!(
        "graph phase: {} nodes, {} edges, rotated by {:.1} degrees",
        graph.nodes.len(),
        graph.edge_count(),
        report.rotation
    );
    (graph, report)
}

/// Builds the segment table and one ribbon mesh per segment.
///
/// Segment types are rolled for every segment first, then the meshes are
/// built in segment order, so the stream is consumed as types then wobble.
///
/// ### Parameters
/// - `graph` - The grown graph; one segment is made per edge, in connection
///   order.
/// - `cfg` - Mesh parameters (width, overlap, vertex count, UV tiling).
/// - `rng` - The pass's random stream.
pub fn segment_phase(graph: &CaveGraph, cfg: &CaveConfig, rng: &mut impl Rng) -> SegmentArena {
    let segments = collect_segments(graph, rng);
    let arena = SegmentArena::build(segments, cfg, rng);
    debug!(
        "segment phase: {} segments, {} vertices each",
        arena.len(),
        2 * cfg.vertices_per_segment
    );
    arena
}

/// Traces every hull over the segment meshes.
///
/// ### Errors
/// Returns the [`TraceError`] of the outer hull walk; inner walks that fail
/// are dropped and counted in [`HullSet::discarded_inner`].
pub fn hull_phase(arena: &SegmentArena, cfg: &CaveConfig) -> Result<HullSet, TraceError> {
    let index = OverlapIndex::new(arena, cfg.max_node_distance);
    HullTracer::new(index, cfg.iteration_limit).trace_all()
}

/// Triangulates the hulls into the inner, interior and rock layers.
pub fn tessellation_phase(
    hulls: &HullSet,
    cfg: &CaveConfig,
    tessellator: &impl Tessellator,
) -> Result<Vec<HullMesh>, TessellationError> {
    let layers = tessellate_hulls(hulls, &cfg.enclosing_rect, cfg.uv_tiling, tessellator)?;
    debug!(
        "tessellation phase: {} layers, {} triangles",
        layers.len(),
        layers.iter().map(|l| l.mesh.triangle_count()).sum::<usize>()
    );
    Ok(layers)
}
