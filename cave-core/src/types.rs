/// Identifier for a node in a [`crate::graph::CaveGraph`].
///
/// This is an index into `CaveGraph::nodes`, and is only meaningful within
/// the lifetime of a given `CaveGraph` instance.
pub type NodeId = usize;

/// Identifier for a segment (and the ribbon mesh it owns) in a
/// [`crate::segment::SegmentArena`].
pub type SegmentId = usize;

/// Stable handle of one ribbon-mesh vertex: the owning segment plus the
/// index into that segment's vertex buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexRef {
    pub segment: SegmentId,
    pub index: usize,
}

impl VertexRef {
    pub fn new(segment: SegmentId, index: usize) -> Self {
        Self { segment, index }
    }
}
