//! Triangulation of traced hulls into renderable meshes.

use glam::Vec2;
use lyon_tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers, math::point,
    path::Path,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{config::EnclosingRect, hull::HullSet};

/// Depth of the rock and inner-hull layers.
pub const FOREGROUND_DEPTH: f32 = 4.5;
/// Depth of the cave interior layer.
pub const BACKGROUND_DEPTH: f32 = 5.0;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TessellationError {
    #[error("fill tessellation failed: {0}")]
    Fill(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TessellatedMesh {
    pub vertices: Vec<Vec2>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl TessellatedMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec2; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]].map(|i| self.vertices[i as usize]))
    }

    /// Sum of the unsigned triangle areas.
    pub fn area(&self) -> f32 {
        self.triangles()
            .map(|[a, b, c]| 0.5 * (b - a).perp_dot(c - a).abs())
            .sum()
    }
}

/// Fills a set of closed contours.
pub trait Tessellator {
    /// Triangulates `contours` under the even-odd rule. Each contour is closed
    /// implicitly; contours with fewer than three points are ignored. UVs are
    /// positions divided by `uv_tiling`.
    fn tessellate(
        &self,
        contours: &[Vec<Vec2>],
        uv_tiling: f32,
    ) -> Result<TessellatedMesh, TessellationError>;
}

/// [`Tessellator`] backed by lyon's fill tessellator.
#[derive(Debug, Clone, Copy, Default)]
pub struct LyonTessellator {
    pub tolerance: Option<f32>,
}

impl Tessellator for LyonTessellator {
    fn tessellate(
        &self,
        contours: &[Vec<Vec2>],
        uv_tiling: f32,
    ) -> Result<TessellatedMesh, TessellationError> {
        let mut builder = Path::builder();
        let mut any = false;
        for contour in contours.iter().filter(|c| c.len() >= 3) {
            builder.begin(point(contour[0].x, contour[0].y));
            for p in &contour[1..] {
                builder.line_to(point(p.x, p.y));
            }
            builder.end(true);
            any = true;
        }
        if !any {
            return Ok(TessellatedMesh::default());
        }
        let path = builder.build();

        let mut options = FillOptions::even_odd();
        if let Some(tolerance) = self.tolerance {
            options = options.with_tolerance(tolerance);
        }

        let mut buffers: VertexBuffers<Vec2, u32> = VertexBuffers::new();
        FillTessellator::new()
            .tessellate_path(
                &path,
                &options,
                &mut BuffersBuilder::new(&mut buffers, |v: FillVertex| {
                    let p = v.position();
                    Vec2::new(p.x, p.y)
                }),
            )
            .map_err(|e| TessellationError::Fill(format!("{e:?}")))?;

        let uvs = buffers.vertices.iter().map(|v| *v / uv_tiling).collect();
        Ok(TessellatedMesh {
            vertices: buffers.vertices,
            uvs,
            indices: buffers.indices,
        })
    }
}

/// Material a hull layer is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialSlot {
    Background,
    Foreground,
}

/// Which hull a layer was tessellated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HullKind {
    /// A rock island inside the cave.
    Inner,
    /// The area enclosed by the outer hull.
    Interior,
    /// The rock outline joined to the outer hull, open above the entrance.
    Rock,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HullMesh {
    pub mesh: TessellatedMesh,
    pub depth: f32,
    pub material: MaterialSlot,
    pub kind: HullKind,
}

/// Tessellates every hull layer: the inner hulls in trace order, then the
/// cave interior, then the rock.
///
/// The rock is a single contour: [`EnclosingRect::outline`] followed by the
/// outer hull points, so the closing edges from the top-right corner to the
/// hull start and from the hull end back to the left edge cut the open
/// surface out of the rectangle.
pub fn tessellate_hulls(
    hulls: &HullSet,
    rect: &EnclosingRect,
    uv_tiling: f32,
    tessellator: &impl Tessellator,
) -> Result<Vec<HullMesh>, TessellationError> {
    let mut layers = Vec::with_capacity(hulls.inner.len() + 2);

    for hull in &hulls.inner {
        layers.push(HullMesh {
            mesh: tessellator.tessellate(&[hull.points().collect()], uv_tiling)?,
            depth: FOREGROUND_DEPTH,
            material: MaterialSlot::Foreground,
            kind: HullKind::Inner,
        });
    }

    let outer: Vec<Vec2> = hulls.outer.points().collect();
    layers.push(HullMesh {
        mesh: tessellator.tessellate(std::slice::from_ref(&outer), uv_tiling)?,
        depth: BACKGROUND_DEPTH,
        material: MaterialSlot::Background,
        kind: HullKind::Interior,
    });

    let mut rock = rect.outline().to_vec();
    rock.extend(outer);
    layers.push(HullMesh {
        mesh: tessellator.tessellate(&[rock], uv_tiling)?,
        depth: FOREGROUND_DEPTH,
        material: MaterialSlot::Foreground,
        kind: HullKind::Rock,
    });

    Ok(layers)
}
