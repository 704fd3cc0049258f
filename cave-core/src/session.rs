//! Generation sessions and the [`Cave`] they produce.
//!
//! A [`GenerationSession`] owns the configuration and the random stream of
//! one pass. Running it consumes the session and yields a [`Cave`] holding
//! every intermediate structure; dropping the cave discards the whole pass.

use log::{info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    config::CaveConfig,
    error::GenerationError,
    graph::{CaveGraph, GraphReport},
    hull::HullSet,
    phases::{graph_phase, hull_phase, segment_phase, tessellation_phase},
    segment::SegmentArena,
    tessellate::{HullMesh, LyonTessellator, Tessellator},
};

/// Summary of a finished pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationReport {
    pub seed: u64,
    pub nodes: usize,
    pub segments: usize,
    /// Outer hull plus inner hulls.
    pub hulls: usize,
    pub discarded_inner: usize,
    pub hit_inner_limit: bool,
    pub graph: GraphReport,
}

/// Everything one pass produced.
#[derive(Debug, Clone)]
pub struct Cave {
    pub config: CaveConfig,
    pub graph: CaveGraph,
    pub arena: SegmentArena,
    pub hulls: HullSet,
    pub meshes: Vec<HullMesh>,
    pub report: GenerationReport,
}

pub struct GenerationSession<T = LyonTessellator> {
    config: CaveConfig,
    rng: ChaCha8Rng,
    tessellator: T,
}

impl GenerationSession {
    /// Validates `config` and seeds the random stream from `config.seed`.
    pub fn new(config: CaveConfig) -> Result<Self, GenerationError> {
        Self::with_tessellator(config, LyonTessellator::default())
    }
}

impl<T: Tessellator> GenerationSession<T> {
    pub fn with_tessellator(config: CaveConfig, tessellator: T) -> Result<Self, GenerationError> {
        config.validate()?;
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            tessellator,
        })
    }

    pub fn config(&self) -> &CaveConfig {
        &self.config
    }

    /// Runs every phase in order.
    pub fn run(mut self) -> Result<Cave, GenerationError> {
        let cfg = &self.config;
        let seed = cfg.seed;

        let (graph, graph_report) = graph_phase(cfg, &mut self.rng);
        let arena = segment_phase(&graph, cfg, &mut self.rng);
        let hulls = hull_phase(&arena, cfg)
            .map_err(|source| GenerationError::OuterHullOpen { seed, source })?;
        let meshes = tessellation_phase(&hulls, cfg, &self.tessellator)?;

        let report = GenerationReport {
            seed,
            nodes: graph.nodes.len(),
            segments: arena.len(),
            hulls: hulls.count(),
            discarded_inner: hulls.discarded_inner,
            hit_inner_limit: hulls.hit_inner_limit,
            graph: graph_report,
        };
        info!(
            "generated cave for seed {seed}: {} nodes, {} segments, {} hulls",
            report.nodes, report.segments, report.hulls
        );

        Ok(Cave {
            config: self.config,
            graph,
            arena,
            hulls,
            meshes,
            report,
        })
    }
}

/// Runs one pass with the default tessellator.
pub fn generate(config: CaveConfig) -> Result<Cave, GenerationError> {
    GenerationSession::new(config)?.run()
}

/// Runs up to `attempts` passes, re-seeding with `seed + k` on the `k`-th
/// retry. Configuration errors are returned immediately.
pub fn generate_with_retry(config: CaveConfig, attempts: usize) -> Result<Cave, GenerationError> {
    let base = config.seed;
    let attempts = attempts.max(1);
    let mut attempt = 0;
    loop {
        let mut cfg = config.clone();
        cfg.seed = base.wrapping_add(attempt as u64);

        match generate(cfg) {
            Ok(cave) => return Ok(cave),
            Err(e) if e.is_seed_dependent() && attempt + 1 < attempts => {
                attempt += 1;
                warn!(
                    "generation failed ({e}), retrying with seed {} ({attempt}/{})",
                    base.wrapping_add(attempt as u64),
                    attempts - 1
                );
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ConfigError, curve::Curve, tessellate::HullKind};
    use glam::Vec2;

    fn straight_config() -> CaveConfig {
        let mut cfg = CaveConfig::default();
        cfg.seed = 1;
        cfg.max_branch_angle = 0.0;
        cfg.min_node_distance = 5.0;
        cfg.max_node_distance = 5.0;
        cfg.branch_distribution = Curve::constant(0.0);
        cfg
    }

    #[test]
    fn straight_corridor_end_to_end() {
        let cfg = straight_config();
        let v = cfg.vertices_per_segment;
        let cave = generate(cfg).expect("generates");

        assert_eq!(cave.report.nodes, 2);
        assert_eq!(cave.report.segments, 1);
        assert_eq!(cave.report.hulls, 1);

        let segment = cave.arena.segment(0);
        assert_eq!(segment.origin, Vec2::ZERO);
        assert!((segment.target - Vec2::new(5.0, 0.0)).length() < 1e-5);

        let mesh = cave.arena.mesh(0);
        assert_eq!(mesh.vertices.len(), 2 * v);
        for i in [0, v - 1] {
            assert!((mesh.vertices[i].y + mesh.vertices[i + v].y).abs() < 1e-5);
        }

        assert_eq!(cave.hulls.outer.len(), 2 * v);
        assert!(cave.hulls.outer.is_closed());
        let points: Vec<Vec2> = cave.hulls.outer.points().collect();
        for pair in points.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }

        let kinds: Vec<_> = cave.meshes.iter().map(|m| m.kind).collect();
        assert_eq!(kinds, vec![HullKind::Interior, HullKind::Rock]);
    }

    #[test]
    fn same_seed_generates_the_same_cave() {
        let mut cfg = CaveConfig::default();
        cfg.seed = 7;
        cfg.max_graph_length = 40.0;

        match (generate(cfg.clone()), generate(cfg)) {
            (Ok(a), Ok(b)) => {
                assert_eq!(a.report, b.report);
                assert_eq!(a.hulls.outer, b.hulls.outer);
                assert_eq!(a.hulls.inner, b.hulls.inner);
                assert_eq!(a.meshes, b.meshes);
                for ((_, ra), (_, rb)) in a.arena.iter().zip(b.arena.iter()) {
                    assert_eq!(ra.mesh, rb.mesh);
                }
            }
            (Err(a), Err(b)) => assert_eq!(a, b),
            _ => panic!("same seed gave different outcomes"),
        }
    }

    #[test]
    fn invalid_config_is_rejected_before_running() {
        let mut cfg = CaveConfig::default();
        cfg.vertices_per_segment = 1;

        assert!(matches!(
            GenerationSession::new(cfg.clone()),
            Err(GenerationError::Config(ConfigError::TooFewVertices(1)))
        ));
        assert!(matches!(
            generate_with_retry(cfg, 5),
            Err(GenerationError::Config(_))
        ));
    }

    #[test]
    fn retry_keeps_the_first_seed_that_works() {
        let cave = generate_with_retry(straight_config(), 3).expect("generates");
        assert_eq!(cave.report.seed, 1);
        assert_eq!(cave.config.seed, 1);
    }
}
