//! Branching tunnel graph.
//!
//! [`CaveGraph`] is a node arena (like a plain tree) plus the list of
//! [`NodeConnection`]s recorded while the graph was grown. [`build_graph`]
//! grows one from a seeded RNG; see its docs for the branching rules.

use std::collections::VecDeque;

use glam::Vec2;
use log::{debug, warn};
use rand::Rng;

use crate::{
    config::CaveConfig,
    geometry::{line_intersection, rotate, unsigned_angle},
    types::NodeId,
};

/// Resample budget for an angle that sits too close to a sibling.
const ANGLE_ATTEMPTS: usize = 10;
/// Retry budget for the last branch slot of a node that must branch.
const FORCE_BRANCH_RETRIES: usize = 10;
/// Sampled branch values below this produce no branch.
const BRANCH_CUTOFF: f32 = 0.333;

#[derive(Debug, Clone)]
pub struct GraphNode {
    pub pos: Vec2,
}

/// One processed origin and the targets its branches reached, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConnection {
    pub origin: NodeId,
    pub targets: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct CaveGraph {
    pub nodes: Vec<GraphNode>,
    pub connections: Vec<NodeConnection>,
}

/// What happened while growing a graph.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GraphReport {
    /// Number of origins taken off the work queue.
    pub processed: usize,
    /// The graph iteration cap stopped growth with work still queued.
    pub hit_iteration_limit: bool,
    /// Rotation applied to the finished tree, in degrees.
    pub rotation: f32,
    /// Accepted branches whose angle still sat too close to a sibling after
    /// every resample.
    pub crowded_angles: usize,
}

impl CaveGraph {
    pub fn new(root_pos: Vec2) -> Self {
        Self {
            nodes: vec![GraphNode { pos: root_pos }],
            connections: Vec::new(),
        }
    }

    /// Appends a node and returns its id. The edge itself is recorded by
    /// the caller's [`NodeConnection`].
    pub fn add_node(&mut self, pos: Vec2) -> NodeId {
        let id: usize = self.nodes.len();
        self.nodes.push(GraphNode { pos });
        id
    }

    #[inline]
    pub fn pos(&self, id: NodeId) -> Vec2 {
        self.nodes[id].pos
    }

    /// All edges `(origin, target)` in connection order, then target order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.connections
            .iter()
            .flat_map(|c| c.targets.iter().map(move |&t| (c.origin, t)))
    }

    pub fn edge_count(&self) -> usize {
        self.connections.iter().map(|c| c.targets.len()).sum()
    }

    /// Largest unsigned angle (degrees) between +X and any connection origin.
    pub fn max_origin_angle(&self) -> Option<f32> {
        self.connections
            .iter()
            .map(|c| unsigned_angle(Vec2::X, self.pos(c.origin)))
            .max_by(|a, b| a.total_cmp(b))
    }

    /// Rotates every node about the world origin.
    pub fn rotate_all(&mut self, degrees: f32) {
        for node in &mut self.nodes {
            node.pos = rotate(node.pos, degrees);
        }
    }

    /// Nearest point where `origin → target` crosses a recorded edge.
    ///
    /// Connections whose origin is more than `2 * window` away along x are
    /// skipped, as is the edge that ends at `origin`.
    pub fn nearest_crossing(&self, origin: NodeId, target: Vec2, window: f32) -> Option<Vec2> {
        let origin_pos = self.pos(origin);
        let mut best: Option<(Vec2, f32)> = None;

        for connection in &self.connections {
            let conn_pos = self.pos(connection.origin);
            if conn_pos.x + 2.0 * window <= origin_pos.x || origin_pos.x + 2.0 * window < conn_pos.x {
                continue;
            }

            for &conn_target in &connection.targets {
                if conn_target == origin {
                    continue;
                }

                let Some(hit) = line_intersection(origin_pos, target, conn_pos, self.pos(conn_target))
                else {
                    continue;
                };

                let dist = hit.distance(origin_pos);
                if best.is_none_or(|(_, d)| dist <= d) {
                    best = Some((hit, dist));
                }
            }
        }

        best.map(|(hit, _)| hit)
    }
}

/// Number of branches to grow from a node at normalized x-progress `x_delta`.
///
/// The root (`x_delta == 0`) always gets exactly one branch. Elsewhere the
/// count is sampled from `[0, variance * distribution(x_delta)]` and rounded
/// up, with small values cut to zero; nodes closer than the force-branch
/// distance are bumped from zero to one.
pub fn branch_count(cfg: &CaveConfig, x_delta: f32, rng: &mut impl Rng) -> usize {
    if x_delta == 0.0 {
        return 1;
    }

    let average = cfg.branch_variance * cfg.branch_distribution.evaluate(x_delta);
    if !(average > 0.0) {
        return 0;
    }

    let sampled = rng.random_range(0.0..=average);
    let branches = if sampled < BRANCH_CUTOFF {
        0
    } else {
        sampled.ceil() as usize
    };

    if x_delta < cfg.force_branch_distance && branches == 0 {
        return 1;
    }
    branches
}

fn has_conflicting_angle(angles: &[f32], angle: f32, min_difference: f32) -> bool {
    angles.iter().any(|a| (angle - a).abs() < min_difference)
}

/// Samples a branch angle, resampling a bounded number of times while it is
/// too close to an already accepted sibling.
///
/// Returns the angle and the number of draws spent. When every draw
/// conflicts the last one is returned with `ANGLE_ATTEMPTS` draws spent.
fn sample_angle(cfg: &CaveConfig, siblings: &[f32], rng: &mut impl Rng) -> (f32, usize) {
    let mut angle = 0.0;
    for attempt in 1..=ANGLE_ATTEMPTS {
        angle = rng.random_range(-cfg.max_branch_angle..=cfg.max_branch_angle);
        if !has_conflicting_angle(siblings, angle, cfg.minimum_angle_difference) {
            return (angle, attempt);
        }
    }
    (angle, ANGLE_ATTEMPTS)
}

/// Grows a cave graph from the origin.
///
/// Origins are processed first-in first-out. Each branch slot samples a
/// length and an angle, rotates the length vector and tests the candidate
/// edge against every recorded edge. A crossing close to the candidate
/// target snaps the target onto it; any other crossing drops the branch,
/// except for the last slot of a near-root node that has no branch yet,
/// which is retried a bounded number of times.
///
/// Finally the whole tree is rotated clockwise by the largest angle any
/// origin makes with +X, so the cave trends downward from the root.
pub fn build_graph(cfg: &CaveConfig, rng: &mut impl Rng) -> (CaveGraph, GraphReport) {
    let mut graph = CaveGraph::new(Vec2::ZERO);
    let mut report = GraphReport::default();
    let mut queue: VecDeque<NodeId> = VecDeque::from([0]);

    while let Some(origin) = queue.pop_front() {
        if report.processed >= cfg.graph_iteration_limit {
            warn!(
                "graph growth stopped at the iteration limit ({}), {} origins left unprocessed",
                cfg.graph_iteration_limit,
                queue.len() + 1
            );
            report.hit_iteration_limit = true;
            break;
        }
        report.processed += 1;

        let origin_pos = graph.pos(origin);
        let x_delta = (origin_pos.x / cfg.max_graph_length).clamp(0.0, 1.0);

        let branches = branch_count(cfg, x_delta, rng);
        if branches == 0 {
            continue;
        }

        let mut angles = Vec::with_capacity(branches);
        let mut targets = Vec::with_capacity(branches);
        let mut retries = 0;
        let mut slot = 0;
        while slot < branches {
            let length = rng.random_range(cfg.min_node_distance..=cfg.max_node_distance);
            let (angle, _) = sample_angle(cfg, &angles, rng);

            let mut target = origin_pos + rotate(Vec2::new(length, 0.0), angle);
            let mut crossing = graph.nearest_crossing(origin, target, cfg.max_node_distance);
            if let Some(hit) = crossing
                && hit.distance(target) < cfg.node_merge_threshold
            {
                target = hit;
                crossing = None;
            }

            if crossing.is_some() {
                let must_branch = targets.is_empty()
                    && x_delta < cfg.force_branch_distance
                    && slot == branches - 1;
                if must_branch && retries < FORCE_BRANCH_RETRIES {
                    retries += 1;
                } else {
                    slot += 1;
                }
                continue;
            }

            if has_conflicting_angle(&angles, angle, cfg.minimum_angle_difference) {
                debug!("branch {slot} of node {origin} kept a crowded angle ({angle:.1})");
                report.crowded_angles += 1;
            }
            let id = graph.add_node(target);
            targets.push(id);
            angles.push(angle);
            queue.push_back(id);
            retries = 0;
            slot += 1;
        }

        graph.connections.push(NodeConnection { origin, targets });
    }

    if let Some(rotation) = graph.max_origin_angle()
        && rotation > 0.0
    {
        graph.rotate_all(-rotation);
        report.rotation = rotation;
    }

    debug!(
        "grew cave graph: {} nodes, {} edges, {} origins processed",
        graph.nodes.len(),
        graph.edge_count(),
        report.processed
    );

    (graph, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Curve;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn straight_config() -> CaveConfig {
        let mut cfg = CaveConfig::default();
        cfg.max_branch_angle = 0.0;
        cfg.min_node_distance = 5.0;
        cfg.max_node_distance = 5.0;
        cfg.branch_distribution = Curve::constant(0.0);
        cfg
    }

    #[test]
    fn root_always_gets_one_branch() {
        let cfg = CaveConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..20 {
            assert_eq!(branch_count(&cfg, 0.0, &mut rng), 1);
        }
    }

    #[test]
    fn zero_distribution_yields_no_branches_away_from_root() {
        let cfg = straight_config();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(branch_count(&cfg, 0.05, &mut rng), 0);
        assert_eq!(branch_count(&cfg, 0.9, &mut rng), 0);
    }

    #[test]
    fn force_branch_distance_bumps_zero_to_one() {
        let mut cfg = CaveConfig::default();
        // Tiny average: the sample is always below the cutoff.
        cfg.branch_distribution = Curve::constant(0.01);
        cfg.branch_variance = 1.0;
        cfg.force_branch_distance = 0.5;
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        assert_eq!(branch_count(&cfg, 0.1, &mut rng), 1);
        assert_eq!(branch_count(&cfg, 0.9, &mut rng), 0);
    }

    #[test]
    fn conflicting_angles_are_detected() {
        assert!(has_conflicting_angle(&[10.0, -20.0], 15.0, 15.0));
        assert!(!has_conflicting_angle(&[10.0, -20.0], 25.0, 15.0));
        assert!(!has_conflicting_angle(&[], 0.0, 15.0));
    }

    #[test]
    fn straight_single_branch_scenario() {
        let cfg = straight_config();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let (graph, report) = build_graph(&cfg, &mut rng);

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.connections.len(), 1);
        assert_eq!(graph.connections[0].targets, vec![1]);
        assert!((graph.pos(1) - Vec2::new(5.0, 0.0)).length() < 1e-5);
        assert!(!report.hit_iteration_limit);
        assert_eq!(report.rotation, 0.0);
    }

    #[test]
    fn degenerate_distribution_terminates_after_forced_branch() {
        let mut cfg = CaveConfig::default();
        cfg.branch_distribution = Curve::constant(0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let (graph, report) = build_graph(&cfg, &mut rng);

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(report.processed, 2);
        assert!(!report.hit_iteration_limit);
    }

    #[test]
    fn iteration_limit_is_reported_not_fatal() {
        let mut cfg = CaveConfig::default();
        cfg.branch_distribution = Curve::constant(1.0);
        cfg.graph_iteration_limit = 3;
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let (graph, report) = build_graph(&cfg, &mut rng);

        assert_eq!(report.processed, 3);
        assert!(report.hit_iteration_limit);
        assert!(graph.nodes.len() >= 2);
    }

    #[test]
    fn forks_that_cannot_spread_are_counted_as_crowded() {
        let mut cfg = CaveConfig::default();
        // Wider than the whole sampling range: every second sibling conflicts.
        cfg.minimum_angle_difference = 150.0;
        cfg.branch_distribution = Curve::constant(1.0);
        cfg.branch_variance = 3.0;
        cfg.graph_iteration_limit = 30;
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let (graph, report) = build_graph(&cfg, &mut rng);

        let forks = graph.connections.iter().filter(|c| c.targets.len() > 1).count();
        assert!(forks > 0);
        let extra: usize = graph
            .connections
            .iter()
            .map(|c| c.targets.len().saturating_sub(1))
            .sum();
        assert_eq!(report.crowded_angles, extra);
    }

    #[test]
    fn nearest_crossing_prefers_the_hit_closest_to_origin() {
        let mut graph = CaveGraph::new(Vec2::ZERO);
        let a = graph.add_node(Vec2::new(4.0, 0.0));
        let b = graph.add_node(Vec2::new(4.0, 8.0));
        let c = graph.add_node(Vec2::new(8.0, -4.0));
        let d = graph.add_node(Vec2::new(8.0, 8.0));
        graph.connections.push(NodeConnection { origin: 0, targets: vec![a, c] });
        graph.connections.push(NodeConnection { origin: a, targets: vec![b] });
        graph.connections.push(NodeConnection { origin: c, targets: vec![d] });

        // From (0, 2) heading right crosses x = 4 before x = 8.
        let start = graph.add_node(Vec2::new(0.0, 2.0));
        let hit = graph
            .nearest_crossing(start, Vec2::new(10.0, 2.0), 10.0)
            .expect("crosses two edges");
        assert!((hit - Vec2::new(4.0, 2.0)).length() < 1e-5);
    }

    #[test]
    fn same_seed_grows_the_same_graph() {
        let cfg = CaveConfig::default();
        let (a, _) = build_graph(&cfg, &mut ChaCha8Rng::seed_from_u64(77));
        let (b, _) = build_graph(&cfg, &mut ChaCha8Rng::seed_from_u64(77));

        assert_eq!(a.connections, b.connections);
        assert_eq!(a.nodes.len(), b.nodes.len());
        for (na, nb) in a.nodes.iter().zip(&b.nodes) {
            assert_eq!(na.pos, nb.pos);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn graph_is_a_tree(seed in any::<u64>()) {
            let cfg = CaveConfig::default();
            let (graph, _) = build_graph(&cfg, &mut ChaCha8Rng::seed_from_u64(seed));

            let mut incoming = vec![0usize; graph.nodes.len()];
            for (_, target) in graph.edges() {
                incoming[target] += 1;
            }
            prop_assert_eq!(incoming[0], 0);
            for &count in &incoming[1..] {
                prop_assert_eq!(count, 1);
            }

            let mut seen_origin = vec![false; graph.nodes.len()];
            for connection in &graph.connections {
                prop_assert!(!seen_origin[connection.origin]);
                seen_origin[connection.origin] = true;
            }
        }

        #[test]
        fn sampled_angle_is_clear_unless_attempts_ran_out(seed in any::<u64>()) {
            let cfg = CaveConfig::default();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);

            let (angle, attempts) = sample_angle(&cfg, &[-40.0, 0.0, 40.0], &mut rng);
            prop_assert!(angle.abs() <= cfg.max_branch_angle);
            prop_assert!((1..=ANGLE_ATTEMPTS).contains(&attempts));
            prop_assert!(
                !has_conflicting_angle(&[-40.0, 0.0, 40.0], angle, cfg.minimum_angle_difference)
                    || attempts == ANGLE_ATTEMPTS
            );
        }

        #[test]
        fn grown_siblings_keep_their_angular_spacing(seed in any::<u64>()) {
            let mut cfg = CaveConfig::default();
            // No snapping, so each edge keeps its sampled direction.
            cfg.node_merge_threshold = 0.0;
            cfg.branch_variance = 2.0;
            let (graph, report) = build_graph(&cfg, &mut ChaCha8Rng::seed_from_u64(seed));
            prop_assume!(report.crowded_angles == 0);

            for connection in &graph.connections {
                let origin = graph.pos(connection.origin);
                let dirs: Vec<Vec2> = connection
                    .targets
                    .iter()
                    .map(|&t| graph.pos(t) - origin)
                    .collect();
                for (i, a) in dirs.iter().enumerate() {
                    for b in &dirs[i + 1..] {
                        let spread = a.angle_to(*b).to_degrees().abs();
                        prop_assert!(
                            spread >= cfg.minimum_angle_difference - 1e-2,
                            "siblings of node {} only {spread} degrees apart",
                            connection.origin
                        );
                    }
                }
            }
        }
    }
}
