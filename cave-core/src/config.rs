use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::curve::Curve;

/// Axis-aligned rectangle used as the outer boundary when tessellating the
/// rock surrounding the cave.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnclosingRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl EnclosingRect {
    /// Rock outline in counter-clockwise order, ending at the top-right.
    ///
    /// The left edge stops at the height of the cave entrance (`y = 0`,
    /// clamped into the rectangle) instead of the top-left corner. Joined to
    /// the outer hull this leaves the surface above the entrance open.
    pub fn outline(&self) -> [Vec2; 4] {
        [
            Vec2::new(self.min.x, 0.0_f32.clamp(self.min.y, self.max.y)),
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
        ]
    }
}

impl Default for EnclosingRect {
    fn default() -> Self {
        Self {
            min: Vec2::new(-200.0, -300.0),
            max: Vec2::new(300.0, 200.0),
        }
    }
}

/// All knobs of one generation pass.
///
/// Angles are in degrees, distances in world units. `force_branch_distance`
/// is compared against the normalized x-progress of a node (`0..=1`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaveConfig {
    pub seed: u64,

    pub max_branch_angle: f32,
    pub minimum_angle_difference: f32,
    pub min_node_distance: f32,
    pub max_node_distance: f32,
    pub max_graph_length: f32,
    pub branch_distribution: Curve,
    pub branch_variance: f32,
    pub force_branch_distance: f32,
    pub node_merge_threshold: f32,
    pub graph_iteration_limit: usize,

    pub cave_width: f32,
    pub segment_overlap: f32,
    pub vertices_per_segment: usize,
    pub uv_tiling: f32,

    pub iteration_limit: usize,
    pub enclosing_rect: EnclosingRect,
}

impl Default for CaveConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            max_branch_angle: 60.0,
            minimum_angle_difference: 15.0,
            min_node_distance: 5.0,
            max_node_distance: 10.0,
            max_graph_length: 100.0,
            branch_distribution: Curve::default(),
            branch_variance: 1.5,
            force_branch_distance: 0.2,
            node_merge_threshold: 1.0,
            graph_iteration_limit: 10_000,
            cave_width: 2.0,
            segment_overlap: 0.5,
            vertices_per_segment: 10,
            uv_tiling: 5.0,
            iteration_limit: 1500,
            enclosing_rect: EnclosingRect::default(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("vertices_per_segment must be at least 2, got {0}")]
    TooFewVertices(usize),
    #[error("node distance range is invalid: min {min} > max {max}")]
    NodeDistanceRange { min: f32, max: f32 },
    #[error("`{name}` must be a finite, non-negative number, got {value}")]
    Negative { name: &'static str, value: f32 },
    #[error("`{name}` must be strictly positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("enclosing rectangle is empty")]
    EmptyEnclosingRect,
    #[error("could not parse configuration: {0}")]
    Parse(String),
    #[error("could not serialize configuration: {0}")]
    Serialize(String),
}

impl CaveConfig {
    /// Checks every value a generation pass relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vertices_per_segment < 2 {
            return Err(ConfigError::TooFewVertices(self.vertices_per_segment));
        }

        for (name, value) in [
            ("max_branch_angle", self.max_branch_angle),
            ("minimum_angle_difference", self.minimum_angle_difference),
            ("min_node_distance", self.min_node_distance),
            ("branch_variance", self.branch_variance),
            ("force_branch_distance", self.force_branch_distance),
            ("node_merge_threshold", self.node_merge_threshold),
            ("segment_overlap", self.segment_overlap),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Negative { name, value });
            }
        }

        for (name, value) in [
            ("max_node_distance", self.max_node_distance),
            ("max_graph_length", self.max_graph_length),
            ("cave_width", self.cave_width),
            ("uv_tiling", self.uv_tiling),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NotPositive { name, value });
            }
        }

        for (name, limit) in [
            ("graph_iteration_limit", self.graph_iteration_limit),
            ("iteration_limit", self.iteration_limit),
        ] {
            if limit == 0 {
                return Err(ConfigError::NotPositive { name, value: 0.0 });
            }
        }

        if self.min_node_distance > self.max_node_distance {
            return Err(ConfigError::NodeDistanceRange {
                min: self.min_node_distance,
                max: self.max_node_distance,
            });
        }

        let rect = &self.enclosing_rect;
        if rect.min.x >= rect.max.x || rect.min.y >= rect.max.y {
            return Err(ConfigError::EmptyEnclosingRect);
        }

        Ok(())
    }

    /// Parses a configuration from RON. Missing fields take their defaults.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}
