//! Keyframed Hermite curves.
//!
//! A [`Curve`] maps a time value onto a scalar by cubic Hermite
//! interpolation between sorted keyframes. Times before the first key or
//! after the last key evaluate to the value of that key.

use serde::{Deserialize, Serialize};

/// A single curve key with incoming and outgoing tangents.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: f32,
    #[serde(default)]
    pub out_tangent: f32,
}

impl Keyframe {
    /// Creates a key with flat (zero) tangents.
    pub fn flat(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
        }
    }

    pub fn with_tangents(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }
}

/// A piecewise cubic Hermite curve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "CurveKeys")]
pub struct Curve {
    keys: Vec<Keyframe>,
}

/// Serialized form of a [`Curve`]; loading goes through [`Curve::new`].
#[derive(Deserialize)]
struct CurveKeys {
    keys: Vec<Keyframe>,
}

impl From<CurveKeys> for Curve {
    fn from(raw: CurveKeys) -> Self {
        Self::new(raw.keys)
    }
}

impl Curve {
    /// Builds a curve from keys in any order; keys are sorted by time.
    pub fn new(mut keys: Vec<Keyframe>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    /// A curve that evaluates to `value` everywhere.
    pub fn constant(value: f32) -> Self {
        Self::new(vec![Keyframe::flat(0.0, value)])
    }

    /// A straight line from `(0, start)` to `(1, end)`.
    pub fn linear(start: f32, end: f32) -> Self {
        let slope = end - start;
        Self::new(vec![
            Keyframe::with_tangents(0.0, start, slope, slope),
            Keyframe::with_tangents(1.0, end, slope, slope),
        ])
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Evaluates the curve at `t`.
    ///
    /// An empty curve evaluates to `0.0`.
    pub fn evaluate(&self, t: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        // First key strictly after t; guaranteed to exist and be > 0 here.
        let upper = self.keys.partition_point(|k| k.time <= t);
        let a = &self.keys[upper - 1];
        let b = &self.keys[upper];

        let dt = b.time - a.time;
        if dt <= f32::EPSILON {
            return b.value;
        }
        let s = (t - a.time) / dt;
        let s2 = s * s;
        let s3 = s2 * s;

        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;

        h00 * a.value + h10 * dt * a.out_tangent + h01 * b.value + h11 * dt * b.in_tangent
    }
}

impl Default for Curve {
    /// Falls off linearly from one branch-weight at the root to none at the
    /// far end of the graph.
    fn default() -> Self {
        Self::linear(1.0, 0.0)
    }
}
