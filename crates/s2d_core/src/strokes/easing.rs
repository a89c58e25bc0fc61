//! Easing curves for stroke tweening.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// Control points of the host's default Bezier ease (ease-in-out).
const BEZIER_CONTROLS: [f32; 4] = [0.42, 0.0, 0.58, 1.0];

/// Timing curve applied to the interpolation factor.
///
/// Every non-linear variant eases in and out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Easing {
    #[default]
    Linear,
    Bezier,
    Sine,
    Quad,
    Cubic,
    Quart,
    Quint,
}

impl Easing {
    pub const ALL: [Easing; 7] = [
        Easing::Linear,
        Easing::Bezier,
        Easing::Sine,
        Easing::Quad,
        Easing::Cubic,
        Easing::Quart,
        Easing::Quint,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Easing::Linear => "LINEAR",
            Easing::Bezier => "BEZIER",
            Easing::Sine => "SINE",
            Easing::Quad => "QUAD",
            Easing::Cubic => "CUBIC",
            Easing::Quart => "QUART",
            Easing::Quint => "QUINT",
        }
    }

    /// Map `t` in `[0, 1]` to the eased factor. Input is clamped.
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Bezier => {
                let [x1, y1, x2, y2] = BEZIER_CONTROLS;
                bezier_ease_t(t, x1, y1, x2, y2)
            }
            Easing::Sine => -((PI * t).cos() - 1.0) / 2.0,
            Easing::Quad => in_out_pow(t, 2),
            Easing::Cubic => in_out_pow(t, 3),
            Easing::Quart => in_out_pow(t, 4),
            Easing::Quint => in_out_pow(t, 5),
        }
    }
}

impl std::fmt::Display for Easing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[inline]
fn in_out_pow(t: f32, power: i32) -> f32 {
    if t < 0.5 {
        2f32.powi(power - 1) * t.powi(power)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(power) / 2.0
    }
}

#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Eased y for input x = `t`, inverting the x polynomial by bisection.
fn bezier_ease_t(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    let mut mid = t;
    for _ in 0..24 {
        let x = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(0.0, y1, y2, 1.0, mid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn endpoints_and_midpoint_are_fixed() {
        for easing in Easing::ALL {
            assert!(approx(easing.apply(0.0), 0.0), "{} at 0", easing);
            assert!(approx(easing.apply(1.0), 1.0), "{} at 1", easing);
            assert!(approx(easing.apply(0.5), 0.5), "{} at 0.5", easing);
        }
    }

    #[test]
    fn in_out_curves_start_slow() {
        for easing in &Easing::ALL[1..] {
            assert!(easing.apply(0.25) < 0.25, "{}", easing);
            assert!(easing.apply(0.75) > 0.75, "{}", easing);
        }
        assert!(approx(Easing::Quad.apply(0.25), 0.125));
        assert!(approx(Easing::Cubic.apply(0.25), 0.0625));
    }

    #[test]
    fn monotonic() {
        for easing in Easing::ALL {
            let mut prev = 0.0;
            for i in 1..=20 {
                let v = easing.apply(i as f32 / 20.0);
                assert!(v >= prev - 1e-6, "{} not monotonic", easing);
                prev = v;
            }
        }
    }

    #[test]
    fn parses_host_identifiers() {
        let e: Easing = serde_json::from_str("\"QUART\"").unwrap();
        assert_eq!(e, Easing::Quart);
        assert_eq!(Easing::default(), Easing::Linear);
    }
}
