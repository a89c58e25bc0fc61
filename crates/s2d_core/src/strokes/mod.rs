//! Classic (non-AI) stroke tweening between two keyed drawing frames.
//!
//! Strokes pair by index and so do their points; whatever one side has in
//! surplus is dropped from the in-betweens.

mod easing;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use easing::Easing;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrokeError {
    #[error("Steps must be at least 1")]
    InvalidSteps,

    #[error("Frames must be consecutive keys (got {first} and {second})")]
    NotAdjacent { first: i32, second: i32 },

    #[error("{steps} in-betweens after frame {first} run past the last frame number")]
    FrameOverflow { first: i32, steps: u32 },
}

/// A single stroke sample.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StrokePoint {
    pub co: [f32; 3],
    pub pressure: f32,
    pub strength: f32,
}

impl StrokePoint {
    pub fn new(co: [f32; 3], pressure: f32, strength: f32) -> Self {
        Self {
            co,
            pressure,
            strength,
        }
    }

    fn lerp(&self, other: &StrokePoint, t: f32) -> StrokePoint {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        StrokePoint {
            co: [
                mix(self.co[0], other.co[0]),
                mix(self.co[1], other.co[1]),
                mix(self.co[2], other.co[2]),
            ],
            pressure: mix(self.pressure, other.pressure),
            strength: mix(self.strength, other.strength),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Stroke {
    pub points: Vec<StrokePoint>,
}

impl Stroke {
    pub fn new(points: Vec<StrokePoint>) -> Self {
        Self { points }
    }
}

/// Strokes keyed on one frame of a drawing layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DrawingFrame {
    pub frame_number: i32,
    pub strokes: Vec<Stroke>,
}

impl DrawingFrame {
    pub fn new(frame_number: i32, strokes: Vec<Stroke>) -> Self {
        Self {
            frame_number,
            strokes,
        }
    }
}

/// A generated in-between frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweenFrame {
    pub frame_number: i32,
    /// Eased interpolation factor the frame was built with.
    pub factor: f32,
    pub strokes: Vec<Stroke>,
}

/// Build `steps` in-betweens for the keys at `n` and `n + 1`.
///
/// In-between `k` (1-based) is numbered `n + k` and sampled at
/// `k / (steps + 1)` before easing.
pub fn interpolate(
    first: &DrawingFrame,
    second: &DrawingFrame,
    steps: u32,
    easing: Easing,
) -> Result<Vec<TweenFrame>, StrokeError> {
    if steps == 0 {
        return Err(StrokeError::InvalidSteps);
    }
    if first.frame_number.checked_add(1) != Some(second.frame_number) {
        return Err(StrokeError::NotAdjacent {
            first: first.frame_number,
            second: second.frame_number,
        });
    }

    let overflow = StrokeError::FrameOverflow {
        first: first.frame_number,
        steps,
    };
    let span = i32::try_from(steps).map_err(|_| overflow.clone())?;
    if first.frame_number.checked_add(span).is_none() {
        return Err(overflow);
    }

    let frames = (1..=span)
        .map(|step| {
            let factor = easing.apply(step as f32 / (span as f32 + 1.0));
            let strokes = first
                .strokes
                .iter()
                .zip(&second.strokes)
                .map(|(a, b)| {
                    Stroke::new(
                        a.points
                            .iter()
                            .zip(&b.points)
                            .map(|(p, q)| p.lerp(q, factor))
                            .collect(),
                    )
                })
                .collect();
            TweenFrame {
                frame_number: first.frame_number + step,
                factor,
                strokes,
            }
        })
        .collect();

    tracing::debug!(
        "Tweened {} frames after {} ({})",
        steps,
        first.frame_number,
        easing
    );
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(frame: i32, x: f32, pressure: f32) -> DrawingFrame {
        DrawingFrame::new(
            frame,
            vec![Stroke::new(vec![
                StrokePoint::new([x, 0.0, 0.0], pressure, 1.0),
                StrokePoint::new([x, 1.0, 0.0], pressure, 0.5),
            ])],
        )
    }

    #[test]
    fn linear_in_betweens() {
        let frames = interpolate(&key(10, 0.0, 0.0), &key(11, 4.0, 1.0), 3, Easing::Linear).unwrap();

        assert_eq!(frames.len(), 3);
        assert_eq!(
            frames.iter().map(|f| f.frame_number).collect::<Vec<_>>(),
            vec![11, 12, 13]
        );
        let mid = &frames[1].strokes[0].points[0];
        assert!((mid.co[0] - 2.0).abs() < 1e-5);
        assert!((mid.pressure - 0.5).abs() < 1e-5);
        assert!((frames[0].factor - 0.25).abs() < 1e-6);
    }

    #[test]
    fn easing_shapes_factor() {
        let frames = interpolate(&key(1, 0.0, 0.0), &key(2, 1.0, 0.0), 3, Easing::Cubic).unwrap();
        assert!(frames[0].factor < 0.25);
        assert!((frames[1].factor - 0.5).abs() < 1e-5);
    }

    #[test]
    fn surplus_strokes_and_points_are_dropped() {
        let mut first = key(1, 0.0, 0.0);
        first.strokes.push(Stroke::new(vec![StrokePoint::default()]));
        let mut second = key(2, 2.0, 0.0);
        second.strokes[0].points.truncate(1);

        let frames = interpolate(&first, &second, 1, Easing::Linear).unwrap();

        assert_eq!(frames[0].strokes.len(), 1);
        assert_eq!(frames[0].strokes[0].points.len(), 1);
    }

    #[test]
    fn rejects_zero_steps_and_gaps() {
        assert_eq!(
            interpolate(&key(1, 0.0, 0.0), &key(2, 0.0, 0.0), 0, Easing::Linear),
            Err(StrokeError::InvalidSteps)
        );
        assert!(matches!(
            interpolate(&key(1, 0.0, 0.0), &key(5, 0.0, 0.0), 2, Easing::Linear),
            Err(StrokeError::NotAdjacent { .. })
        ));
        assert!(matches!(
            interpolate(&key(i32::MAX, 0.0, 0.0), &key(i32::MIN, 0.0, 0.0), 1, Easing::Linear),
            Err(StrokeError::NotAdjacent { .. })
        ));
    }

    #[test]
    fn frame_numbers_past_i32_max_are_rejected() {
        assert_eq!(
            interpolate(&key(i32::MAX - 2, 0.0, 0.0), &key(i32::MAX - 1, 1.0, 0.0), 4, Easing::Linear),
            Err(StrokeError::FrameOverflow {
                first: i32::MAX - 2,
                steps: 4
            })
        );
        assert!(matches!(
            interpolate(&key(1, 0.0, 0.0), &key(2, 1.0, 0.0), u32::MAX, Easing::Linear),
            Err(StrokeError::FrameOverflow { .. })
        ));

        let last = interpolate(&key(i32::MAX - 2, 0.0, 0.0), &key(i32::MAX - 1, 1.0, 0.0), 2, Easing::Linear)
            .unwrap();
        assert_eq!(last[1].frame_number, i32::MAX);
    }
}
