//! Two-finger pinch/twist interpretation.
//!
//! A gesture is anchored on its first usable two-finger move: the distance and
//! angle between the touches at that moment become the reference for every
//! later move. Scale is multiplicative against the anchor distance and rotation
//! is additive against the anchor angle, so the result depends only on the
//! anchor and the latest sample, never on how many moves happened in between.

use crate::constants::MIN_ANCHOR_DISTANCE_PX;
use glam::Vec2;

/// Uniform scale plus rotation about the vertical axis (radians).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub scale: f32,
    pub rotation: f32,
}

impl Transform {
    pub const fn new(scale: f32, rotation: f32) -> Self {
        Self { scale, rotation }
    }
}

/// Two simultaneous touch positions in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureSample {
    pub a: Vec2,
    pub b: Vec2,
}

impl GestureSample {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    /// Builds a sample only when exactly two touches are active.
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        match points {
            [a, b] => Some(Self::new(*a, *b)),
            _ => None,
        }
    }

    #[inline]
    pub fn distance(&self) -> f32 {
        self.a.distance(self.b)
    }

    #[inline]
    pub fn angle(&self) -> f32 {
        let d = self.b - self.a;
        d.y.atan2(d.x)
    }
}

/// Distance and angle captured at the first move of a gesture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureAnchor {
    pub distance: f32,
    pub angle: f32,
}

impl GestureAnchor {
    fn from_sample(sample: &GestureSample) -> Option<Self> {
        let distance = sample.distance();
        if !distance.is_finite() || distance < MIN_ANCHOR_DISTANCE_PX {
            return None;
        }
        Some(Self {
            distance,
            angle: sample.angle(),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleLimits {
    pub min: f32,
    pub max: f32,
}

impl ScaleLimits {
    #[inline]
    pub fn clamp(&self, scale: f32) -> f32 {
        scale.clamp(self.min, self.max)
    }
}

/// Computes the transform for `sample` relative to `anchor`.
///
/// When `anchor` is `None` the sample itself becomes the anchor and the
/// committed transform is returned unchanged. Returns `None` if no anchor
/// exists and the sample is too degenerate to become one.
pub fn interpret(
    anchor: Option<GestureAnchor>,
    sample: &GestureSample,
    committed: Transform,
    limits: ScaleLimits,
) -> Option<(Transform, GestureAnchor)> {
    let anchor = match anchor {
        Some(a) => a,
        None => {
            let a = GestureAnchor::from_sample(sample)?;
            return Some((Transform::new(limits.clamp(committed.scale), committed.rotation), a));
        }
    };
    let ratio = sample.distance() / anchor.distance;
    let scale = limits.clamp(committed.scale * ratio);
    let rotation = committed.rotation + (sample.angle() - anchor.angle);
    Some((Transform::new(scale, rotation), anchor))
}

/// Per-gesture state: the anchor and the live (uncommitted) transform.
#[derive(Clone, Debug)]
pub struct GestureTracker {
    anchor: Option<GestureAnchor>,
    live: Option<Transform>,
    limits: ScaleLimits,
}

impl GestureTracker {
    pub fn new(limits: ScaleLimits) -> Self {
        Self {
            anchor: None,
            live: None,
            limits,
        }
    }

    pub fn anchor(&self) -> Option<GestureAnchor> {
        self.anchor
    }

    pub fn live(&self) -> Option<Transform> {
        self.live
    }

    pub fn is_anchored(&self) -> bool {
        self.anchor.is_some()
    }

    /// Feeds one touch-move. Anything other than exactly two touches freezes
    /// the gesture: no update, anchor kept for when two fingers return.
    pub fn on_move(&mut self, points: &[Vec2], committed: Transform) -> Option<Transform> {
        let sample = GestureSample::from_points(points)?;
        let (next, anchor) = interpret(self.anchor, &sample, committed, self.limits)?;
        if self.anchor.is_none() {
            log::debug!(
                "[gesture] anchored dist={:.1} angle={:.3}",
                anchor.distance,
                anchor.angle
            );
        }
        self.anchor = Some(anchor);
        self.live = Some(next);
        Some(next)
    }

    /// Ends the gesture and returns the transform to commit, if any move was
    /// interpreted since the anchor was set.
    pub fn on_end(&mut self) -> Option<Transform> {
        self.anchor = None;
        self.live.take()
    }

    /// Aborts the gesture without committing.
    pub fn on_cancel(&mut self) {
        self.anchor = None;
        self.live = None;
    }
}
