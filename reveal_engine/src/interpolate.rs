// Values that can be linearly interpolated.
//
// Uses the `a * (1 - t) + b * t` form so both endpoints are reproduced
// exactly, which the runner relies on for its end-state guarantee.

use crate::types::VisualState;

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone {
    /// Interpolate between self and other by factor t (0.0 to 1.0)
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self * (1.0 - t) + other * t
    }
}

impl Interpolate for f64 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        let t = t as f64;
        self * (1.0 - t) + other * t
    }
}

impl Interpolate for VisualState {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        VisualState {
            offset_x: self.offset_x.lerp(&other.offset_x, t),
            offset_y: self.offset_y.lerp(&other.offset_y, t),
            opacity: self.opacity.lerp(&other.opacity, t),
            scale: self.scale.lerp(&other.scale, t),
        }
        .clamped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn visual_state_midpoint() {
        let from = VisualState::natural().with_y(40.0).with_opacity(0.0);
        let mid = from.lerp(&VisualState::natural(), 0.5);
        assert_eq!(mid.offset_y, 20.0);
        assert_eq!(mid.opacity, 0.5);
        assert_eq!(mid.scale, 1.0);
    }

    #[test]
    fn overshoot_keeps_opacity_in_range() {
        let from = VisualState::natural().with_opacity(0.0);
        let over = from.lerp(&VisualState::natural(), 1.3);
        assert_eq!(over.opacity, 1.0);
    }

    proptest! {
        #[test]
        fn endpoints_are_exact(a in -1000.0f32..1000.0, b in -1000.0f32..1000.0) {
            prop_assert_eq!(a.lerp(&b, 0.0), a);
            prop_assert_eq!(a.lerp(&b, 1.0), b);
        }
    }
}
