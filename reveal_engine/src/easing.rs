// Easing curves. Names follow the power-curve vocabulary the site's markup uses
// ("power2.out", "none"), parsed once when configs and requests are read.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Easing function applied to a timed interpolation fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Easing {
    /// `none`: scrubbed and linear motion.
    Linear,
    /// `power1.out`
    QuadOut,
    /// `power2.out`
    CubicOut,
    /// `power3.out`
    QuartOut,
    /// `power2.inOut`
    CubicInOut,
    /// `elastic.out`: overshoots before settling on 1.0.
    Spring,
}

impl Easing {
    /// Remap `t` in [0, 1]. Endpoints are exact: 0.0 -> 0.0 and 1.0 -> 1.0.
    pub fn apply(self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if t == 0.0 || t == 1.0 {
            return t;
        }
        match self {
            Easing::Linear => t,
            Easing::QuadOut => 1.0 - (1.0 - t).powi(2),
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
            Easing::QuartOut => 1.0 - (1.0 - t).powi(4),
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::Spring => {
                let c4 = (2.0 * std::f32::consts::PI) / 3.0;
                2.0_f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
            }
        }
    }

    /// Whether the curve never decreases over [0, 1].
    pub fn is_monotonic(self) -> bool {
        !matches!(self, Easing::Spring)
    }

    pub fn name(self) -> &'static str {
        match self {
            Easing::Linear => "none",
            Easing::QuadOut => "power1.out",
            Easing::CubicOut => "power2.out",
            Easing::QuartOut => "power3.out",
            Easing::CubicInOut => "power2.inOut",
            Easing::Spring => "elastic.out",
        }
    }
}

impl Default for Easing {
    fn default() -> Self {
        Easing::CubicOut
    }
}

impl FromStr for Easing {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" | "linear" => Ok(Easing::Linear),
            "power1.out" | "quad_out" => Ok(Easing::QuadOut),
            "power2.out" | "cubic_out" => Ok(Easing::CubicOut),
            "power3.out" | "quart_out" => Ok(Easing::QuartOut),
            "power2.inOut" | "cubic_in_out" => Ok(Easing::CubicInOut),
            "elastic.out" | "spring" => Ok(Easing::Spring),
            other => Err(EngineError::UnknownEasing(other.to_string())),
        }
    }
}

impl TryFrom<String> for Easing {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Easing> for String {
    fn from(easing: Easing) -> Self {
        easing.name().to_string()
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL: [Easing; 6] = [
        Easing::Linear,
        Easing::QuadOut,
        Easing::CubicOut,
        Easing::QuartOut,
        Easing::CubicInOut,
        Easing::Spring,
    ];

    #[test]
    fn endpoints_are_exact() {
        for easing in ALL {
            assert_eq!(easing.apply(0.0), 0.0, "{easing} start");
            assert_eq!(easing.apply(1.0), 1.0, "{easing} end");
        }
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        assert_eq!(Easing::CubicOut.apply(-2.0), 0.0);
        assert_eq!(Easing::CubicOut.apply(3.0), 1.0);
        assert_eq!(Easing::Linear.apply(f32::NAN), 0.0);
    }

    #[test]
    fn names_round_trip() {
        for easing in ALL {
            assert_eq!(easing.name().parse::<Easing>().unwrap(), easing);
        }
        assert!("bounce.out".parse::<Easing>().is_err());
    }

    proptest! {
        #[test]
        fn monotonic_curves_never_decrease(a in 0.0f32..=1.0, b in 0.0f32..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            for easing in ALL.into_iter().filter(|e| e.is_monotonic()) {
                prop_assert!(easing.apply(lo) <= easing.apply(hi) + 1e-6);
            }
        }
    }
}
