// Entrance presets: fade-up, staggered children, slide-in, pop-in, parallax drift
// and counters, parameterised from EngineConfig. `Preset` is the JSON form the
// JS facade accepts.

use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::transition::{CounterSpec, ScrubRange, Timing, TransitionSpec};
use crate::types::{
    CounterSettings, ElementId, EngineConfig, ParallaxSettings, RevealSettings, StaggerSettings,
    VisualState,
};

/// Single element rising into place.
pub fn fade_up(settings: &RevealSettings, delay_ms: u32) -> TransitionSpec {
    TransitionSpec::entrance(
        VisualState::natural()
            .with_y(settings.offset_y)
            .with_opacity(0.0),
        Timing::new(settings.duration_ms, settings.easing).with_delay(delay_ms),
    )
}

/// Children of a container rising one after another.
pub fn stagger_up(settings: &StaggerSettings) -> TransitionSpec {
    TransitionSpec::entrance(
        VisualState::natural()
            .with_y(settings.offset_y)
            .with_opacity(0.0),
        Timing::new(settings.duration_ms, settings.easing).with_stagger(settings.stagger_ms),
    )
}

/// Horizontal entrance; negative `from_x` comes in from the left.
pub fn slide_in(from_x: f32, duration_ms: u32, easing: Easing) -> TransitionSpec {
    TransitionSpec::entrance(
        VisualState::natural().with_x(from_x).with_opacity(0.0),
        Timing::new(duration_ms, easing),
    )
}

/// Rise, fade and grow from slightly below natural size.
pub fn pop_in(from_y: f32, from_scale: f32, timing: Timing) -> TransitionSpec {
    TransitionSpec::entrance(
        VisualState::natural()
            .with_y(from_y)
            .with_opacity(0.0)
            .with_scale(from_scale),
        timing,
    )
}

/// Scroll-scrubbed drift downward by `viewport_height * speed * travel`.
pub fn parallax(
    settings: &ParallaxSettings,
    trigger: ElementId,
    viewport_height: f32,
) -> TransitionSpec {
    let drift = viewport_height * settings.speed * settings.travel;
    TransitionSpec::scrub(
        VisualState::natural(),
        VisualState::natural().with_y(drift),
        ScrubRange::new(trigger, settings.start, settings.end),
    )
}

pub fn counter(settings: &CounterSettings, to: i64) -> CounterSpec {
    CounterSpec::up_to(to, Timing::new(settings.duration_ms, settings.easing))
}

/// Preset selection as sent from JS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "preset", rename_all = "snake_case")]
pub enum Preset {
    FadeUp {
        #[serde(default)]
        delay_ms: u32,
    },
    Stagger {
        #[serde(default)]
        stagger_ms: Option<u32>,
    },
    SlideIn {
        from_x: f32,
        #[serde(default = "default_slide_duration")]
        duration_ms: u32,
        #[serde(default)]
        easing: Easing,
    },
    PopIn {
        from_y: f32,
        from_scale: f32,
        duration_ms: u32,
        #[serde(default)]
        stagger_ms: u32,
        #[serde(default)]
        easing: Easing,
    },
    Custom {
        from: VisualState,
        #[serde(default)]
        to: VisualState,
        duration_ms: u32,
        #[serde(default)]
        delay_ms: u32,
        #[serde(default)]
        stagger_ms: u32,
        #[serde(default)]
        easing: Easing,
    },
}

fn default_slide_duration() -> u32 {
    900
}

impl Preset {
    pub fn to_spec(&self, config: &EngineConfig) -> TransitionSpec {
        match self {
            Preset::FadeUp { delay_ms } => fade_up(&config.reveal, *delay_ms),
            Preset::Stagger { stagger_ms } => {
                let mut settings = config.stagger.clone();
                if let Some(step) = stagger_ms {
                    settings.stagger_ms = *step;
                }
                stagger_up(&settings)
            }
            Preset::SlideIn {
                from_x,
                duration_ms,
                easing,
            } => slide_in(*from_x, *duration_ms, *easing),
            Preset::PopIn {
                from_y,
                from_scale,
                duration_ms,
                stagger_ms,
                easing,
            } => pop_in(
                *from_y,
                *from_scale,
                Timing::new(*duration_ms, *easing).with_stagger(*stagger_ms),
            ),
            Preset::Custom {
                from,
                to,
                duration_ms,
                delay_ms,
                stagger_ms,
                easing,
            } => TransitionSpec::timed(
                *from,
                *to,
                Timing::new(*duration_ms, *easing)
                    .with_delay(*delay_ms)
                    .with_stagger(*stagger_ms),
            ),
        }
    }

    /// Boundary this preset fires at unless the request names one.
    pub fn default_start(&self, config: &EngineConfig) -> crate::types::Boundary {
        match self {
            Preset::Stagger { .. } => config.stagger.start,
            _ => config.reveal.start,
        }
    }
}
