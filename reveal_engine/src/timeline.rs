// Timeline
//
// A set of entrances placed at absolute offsets from a shared start, played
// immediately when a section mounts. Each entry becomes a clock-driven run
// whose delay is its position; the runs belong to the context that plays
// the timeline.

use crate::context::ScopedContext;
use crate::easing::Easing;
use crate::engine::RunHandle;
use crate::transition::{Timing, TransitionSpec};
use crate::types::{AnimationTarget, VisualState};

#[derive(Debug, Clone)]
struct TimelineEntry {
    targets: AnimationTarget,
    from: VisualState,
    to: VisualState,
    duration_ms: u32,
    at_ms: u32,
    easing: Option<Easing>,
}

/// Builder for a group of offset entrances.
#[derive(Debug, Clone)]
pub struct Timeline {
    default_easing: Easing,
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    pub fn new(default_easing: Easing) -> Self {
        Timeline {
            default_easing,
            entries: Vec::new(),
        }
    }

    /// Enter `targets` from `from` into natural layout, starting at `at_ms`.
    pub fn add(
        self,
        targets: impl Into<AnimationTarget>,
        from: VisualState,
        duration_ms: u32,
        at_ms: u32,
    ) -> Self {
        self.add_with(targets, from, VisualState::natural(), duration_ms, at_ms, None)
    }

    pub fn add_with(
        mut self,
        targets: impl Into<AnimationTarget>,
        from: VisualState,
        to: VisualState,
        duration_ms: u32,
        at_ms: u32,
        easing: Option<Easing>,
    ) -> Self {
        self.entries.push(TimelineEntry {
            targets: targets.into(),
            from,
            to,
            duration_ms,
            at_ms,
            easing,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Time at which the last entry settles.
    pub fn duration_ms(&self) -> u32 {
        self.entries
            .iter()
            .map(|e| e.at_ms.saturating_add(e.duration_ms))
            .max()
            .unwrap_or(0)
    }

    /// Start every entry in `ctx`. Entries with no targets are skipped.
    pub fn play(&self, ctx: &ScopedContext) -> Vec<RunHandle> {
        self.entries
            .iter()
            .filter(|e| !e.targets.is_empty())
            .map(|e| {
                let timing = Timing::new(e.duration_ms, e.easing.unwrap_or(self.default_easing))
                    .with_delay(e.at_ms);
                ctx.play(e.targets.clone(), TransitionSpec::timed(e.from, e.to, timing))
            })
            .collect()
    }
}
