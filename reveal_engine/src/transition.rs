// Transition runner
//
// Interpolates visual properties from an initial to a final state. One
// primitive, two drives:
//
// - `Drive::Timed` advances with the frame clock and honours duration, delay,
//   per-target stagger and easing.
// - `Drive::Scrub` takes its fraction straight from scroll position between
//   two boundaries of a trigger element, linearly, with no end.
//
// Counters are the same interpolation projected to an integer.

use slotmap::{new_key_type, SlotMap};

use crate::easing::Easing;
use crate::interpolate::Interpolate;
use crate::types::{AnimationTarget, Boundary, ElementId, Timestamp, VisualState};
use crate::viewport::{StyleSink, ViewportSource};

new_key_type! {
    /// Handle to a started run
    pub struct RunId;
}

/// Clock-driven timing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub duration_ms: u32,
    pub delay_ms: u32,
    /// Start offset between successive targets.
    pub stagger_ms: u32,
    pub easing: Easing,
}

impl Timing {
    pub fn new(duration_ms: u32, easing: Easing) -> Self {
        Timing {
            duration_ms,
            delay_ms: 0,
            stagger_ms: 0,
            easing,
        }
    }

    pub fn with_delay(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_stagger(mut self, stagger_ms: u32) -> Self {
        self.stagger_ms = stagger_ms;
        self
    }

    /// Raw fraction for the target at `index`, `elapsed_ms` after the run began.
    /// Negative before that target's start.
    fn fraction(&self, elapsed_ms: f64, index: usize) -> f64 {
        let start = self.delay_ms as f64 + self.stagger_ms as f64 * index as f64;
        let local = elapsed_ms - start;
        if self.duration_ms == 0 {
            return if local >= 0.0 { 1.0 } else { -1.0 };
        }
        local / self.duration_ms as f64
    }
}

/// Scroll range a scrubbed run maps onto [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrubRange {
    pub trigger: ElementId,
    pub start: Boundary,
    pub end: Boundary,
}

impl ScrubRange {
    pub fn new(trigger: ElementId, start: Boundary, end: Boundary) -> Self {
        ScrubRange {
            trigger,
            start,
            end,
        }
    }

    /// Linear progress through the range, `None` while the trigger is detached.
    pub fn progress(&self, env: &dyn ViewportSource) -> Option<f32> {
        let bounds = env.element_bounds(self.trigger)?;
        let viewport_height = env.viewport_height();
        // Both distances shrink one-for-one as the page scrolls down.
        let to_start = self.start.distance(&bounds, viewport_height);
        let to_end = self.end.distance(&bounds, viewport_height);
        let span = to_end - to_start;

        if span <= 0.0 {
            return Some(if to_start <= 0.0 { 1.0 } else { 0.0 });
        }
        Some((-to_start / span).clamp(0.0, 1.0))
    }
}

/// What drives the interpolation fraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Drive {
    Timed(Timing),
    Scrub(ScrubRange),
}

/// Initial and final visual state plus the drive between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionSpec {
    pub from: VisualState,
    /// Normally `VisualState::natural()`, the element's own layout.
    pub to: VisualState,
    pub drive: Drive,
}

impl TransitionSpec {
    /// Entrance into natural layout.
    pub fn entrance(from: VisualState, timing: Timing) -> Self {
        TransitionSpec {
            from,
            to: VisualState::natural(),
            drive: Drive::Timed(timing),
        }
    }

    pub fn timed(from: VisualState, to: VisualState, timing: Timing) -> Self {
        TransitionSpec {
            from,
            to,
            drive: Drive::Timed(timing),
        }
    }

    pub fn scrub(from: VisualState, to: VisualState, range: ScrubRange) -> Self {
        TransitionSpec {
            from,
            to,
            drive: Drive::Scrub(range),
        }
    }
}

/// Count-up of a displayed integer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterSpec {
    pub from: i64,
    pub to: i64,
    pub timing: Timing,
}

impl CounterSpec {
    pub fn up_to(to: i64, timing: Timing) -> Self {
        CounterSpec { from: 0, to, timing }
    }
}

enum Channel {
    Visual {
        targets: Vec<ElementId>,
        from: VisualState,
        to: VisualState,
        last: Vec<Option<VisualState>>,
    },
    Counter {
        target: ElementId,
        from: i64,
        to: i64,
        last: Option<i64>,
    },
}

impl Channel {
    fn len(&self) -> usize {
        match self {
            Channel::Visual { targets, .. } => targets.len(),
            Channel::Counter { .. } => 1,
        }
    }

    /// Write target `index` at eased fraction `t`, skipping unchanged values.
    /// A `settled` target writes the final value verbatim. Otherwise `t` may
    /// leave [0, 1] for overshooting curves.
    fn write(&mut self, index: usize, t: f32, settled: bool, sink: &mut dyn StyleSink) {
        match self {
            Channel::Visual {
                targets,
                from,
                to,
                last,
            } => {
                let state = if settled { *to } else { from.lerp(to, t) };
                if last[index] == Some(state) {
                    return;
                }
                last[index] = Some(state);
                sink.write_visual(targets[index], &state);
            }
            Channel::Counter {
                target,
                from,
                to,
                last,
            } => {
                let value = if settled {
                    *to
                } else {
                    let raw = (*from as f64).lerp(&(*to as f64), t.clamp(0.0, 1.0));
                    (raw.floor() as i64).clamp((*from).min(*to), (*from).max(*to))
                };
                // Counters never run backwards.
                let value = match *last {
                    Some(prev) if from <= to => value.max(prev),
                    Some(prev) => value.min(prev),
                    None => value,
                };
                if *last == Some(value) {
                    return;
                }
                *last = Some(value);
                sink.write_count(*target, value);
            }
        }
    }
}

struct Run {
    channel: Channel,
    drive: Drive,
    /// Set on the first frame after the run was started.
    started_at: Option<Timestamp>,
}

/// All in-flight runs.
#[derive(Default)]
pub struct TransitionRunner {
    runs: SlotMap<RunId, Run>,
}

impl TransitionRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a run. An empty target yields `None`.
    pub fn start(&mut self, target: AnimationTarget, spec: TransitionSpec) -> Option<RunId> {
        if target.is_empty() {
            return None;
        }
        let targets = target.into_vec();
        let count = targets.len();
        let id = self.runs.insert(Run {
            channel: Channel::Visual {
                targets,
                from: spec.from,
                to: spec.to,
                last: vec![None; count],
            },
            drive: spec.drive,
            started_at: None,
        });
        tracing::debug!(run = ?id, targets = count, drive = ?spec.drive, "run started");
        Some(id)
    }

    pub fn start_counter(&mut self, target: ElementId, spec: CounterSpec) -> RunId {
        let id = self.runs.insert(Run {
            channel: Channel::Counter {
                target,
                from: spec.from,
                to: spec.to,
                last: None,
            },
            drive: Drive::Timed(spec.timing),
            started_at: None,
        });
        tracing::debug!(run = ?id, element = target.as_u32(), to = spec.to, "counter started");
        id
    }

    /// Stop writing. Values already written stay as they are.
    pub fn cancel(&mut self, id: RunId) -> bool {
        let removed = self.runs.remove(id).is_some();
        if removed {
            tracing::debug!(run = ?id, "run cancelled");
        }
        removed
    }

    pub fn is_active(&self, id: RunId) -> bool {
        self.runs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Whether any clock-driven run still needs frames.
    pub fn has_timed(&self) -> bool {
        self.runs
            .values()
            .any(|run| matches!(run.drive, Drive::Timed(_)))
    }

    /// Advance clock-driven runs to `now`. Finished runs write their final
    /// value and are removed. Returns the number of timed runs still going.
    pub fn tick(&mut self, now: Timestamp, sink: &mut dyn StyleSink) -> usize {
        let mut finished = Vec::new();

        for (id, run) in self.runs.iter_mut() {
            let Drive::Timed(timing) = run.drive else {
                continue;
            };
            let started_at = *run.started_at.get_or_insert(now);
            let elapsed = now.millis_since(started_at);

            let mut done = true;
            for index in 0..run.channel.len() {
                let raw = timing.fraction(elapsed, index);
                let settled = raw >= 1.0;
                if !settled {
                    done = false;
                }
                let t = timing.easing.apply(raw.max(0.0) as f32);
                run.channel.write(index, t, settled, sink);
            }

            if done {
                finished.push(id);
            }
        }

        for id in finished {
            self.runs.remove(id);
            tracing::trace!(run = ?id, "run finished");
        }

        self.runs
            .values()
            .filter(|run| matches!(run.drive, Drive::Timed(_)))
            .count()
    }

    /// Re-evaluate every scrubbed run against the current scroll position.
    pub fn scrub(&mut self, env: &dyn ViewportSource, sink: &mut dyn StyleSink) {
        for run in self.runs.values_mut() {
            let Drive::Scrub(range) = run.drive else {
                continue;
            };
            let Some(progress) = range.progress(env) else {
                continue;
            };
            for index in 0..run.channel.len() {
                run.channel.write(index, progress, progress >= 1.0, sink);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ElementBounds, Edge, ViewportFraction};
    use crate::viewport::{StyleBatch, ViewportSnapshot};
    use proptest::prelude::*;

    fn ms(value: f64) -> Timestamp {
        Timestamp::from_millis(value)
    }

    fn fade_up() -> VisualState {
        VisualState::natural().with_y(30.0).with_opacity(0.0)
    }

    #[test]
    fn first_frame_renders_initial_state() {
        let mut runner = TransitionRunner::new();
        let el = ElementId::new(1);
        runner.start(
            el.into(),
            TransitionSpec::entrance(fade_up(), Timing::new(800, Easing::CubicOut)),
        );

        let mut batch = StyleBatch::new();
        runner.tick(ms(1000.0), &mut batch);
        assert_eq!(batch.last_visual(el), Some(fade_up()));
    }

    #[test]
    fn completes_exactly_at_final_state() {
        let mut runner = TransitionRunner::new();
        let el = ElementId::new(1);
        let to = VisualState::natural().with_x(0.1).with_opacity(0.3);
        let id = runner
            .start(
                el.into(),
                TransitionSpec::timed(fade_up(), to, Timing::new(700, Easing::Spring)),
            )
            .unwrap();

        let mut batch = StyleBatch::new();
        for frame in 0..60 {
            runner.tick(ms(frame as f64 * 16.0), &mut batch);
        }
        assert_eq!(batch.last_visual(el), Some(to));
        assert!(!runner.is_active(id));
    }

    #[test]
    fn spring_overshoots_before_settling() {
        let mut runner = TransitionRunner::new();
        let el = ElementId::new(1);
        runner.start(
            el.into(),
            TransitionSpec::entrance(
                VisualState::natural().with_y(100.0),
                Timing::new(1000, Easing::Spring),
            ),
        );

        let mut lowest = f32::MAX;
        let mut last = None;
        for frame in 0..=20 {
            let mut batch = StyleBatch::new();
            runner.tick(ms(frame as f64 * 50.0), &mut batch);
            if let Some(state) = batch.last_visual(el) {
                lowest = lowest.min(state.offset_y);
                last = Some(state);
            }
        }
        // Past natural layout at some point, then exactly natural at the end.
        assert!(lowest < 0.0, "lowest offset {lowest}");
        assert_eq!(last, Some(VisualState::natural()));
        assert!(runner.is_empty());
    }

    #[test]
    fn stagger_offsets_each_target() {
        let mut runner = TransitionRunner::new();
        let targets = AnimationTarget::many((1..=3).map(ElementId::new));
        runner.start(
            targets,
            TransitionSpec::entrance(
                fade_up(),
                Timing::new(100, Easing::Linear).with_stagger(100),
            ),
        );

        let mut batch = StyleBatch::new();
        runner.tick(ms(0.0), &mut batch);
        runner.tick(ms(150.0), &mut batch);
        // First target done, second halfway, third not started.
        assert_eq!(batch.last_visual(ElementId::new(1)), Some(VisualState::natural()));
        assert_eq!(batch.last_visual(ElementId::new(2)).unwrap().opacity, 0.5);
        assert_eq!(batch.last_visual(ElementId::new(3)), Some(fade_up()));
    }

    #[test]
    fn delay_holds_initial_state() {
        let mut runner = TransitionRunner::new();
        let el = ElementId::new(1);
        runner.start(
            el.into(),
            TransitionSpec::entrance(fade_up(), Timing::new(100, Easing::Linear).with_delay(200)),
        );
        let mut batch = StyleBatch::new();
        runner.tick(ms(0.0), &mut batch);
        runner.tick(ms(150.0), &mut batch);
        assert_eq!(batch.last_visual(el), Some(fade_up()));
        runner.tick(ms(250.0), &mut batch);
        assert_eq!(batch.last_visual(el).unwrap().opacity, 0.5);
    }

    #[test]
    fn zero_duration_jumps_to_end() {
        let mut runner = TransitionRunner::new();
        let el = ElementId::new(1);
        runner.start(
            el.into(),
            TransitionSpec::entrance(fade_up(), Timing::new(0, Easing::CubicOut)),
        );
        let mut batch = StyleBatch::new();
        assert_eq!(runner.tick(ms(5.0), &mut batch), 0);
        assert_eq!(batch.last_visual(el), Some(VisualState::natural()));
    }

    #[test]
    fn cancel_freezes_last_written_state() {
        let mut runner = TransitionRunner::new();
        let el = ElementId::new(1);
        let id = runner
            .start(
                el.into(),
                TransitionSpec::entrance(fade_up(), Timing::new(1000, Easing::Linear)),
            )
            .unwrap();

        let mut batch = StyleBatch::new();
        runner.tick(ms(0.0), &mut batch);
        runner.tick(ms(400.0), &mut batch);
        let frozen = batch.last_visual(el).unwrap();
        assert!(runner.cancel(id));

        let writes = batch.len();
        runner.tick(ms(2000.0), &mut batch);
        assert_eq!(batch.len(), writes);
        assert_eq!(batch.last_visual(el), Some(frozen));
        assert!(!runner.cancel(id));
    }

    #[test]
    fn empty_target_starts_nothing() {
        let mut runner = TransitionRunner::new();
        let id = runner.start(
            AnimationTarget::empty(),
            TransitionSpec::entrance(fade_up(), Timing::new(100, Easing::Linear)),
        );
        assert!(id.is_none());
        assert!(runner.is_empty());
    }

    #[test]
    fn scrub_tracks_scroll_linearly() {
        let mut runner = TransitionRunner::new();
        let section = ElementId::new(1);
        let image = ElementId::new(2);
        // "top bottom" to "bottom top" over a 500px section in a 1000px viewport.
        let range = ScrubRange::new(
            section,
            Boundary::new(Edge::Top, ViewportFraction::new(1.0)),
            Boundary::new(Edge::Bottom, ViewportFraction::new(0.0)),
        );
        let from = VisualState::natural().with_y(50.0).with_scale(1.15);
        runner.start(image.into(), TransitionSpec::scrub(from, VisualState::natural(), range));

        let mut env = ViewportSnapshot::new(0.0, 1000.0)
            .with_element(section, ElementBounds::new(1200.0, 500.0));
        let mut batch = StyleBatch::new();

        runner.scrub(&env, &mut batch);
        assert_eq!(batch.last_visual(image), Some(from));

        // Range spans 1500px of scroll; 950px of scroll brings the top to 250,
        // which is 750px past the start line: halfway.
        env.scroll_by(950.0);
        runner.scrub(&env, &mut batch);
        let mid = batch.last_visual(image).unwrap();
        assert!((mid.offset_y - 25.0).abs() < 1e-3);

        env.scroll_by(2000.0);
        runner.scrub(&env, &mut batch);
        assert_eq!(batch.last_visual(image), Some(VisualState::natural()));

        // Scrubbed runs never finish on their own.
        assert_eq!(runner.len(), 1);
        assert_eq!(runner.tick(ms(99_999.0), &mut batch), 0);
        assert_eq!(runner.len(), 1);
    }

    #[test]
    fn counter_floors_and_lands_on_target() {
        let mut runner = TransitionRunner::new();
        let el = ElementId::new(4);
        runner.start_counter(el, CounterSpec::up_to(150, Timing::new(2000, Easing::CubicOut)));

        let mut batch = StyleBatch::new();
        runner.tick(ms(0.0), &mut batch);
        assert_eq!(batch.last_count(el), Some(0));
        runner.tick(ms(1000.0), &mut batch);
        // 1 - 0.5^3 = 0.875 of 150 = 131.25
        assert_eq!(batch.last_count(el), Some(131));
        runner.tick(ms(2000.0), &mut batch);
        assert_eq!(batch.last_count(el), Some(150));
        assert!(runner.is_empty());
    }

    proptest! {
        #[test]
        fn completed_runs_end_exactly_at_final_state(
            ox in -200.0f32..200.0,
            oy in -200.0f32..200.0,
            opacity in 0.0f32..=1.0,
            scale in 0.0f32..3.0,
            duration in 0u32..3000,
            delay in 0u32..500,
            stagger in 0u32..300,
            targets in 1u32..6,
        ) {
            let to = VisualState { offset_x: ox, offset_y: oy, opacity, scale };
            let timing = Timing::new(duration, Easing::QuartOut).with_delay(delay).with_stagger(stagger);
            let mut runner = TransitionRunner::new();
            runner.start(
                AnimationTarget::many((0..targets).map(ElementId::new)),
                TransitionSpec::timed(fade_up(), to, timing),
            );

            let mut batch = StyleBatch::new();
            let mut now = 0.0;
            while runner.tick(ms(now), &mut batch) > 0 {
                now += 16.7;
            }
            for id in 0..targets {
                prop_assert_eq!(batch.last_visual(ElementId::new(id)), Some(to));
            }
        }

        #[test]
        fn cancelled_runs_write_nothing_more(cancel_at in 0.0f64..1500.0) {
            let mut runner = TransitionRunner::new();
            let el = ElementId::new(1);
            let id = runner
                .start(el.into(), TransitionSpec::entrance(fade_up(), Timing::new(1000, Easing::CubicOut)))
                .unwrap();

            let mut batch = StyleBatch::new();
            runner.tick(ms(0.0), &mut batch);
            runner.tick(ms(cancel_at), &mut batch);
            let frozen = batch.last_visual(el);
            runner.cancel(id);

            let writes = batch.len();
            for frame in 1..20 {
                runner.tick(ms(cancel_at + frame as f64 * 16.0), &mut batch);
            }
            prop_assert_eq!(batch.len(), writes);
            prop_assert_eq!(batch.last_visual(el), frozen);
        }

        #[test]
        fn counter_is_bounded_and_monotonic(
            samples in proptest::collection::vec(0.0f64..2500.0, 1..50),
        ) {
            let mut sorted = samples;
            sorted.sort_by(|a, b| a.total_cmp(b));

            let mut runner = TransitionRunner::new();
            let el = ElementId::new(1);
            runner.start_counter(el, CounterSpec::up_to(150, Timing::new(2000, Easing::CubicOut)));

            let mut batch = StyleBatch::new();
            runner.tick(ms(0.0), &mut batch);
            let mut previous = 0;
            for at in sorted {
                runner.tick(ms(at), &mut batch);
                let value = batch.last_count(el).unwrap();
                prop_assert!((0..=150).contains(&value));
                prop_assert!(value >= previous);
                previous = value;
            }
        }
    }
}
