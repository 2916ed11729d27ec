// Scoped animation context
//
// Ties every trigger and run a page section creates to the section's
// lifetime. Closing the context (or dropping it) cancels everything it
// tracked, so nothing registered inside it can run once `close` returns.
//
// Runs started later by a trigger callback are tracked through a
// `ContextHandle`; if the context is already closed by then, the run is
// cancelled on the spot.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::engine::{Cancellable, EngineHandle, RunHandle, SubscriptionHandle};
use crate::transition::{CounterSpec, TransitionSpec};
use crate::trigger::{TriggerMode, TriggerSpec};
use crate::types::{AnimationTarget, Boundary, ElementId};

struct ContextInner {
    engine: EngineHandle,
    label: String,
    tracked: RefCell<Vec<Box<dyn Cancellable>>>,
    closed: Cell<bool>,
}

impl ContextInner {
    fn track(&self, handle: Box<dyn Cancellable>) {
        if self.closed.get() {
            handle.cancel();
            return;
        }
        self.tracked.borrow_mut().push(handle);
    }

    fn close(&self) {
        if self.closed.replace(true) {
            return;
        }
        // Taken out first: cancelling touches engine state, not ours.
        let handles = std::mem::take(&mut *self.tracked.borrow_mut());
        for handle in &handles {
            handle.cancel();
        }
        tracing::debug!(context = %self.label, released = handles.len(), "animation context closed");
    }
}

/// Ownership boundary for one mounted section's animations.
pub struct ScopedContext {
    inner: Rc<ContextInner>,
}

impl ScopedContext {
    pub fn open(engine: EngineHandle) -> Self {
        Self::open_named(engine, "anonymous")
    }

    pub fn open_named(engine: EngineHandle, label: impl Into<String>) -> Self {
        let label = label.into();
        tracing::debug!(context = %label, "animation context opened");
        ScopedContext {
            inner: Rc::new(ContextInner {
                engine,
                label,
                tracked: RefCell::new(Vec::new()),
                closed: Cell::new(false),
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.inner.engine
    }

    /// Weak handle for use inside callbacks.
    pub fn handle(&self) -> ContextHandle {
        ContextHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Take ownership of a handle's teardown.
    pub fn track(&self, handle: impl Cancellable + 'static) {
        self.inner.track(Box::new(handle));
    }

    /// Cancel every tracked handle exactly once. Further calls do nothing.
    pub fn close(&self) {
        self.inner.close();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }

    pub fn tracked_len(&self) -> usize {
        self.inner.tracked.borrow().len()
    }

    /// Register a raw trigger owned by this context.
    pub fn on_enter(
        &self,
        target: impl Into<AnimationTarget>,
        threshold: Boundary,
        mode: TriggerMode,
        on_activate: impl FnMut() + 'static,
    ) -> SubscriptionHandle {
        let sub = self
            .engine()
            .register(TriggerSpec::new(target, threshold, mode, on_activate));
        self.track(sub.clone());
        sub
    }

    /// Start a run right away (mount-time entrances).
    pub fn play(&self, targets: impl Into<AnimationTarget>, spec: TransitionSpec) -> RunHandle {
        let run = self.engine().run(targets, spec);
        self.track(run.clone());
        run
    }

    /// Play `spec` on `targets` the first time `trigger` crosses `threshold`.
    pub fn reveal(
        &self,
        trigger: impl Into<AnimationTarget>,
        targets: impl Into<AnimationTarget>,
        threshold: Boundary,
        spec: TransitionSpec,
    ) -> SubscriptionHandle {
        let targets = targets.into();
        let engine = self.engine().clone();
        let scope = self.handle();
        self.on_enter(trigger, threshold, TriggerMode::OneShot, move || {
            scope.track(engine.run(targets.clone(), spec));
        })
    }

    /// Count `target` up once it crosses `threshold`. Always one-shot.
    pub fn count_up(
        &self,
        target: ElementId,
        threshold: Boundary,
        spec: CounterSpec,
    ) -> SubscriptionHandle {
        let engine = self.engine().clone();
        let scope = self.handle();
        self.on_enter(target, threshold, TriggerMode::OneShot, move || {
            scope.track(engine.count(target, spec));
        })
    }
}

impl Drop for ScopedContext {
    fn drop(&mut self) {
        self.close();
    }
}

/// Weak reference to a `ScopedContext`.
#[derive(Clone)]
pub struct ContextHandle {
    inner: Weak<ContextInner>,
}

impl ContextHandle {
    /// Track `handle`, or cancel it immediately if the context is gone or closed.
    pub fn track(&self, handle: impl Cancellable + 'static) {
        match self.inner.upgrade() {
            Some(inner) => inner.track(Box::new(handle)),
            None => handle.cancel(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.inner
            .upgrade()
            .map(|inner| !inner.closed.get())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use crate::engine::MotionEngine;
    use crate::transition::Timing;
    use crate::types::{ElementBounds, Timestamp, VisualState};
    use crate::viewport::{StyleBatch, ViewportSnapshot};
    use proptest::prelude::*;

    struct CountingHandle(Rc<Cell<u32>>);

    impl Cancellable for CountingHandle {
        fn cancel(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn entrance() -> TransitionSpec {
        TransitionSpec::entrance(
            VisualState::natural().with_y(40.0).with_opacity(0.0),
            Timing::new(700, Easing::CubicOut).with_stagger(100),
        )
    }

    #[test]
    fn close_is_idempotent() {
        let engine = MotionEngine::new();
        let ctx = ScopedContext::open(engine.handle());
        let count = Rc::new(Cell::new(0));
        ctx.track(CountingHandle(Rc::clone(&count)));
        ctx.close();
        ctx.close();
        drop(ctx);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn tracking_after_close_cancels_immediately() {
        let engine = MotionEngine::new();
        let ctx = ScopedContext::open(engine.handle());
        let handle = ctx.handle();
        ctx.close();
        assert!(!handle.is_open());

        let count = Rc::new(Cell::new(0));
        handle.track(CountingHandle(Rc::clone(&count)));
        assert_eq!(count.get(), 1);
        assert_eq!(ctx.tracked_len(), 0);
    }

    #[test]
    fn dropped_context_cancels_late_tracking() {
        let engine = MotionEngine::new();
        let handle = ScopedContext::open(engine.handle()).handle();
        let count = Rc::new(Cell::new(0));
        handle.track(CountingHandle(Rc::clone(&count)));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn reveal_runs_only_after_crossing() {
        let engine = MotionEngine::new();
        let ctx = ScopedContext::open_named(engine.handle(), "features");
        let grid = ElementId::new(10);
        let cards = AnimationTarget::many((11..=13).map(ElementId::new));
        ctx.reveal(grid, cards, Boundary::top_at(80.0), entrance());

        let mut env = ViewportSnapshot::new(0.0, 1000.0)
            .with_element(grid, ElementBounds::new(1100.0, 400.0));
        let mut batch = StyleBatch::new();
        engine.on_scroll(&env, &mut batch);
        assert!(!engine.tick(Timestamp::from_millis(0.0), &mut batch));
        assert!(batch.is_empty());

        env.scroll_by(400.0);
        engine.on_scroll(&env, &mut batch);
        assert_eq!(engine.run_count(), 1);
        assert_eq!(ctx.tracked_len(), 2, "trigger and the run it started");
    }

    #[test]
    fn closing_mid_run_freezes_and_unregisters() {
        let engine = MotionEngine::new();
        let ctx = ScopedContext::open(engine.handle());
        let hero = ElementId::new(1);
        let below = ElementId::new(2);
        ctx.play(hero, entrance());
        ctx.reveal(below, below, Boundary::top_at(80.0), entrance());

        let mut batch = StyleBatch::new();
        engine.tick(Timestamp::from_millis(0.0), &mut batch);
        engine.tick(Timestamp::from_millis(300.0), &mut batch);
        let frozen = batch.last_visual(hero);

        ctx.close();
        assert_eq!(engine.run_count(), 0);
        assert_eq!(engine.trigger_count(), 0);

        let writes = batch.len();
        let env = ViewportSnapshot::new(0.0, 1000.0)
            .with_element(below, ElementBounds::new(0.0, 100.0));
        engine.on_scroll(&env, &mut batch);
        engine.tick(Timestamp::from_millis(600.0), &mut batch);
        assert_eq!(batch.len(), writes);
        assert_eq!(batch.last_visual(hero), frozen);
    }

    #[test]
    fn count_up_is_one_shot() {
        let engine = MotionEngine::new();
        let ctx = ScopedContext::open(engine.handle());
        let stat = ElementId::new(5);
        ctx.count_up(
            stat,
            Boundary::top_at(85.0),
            CounterSpec::up_to(15, Timing::new(100, Easing::Linear)),
        );

        let mut env = ViewportSnapshot::new(0.0, 1000.0)
            .with_element(stat, ElementBounds::new(500.0, 50.0));
        let mut batch = StyleBatch::new();
        engine.on_scroll(&env, &mut batch);
        engine.tick(Timestamp::from_millis(0.0), &mut batch);
        engine.tick(Timestamp::from_millis(200.0), &mut batch);
        assert_eq!(batch.last_count(stat), Some(15));

        env.scroll_by(-2000.0);
        engine.on_scroll(&env, &mut batch);
        env.scroll_by(2000.0);
        engine.on_scroll(&env, &mut batch);
        assert_eq!(engine.run_count(), 0);
        assert_eq!(engine.trigger_count(), 0);
    }

    proptest! {
        #[test]
        fn close_cancels_each_tracked_handle_once(n in 0usize..64, closes in 1usize..4) {
            let engine = MotionEngine::new();
            let ctx = ScopedContext::open(engine.handle());
            let counters: Vec<Rc<Cell<u32>>> = (0..n).map(|_| Rc::new(Cell::new(0))).collect();
            for counter in &counters {
                ctx.track(CountingHandle(Rc::clone(counter)));
            }
            for _ in 0..closes {
                ctx.close();
            }
            for counter in &counters {
                prop_assert_eq!(counter.get(), 1);
            }
        }
    }
}
