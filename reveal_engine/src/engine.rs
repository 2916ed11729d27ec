// Motion engine
//
// Owns the trigger registry and the transition runner for one page. The
// engine is single-threaded: the host feeds it scroll/resize events and frame
// ticks, and everything happens inside those calls.
//
// `MotionEngine` holds the only strong reference to the shared state.
// `EngineHandle`, `SubscriptionHandle` and `RunHandle` hold weak references,
// so callbacks and contexts can capture them freely and they become inert
// once the engine is dropped.
//
// Typical wiring:
//
//     let engine = MotionEngine::new();
//     let handle = engine.handle();
//     let sub = handle.register(TriggerSpec::once(card, Boundary::top_at(80.0), {
//         let handle = handle.clone();
//         move || { handle.run(cards.clone(), spec); }
//     }));
//
//     engine.on_scroll(&snapshot, &mut batch);
//     engine.tick(now, &mut batch);

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::transition::{CounterSpec, RunId, TransitionRunner, TransitionSpec};
use crate::trigger::{TriggerId, TriggerRegistry, TriggerSpec};
use crate::types::{AnimationTarget, ElementId, Timestamp};
use crate::viewport::{StyleSink, ViewportSource};

/// Something a scoped context can tear down.
pub trait Cancellable {
    /// Stop for good. Must be safe to call on an already-stopped handle.
    fn cancel(&self);
}

#[derive(Default)]
struct EngineState {
    triggers: TriggerRegistry,
    runner: TransitionRunner,
}

/// The engine driving one page's animations.
pub struct MotionEngine {
    state: Rc<RefCell<EngineState>>,
}

impl MotionEngine {
    pub fn new() -> Self {
        MotionEngine {
            state: Rc::new(RefCell::new(EngineState::default())),
        }
    }

    /// Get a handle for registering triggers and starting runs
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            state: Rc::downgrade(&self.state),
        }
    }

    /// Scroll event: fire triggers that just crossed their boundary, in
    /// registration order, then re-evaluate scrubbed runs.
    pub fn on_scroll(&self, env: &dyn ViewportSource, sink: &mut dyn StyleSink) {
        let due = self.state.borrow_mut().triggers.evaluate(env);

        for id in due {
            // Looked up again per trigger: an earlier callback may have cancelled it.
            let Some(mut callback) = self.state.borrow_mut().triggers.begin_dispatch(id) else {
                continue;
            };
            callback();
            self.state.borrow_mut().triggers.end_dispatch(id, callback);
        }

        self.state.borrow_mut().runner.scrub(env, sink);
    }

    /// Layout changed. Boundaries are re-evaluated exactly as for a scroll.
    pub fn on_resize(&self, env: &dyn ViewportSource, sink: &mut dyn StyleSink) {
        self.on_scroll(env, sink);
    }

    /// Frame tick: advance clock-driven runs. Returns true while any still need frames.
    pub fn tick(&self, now: Timestamp, sink: &mut dyn StyleSink) -> bool {
        self.state.borrow_mut().runner.tick(now, sink) > 0
    }

    pub fn trigger_count(&self) -> usize {
        self.state.borrow().triggers.len()
    }

    pub fn run_count(&self) -> usize {
        self.state.borrow().runner.len()
    }

    pub fn has_timed_runs(&self) -> bool {
        self.state.borrow().runner.has_timed()
    }
}

impl Default for MotionEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Weak handle to a `MotionEngine`.
#[derive(Clone)]
pub struct EngineHandle {
    state: Weak<RefCell<EngineState>>,
}

impl EngineHandle {
    /// A handle attached to no engine; every operation is a no-op.
    pub fn detached() -> Self {
        EngineHandle { state: Weak::new() }
    }

    pub fn is_alive(&self) -> bool {
        self.state.strong_count() > 0
    }

    /// Observe an element. Empty targets and a dropped engine give an inert handle.
    pub fn register(&self, spec: TriggerSpec) -> SubscriptionHandle {
        let id = self
            .state
            .upgrade()
            .and_then(|state| state.borrow_mut().triggers.register(spec));
        SubscriptionHandle {
            id,
            engine: self.clone(),
        }
    }

    /// Start interpolating `targets`. Empty targets give an inert handle.
    pub fn run(&self, targets: impl Into<AnimationTarget>, spec: TransitionSpec) -> RunHandle {
        let id = self
            .state
            .upgrade()
            .and_then(|state| state.borrow_mut().runner.start(targets.into(), spec));
        RunHandle {
            id,
            engine: self.clone(),
        }
    }

    /// Start a count-up on `target`.
    pub fn count(&self, target: ElementId, spec: CounterSpec) -> RunHandle {
        let id = self
            .state
            .upgrade()
            .map(|state| state.borrow_mut().runner.start_counter(target, spec));
        RunHandle {
            id,
            engine: self.clone(),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut EngineState) -> R) -> Option<R> {
        let state = self.state.upgrade()?;
        let mut state = state.borrow_mut();
        let result = f(&mut state);
        Some(result)
    }
}

/// Registration returned by `EngineHandle::register`.
#[derive(Clone)]
pub struct SubscriptionHandle {
    id: Option<TriggerId>,
    engine: EngineHandle,
}

impl SubscriptionHandle {
    /// Whether the trigger is still observing (false once fired as one-shot).
    pub fn is_active(&self) -> bool {
        self.id
            .and_then(|id| self.engine.with_state(|s| s.triggers.contains(id)))
            .unwrap_or(false)
    }

    /// Whether registration was ignored (empty target or no engine).
    pub fn is_inert(&self) -> bool {
        self.id.is_none()
    }
}

impl Cancellable for SubscriptionHandle {
    fn cancel(&self) {
        if let Some(id) = self.id {
            self.engine.with_state(|s| s.triggers.cancel(id));
        }
    }
}

/// Run returned by `EngineHandle::run` and `EngineHandle::count`.
#[derive(Clone)]
pub struct RunHandle {
    id: Option<RunId>,
    engine: EngineHandle,
}

impl RunHandle {
    /// Whether the run is still writing (false once finished or cancelled).
    pub fn is_active(&self) -> bool {
        self.id
            .and_then(|id| self.engine.with_state(|s| s.runner.is_active(id)))
            .unwrap_or(false)
    }

    pub fn is_inert(&self) -> bool {
        self.id.is_none()
    }
}

impl Cancellable for RunHandle {
    fn cancel(&self) {
        if let Some(id) = self.id {
            self.engine.with_state(|s| s.runner.cancel(id));
        }
    }
}
