// Trigger registry
//
// Decides when a registered element crosses its activation boundary.
// Evaluation is edge-triggered: a callback is due only when the boundary
// goes from not-crossed to crossed between two evaluations.
//
// The registry never invokes callbacks itself. `evaluate` returns the due
// triggers in registration order and the engine dispatches them one by one
// through `begin_dispatch`/`end_dispatch`, so a trigger cancelled by an
// earlier callback in the same pass is never invoked.

use slotmap::{new_key_type, SlotMap};

use crate::types::{AnimationTarget, Boundary, ElementId};
use crate::viewport::ViewportSource;

new_key_type! {
    /// Handle to a registered trigger
    pub struct TriggerId;
}

/// Activation callback.
pub type ActivateCallback = Box<dyn FnMut()>;

/// How often a trigger may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    /// At most once per registration, then the trigger retires itself.
    OneShot,
    /// On every not-crossed to crossed transition.
    Repeatable,
}

/// Registration request.
pub struct TriggerSpec {
    /// Container whose first element is observed.
    pub target: AnimationTarget,
    pub threshold: Boundary,
    pub mode: TriggerMode,
    pub on_activate: ActivateCallback,
}

impl TriggerSpec {
    pub fn new(
        target: impl Into<AnimationTarget>,
        threshold: Boundary,
        mode: TriggerMode,
        on_activate: impl FnMut() + 'static,
    ) -> Self {
        TriggerSpec {
            target: target.into(),
            threshold,
            mode,
            on_activate: Box::new(on_activate),
        }
    }

    pub fn once(
        target: impl Into<AnimationTarget>,
        threshold: Boundary,
        on_activate: impl FnMut() + 'static,
    ) -> Self {
        TriggerSpec::new(target, threshold, TriggerMode::OneShot, on_activate)
    }
}

struct TriggerEntry {
    element: ElementId,
    threshold: Boundary,
    mode: TriggerMode,
    /// `None` while the callback is being dispatched.
    callback: Option<ActivateCallback>,
    crossed: bool,
    activations: u32,
}

/// Registered triggers, evaluated in registration order.
#[derive(Default)]
pub struct TriggerRegistry {
    entries: SlotMap<TriggerId, TriggerEntry>,
    order: Vec<TriggerId>,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trigger. An empty target yields `None` and nothing is observed.
    pub fn register(&mut self, spec: TriggerSpec) -> Option<TriggerId> {
        let element = spec.target.first()?;
        let id = self.entries.insert(TriggerEntry {
            element,
            threshold: spec.threshold,
            mode: spec.mode,
            callback: Some(spec.on_activate),
            crossed: false,
            activations: 0,
        });
        self.order.push(id);
        tracing::debug!(
            trigger = ?id,
            element = element.as_u32(),
            threshold = %spec.threshold,
            mode = ?spec.mode,
            "trigger registered"
        );
        Some(id)
    }

    /// Stop observing. Returns false if the trigger was already gone.
    pub fn cancel(&mut self, id: TriggerId) -> bool {
        if self.entries.remove(id).is_none() {
            return false;
        }
        self.order.retain(|other| *other != id);
        tracing::trace!(trigger = ?id, "trigger cancelled");
        true
    }

    pub fn contains(&self, id: TriggerId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Times the trigger's callback has been dispatched.
    pub fn activations(&self, id: TriggerId) -> Option<u32> {
        self.entries.get(id).map(|e| e.activations)
    }

    /// Update crossed state for every trigger and return those that just crossed.
    ///
    /// Detached elements are skipped and keep their previous crossed state.
    pub fn evaluate(&mut self, env: &dyn ViewportSource) -> Vec<TriggerId> {
        let viewport_height = env.viewport_height();
        let mut due = Vec::new();

        for &id in &self.order {
            let Some(entry) = self.entries.get_mut(id) else {
                continue;
            };
            let Some(bounds) = env.element_bounds(entry.element) else {
                continue;
            };

            let crossed = entry.threshold.is_crossed(&bounds, viewport_height);
            let entered = crossed && !entry.crossed;
            entry.crossed = crossed;

            if !entered {
                continue;
            }
            if entry.mode == TriggerMode::OneShot && entry.activations > 0 {
                continue;
            }
            due.push(id);
        }

        due
    }

    /// Take the callback out for invocation.
    ///
    /// Returns `None` if the trigger was cancelled since `evaluate`. One-shot
    /// triggers are retired here, so they can never be dispatched again.
    pub fn begin_dispatch(&mut self, id: TriggerId) -> Option<ActivateCallback> {
        let entry = self.entries.get_mut(id)?;
        let callback = entry.callback.take()?;
        entry.activations += 1;

        if entry.mode == TriggerMode::OneShot {
            self.cancel(id);
        }
        tracing::debug!(trigger = ?id, "trigger activated");
        Some(callback)
    }

    /// Hand the callback back after invocation. Dropped if the trigger is gone.
    pub fn end_dispatch(&mut self, id: TriggerId, callback: ActivateCallback) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.callback.get_or_insert(callback);
        }
    }
}
