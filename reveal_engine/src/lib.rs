// reveal_engine: scroll-triggered entrance animations for the site, in Rust/WASM.
// The host page reports geometry and frame times; every style write comes back
// as one JSON batch per event.

mod context;
mod easing;
mod engine;
mod error;
mod forms;
mod interpolate;
mod logging;
mod presets;
mod sections;
mod site;
mod timeline;
mod transition;
mod trigger;
mod types;
mod viewport;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

pub use context::{ContextHandle, ScopedContext};
pub use easing::Easing;
pub use engine::{Cancellable, EngineHandle, MotionEngine, RunHandle, SubscriptionHandle};
pub use error::EngineError;
pub use forms::{
    is_valid_email, validate_contact, validate_newsletter, ContactErrors, ContactField,
    ContactFields, ContactForm, FormPhase, NewsletterForm, Submission,
};
pub use interpolate::Interpolate;
pub use logging::init as init_logging;
pub use presets::{fade_up, parallax, pop_in, slide_in, stagger_up, Preset};
pub use sections::{
    ContactParts, FullBleedParts, HeroParts, ImageSide, Recipe, SplitParts, StatCard,
};
pub use site::{link_is_active, Navbar, Route, ScrollControl, SiteSession};
pub use timeline::Timeline;
pub use transition::{CounterSpec, Drive, ScrubRange, Timing, TransitionSpec};
pub use trigger::{TriggerMode, TriggerSpec};
pub use types::*;
pub use viewport::{StyleBatch, StyleSink, StyleValue, StyleWrite, ViewportSnapshot, ViewportSource};

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = window, js_name = scrollTo)]
    fn window_scroll_to(x: f64, y: f64);
}

/// Browser window as the scroll owner.
struct WindowScroll;

impl ScrollControl for WindowScroll {
    fn scroll_to_top(&mut self) {
        window_scroll_to(0.0, 0.0);
    }
}

fn parse<'a, T: Deserialize<'a>>(what: &str, json: &'a str) -> Result<T, EngineError> {
    serde_json::from_str(json).map_err(|e| EngineError::InvalidRequest(format!("{what}: {e}")))
}

/// Entrance played on `targets` when `trigger` (default: first target) crosses `start`.
#[derive(Debug, Deserialize)]
struct RevealRequest {
    #[serde(default)]
    trigger: Option<ElementId>,
    targets: AnimationTarget,
    #[serde(default)]
    start: Option<Boundary>,
    animation: Preset,
}

#[derive(Debug, Deserialize)]
struct ScrubRequest {
    trigger: ElementId,
    targets: AnimationTarget,
    from: VisualState,
    #[serde(default)]
    to: VisualState,
    #[serde(default)]
    start: Option<Boundary>,
    #[serde(default)]
    end: Option<Boundary>,
}

#[derive(Debug, Deserialize)]
struct CounterRequest {
    element: ElementId,
    to: i64,
    #[serde(default)]
    start: Option<Boundary>,
}

#[derive(Debug, Deserialize)]
struct TimelineRequest {
    #[serde(default = "default_timeline_easing")]
    easing: Easing,
    steps: Vec<TimelineStep>,
}

#[derive(Debug, Deserialize)]
struct TimelineStep {
    targets: AnimationTarget,
    from: VisualState,
    #[serde(default)]
    to: VisualState,
    duration_ms: u32,
    #[serde(default)]
    at_ms: u32,
    #[serde(default)]
    easing: Option<Easing>,
}

fn default_timeline_easing() -> Easing {
    Easing::QuartOut
}

/// A JS `on_enter` registration.
#[derive(Debug, Clone, Copy)]
struct Listener {
    context: u32,
    repeatable: bool,
}

#[derive(Debug, Serialize)]
struct NavLink {
    path: &'static str,
    active: bool,
}

#[derive(Debug, Serialize)]
struct NavbarView<'a> {
    route: Route,
    #[serde(flatten)]
    navbar: &'a Navbar,
    opaque: bool,
    links: Vec<NavLink>,
}

/// Main engine interface exposed to JavaScript.
/// Batch interface to minimize JS↔WASM crossings.
#[wasm_bindgen]
pub struct Engine {
    motion: MotionEngine,
    config: EngineConfig,
    session: SiteSession,
    contact: ContactForm,
    newsletter: NewsletterForm,
    listeners: BTreeMap<u32, Listener>,
    callbacks: BTreeMap<u32, js_sys::Function>,
    /// Listener ids activated during the last events, oldest first.
    activated: Rc<RefCell<Vec<u32>>>,
    next_listener: u32,
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, path: &str) -> Result<Engine, JsValue> {
        Ok(Engine::create(config_json, path)?)
    }

    /// Open an animation context for a mounted section. Returns its id.
    pub fn open_context(&mut self, label: &str) -> u32 {
        self.session.open_section(label)
    }

    /// Unmount a section: nothing it registered runs after this returns.
    pub fn close_context(&mut self, context: u32) -> Result<(), JsValue> {
        Ok(self.close_context_with(context)?)
    }

    /// Register an entrance. Returns false when the selection was empty.
    pub fn reveal(&mut self, context: u32, request_json: &str) -> Result<bool, JsValue> {
        Ok(self.reveal_with(context, request_json)?)
    }

    /// Start a scroll-scrubbed run. Returns false when the selection was empty.
    pub fn scrub(&mut self, context: u32, request_json: &str) -> Result<bool, JsValue> {
        Ok(self.scrub_with(context, request_json)?)
    }

    pub fn count_up(&mut self, context: u32, request_json: &str) -> Result<bool, JsValue> {
        Ok(self.count_up_with(context, request_json)?)
    }

    /// Play a mount timeline. Returns the number of runs started.
    pub fn timeline(&mut self, context: u32, request_json: &str) -> Result<u32, JsValue> {
        Ok(self.timeline_with(context, request_json)?)
    }

    /// Configure a whole section from one of the built-in recipes.
    pub fn mount_section(&mut self, context: u32, recipe_json: &str) -> Result<(), JsValue> {
        Ok(self.mount_section_with(context, recipe_json)?)
    }

    /// Queue `callback` for when `element` crosses `start` (e.g. "top 80%").
    /// The engine never calls it itself: after `on_scroll` or `on_resize`
    /// returns, the host drains `take_activations` and calls each function,
    /// which is then free to call back into the engine.
    pub fn on_enter(
        &mut self,
        context: u32,
        element: u32,
        start: &str,
        repeatable: bool,
        callback: js_sys::Function,
    ) -> Result<bool, JsValue> {
        match self.on_enter_with(context, element, start, repeatable)? {
            Some(id) => {
                self.callbacks.insert(id, callback);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Callbacks whose element crossed since the last call, in crossing
    /// order. Callbacks of closed contexts are left out.
    pub fn take_activations(&mut self) -> js_sys::Array {
        let ready = js_sys::Array::new();
        for id in self.drain_activations() {
            let callback = if self.listeners.contains_key(&id) {
                self.callbacks.get(&id).cloned()
            } else {
                self.callbacks.remove(&id)
            };
            if let Some(callback) = callback {
                ready.push(&callback);
            }
        }
        ready
    }

    /// Scroll event. Returns the resulting style writes as JSON. Crossed
    /// `on_enter` callbacks wait in `take_activations`.
    pub fn on_scroll(&mut self, snapshot_json: &str) -> Result<String, JsValue> {
        Ok(self.viewport_event(snapshot_json, false)?)
    }

    /// Resize event; same evaluation as a scroll.
    pub fn on_resize(&mut self, snapshot_json: &str) -> Result<String, JsValue> {
        Ok(self.viewport_event(snapshot_json, true)?)
    }

    /// Animation frame at `now_ms`. Returns the style writes as JSON.
    pub fn tick(&mut self, now_ms: f64) -> Result<String, JsValue> {
        Ok(self.tick_with(now_ms)?.to_json().map_err(EngineError::from)?)
    }

    /// Whether clock-driven runs still want animation frames.
    pub fn needs_frame(&self) -> bool {
        self.motion.has_timed_runs()
    }

    /// Route change. Returns false when already on `path`.
    pub fn navigate(&mut self, path: &str) -> Result<bool, JsValue> {
        Ok(self.navigate_with(path, &mut WindowScroll)?)
    }

    pub fn toggle_menu(&mut self) -> bool {
        self.session.navbar_mut().toggle_menu()
    }

    pub fn close_menu(&mut self) {
        self.session.navbar_mut().close_menu();
    }

    /// Navbar state as JSON: scrolled, menu_open, opaque and per-link active flags.
    pub fn navbar_state(&self) -> Result<String, JsValue> {
        Ok(self.navbar_json()?)
    }

    pub fn contact_set_field(&mut self, field: &str, value: &str) -> Result<(), JsValue> {
        let field: ContactField = field.parse()?;
        self.contact.set_field(field, value);
        Ok(())
    }

    /// Submit the contact form. Returns `{"status": ..., "payload": ...}`.
    pub fn contact_submit(&mut self) -> Result<String, JsValue> {
        let outcome = self.contact.submit();
        Ok(serde_json::to_string(&outcome).map_err(EngineError::from)?)
    }

    pub fn newsletter_set_email(&mut self, value: &str) {
        self.newsletter.set_email(value);
    }

    pub fn newsletter_submit(&mut self) -> Result<String, JsValue> {
        let outcome = self.newsletter.submit();
        Ok(serde_json::to_string(&outcome).map_err(EngineError::from)?)
    }
}

impl Engine {
    fn create(config_json: &str, path: &str) -> Result<Engine, EngineError> {
        let config = EngineConfig::from_json(config_json)?;
        logging::init(&config.log_level)?;
        let route = Route::from_path(path)?;

        let motion = MotionEngine::new();
        let session = SiteSession::new(motion.handle(), route, &config.navbar);
        tracing::info!(route = %route, "engine ready");

        Ok(Engine {
            motion,
            config,
            session,
            contact: ContactForm::new(),
            newsletter: NewsletterForm::new(),
            listeners: BTreeMap::new(),
            callbacks: BTreeMap::new(),
            activated: Rc::new(RefCell::new(Vec::new())),
            next_listener: 0,
        })
    }

    fn close_context_with(&mut self, context: u32) -> Result<(), EngineError> {
        self.session.close_section(context)?;
        self.forget_closed_listeners();
        Ok(())
    }

    /// Register a listener that queues its id on each crossing. `None` when
    /// the registry handed back an inert subscription.
    fn on_enter_with(
        &mut self,
        context: u32,
        element: u32,
        start: &str,
        repeatable: bool,
    ) -> Result<Option<u32>, EngineError> {
        let threshold: Boundary = start.parse()?;
        let mode = if repeatable {
            TriggerMode::Repeatable
        } else {
            TriggerMode::OneShot
        };

        let id = self.next_listener;
        let queue = Rc::clone(&self.activated);
        let sub = self.session.section(context)?.on_enter(
            ElementId::new(element),
            threshold,
            mode,
            move || queue.borrow_mut().push(id),
        );
        if sub.is_inert() {
            return Ok(None);
        }

        self.next_listener += 1;
        self.listeners.insert(
            id,
            Listener {
                context,
                repeatable,
            },
        );
        Ok(Some(id))
    }

    /// Queued listener ids whose context is still open. One-shot listeners
    /// are forgotten once handed out.
    fn drain_activations(&mut self) -> Vec<u32> {
        let queued = std::mem::take(&mut *self.activated.borrow_mut());
        let mut ready = Vec::with_capacity(queued.len());
        for id in queued {
            let Some(listener) = self.listeners.get(&id).copied() else {
                continue;
            };
            if self.session.section(listener.context).is_err() {
                continue;
            }
            if !listener.repeatable {
                self.listeners.remove(&id);
            }
            ready.push(id);
        }
        ready
    }

    fn forget_closed_listeners(&mut self) {
        let session = &self.session;
        let callbacks = &mut self.callbacks;
        self.listeners.retain(|id, listener| {
            let keep = session.section(listener.context).is_ok();
            if !keep {
                callbacks.remove(id);
            }
            keep
        });
    }

    fn reveal_with(&self, context: u32, request_json: &str) -> Result<bool, EngineError> {
        let request: RevealRequest = parse("reveal request", request_json)?;
        let ctx = self.session.section(context)?;

        let trigger = match request.trigger {
            Some(trigger) => AnimationTarget::single(trigger),
            None => AnimationTarget::from(request.targets.first()),
        };
        let start = request
            .start
            .unwrap_or_else(|| request.animation.default_start(&self.config));
        let spec = request.animation.to_spec(&self.config);

        let sub = ctx.reveal(trigger, request.targets, start, spec);
        Ok(!sub.is_inert())
    }

    fn scrub_with(&self, context: u32, request_json: &str) -> Result<bool, EngineError> {
        let request: ScrubRequest = parse("scrub request", request_json)?;
        let ctx = self.session.section(context)?;

        let range = ScrubRange::new(
            request.trigger,
            request.start.unwrap_or(self.config.parallax.start),
            request.end.unwrap_or(self.config.parallax.end),
        );
        let run = ctx.play(
            request.targets,
            TransitionSpec::scrub(request.from, request.to, range),
        );
        Ok(!run.is_inert())
    }

    fn count_up_with(&self, context: u32, request_json: &str) -> Result<bool, EngineError> {
        let request: CounterRequest = parse("counter request", request_json)?;
        let ctx = self.session.section(context)?;

        let start = request.start.unwrap_or(self.config.counter.start);
        let sub = ctx.count_up(
            request.element,
            start,
            presets::counter(&self.config.counter, request.to),
        );
        Ok(!sub.is_inert())
    }

    fn timeline_with(&self, context: u32, request_json: &str) -> Result<u32, EngineError> {
        let request: TimelineRequest = parse("timeline request", request_json)?;
        let ctx = self.session.section(context)?;

        let timeline = request
            .steps
            .into_iter()
            .fold(Timeline::new(request.easing), |timeline, step| {
                timeline.add_with(
                    step.targets,
                    step.from,
                    step.to,
                    step.duration_ms,
                    step.at_ms,
                    step.easing,
                )
            });
        Ok(timeline.play(ctx).len() as u32)
    }

    fn mount_section_with(&self, context: u32, recipe_json: &str) -> Result<(), EngineError> {
        let recipe: Recipe = parse("section recipe", recipe_json)?;
        recipe.mount(self.session.section(context)?, &self.config);
        Ok(())
    }

    fn viewport_event(
        &mut self,
        snapshot_json: &str,
        resized: bool,
    ) -> Result<String, EngineError> {
        let snapshot: ViewportSnapshot = parse("viewport snapshot", snapshot_json)?;
        self.session.navbar_mut().on_scroll(snapshot.scroll_y);

        let mut batch = StyleBatch::new();
        if resized {
            self.motion.on_resize(&snapshot, &mut batch);
        } else {
            self.motion.on_scroll(&snapshot, &mut batch);
        }
        Ok(batch.to_json()?)
    }

    fn tick_with(&mut self, now_ms: f64) -> Result<StyleBatch, EngineError> {
        let mut batch = StyleBatch::new();
        self.motion.tick(Timestamp::from_millis(now_ms), &mut batch);
        Ok(batch)
    }

    fn navigate_with(
        &mut self,
        path: &str,
        scroll: &mut dyn ScrollControl,
    ) -> Result<bool, EngineError> {
        let route = Route::from_path(path)?;
        if !self.session.navigate(route, scroll) {
            return Ok(false);
        }
        // Forms belong to the page that mounted them.
        self.contact = ContactForm::new();
        self.newsletter = NewsletterForm::new();
        self.forget_closed_listeners();
        Ok(true)
    }

    fn navbar_json(&self) -> Result<String, EngineError> {
        let navbar = self.session.navbar();
        let view = NavbarView {
            route: self.session.route(),
            navbar,
            opaque: navbar.is_opaque(),
            links: Route::NAV_LINKS
                .into_iter()
                .map(|link| NavLink {
                    path: link.path(),
                    active: self.session.is_active(link),
                })
                .collect(),
        };
        Ok(serde_json::to_string(&view)?)
    }
}
