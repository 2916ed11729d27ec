// Strong typing over strings. Newtypes for timestamps, element ids, and viewport geometry.
// Boundaries travel as "top 85%" strings in JSON and are parsed once at the edge.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::error::EngineError;

/// Timestamp in microseconds. Newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn from_micros(us: u64) -> Self {
        Timestamp(us)
    }

    /// From a frame clock in milliseconds (`requestAnimationFrame` style).
    /// Negative and non-finite inputs collapse to zero.
    pub fn from_millis(ms: f64) -> Self {
        if ms.is_finite() && ms > 0.0 {
            Timestamp((ms * 1000.0).round() as u64)
        } else {
            Timestamp(0)
        }
    }

    pub fn as_micros(&self) -> u64 {
        self.0
    }

    pub fn as_millis(&self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Milliseconds elapsed since `earlier`, zero if the clock went backwards.
    pub fn millis_since(&self, earlier: Timestamp) -> f64 {
        self.0.saturating_sub(earlier.0) as f64 / 1000.0
    }
}

/// Host-assigned identifier of a renderable element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(u32);

impl ElementId {
    pub fn new(id: u32) -> Self {
        ElementId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// One or more elements selected from a container.
///
/// The engine only references these for the lifetime of a trigger or run; it
/// never owns the elements. An empty selection is legal and makes every
/// operation against it a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnimationTarget(Vec<ElementId>);

impl AnimationTarget {
    pub fn empty() -> Self {
        AnimationTarget(Vec::new())
    }

    pub fn single(id: ElementId) -> Self {
        AnimationTarget(vec![id])
    }

    pub fn many(ids: impl IntoIterator<Item = ElementId>) -> Self {
        AnimationTarget(ids.into_iter().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The element a trigger observes when this target is used as a container.
    pub fn first(&self) -> Option<ElementId> {
        self.0.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.0.iter().copied()
    }

    pub fn into_vec(self) -> Vec<ElementId> {
        self.0
    }
}

impl From<ElementId> for AnimationTarget {
    fn from(id: ElementId) -> Self {
        AnimationTarget::single(id)
    }
}

impl From<Option<ElementId>> for AnimationTarget {
    fn from(id: Option<ElementId>) -> Self {
        AnimationTarget(id.into_iter().collect())
    }
}

/// Element bounds relative to the top of the viewport, in CSS pixels.
/// Same frame of reference as `getBoundingClientRect()`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ElementBounds {
    pub top: f32,
    pub height: f32,
}

impl ElementBounds {
    pub fn new(top: f32, height: f32) -> Self {
        ElementBounds {
            top,
            height: height.max(0.0),
        }
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn edge_y(&self, edge: Edge) -> f32 {
        match edge {
            Edge::Top => self.top,
            Edge::Center => self.top + self.height / 2.0,
            Edge::Bottom => self.bottom(),
        }
    }
}

/// Which horizontal line of an element a boundary refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Top,
    Center,
    Bottom,
}

impl Edge {
    fn as_str(&self) -> &'static str {
        match self {
            Edge::Top => "top",
            Edge::Center => "center",
            Edge::Bottom => "bottom",
        }
    }

    fn fraction(&self) -> f32 {
        match self {
            Edge::Top => 0.0,
            Edge::Center => 0.5,
            Edge::Bottom => 1.0,
        }
    }
}

impl FromStr for Edge {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(Edge::Top),
            "center" => Ok(Edge::Center),
            "bottom" => Ok(Edge::Bottom),
            other => Err(EngineError::InvalidBoundary(other.to_string())),
        }
    }
}

/// Fraction of the viewport height (0.0 = top line, 1.0 = bottom line).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct ViewportFraction(f32);

impl ViewportFraction {
    pub fn new(fraction: f32) -> Self {
        if fraction.is_nan() {
            return ViewportFraction(0.0);
        }
        ViewportFraction(fraction.clamp(0.0, 1.0))
    }

    pub fn percent(pct: f32) -> Self {
        ViewportFraction::new(pct / 100.0)
    }

    pub fn as_f32(&self) -> f32 {
        self.0
    }

    /// Pixel offset of this line from the viewport top.
    pub fn of(&self, viewport_height: f32) -> f32 {
        self.0 * viewport_height
    }
}

/// "Element edge meets viewport line", e.g. `top 85%` or `bottom top`.
///
/// The boundary is crossed once the element edge sits at or above the
/// viewport line, which happens as the page scrolls down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Boundary {
    pub edge: Edge,
    pub line: ViewportFraction,
}

impl Boundary {
    pub fn new(edge: Edge, line: ViewportFraction) -> Self {
        Boundary { edge, line }
    }

    /// `top <pct>%`, the common entrance boundary.
    pub fn top_at(pct: f32) -> Self {
        Boundary::new(Edge::Top, ViewportFraction::percent(pct))
    }

    /// Signed distance from the viewport line to the element edge.
    /// Zero or negative means crossed.
    pub fn distance(&self, bounds: &ElementBounds, viewport_height: f32) -> f32 {
        bounds.edge_y(self.edge) - self.line.of(viewport_height)
    }

    pub fn is_crossed(&self, bounds: &ElementBounds, viewport_height: f32) -> bool {
        self.distance(bounds, viewport_height) <= 0.0
    }
}

impl FromStr for Boundary {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(edge), Some(line), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(EngineError::InvalidBoundary(s.to_string()));
        };

        let edge = edge
            .parse::<Edge>()
            .map_err(|_| EngineError::InvalidBoundary(s.to_string()))?;

        let line = if let Some(pct) = line.strip_suffix('%') {
            let pct: f32 = pct
                .parse()
                .map_err(|_| EngineError::InvalidBoundary(s.to_string()))?;
            ViewportFraction::percent(pct)
        } else {
            let named = line
                .parse::<Edge>()
                .map_err(|_| EngineError::InvalidBoundary(s.to_string()))?;
            ViewportFraction::new(named.fraction())
        };

        Ok(Boundary::new(edge, line))
    }
}

impl TryFrom<String> for Boundary {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Boundary> for String {
    fn from(boundary: Boundary) -> Self {
        boundary.to_string()
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = (self.line.as_f32() * 100_000.0).round() / 1000.0;
        write!(f, "{} {}%", self.edge.as_str(), pct)
    }
}

/// Numeric rendering properties at one point of an interpolation.
///
/// `VisualState::natural()` is an element's untouched layout state, which is
/// always the end state of an entrance so the page reads fine without motion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualState {
    #[serde(default)]
    pub offset_x: f32,
    #[serde(default)]
    pub offset_y: f32,
    #[serde(default = "default_one")]
    pub opacity: f32,
    #[serde(default = "default_one")]
    pub scale: f32,
}

fn default_one() -> f32 {
    1.0
}

impl VisualState {
    pub fn natural() -> Self {
        VisualState {
            offset_x: 0.0,
            offset_y: 0.0,
            opacity: 1.0,
            scale: 1.0,
        }
    }

    pub fn with_x(mut self, offset_x: f32) -> Self {
        self.offset_x = offset_x;
        self
    }

    pub fn with_y(mut self, offset_y: f32) -> Self {
        self.offset_y = offset_y;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Opacity in [0, 1], scale >= 0.
    pub fn clamped(mut self) -> Self {
        self.opacity = self.opacity.clamp(0.0, 1.0);
        self.scale = self.scale.max(0.0);
        self
    }
}

impl Default for VisualState {
    fn default() -> Self {
        VisualState::natural()
    }
}

/// Engine configuration passed from JS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub reveal: RevealSettings,
    #[serde(default)]
    pub stagger: StaggerSettings,
    #[serde(default)]
    pub parallax: ParallaxSettings,
    #[serde(default)]
    pub counter: CounterSettings,
    #[serde(default)]
    pub navbar: NavbarSettings,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            reveal: RevealSettings::default(),
            stagger: StaggerSettings::default(),
            parallax: ParallaxSettings::default(),
            counter: CounterSettings::default(),
            navbar: NavbarSettings::default(),
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Single-element fade-up defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealSettings {
    #[serde(default = "default_reveal_duration")]
    pub duration_ms: u32,
    #[serde(default = "default_reveal_offset")]
    pub offset_y: f32,
    #[serde(default = "default_reveal_start")]
    pub start: Boundary,
    #[serde(default = "default_easing")]
    pub easing: Easing,
}

impl Default for RevealSettings {
    fn default() -> Self {
        RevealSettings {
            duration_ms: default_reveal_duration(),
            offset_y: default_reveal_offset(),
            start: default_reveal_start(),
            easing: default_easing(),
        }
    }
}

fn default_reveal_duration() -> u32 {
    800
}

fn default_reveal_offset() -> f32 {
    30.0
}

fn default_reveal_start() -> Boundary {
    Boundary::top_at(85.0)
}

fn default_easing() -> Easing {
    Easing::CubicOut
}

/// Staggered-children defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaggerSettings {
    #[serde(default = "default_stagger_duration")]
    pub duration_ms: u32,
    #[serde(default = "default_stagger_step")]
    pub stagger_ms: u32,
    #[serde(default = "default_stagger_offset")]
    pub offset_y: f32,
    #[serde(default = "default_stagger_start")]
    pub start: Boundary,
    #[serde(default = "default_easing")]
    pub easing: Easing,
}

impl Default for StaggerSettings {
    fn default() -> Self {
        StaggerSettings {
            duration_ms: default_stagger_duration(),
            stagger_ms: default_stagger_step(),
            offset_y: default_stagger_offset(),
            start: default_stagger_start(),
            easing: default_easing(),
        }
    }
}

fn default_stagger_duration() -> u32 {
    700
}

fn default_stagger_step() -> u32 {
    100
}

fn default_stagger_offset() -> f32 {
    40.0
}

fn default_stagger_start() -> Boundary {
    Boundary::top_at(80.0)
}

/// Scroll-scrubbed drift defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallaxSettings {
    #[serde(default = "default_parallax_speed")]
    pub speed: f32,
    /// Share of the viewport height travelled at speed 1.0.
    #[serde(default = "default_parallax_travel")]
    pub travel: f32,
    #[serde(default = "default_parallax_start")]
    pub start: Boundary,
    #[serde(default = "default_parallax_end")]
    pub end: Boundary,
}

impl Default for ParallaxSettings {
    fn default() -> Self {
        ParallaxSettings {
            speed: default_parallax_speed(),
            travel: default_parallax_travel(),
            start: default_parallax_start(),
            end: default_parallax_end(),
        }
    }
}

fn default_parallax_speed() -> f32 {
    0.5
}

fn default_parallax_travel() -> f32 {
    0.3
}

fn default_parallax_start() -> Boundary {
    Boundary::new(Edge::Top, ViewportFraction::new(1.0))
}

fn default_parallax_end() -> Boundary {
    Boundary::new(Edge::Bottom, ViewportFraction::new(0.0))
}

/// Count-up defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterSettings {
    #[serde(default = "default_counter_duration")]
    pub duration_ms: u32,
    #[serde(default = "default_easing")]
    pub easing: Easing,
    #[serde(default = "default_reveal_start")]
    pub start: Boundary,
}

impl Default for CounterSettings {
    fn default() -> Self {
        CounterSettings {
            duration_ms: default_counter_duration(),
            easing: default_easing(),
            start: default_reveal_start(),
        }
    }
}

fn default_counter_duration() -> u32 {
    2000
}

/// Navigation bar behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavbarSettings {
    #[serde(default = "default_scrolled_threshold")]
    pub scrolled_threshold_px: f32,
}

impl Default for NavbarSettings {
    fn default() -> Self {
        NavbarSettings {
            scrolled_threshold_px: default_scrolled_threshold(),
        }
    }
}

fn default_scrolled_threshold() -> f32 {
    50.0
}
