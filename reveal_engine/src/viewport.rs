// Environment seams: geometry comes in through `ViewportSource`, visual writes
// go out through `StyleSink`. The JSON snapshot/batch pair is the batch form
// the JS facade uses to keep JS<->WASM crossings to one per event.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{ElementBounds, ElementId, VisualState};

/// Read-only view of scroll position and element geometry.
pub trait ViewportSource {
    /// Document scroll offset in pixels.
    fn scroll_y(&self) -> f32;

    /// Height of the visible viewport in pixels.
    fn viewport_height(&self) -> f32;

    /// Bounds relative to the viewport top, `None` once the element is detached.
    fn element_bounds(&self, id: ElementId) -> Option<ElementBounds>;
}

/// Receiver of interpolated values.
pub trait StyleSink {
    fn write_visual(&mut self, id: ElementId, state: &VisualState);

    /// A counter's displayed integer.
    fn write_count(&mut self, id: ElementId, value: i64);
}

/// Geometry captured by the host at one scroll or resize event.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ViewportSnapshot {
    #[serde(default)]
    pub scroll_y: f32,
    pub viewport_height: f32,
    #[serde(default)]
    pub elements: HashMap<u32, ElementBounds>,
}

impl ViewportSnapshot {
    pub fn new(scroll_y: f32, viewport_height: f32) -> Self {
        ViewportSnapshot {
            scroll_y,
            viewport_height,
            elements: HashMap::new(),
        }
    }

    pub fn with_element(mut self, id: ElementId, bounds: ElementBounds) -> Self {
        self.elements.insert(id.as_u32(), bounds);
        self
    }

    pub fn set_element(&mut self, id: ElementId, bounds: ElementBounds) {
        self.elements.insert(id.as_u32(), bounds);
    }

    pub fn remove_element(&mut self, id: ElementId) {
        self.elements.remove(&id.as_u32());
    }

    /// Move the page by `delta` pixels: scroll offset grows, every element rises.
    pub fn scroll_by(&mut self, delta: f32) {
        self.scroll_y += delta;
        for bounds in self.elements.values_mut() {
            bounds.top -= delta;
        }
    }
}

impl ViewportSource for ViewportSnapshot {
    fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    fn viewport_height(&self) -> f32 {
        self.viewport_height
    }

    fn element_bounds(&self, id: ElementId) -> Option<ElementBounds> {
        self.elements.get(&id.as_u32()).copied()
    }
}

/// Value written to one element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StyleValue {
    Visual { state: VisualState },
    Count { value: i64 },
}

/// Single style write returned to JS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleWrite {
    pub element: ElementId,
    pub value: StyleValue,
}

/// Writes collected during one event, in the order they were produced.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StyleBatch {
    pub writes: Vec<StyleWrite>,
}

impl StyleBatch {
    pub fn new() -> Self {
        StyleBatch::default()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Most recent visual state written to `id` in this batch.
    pub fn last_visual(&self, id: ElementId) -> Option<VisualState> {
        self.writes.iter().rev().find_map(|w| match w.value {
            StyleValue::Visual { state } if w.element == id => Some(state),
            _ => None,
        })
    }

    /// Most recent counter value written to `id` in this batch.
    pub fn last_count(&self, id: ElementId) -> Option<i64> {
        self.writes.iter().rev().find_map(|w| match w.value {
            StyleValue::Count { value } if w.element == id => Some(value),
            _ => None,
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl StyleSink for StyleBatch {
    fn write_visual(&mut self, id: ElementId, state: &VisualState) {
        self.writes.push(StyleWrite {
            element: id,
            value: StyleValue::Visual { state: *state },
        });
    }

    fn write_count(&mut self, id: ElementId, value: i64) {
        self.writes.push(StyleWrite {
            element: id,
            value: StyleValue::Count { value },
        });
    }
}
