// Section recipes: which entrances each part of the site runs, with its offsets,
// durations, staggers and boundaries. Every recipe configures one context;
// a missing part (selector matched nothing) is skipped, never an error.

use serde::Deserialize;

use crate::context::ScopedContext;
use crate::easing::Easing;
use crate::engine::{RunHandle, SubscriptionHandle};
use crate::presets;
use crate::timeline::Timeline;
use crate::transition::{ScrubRange, Timing, TransitionSpec};
use crate::types::{AnimationTarget, Boundary, ElementId, EngineConfig, VisualState};

fn rise(offset_y: f32) -> VisualState {
    VisualState::natural().with_y(offset_y).with_opacity(0.0)
}

/// Side of a split section the image sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSide {
    Left,
    Right,
}

impl ImageSide {
    /// Horizontal sign the image enters from; content comes from the other side.
    fn sign(self) -> f32 {
        match self {
            ImageSide::Left => -1.0,
            ImageSide::Right => 1.0,
        }
    }
}

/// Hero banner parts. Only the image is required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HeroParts {
    pub image: Option<ElementId>,
    pub micro_label: Option<ElementId>,
    pub headline: Option<ElementId>,
    pub subheadline: Option<ElementId>,
    pub rating: Option<ElementId>,
    pub cta_row: Option<ElementId>,
}

/// Plays on mount, no trigger.
pub fn mount_hero(ctx: &ScopedContext, parts: &HeroParts) -> Vec<RunHandle> {
    let Some(image) = parts.image else {
        return Vec::new();
    };
    Timeline::new(Easing::QuartOut)
        .add(image, rise(0.0).with_x(-100.0).with_scale(0.95), 1200, 0)
        .add(parts.micro_label, rise(20.0), 600, 200)
        .add(parts.headline, rise(60.0), 1000, 300)
        .add(parts.subheadline, rise(30.0), 800, 500)
        .add(parts.rating, rise(20.0), 600, 600)
        .add(parts.cta_row, rise(24.0), 700, 700)
        .play(ctx)
}

/// Grid of cards popping in one after another once the grid's top reaches 80%.
pub fn mount_card_grid(
    ctx: &ScopedContext,
    grid: ElementId,
    cards: &[ElementId],
    from_y: f32,
) -> SubscriptionHandle {
    ctx.reveal(
        grid,
        AnimationTarget::many(cards.iter().copied()),
        Boundary::top_at(80.0),
        presets::pop_in(
            from_y,
            0.97,
            Timing::new(1000, Easing::QuartOut).with_stagger(150),
        ),
    )
}

/// Feature cards section.
pub fn mount_feature_cards(
    ctx: &ScopedContext,
    grid: ElementId,
    cards: &[ElementId],
) -> SubscriptionHandle {
    mount_card_grid(ctx, grid, cards, 70.0)
}

/// Office locations section.
pub fn mount_locations(
    ctx: &ScopedContext,
    grid: ElementId,
    cards: &[ElementId],
) -> SubscriptionHandle {
    mount_card_grid(ctx, grid, cards, 60.0)
}

/// One stat card: the card itself plus the number it counts up to.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StatCard {
    pub card: ElementId,
    pub counter: ElementId,
    pub value: i64,
}

/// Stats grid with counters. Cards stagger in at 80%, each counter starts
/// on its own at the configured counter boundary.
pub fn mount_stats(
    ctx: &ScopedContext,
    config: &EngineConfig,
    grid: ElementId,
    stats: &[StatCard],
) -> Vec<SubscriptionHandle> {
    let mut subs = vec![ctx.reveal(
        grid,
        AnimationTarget::many(stats.iter().map(|s| s.card)),
        Boundary::top_at(80.0),
        presets::pop_in(60.0, 0.96, Timing::new(900, Easing::QuartOut).with_stagger(120)),
    )];
    for stat in stats {
        subs.push(ctx.count_up(
            stat.counter,
            config.counter.start,
            presets::counter(&config.counter, stat.value),
        ));
    }
    subs
}

/// Image beside text with bullet points.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SplitParts {
    pub section: Option<ElementId>,
    pub image: Option<ElementId>,
    pub content: Option<ElementId>,
    pub bullets: Vec<ElementId>,
}

pub fn mount_split(
    ctx: &ScopedContext,
    parts: &SplitParts,
    side: ImageSide,
) -> Vec<SubscriptionHandle> {
    let (Some(section), Some(image), Some(content)) = (parts.section, parts.image, parts.content)
    else {
        return Vec::new();
    };
    let sign = side.sign();
    vec![
        ctx.reveal(
            section,
            image,
            Boundary::top_at(75.0),
            TransitionSpec::entrance(
                rise(0.0).with_x(80.0 * sign).with_scale(0.96),
                Timing::new(1100, Easing::QuartOut),
            ),
        ),
        ctx.reveal(
            section,
            content,
            Boundary::top_at(75.0),
            presets::slide_in(-50.0 * sign, 1000, Easing::QuartOut),
        ),
        ctx.reveal(
            section,
            AnimationTarget::many(parts.bullets.iter().copied()),
            Boundary::top_at(65.0),
            TransitionSpec::entrance(
                rise(0.0).with_x(30.0),
                Timing::new(700, Easing::QuartOut).with_stagger(120),
            ),
        ),
    ]
}

/// Full-width image with parallax and overlaid copy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FullBleedParts {
    pub section: Option<ElementId>,
    pub image: Option<ElementId>,
    pub headline: Option<ElementId>,
    pub body: Option<ElementId>,
}

pub fn mount_full_bleed(ctx: &ScopedContext, config: &EngineConfig, parts: &FullBleedParts) {
    let (Some(section), Some(image)) = (parts.section, parts.image) else {
        return;
    };
    ctx.play(
        image,
        TransitionSpec::scrub(
            VisualState::natural().with_y(50.0).with_scale(1.15),
            VisualState::natural(),
            ScrubRange::new(section, config.parallax.start, config.parallax.end),
        ),
    );

    let start = Boundary::top_at(70.0);
    ctx.reveal(
        section,
        parts.headline,
        start,
        presets::pop_in(60.0, 1.0, Timing::new(1000, Easing::QuartOut)),
    );
    ctx.reveal(
        section,
        parts.body,
        start,
        presets::pop_in(40.0, 1.0, Timing::new(900, Easing::QuartOut).with_delay(200)),
    );
}

/// Newsletter signup block.
pub fn mount_newsletter(
    ctx: &ScopedContext,
    section: ElementId,
    content: Option<ElementId>,
) -> SubscriptionHandle {
    ctx.reveal(
        section,
        content,
        Boundary::top_at(80.0),
        presets::pop_in(50.0, 1.0, Timing::new(1000, Easing::QuartOut)),
    )
}

/// Drifting background element, `speed` scaling how far it travels.
pub fn mount_parallax(
    ctx: &ScopedContext,
    config: &EngineConfig,
    element: ElementId,
    speed: f32,
    viewport_height: f32,
) -> RunHandle {
    let mut settings = config.parallax.clone();
    settings.speed = speed;
    ctx.play(element, presets::parallax(&settings, element, viewport_height))
}

/// Contact page: hero copy, contact details from the left, form from the right.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactParts {
    pub hero: Option<ElementId>,
    pub hero_content: Option<ElementId>,
    pub info: Option<ElementId>,
    pub form: Option<ElementId>,
}

pub fn mount_contact_page(ctx: &ScopedContext, parts: &ContactParts) {
    let start = Boundary::top_at(80.0);
    if parts.hero_content.is_some() {
        ctx.reveal(
            parts.hero,
            parts.hero_content,
            start,
            presets::pop_in(50.0, 1.0, Timing::new(1000, Easing::CubicOut)),
        );
    }
    ctx.reveal(
        parts.info,
        parts.info,
        start,
        presets::slide_in(-40.0, 900, Easing::CubicOut),
    );
    ctx.reveal(
        parts.form,
        parts.form,
        start,
        presets::slide_in(40.0, 900, Easing::CubicOut),
    );
}

/// A section mount as requested from JS, tagged by `"kind"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recipe {
    Hero(HeroParts),
    FeatureCards {
        grid: ElementId,
        cards: Vec<ElementId>,
    },
    Locations {
        grid: ElementId,
        cards: Vec<ElementId>,
    },
    Stats {
        grid: ElementId,
        stats: Vec<StatCard>,
    },
    Split {
        #[serde(flatten)]
        parts: SplitParts,
        image_side: ImageSide,
    },
    FullBleed(FullBleedParts),
    Newsletter {
        section: ElementId,
        #[serde(default)]
        content: Option<ElementId>,
    },
    Parallax {
        element: ElementId,
        speed: f32,
        viewport_height: f32,
    },
    Contact(ContactParts),
}

impl Recipe {
    /// Configure `ctx` for this section.
    pub fn mount(&self, ctx: &ScopedContext, config: &EngineConfig) {
        match self {
            Recipe::Hero(parts) => {
                mount_hero(ctx, parts);
            }
            Recipe::FeatureCards { grid, cards } => {
                mount_feature_cards(ctx, *grid, cards);
            }
            Recipe::Locations { grid, cards } => {
                mount_locations(ctx, *grid, cards);
            }
            Recipe::Stats { grid, stats } => {
                mount_stats(ctx, config, *grid, stats);
            }
            Recipe::Split { parts, image_side } => {
                mount_split(ctx, parts, *image_side);
            }
            Recipe::FullBleed(parts) => mount_full_bleed(ctx, config, parts),
            Recipe::Newsletter { section, content } => {
                mount_newsletter(ctx, *section, *content);
            }
            Recipe::Parallax {
                element,
                speed,
                viewport_height,
            } => {
                mount_parallax(ctx, config, *element, *speed, *viewport_height);
            }
            Recipe::Contact(parts) => mount_contact_page(ctx, parts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MotionEngine;
    use crate::types::{ElementBounds, Timestamp};
    use crate::viewport::{StyleBatch, ViewportSnapshot};

    fn id(n: u32) -> ElementId {
        ElementId::new(n)
    }

    #[test]
    fn hero_plays_on_mount_and_skips_missing_parts() {
        let engine = MotionEngine::new();
        let ctx = ScopedContext::open_named(engine.handle(), "hero");
        let parts = HeroParts {
            image: Some(id(1)),
            headline: Some(id(2)),
            cta_row: Some(id(3)),
            ..Default::default()
        };
        let runs = mount_hero(&ctx, &parts);
        assert_eq!(runs.len(), 3);

        let mut batch = StyleBatch::new();
        engine.tick(Timestamp::from_millis(0.0), &mut batch);
        let image = batch.last_visual(id(1)).unwrap();
        assert_eq!(image.offset_x, -100.0);
        assert_eq!(image.scale, 0.95);

        let mut now = 0.0;
        while engine.tick(Timestamp::from_millis(now), &mut batch) {
            now += 16.0;
        }
        for part in [1, 2, 3] {
            assert_eq!(batch.last_visual(id(part)), Some(VisualState::natural()));
        }
    }

    #[test]
    fn hero_without_image_does_nothing() {
        let engine = MotionEngine::new();
        let ctx = ScopedContext::open(engine.handle());
        assert!(mount_hero(&ctx, &HeroParts::default()).is_empty());
        assert_eq!(engine.run_count(), 0);
    }

    #[test]
    fn stats_count_up_after_scrolling_into_view() {
        let engine = MotionEngine::new();
        let config = EngineConfig::default();
        let ctx = ScopedContext::open(engine.handle());
        let stats = [
            StatCard { card: id(11), counter: id(21), value: 150 },
            StatCard { card: id(12), counter: id(22), value: 15 },
            StatCard { card: id(13), counter: id(23), value: 2025 },
        ];
        mount_stats(&ctx, &config, id(10), &stats);
        assert_eq!(engine.trigger_count(), 4);

        let mut env = ViewportSnapshot::new(0.0, 1000.0).with_element(id(10), ElementBounds::new(1400.0, 500.0));
        for (i, stat) in stats.iter().enumerate() {
            env.set_element(stat.counter, ElementBounds::new(1600.0 + i as f32, 60.0));
        }

        let mut batch = StyleBatch::new();
        env.scroll_by(1000.0);
        engine.on_scroll(&env, &mut batch);
        assert_eq!(engine.trigger_count(), 0);

        let mut now = 0.0;
        while engine.tick(Timestamp::from_millis(now), &mut batch) {
            now += 16.0;
        }
        assert_eq!(batch.last_count(id(21)), Some(150));
        assert_eq!(batch.last_count(id(22)), Some(15));
        assert_eq!(batch.last_count(id(23)), Some(2025));
        assert_eq!(batch.last_visual(id(13)), Some(VisualState::natural()));
    }

    #[test]
    fn split_sections_mirror_by_side() {
        let engine = MotionEngine::new();
        let ctx = ScopedContext::open(engine.handle());
        let parts = SplitParts {
            section: Some(id(1)),
            image: Some(id(2)),
            content: Some(id(3)),
            bullets: vec![id(4), id(5)],
        };
        assert_eq!(mount_split(&ctx, &parts, ImageSide::Right).len(), 3);

        let env = ViewportSnapshot::new(0.0, 1000.0).with_element(id(1), ElementBounds::new(700.0, 800.0));
        let mut batch = StyleBatch::new();
        engine.on_scroll(&env, &mut batch);
        engine.tick(Timestamp::from_millis(0.0), &mut batch);
        assert_eq!(batch.last_visual(id(2)).unwrap().offset_x, 80.0);
        assert_eq!(batch.last_visual(id(3)).unwrap().offset_x, -50.0);
        // 700 is above the 75% line but not yet the 65% one: bullets still waiting.
        assert_eq!(batch.last_visual(id(4)), None);
    }

    #[test]
    fn split_without_section_registers_nothing() {
        let engine = MotionEngine::new();
        let ctx = ScopedContext::open(engine.handle());
        let parts = SplitParts {
            image: Some(id(2)),
            ..Default::default()
        };
        assert!(mount_split(&ctx, &parts, ImageSide::Left).is_empty());
        assert_eq!(engine.trigger_count(), 0);
    }

    #[test]
    fn full_bleed_scrubs_image() {
        let engine = MotionEngine::new();
        let config = EngineConfig::default();
        let ctx = ScopedContext::open(engine.handle());
        let parts = FullBleedParts {
            section: Some(id(1)),
            image: Some(id(2)),
            headline: Some(id(3)),
            body: None,
        };
        mount_full_bleed(&ctx, &config, &parts);
        assert_eq!(engine.run_count(), 1);
        assert_eq!(engine.trigger_count(), 2);

        let env = ViewportSnapshot::new(0.0, 1000.0).with_element(id(1), ElementBounds::new(1000.0, 500.0));
        let mut batch = StyleBatch::new();
        engine.on_scroll(&env, &mut batch);
        let image = batch.last_visual(id(2)).unwrap();
        assert_eq!(image.scale, 1.15);
        assert_eq!(image.offset_y, 50.0);
    }

    #[test]
    fn contact_page_slides_from_both_sides() {
        let engine = MotionEngine::new();
        let ctx = ScopedContext::open(engine.handle());
        let parts = ContactParts {
            hero: Some(id(1)),
            hero_content: Some(id(2)),
            info: Some(id(3)),
            form: Some(id(4)),
        };
        mount_contact_page(&ctx, &parts);
        assert_eq!(engine.trigger_count(), 3);

        let env = ViewportSnapshot::new(0.0, 1000.0)
            .with_element(id(1), ElementBounds::new(0.0, 600.0))
            .with_element(id(3), ElementBounds::new(700.0, 400.0))
            .with_element(id(4), ElementBounds::new(700.0, 400.0));
        let mut batch = StyleBatch::new();
        engine.on_scroll(&env, &mut batch);
        engine.tick(Timestamp::from_millis(0.0), &mut batch);
        assert_eq!(batch.last_visual(id(3)).unwrap().offset_x, -40.0);
        assert_eq!(batch.last_visual(id(4)).unwrap().offset_x, 40.0);
        assert_eq!(batch.last_visual(id(2)).unwrap().offset_y, 50.0);
    }

    #[test]
    fn recipes_from_json() {
        let engine = MotionEngine::new();
        let config = EngineConfig::default();
        let ctx = ScopedContext::open(engine.handle());

        let recipe: Recipe = serde_json::from_str(
            r#"{"kind":"split","image":2,"content":3,"bullets":[4],"image_side":"left"}"#,
        )
        .unwrap();
        recipe.mount(&ctx, &config);
        // No section element: nothing registered.
        assert_eq!(engine.trigger_count(), 0);

        let recipe: Recipe =
            serde_json::from_str(r#"{"kind":"feature_cards","grid":1,"cards":[2,3,4]}"#).unwrap();
        recipe.mount(&ctx, &config);
        assert_eq!(engine.trigger_count(), 1);

        let recipe: Recipe =
            serde_json::from_str(r#"{"kind":"parallax","element":9,"speed":0.3,"viewport_height":800}"#)
                .unwrap();
        recipe.mount(&ctx, &config);
        assert_eq!(engine.run_count(), 1);

        assert!(serde_json::from_str::<Recipe>(r#"{"kind":"footer"}"#).is_err());
    }
}
