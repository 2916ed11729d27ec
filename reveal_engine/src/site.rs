// Page routing and chrome state: the six routes, the navbar and the session
// that owns the mounted page's animation contexts.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::context::ScopedContext;
use crate::engine::EngineHandle;
use crate::error::EngineError;
use crate::types::NavbarSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Route {
    Home,
    About,
    Services,
    Projects,
    Procedures,
    Contact,
}

impl Route {
    pub const ALL: [Route; 6] = [
        Route::Home,
        Route::About,
        Route::Services,
        Route::Projects,
        Route::Procedures,
        Route::Contact,
    ];

    /// Links shown in the navbar. Contact is reached through its own button.
    pub const NAV_LINKS: [Route; 5] = [
        Route::Home,
        Route::About,
        Route::Services,
        Route::Projects,
        Route::Procedures,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::About => "/about",
            Route::Services => "/services",
            Route::Projects => "/projects",
            Route::Procedures => "/procedures",
            Route::Contact => "/contact",
        }
    }

    pub fn from_path(path: &str) -> Result<Self, EngineError> {
        // "/about/" and "/about" are the same page.
        let trimmed = match path.trim_end_matches('/') {
            "" => "/",
            other => other,
        };
        Route::ALL
            .into_iter()
            .find(|route| route.path() == trimmed)
            .ok_or_else(|| EngineError::UnknownRoute(path.to_string()))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::from_path(s)
    }
}

impl TryFrom<String> for Route {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Route::from_path(&value)
    }
}

impl From<Route> for String {
    fn from(route: Route) -> Self {
        route.path().to_string()
    }
}

/// Whether a navbar link to `href` is highlighted while `current_path` is shown.
pub fn link_is_active(href: &str, current_path: &str) -> bool {
    if href == "/" {
        current_path == "/"
    } else {
        current_path.starts_with(href)
    }
}

/// Scroll position owner, reset on navigation.
pub trait ScrollControl {
    fn scroll_to_top(&mut self);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Navbar {
    #[serde(skip)]
    threshold_px: f32,
    scrolled: bool,
    menu_open: bool,
}

impl Navbar {
    pub fn new(settings: &NavbarSettings) -> Self {
        Navbar {
            threshold_px: settings.scrolled_threshold_px,
            scrolled: false,
            menu_open: false,
        }
    }

    /// Track page scroll. Returns true when the scrolled flag flipped.
    pub fn on_scroll(&mut self, scroll_y: f32) -> bool {
        let scrolled = scroll_y > self.threshold_px;
        let changed = scrolled != self.scrolled;
        self.scrolled = scrolled;
        changed
    }

    pub fn is_scrolled(&self) -> bool {
        self.scrolled
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu_open
    }

    /// Solid background once scrolled or while the mobile menu covers the page.
    pub fn is_opaque(&self) -> bool {
        self.scrolled || self.menu_open
    }

    pub fn toggle_menu(&mut self) -> bool {
        self.menu_open = !self.menu_open;
        self.menu_open
    }

    pub fn close_menu(&mut self) {
        self.menu_open = false;
    }
}

/// Current page plus the animation contexts its sections opened.
pub struct SiteSession {
    engine: EngineHandle,
    route: Route,
    navbar: Navbar,
    sections: BTreeMap<u32, ScopedContext>,
    /// Never reused, so ids from a departed page stay unknown.
    next_section: u32,
}

impl SiteSession {
    pub fn new(engine: EngineHandle, route: Route, navbar: &NavbarSettings) -> Self {
        SiteSession {
            engine,
            route,
            navbar: Navbar::new(navbar),
            sections: BTreeMap::new(),
            next_section: 1,
        }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn navbar(&self) -> &Navbar {
        &self.navbar
    }

    pub fn navbar_mut(&mut self) -> &mut Navbar {
        &mut self.navbar
    }

    pub fn is_active(&self, link: Route) -> bool {
        link_is_active(link.path(), self.route.path())
    }

    /// Open a context for a section of the current page and return its id.
    pub fn open_section(&mut self, label: impl Into<String>) -> u32 {
        let id = self.next_section;
        self.next_section += 1;
        self.sections
            .insert(id, ScopedContext::open_named(self.engine.clone(), label));
        id
    }

    pub fn section(&self, id: u32) -> Result<&ScopedContext, EngineError> {
        self.sections
            .get(&id)
            .ok_or(EngineError::UnknownContext(id))
    }

    /// Close one section early (it unmounted while the page stays).
    pub fn close_section(&mut self, id: u32) -> Result<(), EngineError> {
        let section = self
            .sections
            .remove(&id)
            .ok_or(EngineError::UnknownContext(id))?;
        section.close();
        Ok(())
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Leave the current page. Every section context is closed before
    /// returning. Navigating to the page already shown does nothing.
    pub fn navigate(&mut self, to: Route, scroll: &mut dyn ScrollControl) -> bool {
        if to == self.route {
            return false;
        }

        let released = self.sections.len();
        for (_, section) in std::mem::take(&mut self.sections) {
            section.close();
        }
        scroll.scroll_to_top();
        self.navbar.close_menu();

        tracing::info!(from = %self.route, to = %to, sections = released, "navigated");
        self.route = to;
        true
    }
}
