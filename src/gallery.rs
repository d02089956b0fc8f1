//! Gallery and modal interaction.
//!
//! Two halves:
//!
//! - [`plan_click`] decides, at build time, what clicking an image tile does.
//!   The result is a [`ClickAction`], serialized into the tile's
//!   `data-action` attribute and executed by `static/press.js`.
//! - [`GalleryController`] is the runtime state machine that executes those
//!   actions and handles navigation and dismissal. It owns its state and
//!   performs every visible effect through a [`ModalPort`], so the whole
//!   interaction can be driven without a browser.
//!
//! ## Click priority
//!
//! 1. Popup link and screenshot → article view (embedded page + screenshot)
//! 2. Popup link only → open the link in a new browsing context
//! 3. Two images → spread, adjusted by the exception rules
//! 4. Three images with a cover-first rule → cover, then images 2 and 3
//! 5. Anything else → lightbox starting at the first image
//!
//! ## States
//!
//! ```text
//!            click                      next / →
//! Closed ──────────────► CoverThenSpread ──────────► Spread
//!   ▲  ╲                                               │
//!   │   ╲──────────────► Lightbox ◄─┐ next/prev (wrap) │
//!   │    ╲               │  └───────┘                  │
//!   │     ╲────────────► Article                       │
//!   └──── Esc / backdrop / close ◄─────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

/// How a two-image tile deviates from the plain spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpreadBehavior {
    /// Second image on the left, first on the right.
    Swap,
    /// First image alone, the spread revealed on the next action.
    CoverFirst,
}

/// Lookup table of spread exceptions.
///
/// Publication names match case-insensitively as substrings of the tile's
/// medium or title. Positions match exactly. A position match wins over a
/// name match; among name matches `CoverFirst` wins over `Swap`.
#[derive(Debug, Clone, Default)]
pub struct ExceptionRules {
    publications: Vec<(String, SpreadBehavior)>,
    positions: Vec<(f64, SpreadBehavior)>,
}

impl ExceptionRules {
    pub fn add_publication(&mut self, name: &str, behavior: SpreadBehavior) {
        let name = name.trim().to_lowercase();
        // An empty needle would match every tile.
        if !name.is_empty() {
            self.publications.push((name, behavior));
        }
    }

    pub fn add_position(&mut self, position: f64, behavior: SpreadBehavior) {
        self.positions.push((position, behavior));
    }

    pub fn is_empty(&self) -> bool {
        self.publications.is_empty() && self.positions.is_empty()
    }

    pub fn behavior_for(
        &self,
        medium: &str,
        title: &str,
        position: Option<f64>,
    ) -> Option<SpreadBehavior> {
        if let Some(p) = position
            && let Some((_, behavior)) = self.positions.iter().find(|(pos, _)| *pos == p)
        {
            return Some(*behavior);
        }

        let medium = medium.trim().to_lowercase();
        let title = title.trim().to_lowercase();
        let matching: Vec<SpreadBehavior> = self
            .publications
            .iter()
            .filter(|(name, _)| medium.contains(name.as_str()) || title.contains(name.as_str()))
            .map(|(_, behavior)| *behavior)
            .collect();

        if matching.contains(&SpreadBehavior::CoverFirst) {
            Some(SpreadBehavior::CoverFirst)
        } else if matching.contains(&SpreadBehavior::Swap) {
            Some(SpreadBehavior::Swap)
        } else {
            None
        }
    }
}

/// What a click on an image tile should do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClickAction {
    Article { url: String, screenshot: String },
    External { url: String },
    Spread { left: String, right: String },
    CoverThenSpread { cover: String, left: String, right: String },
    Lightbox { images: Vec<String>, start: usize },
}

/// The tile data click planning looks at.
#[derive(Debug, Clone, Copy)]
pub struct GalleryTarget<'a> {
    pub images: &'a [String],
    /// Used when `images` is empty.
    pub main_image: Option<&'a str>,
    pub popup_link: Option<&'a str>,
    pub screenshot: Option<&'a str>,
    pub medium: &'a str,
    pub title: &'a str,
    pub position: Option<f64>,
}

/// Decide what clicking a tile does. See the [module docs](self) for the
/// priority order.
pub fn plan_click(target: &GalleryTarget<'_>, rules: &ExceptionRules) -> ClickAction {
    match (target.popup_link, target.screenshot) {
        (Some(url), Some(screenshot)) => {
            return ClickAction::Article {
                url: url.to_string(),
                screenshot: screenshot.to_string(),
            };
        }
        (Some(url), None) => return ClickAction::External { url: url.to_string() },
        _ => {}
    }

    let images: Vec<String> = if target.images.is_empty() {
        target.main_image.map(str::to_string).into_iter().collect()
    } else {
        target.images.to_vec()
    };

    let behavior = rules.behavior_for(target.medium, target.title, target.position);

    match (images.as_slice(), behavior) {
        ([first, second], Some(SpreadBehavior::CoverFirst)) => ClickAction::CoverThenSpread {
            cover: first.clone(),
            left: first.clone(),
            right: second.clone(),
        },
        ([first, second], Some(SpreadBehavior::Swap)) => ClickAction::Spread {
            left: second.clone(),
            right: first.clone(),
        },
        ([first, second], None) => ClickAction::Spread {
            left: first.clone(),
            right: second.clone(),
        },
        ([cover, left, right], Some(SpreadBehavior::CoverFirst)) => {
            ClickAction::CoverThenSpread {
                cover: cover.clone(),
                left: left.clone(),
                right: right.clone(),
            }
        }
        _ => ClickAction::Lightbox { images, start: 0 },
    }
}

// ============================================================================
// Runtime state machine
// ============================================================================

/// The three modal elements of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    Lightbox,
    Spread,
    Article,
}

impl ModalKind {
    /// Element ids a modal needs before it can open.
    pub fn required_elements(self) -> &'static [&'static str] {
        match self {
            ModalKind::Lightbox => &["lightbox", "lightbox-img"],
            ModalKind::Spread => &["spread-modal", "spread-img-left", "spread-img-right"],
            ModalKind::Article => &["article-modal", "article-iframe", "article-screenshot"],
        }
    }
}

/// Most specific modal first. Escape closes the first active one only.
const CLOSE_PRECEDENCE: [ModalKind; 3] = [ModalKind::Article, ModalKind::Spread, ModalKind::Lightbox];

/// The overlay currently on screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Overlay {
    #[default]
    Closed,
    Lightbox {
        gallery: Vec<String>,
        index: usize,
    },
    Spread {
        left: String,
        right: String,
    },
    Article {
        url: String,
        screenshot: String,
    },
    /// Cover shown in the lightbox; the spread waits for "next".
    CoverThenSpread {
        cover: String,
        pending: (String, String),
    },
}

impl Overlay {
    /// The modal element this overlay occupies.
    pub fn kind(&self) -> Option<ModalKind> {
        match self {
            Overlay::Closed => None,
            Overlay::Lightbox { .. } | Overlay::CoverThenSpread { .. } => Some(ModalKind::Lightbox),
            Overlay::Spread { .. } => Some(ModalKind::Spread),
            Overlay::Article { .. } => Some(ModalKind::Article),
        }
    }

    /// Visibility of the (prev, next) buttons.
    pub fn nav_visibility(&self) -> (bool, bool) {
        match self {
            Overlay::Lightbox { gallery, .. } => (gallery.len() > 1, gallery.len() > 1),
            Overlay::CoverThenSpread { .. } => (false, true),
            _ => (false, false),
        }
    }
}

/// Keys the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Escape" | "Esc" => Key::Escape,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            _ => Key::Other,
        }
    }
}

/// Side effects of the controller: the page's modal elements.
pub trait ModalPort {
    /// Whether an element with this id exists.
    fn has_element(&self, id: &str) -> bool;

    /// Make `overlay` visible (or update it after navigation).
    fn show(&mut self, overlay: &Overlay);

    /// Hide a modal and clear its sources.
    fn hide(&mut self, kind: ModalKind);

    /// Open a URL in a new browsing context.
    fn open_external(&mut self, url: &str);
}

/// Owns the interaction state for one set of modals.
pub struct GalleryController<P> {
    port: P,
    overlay: Overlay,
}

impl<P: ModalPort> GalleryController<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            overlay: Overlay::Closed,
        }
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn into_port(self) -> P {
        self.port
    }

    /// Execute a tile's planned click.
    pub fn click(&mut self, action: &ClickAction) {
        tracing::debug!(?action, "tile clicked");
        match action {
            ClickAction::External { url } => self.port.open_external(url),
            ClickAction::Article { url, screenshot } => self.open(Overlay::Article {
                url: url.clone(),
                screenshot: screenshot.clone(),
            }),
            ClickAction::Spread { left, right } => self.open(Overlay::Spread {
                left: left.clone(),
                right: right.clone(),
            }),
            ClickAction::CoverThenSpread { cover, left, right } => {
                self.open(Overlay::CoverThenSpread {
                    cover: cover.clone(),
                    pending: (left.clone(), right.clone()),
                })
            }
            ClickAction::Lightbox { images, start } => {
                if *start < images.len() {
                    self.open(Overlay::Lightbox {
                        gallery: images.clone(),
                        index: *start,
                    });
                }
            }
        }
    }

    /// Forward: next lightbox image (wrapping), or reveal a pending spread.
    pub fn next(&mut self) {
        match &self.overlay {
            Overlay::Lightbox { gallery, index } => {
                let target = (index + 1) % gallery.len();
                self.show_index(target);
            }
            Overlay::CoverThenSpread { pending, .. } => {
                let (left, right) = pending.clone();
                self.open(Overlay::Spread { left, right });
            }
            _ => {}
        }
    }

    /// Back: previous lightbox image, wrapping to the end.
    pub fn prev(&mut self) {
        if let Overlay::Lightbox { gallery, index } = &self.overlay {
            let target = (index + gallery.len() - 1) % gallery.len();
            self.show_index(target);
        }
    }

    /// Jump to a lightbox image. Out-of-range indices are ignored.
    pub fn show_index(&mut self, target: usize) {
        if let Overlay::Lightbox { gallery, index } = &mut self.overlay
            && target < gallery.len()
        {
            *index = target;
            self.port.show(&self.overlay);
        }
    }

    pub fn key(&mut self, key: Key) {
        match key {
            Key::Escape => self.close(),
            Key::ArrowRight => self.next(),
            Key::ArrowLeft => self.prev(),
            Key::Other => {}
        }
    }

    /// A click on a modal's backdrop closes it when it is the active one.
    pub fn backdrop(&mut self, kind: ModalKind) {
        if self.overlay.kind() == Some(kind) {
            self.close();
        }
    }

    /// Close whichever modal is active.
    pub fn close(&mut self) {
        let active = self.overlay.kind();
        if let Some(kind) = CLOSE_PRECEDENCE.into_iter().find(|k| active == Some(*k)) {
            self.port.hide(kind);
            self.overlay = Overlay::Closed;
        }
    }

    fn open(&mut self, overlay: Overlay) {
        let Some(kind) = overlay.kind() else {
            return;
        };
        if !kind
            .required_elements()
            .iter()
            .all(|id| self.port.has_element(id))
        {
            return;
        }
        if let Some(active) = self.overlay.kind()
            && active != kind
        {
            self.port.hide(active);
        }
        self.overlay = overlay;
        self.port.show(&self.overlay);
    }
}
