//! Light/dark theme preference.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::storage::{SharedStore, THEME_KEY};
use crate::core::subject::Subject;

/// Class toggled on the document root while the dark theme is active.
pub const DARK_CLASS: &str = "dark";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("Unknown theme: {other}")),
        }
    }
}

/// The document root whose class list carries the theme marker.
pub trait StyleTarget {
    fn add_class(&mut self, class: &str);

    fn remove_class(&mut self, class: &str);
}

/// An in-memory class list. Clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct ClassList {
    classes: Rc<RefCell<BTreeSet<String>>>,
}

impl ClassList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.borrow().contains(class)
    }
}

impl StyleTarget for ClassList {
    fn add_class(&mut self, class: &str) {
        self.classes.borrow_mut().insert(class.to_string());
    }

    fn remove_class(&mut self, class: &str) {
        self.classes.borrow_mut().remove(class);
    }
}

/// Tracks the active theme, persists it under [`THEME_KEY`] and marks the
/// document root.
///
/// Without a style target (no document to style) transitions still update
/// the observable state and the stored preference.
pub struct ThemeManager {
    theme: Subject<Theme>,
    store: SharedStore,
    root: Option<Box<dyn StyleTarget>>,
}

impl ThemeManager {
    /// Resolves the initial theme and applies it.
    ///
    /// Resolution order: the stored preference, then `prefers_dark` (the
    /// platform's dark-mode signal), then [`Theme::Light`].
    pub fn new(store: SharedStore, root: Option<Box<dyn StyleTarget>>, prefers_dark: bool) -> Self {
        let stored = match store.get(THEME_KEY) {
            Ok(value) => value.and_then(|v| match v.parse::<Theme>() {
                Ok(theme) => Some(theme),
                Err(e) => {
                    log::warn!("Ignoring stored theme: {e}");
                    None
                }
            }),
            Err(e) => {
                log::warn!("Could not read theme preference: {e}");
                None
            }
        };

        let initial = stored.unwrap_or(if prefers_dark { Theme::Dark } else { Theme::Light });

        let mut manager = Self { theme: Subject::new(initial), store, root };
        manager.set_theme(initial);
        manager
    }

    /// Live view of the active theme.
    pub fn theme(&self) -> &Subject<Theme> {
        &self.theme
    }

    pub fn current(&self) -> Theme {
        self.theme.get()
    }

    /// Switches between light and dark. Returns the new theme.
    pub fn toggle_theme(&mut self) -> Theme {
        let next = self.current().toggled();
        self.set_theme(next);
        next
    }

    pub fn set_theme(&mut self, theme: Theme) {
        if let Some(root) = self.root.as_mut() {
            match theme {
                Theme::Dark => root.add_class(DARK_CLASS),
                Theme::Light => root.remove_class(DARK_CLASS),
            }
        }

        if let Err(e) = self.store.set(THEME_KEY, theme.as_str()) {
            log::error!("Failed to persist theme: {e}");
        }

        self.theme.next_if_changed(theme);
    }
}
