//! Dark/light theme preference

use core::fmt;
use core::str::FromStr;

use heapless::String;
use log::warn;

/// Key the preference is stored under.
pub const THEME_KEY: &str = "theme";

/// Longest value a preference store needs to hand back.
pub const PREFERENCE_LEN: usize = 16;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Theme::Dark => "moon",
            Theme::Light => "sun",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ParseThemeError;

impl fmt::Display for ParseThemeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected \"dark\" or \"light\"")
    }
}

impl FromStr for Theme {
    type Err = ParseThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            _ => Err(ParseThemeError),
        }
    }
}

/// Persistent string key-value storage supplied by the host.
pub trait PreferenceStore {
    type Error: fmt::Debug;

    fn get(&mut self, key: &str) -> Result<Option<String<PREFERENCE_LEN>>, Self::Error>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), Self::Error>;
}

pub struct ThemeManager<S> {
    store: S,
    theme: Theme,
}

impl<S: PreferenceStore> ThemeManager<S> {
    /// Read the saved theme, falling back to dark.
    pub fn load(mut store: S) -> Self {
        let theme = match store.get(THEME_KEY) {
            Ok(Some(value)) => value.parse().unwrap_or_else(|_| {
                warn!("unrecognised theme preference {:?}, using dark", value.as_str());
                Theme::Dark
            }),
            Ok(None) => Theme::Dark,
            Err(e) => {
                warn!("could not read theme preference: {:?}", e);
                Theme::Dark
            }
        };
        Self { store, theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Flip and persist. The in-memory theme flips even when the write fails.
    pub fn toggle(&mut self) -> Result<Theme, S::Error> {
        self.theme = self.theme.toggle();
        self.store.set(THEME_KEY, self.theme.as_str()).map_err(|e| {
            warn!("could not save theme preference: {:?}", e);
            e
        })?;
        Ok(self.theme)
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
