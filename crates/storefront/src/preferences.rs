//! Theme preference.
//!
//! Stored as the bare word `light` or `dark`, not JSON.

use tracing::debug;

use seattle_trading_core::Theme;

use crate::storage::{KeyValueStore, StorageError, keys};

#[derive(Debug, Clone)]
pub struct ThemePreference<S> {
    store: S,
}

impl<S: KeyValueStore> ThemePreference<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The saved theme. Only an explicit `light` selects the light theme.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn get(&self) -> Result<Theme, StorageError> {
        let stored = self.store.get(keys::THEME)?;
        let light = stored
            .as_deref()
            .map(|raw| raw.trim().trim_matches('"'))
            .is_some_and(|raw| raw == "light");
        Ok(if light { Theme::Light } else { Theme::Dark })
    }

    /// Save a theme.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn set(&self, theme: Theme) -> Result<(), StorageError> {
        debug!(%theme, "Saving theme");
        self.store.set(keys::THEME, &theme.to_string())
    }

    /// Flip and save the theme, returning the new one.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn toggle(&self) -> Result<Theme, StorageError> {
        let theme = self.get()?.toggled();
        self.set(theme)?;
        Ok(theme)
    }
}
