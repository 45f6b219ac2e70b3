use std::sync::Arc;

use crate::model::theme::Theme;
use crate::storage::{KeyValueStore, THEME_KEY};

/// The light/dark preference, stored as the bare word `light` or `dark`.
pub struct ThemeState {
    store: Arc<dyn KeyValueStore>,
    theme: Theme,
}

impl ThemeState {
    /// Read the stored preference; anything unreadable gives `default`.
    pub fn load(store: Arc<dyn KeyValueStore>, default: Theme) -> Self {
        let theme = match store.get(THEME_KEY) {
            Ok(Some(stored)) => stored.trim().parse().unwrap_or(default),
            Ok(None) => default,
            Err(err) => {
                warn!("Could not read theme preference: {err}");
                default
            }
        };
        Self { store, theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set(&mut self, theme: Theme) -> Theme {
        self.theme = theme;
        if let Err(err) = self.store.set(THEME_KEY, theme.as_str()) {
            warn!("Could not persist theme preference: {err}");
        }
        theme
    }

    pub fn toggle(&mut self) -> Theme {
        self.set(self.theme.toggled())
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::MemoryStore;

    use super::*;

    #[test]
    fn defaults_and_ignores_garbage() {
        let store = Arc::new(MemoryStore::new());
        assert_eq!(ThemeState::load(store.clone(), Theme::Dark).theme(), Theme::Dark);

        store.set("theme", "purple").unwrap();
        assert_eq!(ThemeState::load(store, Theme::Light).theme(), Theme::Light);
    }

    #[test]
    fn toggle_is_persisted_as_bare_word() {
        let store = Arc::new(MemoryStore::new());
        let mut theme = ThemeState::load(store.clone(), Theme::Light);
        assert_eq!(theme.toggle(), Theme::Dark);
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));

        let reloaded = ThemeState::load(store, Theme::Light);
        assert_eq!(reloaded.theme(), Theme::Dark);
    }

    #[test]
    fn write_failure_keeps_memory_value() {
        let store = Arc::new(MemoryStore::new());
        store.set_read_only(true);
        let mut theme = ThemeState::load(store, Theme::Light);
        assert_eq!(theme.set(Theme::Dark), Theme::Dark);
        assert_eq!(theme.theme(), Theme::Dark);
    }
}
