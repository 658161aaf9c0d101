use crate::config::DEFAULT_PERSONA;
use crate::error::{Error, Result};
use crate::state::Theme;
use leptos::logging::warn;

const THEME_KEY: &str = "theme";
const PERSONA_KEY: &str = "assistantName";

/// String key/value storage that outlives the page.
pub trait Store {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// `window.localStorage`.
#[derive(Clone)]
pub struct LocalStore {
    storage: web_sys::Storage,
}

impl LocalStore {
    pub fn new() -> Result<Self> {
        let storage = leptos::window()
            .local_storage()?
            .ok_or(Error::Unsupported("Local storage"))?;
        Ok(Self { storage })
    }
}

impl Store for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        Ok(self.storage.set_item(key, value)?)
    }
}

/// Client-side preferences: theme and the companion's display name.
pub struct Preferences<S> {
    store: Option<S>,
    theme: Theme,
    persona: String,
}

impl<S: Store> Preferences<S> {
    /// Without a store the defaults apply and nothing is persisted.
    pub fn load(store: Option<S>) -> Self {
        let theme = store
            .as_ref()
            .and_then(|store| store.get(THEME_KEY))
            .and_then(|theme| Theme::parse(&theme))
            .unwrap_or_default();
        let persona = store
            .as_ref()
            .and_then(|store| store.get(PERSONA_KEY))
            .map(|persona| persona.trim().to_owned())
            .filter(|persona| !persona.is_empty())
            .unwrap_or_else(|| DEFAULT_PERSONA.to_owned());
        Self {
            store,
            theme,
            persona,
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    fn persist(&self, key: &str, value: &str) {
        if let Some(store) = &self.store {
            if let Err(err) = store.set(key, value) {
                warn!("Could not persist {key}: {err}");
            }
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.persist(THEME_KEY, theme.as_str());
    }

    pub fn rename_persona(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Enter a name."));
        }
        self.persona = name.to_owned();
        self.persist(PERSONA_KEY, name);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MemoryStore;
    use super::*;

    #[test]
    fn defaults() {
        let prefs = Preferences::load(Some(MemoryStore::default()));
        assert_eq!(prefs.theme(), Theme::Light);
        assert_eq!(prefs.persona(), DEFAULT_PERSONA);
        let prefs: Preferences<MemoryStore> = Preferences::load(None);
        assert_eq!(prefs.theme(), Theme::Light);
    }

    #[test]
    fn theme_switch_there_and_back() {
        let store = MemoryStore::default();
        store.set(THEME_KEY, "dark").unwrap();
        let mut prefs = Preferences::load(Some(store.clone()));
        assert_eq!(prefs.theme(), Theme::Dark);
        prefs.set_theme(Theme::Light);
        assert_eq!(prefs.theme(), Theme::Light);
        assert_eq!(store.get(THEME_KEY).as_deref(), Some("light"));
        prefs.set_theme(Theme::Dark);
        assert_eq!(prefs.theme(), Theme::Dark);
        assert_eq!(store.get(THEME_KEY).as_deref(), Some("dark"));
        let reloaded = Preferences::load(Some(store));
        assert_eq!(reloaded.theme(), Theme::Dark);
    }

    #[test]
    fn garbage_theme_is_ignored() {
        let store = MemoryStore::default();
        store.set(THEME_KEY, "neon").unwrap();
        assert_eq!(Preferences::load(Some(store)).theme(), Theme::Light);
    }

    #[test]
    fn persona_rename() {
        let store = MemoryStore::default();
        let mut prefs = Preferences::load(Some(store.clone()));
        assert!(prefs.rename_persona("   ").is_err());
        assert_eq!(prefs.persona(), DEFAULT_PERSONA);
        prefs.rename_persona(" Mira ").unwrap();
        assert_eq!(prefs.persona(), "Mira");
        assert_eq!(Preferences::load(Some(store)).persona(), "Mira");
    }
}
