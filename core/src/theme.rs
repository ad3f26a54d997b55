use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use crate::storage::Storage;

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

/// Colours a consumer paints the app chrome with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub background: &'static str,
    pub text: &'static str,
    pub toolbar_background: &'static str,
    pub item_background: &'static str,
    pub card_background: &'static str,
}

const LIGHT: Palette = Palette {
    background: "#ffffff",
    text: "#000000",
    toolbar_background: "#3880ff",
    item_background: "#ffffff",
    card_background: "#ffffff",
};

const DARK: Palette = Palette {
    background: "#000000",
    text: "#ffffff",
    toolbar_background: "#1a1a1a",
    item_background: "#1a1a1a",
    card_background: "#1a1a1a",
};

impl Theme {
    /// Anything other than `"dark"` reads as light.
    #[must_use]
    pub fn from_stored(value: Option<&str>) -> Self {
        if value == Some("dark") {
            Self::Dark
        } else {
            Self::Light
        }
    }

    #[must_use]
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

    #[must_use]
    pub fn palette(self) -> Palette {
        match self {
            Self::Light => LIGHT,
            Self::Dark => DARK,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-wide light/dark preference, loaded once and persisted on every toggle.
pub struct ThemeService {
    storage: Arc<Storage>,
    theme: Theme,
}

impl ThemeService {
    pub async fn load(storage: Arc<Storage>) -> Result<Self> {
        let stored: Option<serde_json::Value> = storage.get(THEME_KEY).await?;
        let theme = Theme::from_stored(stored.as_ref().and_then(serde_json::Value::as_str));
        Ok(Self { storage, theme })
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        self.theme
    }

    #[must_use]
    pub fn is_dark_mode(&self) -> bool {
        self.theme == Theme::Dark
    }

    pub async fn toggle(&mut self) -> Result<Theme> {
        let next = self.theme.toggled();
        self.storage.set(THEME_KEY, next.as_str()).await?;
        self.theme = next;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_from_stored() {
        assert_eq!(Theme::from_stored(Some("dark")), Theme::Dark);
        assert_eq!(Theme::from_stored(Some("light")), Theme::Light);
        assert_eq!(Theme::from_stored(Some("DARK")), Theme::Light);
        assert_eq!(Theme::from_stored(None), Theme::Light);
    }

    #[test]
    fn test_palettes_differ() {
        assert_eq!(Theme::Dark.palette().background, "#000000");
        assert_eq!(Theme::Light.palette().toolbar_background, "#3880ff");
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
    }

    #[tokio::test]
    async fn test_defaults_to_light() {
        let storage = Arc::new(Storage::new(Arc::new(MemoryStore::new())));
        let svc = ThemeService::load(storage).await.unwrap();
        assert!(!svc.is_dark_mode());
    }

    #[tokio::test]
    async fn test_toggle_persists() {
        let storage = Arc::new(Storage::new(Arc::new(MemoryStore::new())));
        let mut svc = ThemeService::load(Arc::clone(&storage)).await.unwrap();

        assert_eq!(svc.toggle().await.unwrap(), Theme::Dark);
        assert!(svc.is_dark_mode());

        let reloaded = ThemeService::load(Arc::clone(&storage)).await.unwrap();
        assert_eq!(reloaded.theme(), Theme::Dark);

        svc.toggle().await.unwrap();
        let stored: Option<String> = storage.get(THEME_KEY).await.unwrap();
        assert_eq!(stored.as_deref(), Some("light"));
    }

    #[tokio::test]
    async fn test_unreadable_value_reads_light() {
        let storage = Arc::new(Storage::new(Arc::new(MemoryStore::new())));
        storage.set(THEME_KEY, &42).await.unwrap();
        let svc = ThemeService::load(storage).await.unwrap();
        assert_eq!(svc.theme(), Theme::Light);
    }
}
