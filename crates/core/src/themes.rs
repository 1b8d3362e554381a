//! Theme catalog and loader
//!
//! Themes are loaded once at startup from a TOML file:
//!
//! ```toml
//! [[themes]]
//! title = "Breakfast"
//! prompt = "What is the best thing to eat in the morning?"
//! ```

use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use crate::error::Result;
use crate::models::Theme;

#[derive(Debug, Deserialize)]
struct ThemeFile {
    #[serde(default)]
    themes: Vec<Theme>,
}

/// Fixed, ordered list of themes available to the room
#[derive(Debug, Clone, Default)]
pub struct ThemeCatalog {
    themes: Vec<Theme>,
}

impl ThemeCatalog {
    pub fn new(themes: Vec<Theme>) -> Self {
        Self { themes }
    }

    /// Load a catalog from a TOML theme file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_toml(&content)?;
        tracing::info!(path = %path.display(), count = catalog.len(), "Loaded themes");
        Ok(catalog)
    }

    /// Parse a catalog from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: ThemeFile = toml::from_str(content)?;
        let themes = file
            .themes
            .into_iter()
            .filter(|t| !t.prompt.trim().is_empty())
            .collect();
        Ok(Self { themes })
    }

    /// Pick a theme uniformly at random, `None` when the catalog is empty
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Theme> {
        self.themes.choose(rng)
    }

    pub fn themes(&self) -> &[Theme] {
        &self.themes
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_themes() {
        let toml = r#"
[[themes]]
title = "Breakfast"
prompt = "Best breakfast?"

[[themes]]
prompt = "Best holiday?"
"#;
        let catalog = ThemeCatalog::from_toml(toml).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.themes()[0].title.as_deref(), Some("Breakfast"));
        assert_eq!(catalog.themes()[1].prompt, "Best holiday?");
        assert!(catalog.themes()[1].title.is_none());
    }

    #[test]
    fn test_blank_prompts_skipped() {
        let toml = r#"
[[themes]]
prompt = "   "

[[themes]]
prompt = "Real one"
"#;
        let catalog = ThemeCatalog::from_toml(toml).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_empty_file_is_empty_catalog() {
        let catalog = ThemeCatalog::from_toml("").unwrap();
        assert!(catalog.is_empty());
        let mut rng = StdRng::seed_from_u64(0);
        assert!(catalog.choose(&mut rng).is_none());
    }

    #[test]
    fn test_invalid_toml_rejected() {
        assert!(ThemeCatalog::from_toml("[[themes]]\nprompt = ").is_err());
    }

    #[test]
    fn test_load_from_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("themes.toml");
        fs::write(&path, "[[themes]]\nprompt = \"Favourite season?\"\n").unwrap();

        let catalog = ThemeCatalog::load_from_path(&path).unwrap();
        assert_eq!(catalog.themes(), &[Theme::new("Favourite season?")]);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        assert!(ThemeCatalog::load_from_path(&temp.path().join("nope.toml")).is_err());
    }

    #[test]
    fn test_choose_covers_all_themes() {
        let catalog = ThemeCatalog::new(vec![Theme::new("a"), Theme::new("b"), Theme::new("c")]);
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(catalog.choose(&mut rng).unwrap().prompt.clone());
        }
        assert_eq!(seen.len(), 3);
    }
}
