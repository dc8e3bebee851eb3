//! Signature font catalogues

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// A font the user can pick for their signature text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontChoice {
    pub name: String,
    /// Stylesheet to load for preview, when the font is a web font
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stylesheet_url: Option<String>,
}

impl FontChoice {
    pub fn web(name: &str, stylesheet_url: &str) -> Self {
        Self {
            name: name.to_string(),
            stylesheet_url: Some(stylesheet_url.to_string()),
        }
    }

    pub fn system(name: &str) -> Self {
        Self {
            name: name.to_string(),
            stylesheet_url: None,
        }
    }
}

/// Where the font list offered to the signer comes from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FontSource {
    /// Hosted script fonts
    #[default]
    Web,
    /// Fonts every PDF viewer ships with
    System,
    Custom(Vec<FontChoice>),
}

impl FontSource {
    pub fn fonts(&self) -> Vec<FontChoice> {
        match self {
            FontSource::Web => vec![
                FontChoice::web(
                    "Pacifico",
                    "https://fonts.googleapis.com/css2?family=Pacifico&display=swap",
                ),
                FontChoice::web(
                    "Great Vibes",
                    "https://fonts.googleapis.com/css2?family=Great+Vibes&display=swap",
                ),
                FontChoice::web(
                    "Dancing Script",
                    "https://fonts.googleapis.com/css2?family=Dancing+Script&display=swap",
                ),
            ],
            FontSource::System => vec![
                FontChoice::system("Helvetica"),
                FontChoice::system("Times"),
                FontChoice::system("Courier"),
            ],
            FontSource::Custom(fonts) => fonts.clone(),
        }
    }

    /// Look up a font by its display name
    pub fn find(&self, name: &str) -> Option<FontChoice> {
        self.fonts().into_iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Error)]
#[error("Unknown font source: {0} (expected 'web' or 'system')")]
pub struct UnknownFontSource(pub String);

impl FromStr for FontSource {
    type Err = UnknownFontSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" | "" => Ok(FontSource::Web),
            "system" => Ok(FontSource::System),
            other => Err(UnknownFontSource(other.to_string())),
        }
    }
}
