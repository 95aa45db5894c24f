//! Locales supported for user-facing messages.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unsupported locale tag.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported locale: {0}")]
pub struct LocaleError(pub String);

/// Language used when rendering notification and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::En => write!(f, "en"),
            Self::Es => write!(f, "es"),
        }
    }
}

impl std::str::FromStr for Locale {
    type Err = LocaleError;

    /// Accepts bare language tags and region-qualified tags (`es-MX`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let language = s
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match language.as_str() {
            "en" => Ok(Self::En),
            "es" => Ok(Self::Es),
            _ => Err(LocaleError(s.to_owned())),
        }
    }
}
