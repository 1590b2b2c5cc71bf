//! Provenance labels.
//!
//! Every ingested chunk carries the label of the documentation set it was
//! scraped from. Policies and stores share the constants below instead of
//! repeating string literals, so a typo becomes a compile error rather than
//! a silently empty partition. The set stays open: [`Label::new`] accepts
//! any documentation source added later.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A provenance label identifying which source document a chunk came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(Cow<'static, str>);

impl Label {
    pub const TAILWIND: Label = Label::from_static("Tailwind");
    pub const TAILWIND_UI_KIT: Label = Label::from_static("Tailwind-UI-Kit");
    pub const TAILWIND_TEMPLATES: Label = Label::from_static("Tailwindcss-Templates");
    pub const REACT: Label = Label::from_static("React");
    pub const REACT_ROUTER: Label = Label::from_static("React-Router");
    pub const REACT_HOOK_FORM: Label = Label::from_static("React-hook-form");
    pub const AXIOS: Label = Label::from_static("Axios");

    /// All labels produced by the bundled documentation scrapers.
    pub const KNOWN: [Label; 7] = [
        Self::TAILWIND,
        Self::TAILWIND_UI_KIT,
        Self::TAILWIND_TEMPLATES,
        Self::REACT,
        Self::REACT_ROUTER,
        Self::REACT_HOOK_FORM,
        Self::AXIOS,
    ];

    pub const fn from_static(s: &'static str) -> Self {
        Self(Cow::Borrowed(s))
    }

    pub fn new(s: impl Into<String>) -> Self {
        Self(Cow::Owned(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this label is one of the [`Label::KNOWN`] scraper outputs.
    pub fn is_known(&self) -> bool {
        Self::KNOWN.iter().any(|k| k == self)
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
