//! Locale identifiers and the parent chain used for inheritance

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Identifier of the most general locale, the end of every parent chain
pub const ROOT_LOCALE: &str = "root";

/// Language code used for data that belongs to no particular language
pub const UNDETERMINED: &str = "und";

/// A locale identifier such as `fr_CA`, `fr` or `root`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocaleId(String);

impl LocaleId {
    /// Parse and validate a locale identifier
    pub fn new<S: Into<String>>(id: S) -> CoreResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(CoreError::invalid_locale("empty locale id"));
        }
        if id.starts_with('_') || id.ends_with('_') || id.contains("__") {
            return Err(CoreError::invalid_locale(id));
        }
        if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(CoreError::invalid_locale(id));
        }
        Ok(LocaleId(id))
    }

    /// The root locale
    pub fn root() -> Self {
        LocaleId(ROOT_LOCALE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_LOCALE
    }

    /// Language subtag, e.g. `fr` for `fr_CA`
    pub fn language(&self) -> &str {
        self.0.split('_').next().unwrap_or(&self.0)
    }

    /// Whether this locale belongs to the undetermined language
    pub fn is_undetermined(&self) -> bool {
        self.language() == UNDETERMINED
    }

    /// The locale this one inherits from: `fr_CA` -> `fr` -> `root` -> none
    pub fn parent(&self) -> Option<LocaleId> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('_') {
            Some(idx) => Some(LocaleId(self.0[..idx].to_string())),
            None => Some(LocaleId::root()),
        }
    }

    /// This locale followed by all of its ancestors
    pub fn chain(&self) -> Vec<LocaleId> {
        let mut chain = vec![self.clone()];
        let mut current = self.parent();
        while let Some(locale) = current {
            current = locale.parent();
            chain.push(locale);
        }
        chain
    }

    /// Whether `self` is `other` or one of its ancestors
    pub fn is_ancestor_or_self_of(&self, other: &LocaleId) -> bool {
        if self.is_root() {
            return true;
        }
        other.0 == self.0 || other.0.starts_with(&format!("{}_", self.0))
    }
}

impl fmt::Display for LocaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LocaleId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LocaleId::new(s)
    }
}

impl TryFrom<String> for LocaleId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LocaleId::new(value)
    }
}

impl From<LocaleId> for String {
    fn from(locale: LocaleId) -> Self {
        locale.0
    }
}

impl AsRef<str> for LocaleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
