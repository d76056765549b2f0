//! Cache key definitions.
//!
//! Keys carry the collection they belong to, so query values of different kinds can
//! never land on the same entry.

use std::fmt;

use crate::application::query::CharacterView;

/// Key of one cached entity list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The enriched, chronologically ordered film list.
    Movies,
    /// The character list as seen through one view.
    Characters(CharacterView),
}

impl CacheKey {
    /// Collection tag, matching `EntityList::kind` of the stored value.
    pub fn collection(&self) -> &'static str {
        match self {
            CacheKey::Movies => "movies",
            CacheKey::Characters(_) => "characters",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Movies => f.write_str("movies"),
            CacheKey::Characters(CharacterView::All) => f.write_str("characters"),
            CacheKey::Characters(CharacterView::Sorted(spec)) => {
                write!(f, "characters:sort:{spec}")
            }
            CacheKey::Characters(CharacterView::Filtered(gender)) => {
                write!(f, "characters:gender:{}", gender.as_str())
            }
        }
    }
}
