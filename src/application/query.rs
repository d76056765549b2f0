//! Character sort and filter semantics.
//!
//! A request honors at most one view: a gender filter applies only when no sort is
//! requested; otherwise the sort applies; with neither, the upstream order is kept.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::entities::Character;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("unsupported sort key `{0}` (expected name, gender or height, `-` for descending)")]
    UnknownSortKey(String),
    #[error("unsupported gender filter `{0}` (expected male or female)")]
    UnknownGender(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Name,
    Gender,
    Height,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Gender => "gender",
            SortField::Height => "height",
        }
    }

    fn compare(self, left: &Character, right: &Character) -> Ordering {
        match self {
            SortField::Name => left.name.cmp(&right.name),
            SortField::Gender => left.gender.cmp(&right.gender),
            SortField::Height => left.height_cm().cmp(&right.height_cm()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Descending,
        }
    }
}

impl FromStr for SortSpec {
    type Err = QueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (direction, name) = match value.strip_prefix('-') {
            Some(rest) => (SortDirection::Descending, rest),
            None => (SortDirection::Ascending, value),
        };
        let field = match name {
            "name" => SortField::Name,
            "gender" => SortField::Gender,
            "height" => SortField::Height,
            _ => return Err(QueryError::UnknownSortKey(value.to_string())),
        };
        Ok(Self { field, direction })
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.direction == SortDirection::Descending {
            f.write_str("-")?;
        }
        f.write_str(self.field.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    fn matches(self, character: &Character) -> bool {
        character.gender == self.as_str()
    }
}

impl FromStr for Gender {
    type Err = QueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            _ => Err(QueryError::UnknownGender(value.to_string())),
        }
    }
}

/// The single view a character request resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterView {
    All,
    Sorted(SortSpec),
    Filtered(Gender),
}

impl CharacterView {
    /// Resolve raw `sort` and `gender` query values. Empty strings count as absent.
    /// When both are present the sort wins and the gender value is not consulted.
    pub fn from_params(sort: Option<&str>, gender: Option<&str>) -> Result<Self, QueryError> {
        let sort = sort.map(str::trim).filter(|value| !value.is_empty());
        let gender = gender.map(str::trim).filter(|value| !value.is_empty());

        match (sort, gender) {
            (Some(sort), _) => Ok(CharacterView::Sorted(sort.parse()?)),
            (None, Some(gender)) => Ok(CharacterView::Filtered(gender.parse()?)),
            (None, None) => Ok(CharacterView::All),
        }
    }
}

/// Characters after a view was applied, with the summed height of exactly those
/// characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewResult {
    pub characters: Vec<Character>,
    pub total_height_cm: i64,
}

pub fn apply_view(characters: Vec<Character>, view: CharacterView) -> ViewResult {
    match view {
        CharacterView::All => with_total(characters),
        CharacterView::Sorted(spec) => {
            let mut characters = characters;
            sort_characters(&mut characters, spec);
            with_total(characters)
        }
        CharacterView::Filtered(gender) => filter_by_gender(characters, gender),
    }
}

/// Stable sort. Descending order flips the comparator, so ties keep their upstream
/// order in both directions.
pub fn sort_characters(characters: &mut [Character], spec: SortSpec) {
    let field = spec.field;
    match spec.direction {
        SortDirection::Ascending => characters.sort_by(|a, b| field.compare(a, b)),
        SortDirection::Descending => characters.sort_by(|a, b| field.compare(b, a)),
    }
}

/// Keeps characters whose gender equals `gender`, summing heights of the survivors in
/// the same pass.
pub fn filter_by_gender(characters: Vec<Character>, gender: Gender) -> ViewResult {
    let mut total_height_cm: i64 = 0;
    let mut kept = Vec::new();
    for character in characters {
        if gender.matches(&character) {
            total_height_cm = total_height_cm.saturating_add(character.height_cm());
            kept.push(character);
        }
    }
    ViewResult {
        characters: kept,
        total_height_cm,
    }
}

/// Saturates instead of overflowing on absurd upstream heights.
pub fn total_height_cm(characters: &[Character]) -> i64 {
    characters
        .iter()
        .map(Character::height_cm)
        .fold(0i64, i64::saturating_add)
}

fn with_total(characters: Vec<Character>) -> ViewResult {
    let total_height_cm = total_height_cm(&characters);
    ViewResult {
        characters,
        total_height_cm,
    }
}
