//! Catalog entities and locally owned comment records.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

/// A film from the upstream catalog, enriched with the local comment count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub title: String,
    pub opening_crawl: String,
    #[serde(with = "release_date")]
    pub release_date: Date,
    pub comment_count: u64,
}

/// A person from the upstream catalog.
///
/// `height` is kept as the upstream text (it can be `"unknown"`); numeric use goes
/// through [`Character::height_cm`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub height: String,
    pub gender: String,
}

impl Character {
    /// Height in centimeters. Values that are not integers count as zero.
    pub fn height_cm(&self) -> i64 {
        self.height.trim().parse().unwrap_or(0)
    }
}

/// Ordered list of one entity variant. The tag travels with the serialized form so a
/// cached value can only decode back into the variant it was written from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum EntityList {
    Movies(Vec<Movie>),
    Characters(Vec<Character>),
}

impl EntityList {
    pub fn len(&self) -> usize {
        match self {
            EntityList::Movies(items) => items.len(),
            EntityList::Characters(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EntityList::Movies(_) => "movies",
            EntityList::Characters(_) => "characters",
        }
    }
}

/// Borrowed counterpart of [`EntityList`] with the identical wire form, used when the
/// caller keeps ownership of the list after writing it.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum EntitySlice<'a> {
    Movies(&'a [Movie]),
    Characters(&'a [Character]),
}

impl EntitySlice<'_> {
    pub fn len(&self) -> usize {
        match self {
            EntitySlice::Movies(items) => items.len(),
            EntitySlice::Characters(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EntitySlice::Movies(_) => "movies",
            EntitySlice::Characters(_) => "characters",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentRecord {
    pub id: i64,
    #[serde(skip)]
    pub created_at: OffsetDateTime,
    pub comment: String,
    pub movie_name: String,
    pub commenter_ip: String,
    pub version: i32,
}

/// `YYYY-MM-DD` wire form for release dates.
pub(crate) mod release_date {
    use serde::{Deserialize, Deserializer, Serializer, de, ser};
    use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

    pub(crate) const FORMAT: &[BorrowedFormatItem<'static>] =
        format_description!("[year]-[month]-[day]");

    pub(crate) fn parse(text: &str) -> Result<Date, time::error::Parse> {
        Date::parse(text.trim(), FORMAT)
    }

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let text = date.format(FORMAT).map_err(ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn height_parses_integers_and_defaults_to_zero() {
        let tall = Character {
            name: "Chewbacca".to_string(),
            height: "228".to_string(),
            gender: "male".to_string(),
        };
        let unknown = Character {
            height: "unknown".to_string(),
            ..tall.clone()
        };
        let fractional = Character {
            height: "96.5".to_string(),
            ..tall.clone()
        };

        assert_eq!(tall.height_cm(), 228);
        assert_eq!(unknown.height_cm(), 0);
        assert_eq!(fractional.height_cm(), 0);
    }

    #[test]
    fn release_date_uses_upstream_text_on_the_wire() {
        let movie = Movie {
            title: "A New Hope".to_string(),
            opening_crawl: "It is a period of civil war.".to_string(),
            release_date: date!(1977 - 05 - 25),
            comment_count: 3,
        };

        let json = serde_json::to_value(&movie).expect("serialize movie");
        assert_eq!(json["release_date"], "1977-05-25");

        let decoded: Movie = serde_json::from_value(json).expect("deserialize movie");
        assert_eq!(decoded, movie);
    }

    #[test]
    fn entity_list_keeps_its_variant_tag() {
        let list = EntityList::Characters(vec![Character {
            name: "Leia Organa".to_string(),
            height: "150".to_string(),
            gender: "female".to_string(),
        }]);

        let text = serde_json::to_string(&list).expect("serialize list");
        assert!(text.contains("\"kind\":\"characters\""));

        let decoded: EntityList = serde_json::from_str(&text).expect("deserialize list");
        assert_eq!(decoded, list);
        assert_eq!(decoded.kind(), "characters");
        assert_eq!(decoded.len(), 1);
    }

    #[test]
    fn borrowed_list_decodes_as_owned() {
        let characters = vec![Character {
            name: "Han Solo".to_string(),
            height: "180".to_string(),
            gender: "male".to_string(),
        }];

        let text =
            serde_json::to_string(&EntitySlice::Characters(&characters)).expect("serialize");
        let decoded: EntityList = serde_json::from_str(&text).expect("deserialize list");
        assert_eq!(decoded, EntityList::Characters(characters));
    }

    #[test]
    fn comment_record_hides_created_at() {
        let record = CommentRecord {
            id: 7,
            created_at: OffsetDateTime::UNIX_EPOCH,
            comment: "Great opening".to_string(),
            movie_name: "A New Hope".to_string(),
            commenter_ip: "10.0.0.1".to_string(),
            version: 1,
        };

        let json = serde_json::to_value(&record).expect("serialize comment");
        assert!(json.get("created_at").is_none());
        assert_eq!(json["movie_name"], "A New Hope");
    }
}
