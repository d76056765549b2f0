use crate::domain::error::DomainError;

pub const COMMENT_MIN_CHARS: usize = 4;
pub const COMMENT_MAX_CHARS: usize = 500;

/// A validated comment ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub comment: String,
    pub movie_name: String,
    pub commenter_ip: String,
}

impl NewComment {
    pub fn new(
        comment: &str,
        movie_name: &str,
        commenter_ip: &str,
    ) -> Result<Self, DomainError> {
        let comment = comment.trim();
        let length = comment.chars().count();
        if length < COMMENT_MIN_CHARS {
            return Err(DomainError::validation(
                "comment",
                format!("must be at least {COMMENT_MIN_CHARS} characters"),
            ));
        }
        if length > COMMENT_MAX_CHARS {
            return Err(DomainError::validation(
                "comment",
                format!("must be at most {COMMENT_MAX_CHARS} characters"),
            ));
        }

        let movie_name = movie_name.trim();
        if movie_name.is_empty() {
            return Err(DomainError::validation("movie_name", "is required"));
        }

        let commenter_ip = commenter_ip.trim();
        if commenter_ip.is_empty() {
            return Err(DomainError::validation("commenter_ip", "is required"));
        }

        Ok(Self {
            comment: comment.to_string(),
            movie_name: movie_name.to_string(),
            commenter_ip: commenter_ip.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_trimmed_comment() {
        let comment = NewComment::new("  Loved it  ", "A New Hope", "127.0.0.1").expect("valid");
        assert_eq!(comment.comment, "Loved it");
        assert_eq!(comment.movie_name, "A New Hope");
    }

    #[test]
    fn rejects_short_comment() {
        let err = NewComment::new("ok", "A New Hope", "127.0.0.1").unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation {
                field: "comment",
                ..
            }
        ));
    }

    #[test]
    fn rejects_long_comment() {
        let body = "x".repeat(COMMENT_MAX_CHARS + 1);
        assert!(NewComment::new(&body, "A New Hope", "127.0.0.1").is_err());

        let body = "x".repeat(COMMENT_MAX_CHARS);
        assert!(NewComment::new(&body, "A New Hope", "127.0.0.1").is_ok());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(NewComment::new("ééé", "A New Hope", "127.0.0.1").is_err());
        assert!(NewComment::new("éééé", "A New Hope", "127.0.0.1").is_ok());
    }

    #[test]
    fn requires_movie_and_ip() {
        assert_eq!(
            NewComment::new("Great film", "   ", "127.0.0.1").unwrap_err(),
            DomainError::validation("movie_name", "is required")
        );
        assert_eq!(
            NewComment::new("Great film", "A New Hope", "").unwrap_err(),
            DomainError::validation("commenter_ip", "is required")
        );
    }
}
