use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::domain::entities::CommentRecord;

pub const STATUS_SUCCESS: &str = "success";

/// Envelope shared by the catalog endpoints.
#[derive(Debug, Serialize)]
pub struct CatalogResponse<E, M> {
    pub entities: Vec<E>,
    pub metadata: M,
    pub message: &'static str,
    pub status: &'static str,
}

/// `movie_name` and `commenter_ip` may be sent but are ignored; the path and the client
/// address decide them. Any other field is rejected.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub comment: String,
    #[serde(default, rename = "movie_name")]
    _movie_name: Option<IgnoredAny>,
    #[serde(default, rename = "commenter_ip")]
    _commenter_ip: Option<IgnoredAny>,
}

#[derive(Debug, Serialize)]
pub struct CommentCreatedResponse {
    pub comment: CommentRecord,
    pub message: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub comments: Vec<CommentRecord>,
    pub total_records: usize,
    pub message: &'static str,
    pub status: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_fields_owned_by_the_route_are_ignored() {
        let request: CreateCommentRequest = serde_json::from_str(
            r#"{"comment": "Great", "movie_name": "Other", "commenter_ip": "1.2.3.4"}"#,
        )
        .expect("accepted");
        assert_eq!(request.comment, "Great");
    }

    #[test]
    fn other_unknown_fields_are_rejected() {
        let err = serde_json::from_str::<CreateCommentRequest>(
            r#"{"comment": "Great", "rating": 5}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("rating"));
    }
}
