use anyhow::{anyhow, Context};
use serde_json::json;

use crate::{CommentId, ExerciseId};

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Comment not found {0}")]
    CommentNotFound(CommentId),

    #[error("Exercise not found {0}")]
    ExerciseNotFound(ExerciseId),

    #[error("Parent comment {0} belongs to another exercise")]
    ForeignParent(CommentId),

    #[error("Comment content is required")]
    EmptyContent,

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),

    #[error("Invalid vote type {0:?}")]
    InvalidVote(String),

    #[error("Unknown comment order {0:?}")]
    UnknownOrder(String),
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::CommentNotFound(_) => StatusCode::NOT_FOUND,
            Error::ExerciseNotFound(_) => StatusCode::NOT_FOUND,
            Error::ForeignParent(_) => StatusCode::BAD_REQUEST,
            Error::EmptyContent => StatusCode::BAD_REQUEST,
            Error::NullByteInString(_) => StatusCode::BAD_REQUEST,
            Error::InvalidVote(_) => StatusCode::BAD_REQUEST,
            Error::UnknownOrder(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Whether the request was refused because of what it contained, as opposed to
    /// the state it targeted
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Error::EmptyContent
                | Error::NullByteInString(_)
                | Error::InvalidVote(_)
                | Error::UnknownOrder(_)
        )
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "message": msg,
                "type": "unknown",
            }),
            Error::AuthenticationRequired => json!({
                "message": "authentication required",
                "type": "unauthenticated",
            }),
            Error::PermissionDenied => json!({
                "message": "permission denied",
                "type": "permission-denied",
            }),
            Error::CommentNotFound(id) => json!({
                "message": "comment not found",
                "type": "comment-not-found",
                "id": id,
            }),
            Error::ExerciseNotFound(id) => json!({
                "message": "exercise not found",
                "type": "exercise-not-found",
                "id": id,
            }),
            Error::ForeignParent(id) => json!({
                "message": "parent comment belongs to another exercise",
                "type": "foreign-parent",
                "id": id,
            }),
            Error::EmptyContent => json!({
                "message": "comment content is required",
                "type": "empty-content",
            }),
            Error::NullByteInString(s) => json!({
                "message": "there was a null byte in argument string",
                "type": "null-byte",
                "string": s,
            }),
            Error::InvalidVote(v) => json!({
                "message": "invalid vote type",
                "type": "invalid-vote",
                "vote": v,
            }),
            Error::UnknownOrder(o) => json!({
                "message": "unknown comment order",
                "type": "unknown-order",
                "order": o,
            }),
        })
        .expect("serializing error contents")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let field = |name: &str| -> anyhow::Result<String> {
            data.get(name)
                .and_then(|v| v.as_str())
                .map(String::from)
                .ok_or_else(|| anyhow!("error contents lacks a string {name:?} field"))
        };
        Ok(
            match data
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error type is not a string"))?
            {
                "unknown" => Error::Unknown(field("message").unwrap_or_default()),
                "unauthenticated" => Error::AuthenticationRequired,
                "permission-denied" => Error::PermissionDenied,
                "comment-not-found" => Error::CommentNotFound(CommentId(field("id")?)),
                "exercise-not-found" => Error::ExerciseNotFound(ExerciseId(field("id")?)),
                "foreign-parent" => Error::ForeignParent(CommentId(field("id")?)),
                "empty-content" => Error::EmptyContent,
                "null-byte" => Error::NullByteInString(field("string")?),
                "invalid-vote" => Error::InvalidVote(field("vote")?),
                "unknown-order" => Error::UnknownOrder(field("order")?),
                _ => return Err(anyhow!("error contents has unknown type")),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contents_parse_back() {
        let errors = [
            Error::Unknown(String::from("boom")),
            Error::PermissionDenied,
            Error::CommentNotFound(CommentId::from("9")),
            Error::ForeignParent(CommentId::from("3")),
            Error::NullByteInString(String::from("a\0")),
            Error::InvalidVote(String::from("sideways")),
        ];
        for e in errors {
            assert_eq!(Error::parse(&e.contents()).unwrap(), e);
        }
    }

    #[test]
    fn untyped_bodies_are_rejected() {
        // what the server sends for errors it does not classify
        assert!(Error::parse(br#"{"error": "Comment content is required"}"#).is_err());
        assert!(Error::parse(b"<html>502</html>").is_err());
    }

    #[test]
    fn status_codes() {
        assert_eq!(Error::EmptyContent.status_code(), http::StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::CommentNotFound(CommentId::from("1")).status_code(),
            http::StatusCode::NOT_FOUND
        );
        assert!(Error::EmptyContent.is_invalid_input());
        assert!(!Error::PermissionDenied.is_invalid_input());
    }
}
