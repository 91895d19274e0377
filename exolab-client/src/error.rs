use crate::{
    api::{self, CommentId},
    ActionKey,
};

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// The local tree does not hold this comment; the caller should refetch
    #[error("Comment {0} is not in the local tree")]
    NotFound(CommentId),

    #[error("Comment {0} is already in the local tree")]
    AlreadyExists(CommentId),

    #[error("Invalid comment: {0}")]
    Validation(String),

    /// The server refused a mutation, eg. because its target was deleted concurrently
    #[error("Rejected by the server: {0}")]
    Conflict(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("{0} is already being submitted")]
    Busy(ActionKey),

    #[error("Ticket does not match any pending action")]
    UnknownTicket,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<api::Error> for Error {
    fn from(e: api::Error) -> Error {
        match e {
            e if e.is_invalid_input() => Error::Validation(e.to_string()),
            api::Error::Unknown(msg) => Error::Network(msg),
            e => Error::Conflict(e.to_string()),
        }
    }
}

impl Error {
    /// Whether submitting the same action again may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Busy(_))
    }
}
