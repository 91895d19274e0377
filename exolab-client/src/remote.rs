use async_trait::async_trait;

use crate::{
    api::{Comment, CommentId, ExerciseId, Vote},
    Error,
};

/// The comment endpoints of the server
// ?Send because the browser's HTTP futures are not Send
#[async_trait(?Send)]
pub trait CommentApi {
    async fn fetch_comments(&self, exercise: &ExerciseId) -> Result<Vec<Comment>, Error>;

    async fn add_comment(
        &self,
        exercise: &ExerciseId,
        text: &str,
        parent: Option<&CommentId>,
    ) -> Result<Comment, Error>;

    async fn edit_comment(&self, id: &CommentId, text: &str) -> Result<Comment, Error>;

    async fn delete_comment(&self, id: &CommentId) -> Result<(), Error>;

    /// Casting the vote the user already holds clears it, as does `Vote::None`
    async fn vote_comment(&self, id: &CommentId, vote: Vote) -> Result<Comment, Error>;
}
