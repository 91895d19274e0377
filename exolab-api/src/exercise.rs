use crate::Comment;

opaque_id!(ExerciseId);

/// The subset of the exercise payload the comment section needs
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Exercise {
    pub id: ExerciseId,

    #[serde(default)]
    pub title: String,

    /// Every comment of the exercise, replies both listed here and nested under their parent
    #[serde(default)]
    pub comments: Vec<Comment>,
}
