opaque_id!(UserId);

#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Author {
    pub id: UserId,
    pub username: String,
}

impl Author {
    pub fn new(id: impl Into<UserId>, username: impl Into<String>) -> Author {
        Author {
            id: id.into(),
            username: username.into(),
        }
    }
}
