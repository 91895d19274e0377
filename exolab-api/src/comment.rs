use std::str::FromStr;

use serde::Deserialize;

use crate::{Author, Error, Time};

opaque_id!(CommentId);

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Up,
    Down,
    #[default]
    None,
}

impl Vote {
    pub fn value(self) -> i64 {
        match self {
            Vote::Up => 1,
            Vote::Down => -1,
            Vote::None => 0,
        }
    }

    /// Change in vote count when a user's vote goes from `from` to `to`
    pub fn delta(from: Vote, to: Vote) -> i64 {
        to.value() - from.value()
    }

    /// Vote resulting from pressing `pressed` while currently holding `self`:
    /// pressing the held vote again clears it
    pub fn toggle(self, pressed: Vote) -> Vote {
        if self == pressed {
            Vote::None
        } else {
            pressed
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Vote::Up => "up",
            Vote::Down => "down",
            Vote::None => "none",
        }
    }
}

impl FromStr for Vote {
    type Err = Error;

    fn from_str(s: &str) -> Result<Vote, Error> {
        match s {
            "up" => Ok(Vote::Up),
            "down" => Ok(Vote::Down),
            "none" => Ok(Vote::None),
            _ => Err(Error::InvalidVote(String::from(s))),
        }
    }
}

fn vote_or_none<'de, D>(deserializer: D) -> Result<Vote, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Vote>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A comment as the server sends it, replies nested
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub author: Author,
    pub created_at: Time,

    #[serde(default)]
    pub vote_count: i64,

    /// Vote of the user the response was computed for, `null` on the wire when absent
    #[serde(default, deserialize_with = "vote_or_none")]
    pub user_vote: Vote,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<CommentId>,

    #[serde(default)]
    pub replies: Vec<Comment>,
}

impl Comment {
    /// Number of comments in this thread, this one included
    pub fn thread_len(&self) -> usize {
        1 + self.replies.iter().map(Comment::thread_len).sum::<usize>()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, serde::Serialize)]
pub struct NewComment {
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<CommentId>,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_content(&self.content)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, serde::Serialize)]
pub struct EditComment {
    pub content: String,
}

impl EditComment {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_content(&self.content)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, serde::Serialize)]
pub struct CastVote {
    #[serde(rename = "type")]
    pub vote: Vote,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_server_payload() {
        let c: Comment = serde_json::from_str(
            r#"{
                "id": 12,
                "content": "Nice use of $\\frac{a}{b}$",
                "author": {"id": 3, "username": "amine", "email": "a@example.org"},
                "created_at": "2024-03-01T10:20:30.123456Z",
                "vote_count": -2,
                "user_vote": null,
                "replies": [{
                    "id": 13,
                    "content": "thanks",
                    "author": {"id": 4, "username": "sara"},
                    "created_at": "2024-03-01T11:00:00Z",
                    "vote_count": 1,
                    "user_vote": "up",
                    "replies": []
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(c.id, CommentId::from("12"));
        assert_eq!(c.author.username, "amine");
        assert_eq!(c.user_vote, Vote::None);
        assert_eq!(c.replies[0].user_vote, Vote::Up);
        assert_eq!(c.thread_len(), 2);
    }

    #[test]
    fn vote_toggling() {
        assert_eq!(Vote::Up.toggle(Vote::Up), Vote::None);
        assert_eq!(Vote::Up.toggle(Vote::Down), Vote::Down);
        assert_eq!(Vote::None.toggle(Vote::Down), Vote::Down);
        assert_eq!(Vote::delta(Vote::Down, Vote::Up), 2);
        assert_eq!(Vote::delta(Vote::Up, Vote::None), -1);
    }

    #[test]
    fn cast_vote_wire_format() {
        let body = serde_json::to_value(CastVote { vote: Vote::None }).unwrap();
        assert_eq!(body, serde_json::json!({ "type": "none" }));
        assert_eq!("down".parse::<Vote>(), Ok(Vote::Down));
        assert_eq!(
            "sideways".parse::<Vote>(),
            Err(Error::InvalidVote(String::from("sideways")))
        );
    }
}
