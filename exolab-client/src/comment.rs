use chrono::Utc;
use uuid::Uuid;

use crate::api::{self, Author, CommentId, Time, UserId, Vote};

const PROVISIONAL_PREFIX: &str = "pending-";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommentNode {
    pub id: CommentId,
    pub author: Author,
    pub content: String,
    pub created_at: Time,
    pub vote_count: i64,

    /// Vote of the user viewing the tree
    pub user_vote: Vote,

    /// `None` for top-level comments
    pub parent_id: Option<CommentId>,

    /// Replies, in insertion order
    pub children: Vec<CommentId>,
}

impl CommentNode {
    pub fn new(id: CommentId, author: Author, content: String, created_at: Time) -> CommentNode {
        CommentNode {
            id,
            author,
            content,
            created_at,
            vote_count: 0,
            user_vote: Vote::None,
            parent_id: None,
            children: Vec::new(),
        }
    }

    /// Local stand-in for a comment the server has not acknowledged yet
    pub fn provisional(author: Author, content: String) -> CommentNode {
        let id = CommentId(format!("{PROVISIONAL_PREFIX}{}", Uuid::new_v4()));
        CommentNode::new(id, author, content, Utc::now())
    }

    /// Converts one wire comment, ignoring its replies
    pub fn from_api(c: &api::Comment) -> CommentNode {
        CommentNode {
            id: c.id.clone(),
            author: c.author.clone(),
            content: c.content.clone(),
            created_at: c.created_at,
            vote_count: c.vote_count,
            user_vote: c.user_vote,
            parent_id: c.parent.clone(),
            children: Vec::new(),
        }
    }

    pub fn is_provisional(&self) -> bool {
        is_provisional(&self.id)
    }

    pub fn age(&self, now: Time) -> String {
        let elapsed = now.signed_duration_since(self.created_at);
        if elapsed.num_days() > 0 {
            format!("{}d ago", elapsed.num_days())
        } else if elapsed.num_hours() > 0 {
            format!("{}h ago", elapsed.num_hours())
        } else if elapsed.num_minutes() > 0 {
            format!("{}m ago", elapsed.num_minutes())
        } else {
            // clock skew can put a fresh comment slightly in the future
            format!("{}s ago", elapsed.num_seconds().max(0))
        }
    }
}

pub fn is_provisional(id: &CommentId) -> bool {
    id.0.starts_with(PROVISIONAL_PREFIX)
}

/// Partial update of the mutable fields of a comment
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommentPatch {
    pub content: Option<String>,
    pub vote_count: Option<i64>,
    pub user_vote: Option<Vote>,
}

impl CommentPatch {
    pub fn content(content: impl Into<String>) -> CommentPatch {
        CommentPatch {
            content: Some(content.into()),
            ..CommentPatch::default()
        }
    }

    pub fn vote(vote_count: i64, user_vote: Vote) -> CommentPatch {
        CommentPatch {
            vote_count: Some(vote_count),
            user_vote: Some(user_vote),
            ..CommentPatch::default()
        }
    }

    /// Every mutable field of `node`, as it currently is
    pub fn snapshot(node: &CommentNode) -> CommentPatch {
        CommentPatch {
            content: Some(node.content.clone()),
            vote_count: Some(node.vote_count),
            user_vote: Some(node.user_vote),
        }
    }

    /// The server's version of every mutable field
    pub fn from_api(c: &api::Comment) -> CommentPatch {
        CommentPatch {
            content: Some(c.content.clone()),
            vote_count: Some(c.vote_count),
            user_vote: Some(c.user_vote),
        }
    }

    pub fn apply(&self, node: &mut CommentNode) {
        if let Some(content) = &self.content {
            node.content = content.clone();
        }
        if let Some(count) = self.vote_count {
            node.vote_count = count;
        }
        if let Some(vote) = self.user_vote {
            node.user_vote = vote;
        }
    }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Participant {
    pub id: UserId,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn relative_age() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let c = CommentNode::new(
            CommentId::from("1"),
            Author::new("1", "amine"),
            String::from("hi"),
            t0,
        );
        assert_eq!(c.age(t0 + Duration::seconds(30)), "30s ago");
        assert_eq!(c.age(t0 - Duration::seconds(2)), "0s ago");
        assert_eq!(c.age(t0 + Duration::minutes(12)), "12m ago");
        assert_eq!(c.age(t0 + Duration::hours(5)), "5h ago");
        assert_eq!(c.age(t0 + Duration::days(3)), "3d ago");
    }

    #[test]
    fn provisional_ids() {
        let c = CommentNode::provisional(Author::new("1", "amine"), String::from("hi"));
        assert!(c.is_provisional());
        assert!(!is_provisional(&CommentId::from("17")));
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut c = CommentNode::new(
            CommentId::from("1"),
            Author::new("1", "amine"),
            String::from("hi"),
            Utc::now(),
        );
        CommentPatch::vote(4, Vote::Up).apply(&mut c);
        assert_eq!((c.vote_count, c.user_vote), (4, Vote::Up));
        assert_eq!(c.content, "hi");
        CommentPatch::content("hello").apply(&mut c);
        assert_eq!(c.content, "hello");
        assert_eq!(c.vote_count, 4);
    }
}
