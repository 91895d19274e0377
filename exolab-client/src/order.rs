use std::{cmp::Reverse, sync::Arc};

use crate::{api::CommentOrder, CommentNode};

pub trait OrderExt {
    fn sort(&self, comments: &mut [Arc<CommentNode>]);
}

impl OrderExt for CommentOrder {
    /// Stable: comments that compare equal keep their relative order
    fn sort(&self, comments: &mut [Arc<CommentNode>]) {
        match self {
            CommentOrder::MostUpvoted => comments.sort_by_key(|c| Reverse(c.vote_count)),
            CommentOrder::Recent => comments.sort_by_key(|c| Reverse(c.created_at)),
            CommentOrder::Oldest => comments.sort_by_key(|c| c.created_at),
        }
    }
}
