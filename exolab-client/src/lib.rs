mod comment;
pub use comment::{is_provisional, CommentNode, CommentPatch, Participant};

mod error;
pub use error::Error;

mod forest;
pub use forest::{Forest, ViewEntry, Walk};

mod http;
pub use http::{classify, HttpApi};

pub mod mention;

mod order;
pub use order::OrderExt;

mod pending;
pub use pending::{ActionKey, ActionKind, ActionState, Ticket};

mod remote;
pub use remote::CommentApi;

mod section;
pub use section::CommentSection;

mod storage;
pub use storage::{load_order, save_order, KvStore, MemoryStore, SORT_ORDER_KEY};

pub mod api {
    pub use exolab_api::*;
}

pub mod prelude {
    pub use crate::{CommentApi, KvStore, OrderExt};
}
