use std::collections::HashMap;

use crate::{api::CommentOrder, Error};

/// Key under which the preferred comment order is kept
pub const SORT_ORDER_KEY: &str = "sortOption";

/// Small persistent string store, eg. the browser's `localStorage`
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), Error>;
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MemoryStore(HashMap<String, String>);

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.0.insert(String::from(key), String::from(value));
        Ok(())
    }
}

/// Stored order, or the default one if there is none or it cannot be understood
pub fn load_order<S: KvStore + ?Sized>(store: &S) -> CommentOrder {
    match store.get(SORT_ORDER_KEY) {
        None => CommentOrder::default(),
        Some(stored) => stored.parse().unwrap_or_else(|err| {
            tracing::warn!(?err, "ignoring stored comment order");
            CommentOrder::default()
        }),
    }
}

pub fn save_order<S: KvStore + ?Sized>(store: &mut S, order: CommentOrder) -> Result<(), Error> {
    store.set(SORT_ORDER_KEY, order.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_defaults_and_round_trips() {
        let mut store = MemoryStore::new();
        assert_eq!(load_order(&store), CommentOrder::MostUpvoted);
        save_order(&mut store, CommentOrder::Oldest).unwrap();
        assert_eq!(store.get(SORT_ORDER_KEY).as_deref(), Some("oldest"));
        assert_eq!(load_order(&store), CommentOrder::Oldest);
    }

    #[test]
    fn garbage_falls_back_to_default() {
        let mut store = MemoryStore::new();
        store.set(SORT_ORDER_KEY, "most_commented").unwrap();
        assert_eq!(load_order(&store), CommentOrder::MostUpvoted);
    }
}
