use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::Context;
use exolab_client::{Error, KvStore};

/// `KvStore` kept as a JSON object in a file, rewritten on every change
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Loads `path`, or starts empty if it does not exist yet
    pub fn open(path: &Path) -> anyhow::Result<FileStore> {
        let values = match std::fs::read(path) {
            Ok(data) => serde_json::from_slice(&data)
                .with_context(|| format!("parsing state file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("reading state file {}", path.display()))
            }
        };
        Ok(FileStore {
            path: path.to_path_buf(),
            values,
        })
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.values.insert(String::from(key), String::from(value));
        let data =
            serde_json::to_vec_pretty(&self.values).map_err(|e| Error::Storage(e.to_string()))?;
        std::fs::write(&self.path, data)
            .map_err(|e| Error::Storage(format!("writing {}: {e}", self.path.display())))
    }
}

#[cfg(test)]
mod tests {
    use exolab_client::{api::CommentOrder, load_order, save_order, SORT_ORDER_KEY};

    use super::*;

    #[test]
    fn order_survives_reopening() {
        let dir = tempfile::tempdir().expect("creating tempdir");
        let path = dir.path().join("state.json");
        let mut store = FileStore::open(&path).unwrap();
        assert_eq!(load_order(&store), CommentOrder::MostUpvoted);
        save_order(&mut store, CommentOrder::Recent).unwrap();

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get(SORT_ORDER_KEY).as_deref(), Some("recent"));
        assert_eq!(load_order(&store), CommentOrder::Recent);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().expect("creating tempdir");
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(FileStore::open(&path).is_err());
    }

    #[test]
    fn unwritable_path_is_a_storage_error() {
        let dir = tempfile::tempdir().expect("creating tempdir");
        let mut store = FileStore::open(&dir.path().join("missing/state.json")).unwrap();
        assert!(matches!(
            store.set(SORT_ORDER_KEY, "oldest"),
            Err(Error::Storage(_))
        ));
    }
}
