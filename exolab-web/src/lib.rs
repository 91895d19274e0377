//! Browser glue: preferences in `localStorage`, logs in the devtools console.

use exolab_client::{
    api::{Author, ExerciseId},
    CommentSection, Error, HttpApi, KvStore,
};
use gloo_storage::{LocalStorage, Storage};

/// `KvStore` over the browser's `localStorage`. Values are stored as plain strings,
/// not JSON, so that they stay readable by other scripts of the site.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStore;

impl KvStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        match LocalStorage::raw().get_item(key) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(?err, key, "failed reading from localStorage");
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(|err| Error::Storage(format!("writing {key} to localStorage: {err:?}")))
    }
}

pub fn init_logging() {
    tracing_wasm::set_as_global_default();
}

/// Comment section for the exercise page, talking to `host` as `viewer`
pub fn open_section(
    host: &str,
    token: Option<String>,
    exercise: ExerciseId,
    viewer: Author,
) -> (HttpApi, CommentSection<LocalStore>) {
    (
        HttpApi::new(host, token),
        CommentSection::new(exercise, viewer, LocalStore),
    )
}
