#![forbid(unsafe_code)]

pub mod autosave;
pub mod backend;
pub mod json_file;

pub use autosave::{Autosave, DEFAULT_FLUSH_DELAY, Snapshot};
pub use backend::{InMemoryBackend, StorageError, StoreBackend};
pub use json_file::JsonFileBackend;
