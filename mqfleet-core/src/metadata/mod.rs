mod errors;
pub use errors::{MetadataError, Result};

mod store;
pub use store::{MetaOptions, MetadataStore};

mod memory_store;
pub use memory_store::MemoryStore;

mod file_store;
pub use file_store::FileStore;

mod storage;
pub use storage::MetadataStorage;
