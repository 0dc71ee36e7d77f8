pub mod index;
pub mod lmdb_storage;
pub mod memory;
pub mod store;

pub use index::{HnswVectorIndex, IndexError, NativeVectorIndex};
pub use lmdb_storage::LmdbStore;
pub use memory::MemoryStore;
pub use store::DocumentStore;
