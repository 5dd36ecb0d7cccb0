pub mod manager;
pub mod memory;
pub mod models;
pub mod repository;
pub mod store;

pub use manager::PgStore;
pub use memory::MemoryStore;
pub use store::{ContactRepository, SalesRepository, Store, StoreError, StoreResult, TaskRepository};
